//! Stylesheets, scripts and images written next to the generated documents.
//!
//! Everything under `static/` is embedded at compile time. The site
//! stylesheet is the theme's custom properties followed by the base rules, so
//! colour changes in `site.json` never require touching CSS.
//!
//! Write order matters: generated files land first, then `content/assets/**`
//! is copied without overwriting them, then `content/media/**` is copied
//! into `assets/img/` where it may replace a stock placeholder.

use crate::config::{SiteConfig, generate_theme_css};
use maud::html;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const CSS_PATH: &str = "assets/css/style.css";
pub const JS_PATH: &str = "assets/js/main.js";
pub const LANDING_CSS_PATH: &str = "assets/css/landing.css";
pub const LANDING_JS_PATH: &str = "assets/js/landing.js";
pub const IMG_DIR: &str = "assets/img";

/// Source directory copied verbatim into `assets/`.
pub const CONTENT_ASSETS_DIR: &str = "assets";
/// Source directory copied into `assets/img/`.
pub const MEDIA_DIR: &str = "media";

const BASE_CSS: &str = include_str!("../static/style.css");
const MAIN_JS: &str = include_str!("../static/main.js");
const LANDING_CSS: &str = include_str!("../static/landing.css");
const LANDING_JS: &str = include_str!("../static/landing.js");

/// Stock placeholder images and the caption drawn on each.
pub const PLACEHOLDERS: [(&str, &str); 5] = [
    ("placeholder-hero.svg", "Hero image"),
    ("placeholder-studio.svg", "Studio"),
    ("placeholder-lab.svg", "Lab"),
    ("placeholder-portrait.svg", "Portrait"),
    ("placeholder-grid.svg", "Gallery"),
];

/// Full site stylesheet: theme variables, then the base rules.
pub fn stylesheet(config: &SiteConfig) -> String {
    format!("{}\n{}", generate_theme_css(&config.theme), BASE_CSS)
}

pub fn placeholder_svg(label: &str) -> String {
    let label = html! { (label) }.into_string();
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1200 800" role="img" aria-label="{label}">
<defs><linearGradient id="g" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="#f3f1f0"/><stop offset="1" stop-color="#e6dcd5"/></linearGradient></defs>
<rect width="1200" height="800" fill="url(#g)"/>
<circle cx="960" cy="180" r="220" fill="none" stroke="#e0b15a" stroke-opacity="0.5"/>
<text x="600" y="420" text-anchor="middle" font-family="Georgia, serif" font-size="56" fill="#65141c">{label}</text>
</svg>
"##
    )
}

fn write_file(output: &Path, rel: &str, contents: &str) -> io::Result<String> {
    let path = output.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, contents)?;
    Ok(rel.to_string())
}

/// Write the stylesheet, script, placeholders and, when asked, the landing
/// assets. Returns the output-relative paths written.
pub fn write_generated(output: &Path, config: &SiteConfig, landing: bool) -> io::Result<Vec<String>> {
    let mut written = vec![
        write_file(output, CSS_PATH, &stylesheet(config))?,
        write_file(output, JS_PATH, MAIN_JS)?,
    ];
    if landing {
        written.push(write_file(output, LANDING_CSS_PATH, LANDING_CSS)?);
        written.push(write_file(output, LANDING_JS_PATH, LANDING_JS)?);
    }
    for (name, label) in PLACEHOLDERS {
        written.push(write_file(output, &format!("{IMG_DIR}/{name}"), &placeholder_svg(label))?);
    }
    Ok(written)
}

/// Mirror `src` into `dst`. Existing files are left alone unless `overwrite`.
/// A missing `src` copies nothing.
fn copy_tree(src: &Path, dst: &Path, overwrite: bool) -> io::Result<Vec<PathBuf>> {
    let mut copied = Vec::new();
    if !src.is_dir() {
        return Ok(copied);
    }
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if target.exists() && !overwrite {
            debug!(path = %target.display(), "keeping generated file");
            continue;
        }
        fs::copy(entry.path(), &target)?;
        copied.push(target);
    }
    Ok(copied)
}

/// Copy user-supplied assets and media from the content root.
pub fn copy_content_assets(root: &Path, output: &Path) -> io::Result<Vec<PathBuf>> {
    let mut copied = copy_tree(&root.join(CONTENT_ASSETS_DIR), &output.join("assets"), false)?;
    copied.extend(copy_tree(&root.join(MEDIA_DIR), &output.join(IMG_DIR), true)?);
    Ok(copied)
}
