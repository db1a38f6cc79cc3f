//! # Tabula
//!
//! A static site generator driven by content-control tables. A small set of
//! CSV files decides which pages exist, which sections each page has and in
//! what order; the prose lives in markdown blocks next to them.
//!
//! # Architecture: Read Once, Then Emit
//!
//! ```text
//! 1. Scan      content/  →  Manifest     (tables, blocks, posts, digests, config)
//! 2. Generate  Manifest  →  site/        (HTML, assets, form endpoints)
//! 3. Verify    site/     →  report       (broken and forbidden links)
//! ```
//!
//! Every input is read and validated in the scan phase. A bad order value,
//! an unsafe slug, an escaping block reference or a missing block file aborts
//! the build before a single output file is written. Generation is a pure
//! function of the manifest plus the copied asset directories, so two builds
//! of the same content produce identical trees.
//!
//! # Content Layout
//!
//! ```text
//! content/
//! ├── control.csv          # page_slug, kind, status, title, order, section, source_md, ...
//! ├── links.csv            # label, url, kind, order
//! ├── site.json            # site settings and theme (optional)
//! ├── blocks/              # markdown blocks referenced by bare name
//! ├── blog/posts.csv       # source_md, title, date, slug
//! ├── blog/*.txt           # legacy posts
//! ├── digests/index.json   # date, title, slug, source_md
//! ├── assets/              # copied to site/assets/
//! └── media/               # copied to site/assets/img/
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Reads the control and links tables into the [`scan::Manifest`] |
//! | [`blocks`] | Resolves block references, refusing anything outside the content root |
//! | [`collections`] | Blog posts (table + legacy files) and digest issues |
//! | [`config`] | `site.json` loading: stock defaults, merge, validation, theme CSS |
//! | [`types`] | Pages, sections, links, posts and digest issues |
//! | [`naming`] | Slug normalization, slugify, default titles |
//! | [`paths`] | Output paths and document-relative links |
//! | [`markdown`] | Markdown rendering with raw HTML neutralized |
//! | [`layout`] | Section renderers and root layout variants |
//! | [`generate`] | Document assembly and parallel emission |
//! | [`assets`] | Stylesheets, scripts, placeholder images, copied media |
//! | [`forms`] | Contact/newsletter endpoint contract and scripts |
//! | [`verify`] | Link checking over a built site |
//! | [`publications`] | BibTeX bibliographies rendered into a markdown block |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Relative Links Everywhere
//!
//! Every link is computed relative to the document that contains it, so the
//! site works from any sub-path and straight from the filesystem. [`paths`]
//! is the only place that knows the output layout.
//!
//! ## Maud Over Template Engines
//!
//! HTML is built with [Maud](https://maud.lambda.xyz/). Interpolation is
//! escaped by default; the only unescaped strings are the output of the
//! markdown renderer, which turns raw HTML into text before rendering.
//!
//! ## Closed Enumerations
//!
//! Section kinds and layout variants are enums matched exhaustively. Unknown
//! section kinds render as generic content sections and unknown layout
//! variants fall back to the standard layout, so a typo in a table degrades
//! the page instead of failing the build.

pub mod assets;
pub mod blocks;
pub mod collections;
pub mod config;
pub mod forms;
pub mod generate;
pub mod layout;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod paths;
pub mod publications;
pub mod scan;
pub mod types;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_helpers;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` (the number of `-v`
/// flags) picks warn, info, debug or trace for this crate.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,tabula={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}
