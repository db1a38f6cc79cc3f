//! Content root scanning and manifest construction.
//!
//! Stage 1 of the build. Reads every content source exactly once and produces
//! an immutable [`Manifest`] that rendering consumes without touching the
//! content root again.
//!
//! ## Directory Structure
//!
//! ```text
//! content/                 # Content root
//! ├── site.json            # Site configuration (optional)
//! ├── control.csv          # Pages and sections (required)
//! ├── links.csv            # Digital presence links (optional)
//! ├── blocks/              # Markdown blocks referenced by bare name
//! ├── blog/
//! │   ├── posts.csv        # Structured post table (optional)
//! │   └── *.txt            # Legacy freeform posts
//! ├── digests/index.json   # Digest index (optional)
//! ├── media/               # Copied to assets/img/
//! └── assets/              # Copied to assets/
//! ```
//!
//! ## Control Table
//!
//! One row per section. Columns: `page_slug`, `kind`, `status`, `active`,
//! `title`, `order`, `section` (or `id`), `source_md`, `cta_text`, `cta_url`,
//! `hero_image`, `width`, `style_variant`. Unknown columns are ignored.
//!
//! - Rows with status `draft`, `hidden`, `archived` or `inactive`, or with an
//!   `active` cell other than `true`, are skipped entirely.
//! - `page`/`meta` rows set the page title and order instead of adding a
//!   section.
//! - Page slugs must be safe directory names (see
//!   [`is_safe_slug`](crate::naming::is_safe_slug)); `..`, empty segments and
//!   other characters abort the scan with the file and line.
//! - `order` must be an integer (empty means 0). Anything else aborts the scan
//!   with the file and line.
//!
//! ## Validation
//!
//! - The control table must exist.
//! - Every referenced block must exist inside the content root.

use crate::blocks::{BlockError, BlockResolver};
use crate::collections::{self, CollectionError};
use crate::config::{self, SiteConfig};
use crate::naming::{is_safe_slug, normalize_slug, title_from_slug};
use crate::types::{
    BlogPost, DigestIssue, LinkKind, NavLink, Page, Section, SectionKind, SitePages,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const CONTROL_TABLE: &str = "control.csv";
pub const LINKS_TABLE: &str = "links.csv";
pub const BLOG_DIR: &str = "blog";
pub const DIGESTS_DIR: &str = "digests";

const EXCLUDED_STATUSES: [&str; 4] = ["draft", "hidden", "archived", "inactive"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Missing control table: {0}")]
    MissingControl(PathBuf),
    #[error("Non-integer order '{value}' in {path} line {line}")]
    InvalidOrder {
        path: PathBuf,
        line: u64,
        value: String,
    },
    #[error("Unsafe page slug '{slug}' in {path} line {line}")]
    InvalidSlug {
        path: PathBuf,
        line: u64,
        slug: String,
    },
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Everything the build needs, read once from the content root.
#[derive(Debug, Serialize)]
pub struct Manifest {
    /// Canonical content root.
    pub root: PathBuf,
    pub config: SiteConfig,
    pub pages: SitePages,
    pub links: Vec<NavLink>,
    pub posts: Vec<BlogPost>,
    pub digests: Vec<DigestIssue>,
}

impl Manifest {
    pub fn page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    pub fn has_page(&self, slug: &str) -> bool {
        self.pages.contains(slug)
    }
}

/// Scan a content root into a [`Manifest`].
pub fn scan(content_root: &Path) -> Result<Manifest, ScanError> {
    let control = content_root.join(CONTROL_TABLE);
    if !control.is_file() {
        return Err(ScanError::MissingControl(control));
    }

    let config = config::load_config(content_root)?;
    let blocks = BlockResolver::new(content_root)?;
    let root = blocks.root().to_path_buf();

    let pages = read_control(&root.join(CONTROL_TABLE), &blocks)?;
    let links = read_links(&root.join(LINKS_TABLE))?;
    let posts = collections::load_blog_posts(&root.join(BLOG_DIR), &blocks)?;
    let digests = collections::load_digests(&root.join(DIGESTS_DIR), &blocks)?;

    debug!(
        pages = pages.len(),
        links = links.len(),
        posts = posts.len(),
        digests = digests.len(),
        "scanned content root"
    );

    Ok(Manifest {
        root,
        config,
        pages,
        links,
        posts,
        digests,
    })
}

// =============================================================================
// Table readers
// =============================================================================

fn csv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, ScanError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| ScanError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_order(raw: &str, path: &Path, line: u64) -> Result<i64, ScanError> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(|_| ScanError::InvalidOrder {
        path: path.to_path_buf(),
        line,
        value: raw.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ControlRow {
    page_slug: String,
    kind: String,
    status: String,
    active: String,
    title: String,
    order: String,
    section: String,
    id: String,
    source_md: String,
    cta_text: String,
    cta_url: String,
    hero_image: String,
    width: String,
    style_variant: String,
}

impl ControlRow {
    fn is_excluded(&self) -> bool {
        let status = self.status.to_lowercase();
        let active = if self.active.is_empty() {
            "true".to_string()
        } else {
            self.active.to_lowercase()
        };
        EXCLUDED_STATUSES.contains(&status.as_str()) || active != "true"
    }
}

fn read_control(path: &Path, blocks: &BlockResolver) -> Result<SitePages, ScanError> {
    let mut reader = csv_reader(path)?;
    let mut pages: BTreeMap<String, Page> = BTreeMap::new();

    let mut record = csv::StringRecord::new();
    let headers = reader
        .headers()
        .map_err(|source| ScanError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    loop {
        let more = reader.read_record(&mut record).map_err(|source| ScanError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if !more {
            break;
        }
        let line = record.position().map_or(0, |p| p.line());
        let row: ControlRow =
            record
                .deserialize(Some(&headers))
                .map_err(|source| ScanError::Csv {
                    path: path.to_path_buf(),
                    source,
                })?;
        if row.is_excluded() {
            continue;
        }

        let slug = normalize_slug(&row.page_slug);
        if !is_safe_slug(&slug) {
            return Err(ScanError::InvalidSlug {
                path: path.to_path_buf(),
                line,
                slug,
            });
        }
        let order = parse_order(&row.order, path, line)?;
        let page = pages.entry(slug.clone()).or_insert_with(|| Page {
            title: title_from_slug(&slug),
            slug: slug.clone(),
            order: 0,
            sections: Vec::new(),
        });

        let kind = row.kind.to_lowercase();
        if kind == "page" || kind == "meta" {
            if !row.title.is_empty() {
                page.title = row.title;
            }
            page.order = order;
            continue;
        }

        let (source, body) = blocks.read(&row.source_md)?;
        let section_id = if row.section.is_empty() {
            row.id
        } else {
            row.section
        };
        page.sections.push(Section {
            kind: SectionKind::parse(&kind),
            order,
            title: row.title,
            section_id,
            source,
            body,
            cta_text: row.cta_text,
            cta_url: row.cta_url,
            hero_image: row.hero_image,
            width: or_default(&row.width, "full"),
            style_variant: or_default(&row.style_variant, "glass"),
        });
    }

    for page in pages.values_mut() {
        page.sections.sort_by_key(|section| section.order);
    }
    Ok(SitePages::new(pages))
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_lowercase()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LinkRow {
    label: String,
    url: String,
    kind: String,
    order: String,
}

fn read_links(path: &Path) -> Result<Vec<NavLink>, ScanError> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let mut reader = csv_reader(path)?;
    let mut links = Vec::new();
    for (index, row) in reader.deserialize::<LinkRow>().enumerate() {
        let row = row.map_err(|source| ScanError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if row.label.is_empty() {
            continue;
        }
        // Header is line 1.
        let line = index as u64 + 2;
        links.push(NavLink {
            order: parse_order(&row.order, path, line)?,
            kind: if row.kind.eq_ignore_ascii_case("placeholder") {
                LinkKind::Placeholder
            } else {
                LinkKind::Normal
            },
            label: row.label,
            url: row.url,
        });
    }
    links.sort_by_key(|link| link.order);
    Ok(links)
}
