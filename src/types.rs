//! Shared content types produced by the scan stage and consumed by rendering.
//!
//! Everything here is built once while reading the content root and never
//! mutated afterwards; renderers only ever hold shared references.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What a section renders as.
///
/// The set of special kinds is closed; any other string in the `kind` column
/// becomes [`SectionKind::Other`] and renders as a generic content block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(into = "String")]
pub enum SectionKind {
    Hero,
    #[default]
    Section,
    ContactForm,
    DigestList,
    Other(String),
}

impl SectionKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "section" => SectionKind::Section,
            "hero" => SectionKind::Hero,
            "contact_form" => SectionKind::ContactForm,
            "digest_list" => SectionKind::DigestList,
            other => SectionKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SectionKind::Hero => "hero",
            SectionKind::Section => "section",
            SectionKind::ContactForm => "contact_form",
            SectionKind::DigestList => "digest_list",
            SectionKind::Other(name) => name,
        }
    }
}

impl From<SectionKind> for String {
    fn from(kind: SectionKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One content block on a page.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub order: i64,
    pub title: String,
    /// HTML anchor id; empty when the row declared none.
    pub section_id: String,
    /// Resolved block file, if the row referenced one.
    pub source: Option<PathBuf>,
    /// Raw markdown read from `source` at load time.
    pub body: String,
    pub cta_text: String,
    pub cta_url: String,
    pub hero_image: String,
    /// Width class suffix (`full`, `narrow`, ...).
    pub width: String,
    /// Style class suffix (`glass`, `plain`, ...).
    pub style_variant: String,
}

impl Section {
    pub fn is_hero(&self) -> bool {
        self.kind == SectionKind::Hero
    }

    pub fn is_digest_list(&self) -> bool {
        self.kind == SectionKind::DigestList
    }
}

/// A page assembled from all control rows sharing a slug.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Normalized slug; `""` is the site root.
    pub slug: String,
    pub title: String,
    pub order: i64,
    /// Sections sorted by order, ties in row order.
    pub sections: Vec<Section>,
}

/// Pages keyed by slug.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SitePages(BTreeMap<String, Page>);

impl SitePages {
    pub fn new(pages: BTreeMap<String, Page>) -> Self {
        Self(pages)
    }

    pub fn get(&self, slug: &str) -> Option<&Page> {
        self.0.get(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.0.contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pages in `(order, slug)` order.
    pub fn ordered(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self.0.values().collect();
        pages.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.slug.cmp(&b.slug)));
        pages
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Normal,
    /// Rendered as a non-clickable "coming soon" entry.
    Placeholder,
}

/// An entry of the links table.
#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub label: String,
    pub url: String,
    pub kind: LinkKind,
    pub order: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    /// ISO `YYYY-MM-DD`, compared as a plain string.
    pub date: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DigestIssue {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub source: PathBuf,
    pub body: String,
}
