//! Shared test utilities for the tabula test suite.
//!
//! Two kinds of helpers:
//!
//! - **Fixtures**: [`setup_fixtures`] copies the checked-in `fixtures/content`
//!   tree into a temp dir so tests can scan, build and mutate it freely.
//! - **Builders**: small constructors ([`page`], [`section`], [`post`],
//!   [`digest`], [`manifest`]) for rendering tests that don't need the
//!   filesystem at all.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let manifest = scan(&content_dir(&tmp)).unwrap();
//! let root = find_page(&manifest, "");
//! assert_eq!(find_section(root, "Welcome").kind, SectionKind::Hero);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::naming::title_from_slug;
use crate::scan::Manifest;
use crate::types::{BlogPost, DigestIssue, Page, Section, SectionKind, SitePages};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to `<tmp>/content` and return the temp dir.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    let target = content_dir(&tmp);
    for entry in WalkDir::new(&fixtures) {
        let entry = entry.unwrap();
        let rel = entry.path().strip_prefix(&fixtures).unwrap();
        let dest = target.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).unwrap();
        } else {
            fs::copy(entry.path(), &dest).unwrap();
        }
    }
    tmp
}

/// Content root inside a fixture temp dir.
pub fn content_dir(tmp: &TempDir) -> PathBuf {
    tmp.path().join("content")
}

/// Output dir inside a fixture temp dir (not created).
pub fn output_dir(tmp: &TempDir) -> PathBuf {
    tmp.path().join("site")
}

// =========================================================================
// Manifest lookups, panicking with a clear message on miss
// =========================================================================

/// Find a page by slug. Panics if not found.
pub fn find_page<'a>(manifest: &'a Manifest, slug: &str) -> &'a Page {
    manifest.page(slug).unwrap_or_else(|| {
        let slugs: Vec<&str> = manifest
            .pages
            .ordered()
            .iter()
            .map(|p| p.slug.as_str())
            .collect();
        panic!("page '{slug}' not found. Available: {slugs:?}")
    })
}

/// Find a section by title within a page. Panics if not found.
pub fn find_section<'a>(page: &'a Page, title: &str) -> &'a Section {
    page.sections
        .iter()
        .find(|s| s.title == title)
        .unwrap_or_else(|| {
            let titles: Vec<&str> = page.sections.iter().map(|s| s.title.as_str()).collect();
            panic!(
                "section '{title}' not found on page '{}'. Available: {titles:?}",
                page.slug
            )
        })
}

/// Find a blog post by slug. Panics if not found.
pub fn find_post<'a>(manifest: &'a Manifest, slug: &str) -> &'a BlogPost {
    manifest
        .posts
        .iter()
        .find(|p| p.slug == slug)
        .unwrap_or_else(|| {
            let slugs: Vec<&str> = manifest.posts.iter().map(|p| p.slug.as_str()).collect();
            panic!("post '{slug}' not found. Available: {slugs:?}")
        })
}

/// Read an emitted file relative to the output dir. Panics if missing.
pub fn read_output(output: &Path, rel: &str) -> String {
    fs::read_to_string(output.join(rel))
        .unwrap_or_else(|e| panic!("expected output file '{rel}': {e}"))
}

// =========================================================================
// Builders
// =========================================================================

pub fn section(kind: SectionKind, title: &str) -> Section {
    Section {
        kind,
        order: 0,
        title: title.to_string(),
        section_id: String::new(),
        source: None,
        body: String::new(),
        cta_text: String::new(),
        cta_url: String::new(),
        hero_image: String::new(),
        width: "full".to_string(),
        style_variant: "glass".to_string(),
    }
}

pub fn page(slug: &str, sections: Vec<Section>) -> Page {
    Page {
        slug: slug.to_string(),
        title: title_from_slug(slug),
        order: 0,
        sections,
    }
}

pub fn post(slug: &str, date: &str, body: &str) -> BlogPost {
    BlogPost {
        slug: slug.to_string(),
        title: title_from_slug(slug),
        date: date.to_string(),
        body: body.to_string(),
    }
}

pub fn digest(slug: &str) -> DigestIssue {
    DigestIssue {
        slug: slug.to_string(),
        title: format!("Digest {slug}"),
        date: "2024-05-01".to_string(),
        source: PathBuf::from(format!("digests/{slug}.md")),
        body: format!("Issue {slug} body."),
    }
}

/// A manifest with stock config and no collections.
pub fn manifest(pages: Vec<Page>) -> Manifest {
    Manifest {
        root: PathBuf::new(),
        config: SiteConfig::default(),
        pages: SitePages::new(pages.into_iter().map(|p| (p.slug.clone(), p)).collect()),
        links: Vec::new(),
        posts: Vec::new(),
        digests: Vec::new(),
    }
}
