//! Relative link resolution between output documents.
//!
//! Every emitted document lives at `index.html` or `<dir>/index.html`, at any
//! depth (`research/index.html`, `blog/first-light/index.html`, ...). Links are
//! always written relative to the linking document's directory, so the
//! generated tree can be served from any base path or dropped into a
//! subdirectory without regeneration.
//!
//! Because each document sits at a different depth, a link cannot be computed
//! once and shared: [`relative_link`] takes the current document's own path on
//! every call. It is pure string/path arithmetic with no filesystem access.
//!
//! ```text
//! from                         target                  result
//! index.html                   Dir("research")         research/
//! research/index.html          Dir("")                 ../
//! research/index.html          Dir("research")         ./
//! blog/first-light/index.html  File("assets/js/main.js") ../../assets/js/main.js
//! ```

use std::path::{Component, Path};

/// A link target inside the output tree, given relative to the site root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// A directory served through its `index.html` (pages, collection items).
    /// Rendered with exactly one trailing `/`.
    Dir(&'a str),
    /// A concrete file (stylesheets, scripts, images, endpoints).
    /// Rendered without a trailing `/`.
    File(&'a str),
}

/// Split a site-relative path into its non-empty, non-`.` components.
fn components(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect()
}

/// Directory components of the document at `document_path`.
fn document_dir(document_path: &str) -> Vec<&str> {
    let mut parts = components(document_path);
    parts.pop();
    parts
}

/// Relative path between two component lists, `"."` when identical.
fn relative_components(from_dir: &[&str], to: &[&str]) -> String {
    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<&str> = Vec::with_capacity(from_dir.len() - common + to.len() - common);
    parts.extend(std::iter::repeat_n("..", from_dir.len() - common));
    parts.extend(&to[common..]);
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Compute the link from `from_document` to `target`.
pub fn relative_link(from_document: &str, target: Target<'_>) -> String {
    let from_dir = document_dir(from_document);
    match target {
        Target::File(path) => relative_components(&from_dir, &components(path)),
        Target::Dir(path) => {
            let rel = relative_components(&from_dir, &components(path));
            if rel == "." {
                "./".to_string()
            } else {
                format!("{}/", rel.trim_end_matches('/'))
            }
        }
    }
}

/// Link from `from_document` to the page with the given (normalized) slug.
pub fn page_link(from_document: &str, slug: &str) -> String {
    relative_link(from_document, Target::Dir(slug))
}

/// Output path of a page document.
pub fn page_output_path(slug: &str) -> String {
    if slug.is_empty() {
        "index.html".to_string()
    } else {
        format!("{slug}/index.html")
    }
}

/// Site-relative directory of a blog post.
pub fn post_dir(slug: &str) -> String {
    format!("blog/{slug}")
}

/// Output path of a blog post document.
pub fn post_output_path(slug: &str) -> String {
    format!("{}/index.html", post_dir(slug))
}

/// Site-relative directory of a digest issue.
pub fn digest_dir(slug: &str) -> String {
    format!("digest/{slug}")
}

/// Output path of a digest issue document.
pub fn digest_output_path(slug: &str) -> String {
    format!("{}/index.html", digest_dir(slug))
}

/// Whether an output-relative path stays inside the output root: relative,
/// non-empty, and made only of plain components.
pub fn is_contained(rel: &str) -> bool {
    let path = Path::new(rel);
    !rel.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)))
}
