//! Centralized slug handling.
//!
//! Every addressable entity (pages, blog posts, digest issues) is identified by
//! a slug. Pages come from the `page_slug` column of the control table and are
//! normalized so that the several spellings people use for the home page all
//! land on the same record; posts derive their slug from the file stem when the
//! table does not declare one.
//!
//! ## Normalization
//!
//! - `""`, `"/"`, `"index"`, `"home"` → `""` (the site root)
//! - `"/about/"` → `"about"` (outer slashes stripped)
//! - `"team/alumni"` → `"team/alumni"` (inner separators preserved)
//!
//! ## Safe Slugs
//!
//! Slugs become output directories, so every slug that reaches generation
//! must pass [`is_safe_slug`]: `/`-separated segments made of ASCII letters,
//! digits, `-`, `_` and `.`, none of them empty, `.` or `..`.
//!
//! ## Display Titles
//!
//! Pages without an explicit `page`/`meta` row get a title derived from their
//! slug by capitalizing each alphabetic run: `about-us` → "About-Us". The root
//! page is titled "Home".

/// Normalize a raw page slug from the control table.
pub fn normalize_slug(raw: &str) -> String {
    let slug = raw.trim();
    match slug {
        "" | "/" | "index" | "home" => String::new(),
        _ => slug.trim_matches('/').to_string(),
    }
}

/// Whether `slug` can name an output directory without leaving the output
/// root. The empty root slug is accepted.
pub fn is_safe_slug(slug: &str) -> bool {
    slug.is_empty()
        || slug.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        })
}

/// Turn free text (usually a file stem) into a URL-safe slug.
///
/// Characters other than ASCII alphanumerics, whitespace and dashes are
/// dropped, whitespace runs become a single dash, and the result is
/// lowercased. Empty results fall back to `"post"`.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    let slug = kept
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    if slug.is_empty() {
        "post".to_string()
    } else {
        slug
    }
}

/// Default display title for a page slug.
pub fn title_from_slug(slug: &str) -> String {
    if slug.is_empty() {
        return "Home".to_string();
    }
    let mut title = String::with_capacity(slug.len());
    let mut at_word_start = true;
    for c in slug.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                title.extend(c.to_uppercase());
            } else {
                title.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            title.push(c);
            at_word_start = true;
        }
    }
    title
}
