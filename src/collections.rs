//! Blog and digest collection loading.
//!
//! ## Blog
//!
//! Posts come from two places under `blog/`:
//!
//! 1. `posts.csv` rows (`source_md`, `title`, `date`, `slug`). The source file
//!    is parsed like any post file; non-empty table cells override whatever the
//!    file declares. Rows whose file is missing are skipped with a warning;
//!    a source outside the content root aborts the scan.
//! 2. Legacy `*.txt` files, visited in file-name order.
//!
//! Slugs are unique: the first post to claim a slug wins, so table entries
//! shadow legacy files. Every slug must pass
//! [`is_safe_slug`](crate::naming::is_safe_slug). The final list is sorted
//! newest first by comparing the raw date strings, which keeps ISO dates
//! chronological.
//!
//! ## Post files
//!
//! ```text
//! ---                       Title: First light
//! title: "First light"      Date: 2024-03-01
//! date: 2024-03-01          Body:
//! slug: first-light         The body starts after the first blank line
//! ---                       or the Body: marker.
//! Body text.
//! ```
//!
//! A missing title falls back to the file stem, a missing date to the file's
//! modification date, and the slug to the slugified file stem.
//!
//! ## Digests
//!
//! `digests/index.json` holds either a bare array or `{"digests": [...]}` of
//! `{date, title, slug, source_md}` objects. Entries missing any of the four
//! are dropped silently, as are later entries repeating an earlier slug; the
//! rest keep index order and have their block read immediately.

use crate::blocks::{BlockError, BlockResolver};
use crate::naming::{is_safe_slug, slugify};
use crate::types::{BlogPost, DigestIssue};
use chrono::{DateTime, Local};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

pub const POSTS_TABLE: &str = "posts.csv";
pub const DIGEST_INDEX: &str = "index.json";

static FRONT_MATTER_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^---[ \t\r]*$").expect("fence pattern is valid"));

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Unsafe slug '{slug}' in {path}")]
    InvalidSlug { path: PathBuf, slug: String },
    #[error(transparent)]
    Block(#[from] BlockError),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CollectionError + '_ {
    move |source| CollectionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// =============================================================================
// Post files
// =============================================================================

/// Parse a single post file (front-matter or legacy header format).
pub fn parse_post_file(path: &Path) -> Result<BlogPost, CollectionError> {
    let raw = fs::read_to_string(path).map_err(io_error(path))?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut fields = if raw.starts_with("---") {
        parse_front_matter(&raw).unwrap_or_else(|| parse_legacy(&raw))
    } else {
        parse_legacy(&raw)
    };

    if fields.title.is_empty() {
        fields.title = stem.clone();
    }
    if fields.date.is_empty() {
        fields.date = modification_date(path)?;
    }
    if fields.slug.is_empty() {
        fields.slug = slugify(&stem);
    }

    Ok(BlogPost {
        slug: fields.slug,
        title: fields.title,
        date: fields.date,
        body: fields.body,
    })
}

#[derive(Debug, Default)]
struct PostFields {
    title: String,
    date: String,
    slug: String,
    body: String,
}

/// Front-matter format. `None` when the closing fence is missing.
fn parse_front_matter(raw: &str) -> Option<PostFields> {
    let parts: Vec<&str> = FRONT_MATTER_FENCE.splitn(raw, 3).collect();
    if parts.len() < 3 {
        return None;
    }
    let mut fields = PostFields {
        body: parts[2].trim().to_string(),
        ..Default::default()
    };
    for line in parts[1].lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches('"').to_string();
        match key.trim().to_lowercase().as_str() {
            "title" => fields.title = value,
            "date" => fields.date = value,
            "slug" => fields.slug = value,
            _ => {}
        }
    }
    Some(fields)
}

fn parse_legacy(raw: &str) -> PostFields {
    let mut fields = PostFields::default();
    let mut body_lines: Vec<&str> = Vec::new();
    let mut in_body = false;
    for line in raw.lines() {
        if in_body {
            body_lines.push(line);
            continue;
        }
        if line.trim().is_empty() {
            in_body = true;
        } else if let Some(value) = line.strip_prefix("Title:") {
            fields.title = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("Date:") {
            fields.date = value.trim().to_string();
        } else if line.starts_with("Body:") {
            in_body = true;
        }
    }
    fields.body = body_lines.join("\n").trim().to_string();
    fields
}

fn modification_date(path: &Path) -> Result<String, CollectionError> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(io_error(path))?;
    let local: DateTime<Local> = modified.into();
    Ok(local.format("%Y-%m-%d").to_string())
}

fn checked_slug(slug: &str, path: &Path) -> Result<(), CollectionError> {
    if slug.is_empty() || !is_safe_slug(slug) {
        return Err(CollectionError::InvalidSlug {
            path: path.to_path_buf(),
            slug: slug.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Blog merge
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PostRow {
    source_md: String,
    title: String,
    date: String,
    slug: String,
}

/// Load, merge, de-duplicate and sort all blog posts under `blog_dir`.
///
/// Post files are checked against the content root of `blocks`.
pub fn load_blog_posts(
    blog_dir: &Path,
    blocks: &BlockResolver,
) -> Result<Vec<BlogPost>, CollectionError> {
    if !blog_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut posts = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for post in table_posts(blog_dir, blocks)?
        .into_iter()
        .chain(legacy_posts(blog_dir, blocks)?)
    {
        if seen.insert(post.slug.clone()) {
            posts.push(post);
        } else {
            debug!(slug = %post.slug, "dropping duplicate post");
        }
    }

    posts.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(posts)
}

fn table_posts(blog_dir: &Path, blocks: &BlockResolver) -> Result<Vec<BlogPost>, CollectionError> {
    let table = blog_dir.join(POSTS_TABLE);
    if !table.is_file() {
        return Ok(Vec::new());
    }
    let csv_error = |source: csv::Error| CollectionError::Csv {
        path: table.clone(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(&table)
        .map_err(csv_error)?;

    let mut posts = Vec::new();
    for row in reader.deserialize::<PostRow>() {
        let row = row.map_err(csv_error)?;
        if row.source_md.is_empty() {
            continue;
        }
        let source = match blocks.contain(&blog_dir.join(&row.source_md), &row.source_md) {
            Ok(source) if source.is_file() => source,
            Ok(source) | Err(BlockError::Missing { path: source, .. }) => {
                warn!(path = %source.display(), "blog post file not found, skipping");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        let mut post = parse_post_file(&source)?;
        if !row.title.is_empty() {
            post.title = row.title;
        }
        if !row.date.is_empty() {
            post.date = row.date;
        }
        if !row.slug.is_empty() {
            post.slug = row.slug;
        }
        checked_slug(&post.slug, &table)?;
        posts.push(post);
    }
    Ok(posts)
}

fn legacy_posts(blog_dir: &Path, blocks: &BlockResolver) -> Result<Vec<BlogPost>, CollectionError> {
    let mut files: Vec<PathBuf> = fs::read_dir(blog_dir)
        .map_err(io_error(blog_dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    files
        .iter()
        .map(|path| -> Result<BlogPost, CollectionError> {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            blocks.contain(path, &name)?;
            let post = parse_post_file(path)?;
            checked_slug(&post.slug, path)?;
            Ok(post)
        })
        .collect()
}

// =============================================================================
// Digests
// =============================================================================

/// Load the digest index from `digests_dir`, reading each issue's block.
pub fn load_digests(
    digests_dir: &Path,
    blocks: &BlockResolver,
) -> Result<Vec<DigestIssue>, CollectionError> {
    let index = digests_dir.join(DIGEST_INDEX);
    if !index.is_file() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(&index).map_err(io_error(&index))?;
    let raw: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| CollectionError::Json {
            path: index.clone(),
            source,
        })?;

    let entries: &[serde_json::Value] = match &raw {
        serde_json::Value::Array(items) => items.as_slice(),
        serde_json::Value::Object(map) => match map.get("digests") {
            Some(serde_json::Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => {
            warn!(path = %index.display(), "digest index is neither an array nor an object");
            &[]
        }
    };

    let mut digests = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for entry in entries {
        let Some(fields) = entry.as_object() else {
            continue;
        };
        let field = |name: &str| match fields.get(name) {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let (date, title, slug, source_md) =
            (field("date"), field("title"), field("slug"), field("source_md"));
        if date.is_empty() || title.is_empty() || slug.is_empty() || source_md.is_empty() {
            debug!(?entry, "dropping incomplete digest entry");
            continue;
        }
        checked_slug(&slug, &index)?;
        if !seen.insert(slug.clone()) {
            debug!(slug = %slug, "dropping duplicate digest entry");
            continue;
        }
        let (source, body) = blocks.read(&source_md)?;
        digests.push(DigestIssue {
            slug,
            title,
            date,
            source: source.unwrap_or_default(),
            body,
        });
    }
    Ok(digests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    // =========================================================================
    // parse_post_file
    // =========================================================================

    #[test]
    fn front_matter_post() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "first.md",
            "---\ntitle: \"First light\"\ndate: 2024-03-01\nslug: first-light\n---\n\nHello.\n\nSecond paragraph.\n",
        );
        let post = parse_post_file(&path).unwrap();
        assert_eq!(post.title, "First light");
        assert_eq!(post.date, "2024-03-01");
        assert_eq!(post.slug, "first-light");
        assert_eq!(post.body, "Hello.\n\nSecond paragraph.");
    }

    #[test]
    fn front_matter_defaults_slug_from_stem() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "Spring Update.md",
            "---\ntitle: Spring\ndate: 2024-04-01\n---\nBody",
        );
        let post = parse_post_file(&path).unwrap();
        assert_eq!(post.slug, "spring-update");
    }

    #[test]
    fn legacy_post_with_headers() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "old-news.txt",
            "Title: Old news\nDate: 2023-01-05\n\nThe body.\nMore body.\n",
        );
        let post = parse_post_file(&path).unwrap();
        assert_eq!(post.title, "Old news");
        assert_eq!(post.date, "2023-01-05");
        assert_eq!(post.slug, "old-news");
        assert_eq!(post.body, "The body.\nMore body.");
    }

    #[test]
    fn legacy_body_marker_starts_body() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "marked.txt",
            "Title: Marked\nDate: 2023-02-02\nBody:\nText right after the marker.\n",
        );
        let post = parse_post_file(&path).unwrap();
        assert_eq!(post.body, "Text right after the marker.");
    }

    #[test]
    fn missing_title_and_date_fall_back() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "untitled.txt", "\nJust a body.\n");
        let post = parse_post_file(&path).unwrap();
        assert_eq!(post.title, "untitled");
        assert_eq!(post.date.len(), 10, "expected YYYY-MM-DD, got {}", post.date);
        assert_eq!(post.body, "Just a body.");
    }

    #[test]
    fn unterminated_front_matter_is_read_as_legacy() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "odd.txt", "---\nTitle: Odd\n\nBody here\n");
        let post = parse_post_file(&path).unwrap();
        assert_eq!(post.title, "Odd");
        assert_eq!(post.body, "Body here");
    }

    // =========================================================================
    // load_blog_posts
    // =========================================================================

    /// Load posts from `blog`, treating it as the content root as well.
    fn load(blog: &Path) -> Result<Vec<BlogPost>, CollectionError> {
        let resolver = BlockResolver::new(blog).unwrap();
        load_blog_posts(resolver.root(), &resolver)
    }

    #[test]
    fn missing_blog_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let resolver = BlockResolver::new(tmp.path()).unwrap();
        assert!(load_blog_posts(&tmp.path().join("blog"), &resolver).unwrap().is_empty());
    }

    #[test]
    fn table_entry_wins_over_legacy_duplicate() {
        let tmp = TempDir::new().unwrap();
        let blog = tmp.path();
        write(blog, "posts/launch.md", "---\ntitle: From file\ndate: 2024-01-01\n---\nTable body");
        write(
            blog,
            POSTS_TABLE,
            "source_md,title,date,slug\nposts/launch.md,Launch,2024-02-01,launch\n",
        );
        write(blog, "launch.txt", "Title: Legacy launch\nDate: 2020-01-01\n\nLegacy body");

        let posts = load(blog).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Launch");
        assert_eq!(posts[0].date, "2024-02-01");
        assert_eq!(posts[0].body, "Table body");
    }

    #[test]
    fn empty_table_cells_keep_file_values() {
        let tmp = TempDir::new().unwrap();
        let blog = tmp.path();
        write(blog, "a.md", "---\ntitle: File title\ndate: 2024-05-05\nslug: a-post\n---\nx");
        write(blog, POSTS_TABLE, "source_md,title,date,slug\na.md,,,\n");

        let posts = load(blog).unwrap();
        assert_eq!(posts[0].title, "File title");
        assert_eq!(posts[0].slug, "a-post");
    }

    #[test]
    fn missing_table_source_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let blog = tmp.path();
        write(blog, POSTS_TABLE, "source_md,title\nnowhere.md,Ghost\n,No source\n");
        assert!(load(blog).unwrap().is_empty());
    }

    #[test]
    fn table_source_outside_content_root_is_fatal() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("content");
        write(outer.path(), "secret.txt", "Title: Leak\nDate: 2024-01-01\n\nTOP SECRET");
        write(&root, "blog/posts.csv", "source_md,title,date,slug\n../../secret.txt,,,leak\n");

        let resolver = BlockResolver::new(&root).unwrap();
        let result = load_blog_posts(&resolver.root().join("blog"), &resolver);
        assert!(matches!(
            result,
            Err(CollectionError::Block(BlockError::OutsideRoot { .. }))
        ));
    }

    #[test]
    fn unsafe_table_slug_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let blog = tmp.path();
        write(blog, "a.md", "---\ntitle: A\ndate: 2024-01-01\n---\nx");
        write(blog, POSTS_TABLE, "source_md,title,date,slug\na.md,,,../../pwned\n");
        match load(blog) {
            Err(CollectionError::InvalidSlug { slug, .. }) => assert_eq!(slug, "../../pwned"),
            other => panic!("expected InvalidSlug, got {other:?}"),
        }
    }

    #[test]
    fn unsafe_front_matter_slug_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "odd.txt", "---\ntitle: Odd\nslug: a/../..\n---\nBody");
        assert!(matches!(load(tmp.path()), Err(CollectionError::InvalidSlug { .. })));
    }

    #[test]
    fn posts_sorted_newest_first_and_stable() {
        let tmp = TempDir::new().unwrap();
        let blog = tmp.path();
        write(blog, "a.txt", "Title: A\nDate: 2024-01-01\n\na");
        write(blog, "b.txt", "Title: B\nDate: 2024-06-01\n\nb");
        write(blog, "c.txt", "Title: C\nDate: 2024-01-01\n\nc");

        let titles: Vec<String> = load(blog)
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["B", "A", "C"]);
    }

    // =========================================================================
    // load_digests
    // =========================================================================

    fn digest_root() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "digests/2024-05.md", "May issue body");
        tmp
    }

    #[test]
    fn digests_from_object_index() {
        let tmp = digest_root();
        write(
            tmp.path(),
            "digests/index.json",
            r#"{"digests": [
                {"date": "2024-05-01", "title": "May", "slug": "2024-05", "source_md": "digests/2024-05.md"},
                {"date": "2024-04-01", "title": "April"},
                "not an object"
            ]}"#,
        );
        let resolver = BlockResolver::new(tmp.path()).unwrap();
        let digests = load_digests(&tmp.path().join("digests"), &resolver).unwrap();
        assert_eq!(digests.len(), 1);
        assert_eq!(digests[0].slug, "2024-05");
        assert_eq!(digests[0].body, "May issue body");
    }

    #[test]
    fn digests_from_bare_array() {
        let tmp = digest_root();
        write(
            tmp.path(),
            "digests/index.json",
            r#"[{"date": "2024-05-01", "title": "May", "slug": "may", "source_md": "digests/2024-05.md"}]"#,
        );
        let resolver = BlockResolver::new(tmp.path()).unwrap();
        let digests = load_digests(&tmp.path().join("digests"), &resolver).unwrap();
        assert_eq!(digests[0].slug, "may");
    }

    #[test]
    fn digest_with_blank_title_is_dropped() {
        let tmp = digest_root();
        write(
            tmp.path(),
            "digests/index.json",
            r#"[{"date": "2024-05-01", "title": "  ", "slug": "may", "source_md": "digests/2024-05.md"}]"#,
        );
        let resolver = BlockResolver::new(tmp.path()).unwrap();
        assert!(
            load_digests(&tmp.path().join("digests"), &resolver)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn repeated_digest_slug_keeps_first_entry() {
        let tmp = digest_root();
        write(tmp.path(), "digests/2024-06.md", "June issue body");
        write(
            tmp.path(),
            "digests/index.json",
            r#"[
                {"date": "2024-05-01", "title": "May", "slug": "x", "source_md": "digests/2024-05.md"},
                {"date": "2024-06-01", "title": "June", "slug": "x", "source_md": "digests/2024-06.md"}
            ]"#,
        );
        let resolver = BlockResolver::new(tmp.path()).unwrap();
        let digests = load_digests(&tmp.path().join("digests"), &resolver).unwrap();
        assert_eq!(digests.len(), 1);
        assert_eq!(digests[0].title, "May");
    }

    #[test]
    fn unsafe_digest_slug_is_fatal() {
        let tmp = digest_root();
        write(
            tmp.path(),
            "digests/index.json",
            r#"[{"date": "2024-05-01", "title": "May", "slug": "../../x", "source_md": "digests/2024-05.md"}]"#,
        );
        let resolver = BlockResolver::new(tmp.path()).unwrap();
        let result = load_digests(&tmp.path().join("digests"), &resolver);
        assert!(matches!(result, Err(CollectionError::InvalidSlug { .. })));
    }

    #[test]
    fn digest_missing_block_is_fatal() {
        let tmp = digest_root();
        write(
            tmp.path(),
            "digests/index.json",
            r#"[{"date": "2024-06-01", "title": "June", "slug": "june", "source_md": "digests/absent.md"}]"#,
        );
        let resolver = BlockResolver::new(tmp.path()).unwrap();
        let result = load_digests(&tmp.path().join("digests"), &resolver);
        assert!(matches!(
            result,
            Err(CollectionError::Block(BlockError::Missing { .. }))
        ));
    }

    #[test]
    fn missing_digest_index_is_empty() {
        let tmp = TempDir::new().unwrap();
        let resolver = BlockResolver::new(tmp.path()).unwrap();
        assert!(
            load_digests(&tmp.path().join("digests"), &resolver)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn malformed_digest_index_is_an_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "digests/index.json", "{ nope");
        let resolver = BlockResolver::new(tmp.path()).unwrap();
        let result = load_digests(&tmp.path().join("digests"), &resolver);
        assert!(matches!(result, Err(CollectionError::Json { .. })));
    }
}
