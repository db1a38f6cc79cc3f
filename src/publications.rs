//! Publication lists from BibTeX.
//!
//! `tabula publications refs.bib` turns a bibliography into an ordinary
//! markdown block under `blocks/`, which a control row can then reference
//! like any hand-written block. Nothing here runs during a build.
//!
//! ## Parsing
//!
//! The reader is lenient. It looks for `@type{key,` headers and reads
//! `name = value` fields until the entry's closing brace. Values may be
//! braced (nesting allowed), double-quoted (`\"` escapes) or bare. Field
//! names are lowercased and whitespace inside values collapses to single
//! spaces; LaTeX markup is left alone. Stray characters between fields are
//! skipped and an entry cut off by the end of the file is dropped.
//!
//! ## Rendering
//!
//! ```text
//! # Publications
//!
//! ## Journal Articles
//!
//! * **Ada Lovelace, Charles Babbage** (1843). *Sketch of the Analytical Engine*. Scientific Memoirs.
//! ```
//!
//! Entries are grouped by category in [`CATEGORY_ORDER`] and listed newest
//! first; entries from the same year keep their file order. A `note` that
//! starts with "keynote" moves an entry into Keynotes whatever its type.

use crate::blocks::BLOCKS_DIR;
use crate::naming::is_safe_slug;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::info;

/// Category headings in output order.
pub const CATEGORY_ORDER: [&str; 9] = [
    "Journal Articles",
    "Conference Papers",
    "Books",
    "Book Chapters",
    "Keynotes",
    "Working Papers",
    "Technical Reports",
    "Theses",
    "Other",
];

/// Fields that can name where a work appeared, in preference order.
const SOURCE_FIELDS: [&str; 5] = ["journal", "booktitle", "publisher", "school", "institution"];

static ENTRY_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)\s*\{\s*([^,]+),").expect("entry header pattern is valid"));
static FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*=\s*").expect("field name pattern is valid"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

#[derive(Error, Debug)]
pub enum PublicationsError {
    #[error("IO error reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("IO error writing {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Block name '{0}' must be a bare file name ending in .md")]
    InvalidBlockName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    /// Lowercased entry type (`article`, `inproceedings`, ...).
    pub entry_type: String,
    pub key: String,
    pub fields: BTreeMap<String, String>,
}

impl BibEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn category(&self) -> &'static str {
        if self
            .field("note")
            .is_some_and(|note| note.to_lowercase().starts_with("keynote"))
        {
            return "Keynotes";
        }
        match self.entry_type.as_str() {
            "article" => "Journal Articles",
            "inproceedings" | "proceedings" => "Conference Papers",
            "book" => "Books",
            "incollection" => "Book Chapters",
            "phdthesis" | "mastersthesis" => "Theses",
            "techreport" => "Technical Reports",
            "unpublished" => "Working Papers",
            _ => "Other",
        }
    }

    fn year_key(&self) -> &str {
        self.field("year").unwrap_or("0000")
    }
}

// ============================================================================
// Parsing
// ============================================================================

pub fn parse_bibtex(content: &str) -> Vec<BibEntry> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while let Some(header) = ENTRY_HEADER.captures_at(content, pos) {
        let mut entry = BibEntry {
            entry_type: header[1].to_lowercase(),
            key: header[2].trim().to_string(),
            fields: BTreeMap::new(),
        };
        let mut cursor = header.get(0).map_or(content.len(), |m| m.end());

        loop {
            cursor = skip_whitespace(content, cursor);
            let rest = &content[cursor..];
            if rest.is_empty() {
                return entries;
            }
            if rest.starts_with('}') {
                entries.push(entry);
                pos = cursor + 1;
                break;
            }
            match FIELD_NAME.captures(rest) {
                Some(field) => {
                    let name = field[1].to_lowercase();
                    cursor += field.get(0).map_or(0, |m| m.end());
                    let (raw, next) = read_value(content, cursor);
                    entry.fields.insert(name, clean_value(raw));
                    cursor = skip_whitespace(content, next);
                    if content[cursor..].starts_with(',') {
                        cursor += 1;
                    }
                }
                None => cursor += rest.chars().next().map_or(1, char::len_utf8),
            }
        }
    }
    entries
}

fn skip_whitespace(content: &str, pos: usize) -> usize {
    let rest = &content[pos..];
    pos + rest.len() - rest.trim_start().len()
}

/// Read one field value starting at `start`; returns the raw value and the
/// position just past it.
fn read_value(content: &str, start: usize) -> (&str, usize) {
    let bytes = content.as_bytes();
    match bytes.get(start) {
        Some(b'{') => {
            let mut depth = 1;
            for (i, byte) in bytes.iter().enumerate().skip(start + 1) {
                match byte {
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            return (&content[start + 1..i], i + 1);
                        }
                    }
                    _ => {}
                }
            }
            (&content[start + 1..], content.len())
        }
        Some(b'"') => {
            let body = start + 1;
            let mut end = body;
            while end < bytes.len() && !(bytes[end] == b'"' && bytes[end - 1] != b'\\') {
                end += 1;
            }
            (&content[body..end], (end + 1).min(content.len()))
        }
        _ => {
            let end = content[start..]
                .find([',', '}'])
                .map_or(content.len(), |i| start + i);
            (content[start..end].trim(), end)
        }
    }
}

fn clean_value(raw: &str) -> String {
    let raw = raw.replace('\r', "");
    WHITESPACE_RUN.replace_all(raw.trim(), " ").into_owned()
}

// ============================================================================
// Rendering
// ============================================================================

/// One markdown list item: authors, year, title, then source and note when
/// present.
pub fn format_entry(entry: &BibEntry) -> String {
    let authors = entry.field("author").unwrap_or("Unknown").replace(" and ", ", ");
    let year = entry.field("year").unwrap_or("n.d.");
    let title = entry.field("title").unwrap_or("Untitled");

    let mut line = format!("* **{authors}** ({year}). *{title}*.");
    let source = SOURCE_FIELDS
        .iter()
        .filter_map(|name| entry.field(name))
        .find(|value| !value.is_empty());
    if let Some(source) = source {
        line.push_str(&format!(" {source}."));
    }
    if let Some(note) = entry.field("note").filter(|note| !note.is_empty()) {
        line.push_str(&format!(" ({note})."));
    }
    line
}

pub fn render_publications(entries: &[BibEntry]) -> String {
    let mut out = String::from("# Publications\n\n");
    for category in CATEGORY_ORDER {
        let mut group: Vec<&BibEntry> = entries.iter().filter(|e| e.category() == category).collect();
        if group.is_empty() {
            continue;
        }
        group.sort_by(|a, b| b.year_key().cmp(a.year_key()));

        out.push_str(&format!("## {category}\n\n"));
        for entry in group {
            out.push_str(&format_entry(entry));
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

// ============================================================================
// Block output
// ============================================================================

#[derive(Debug)]
pub struct PublicationsReport {
    pub block: PathBuf,
    pub entries: usize,
}

/// Render `bib` into `<content_root>/blocks/<name>`, replacing any previous
/// version of the block.
pub fn write_block(
    bib: &Path,
    content_root: &Path,
    name: &str,
) -> Result<PublicationsReport, PublicationsError> {
    let bare = !name.contains(['/', '\\']) && is_safe_slug(name);
    if !bare || name.strip_suffix(".md").is_none_or(str::is_empty) {
        return Err(PublicationsError::InvalidBlockName(name.to_string()));
    }

    let content = fs::read_to_string(bib).map_err(|source| PublicationsError::Read {
        path: bib.to_path_buf(),
        source,
    })?;
    let entries = parse_bibtex(&content);

    let dir = content_root.join(BLOCKS_DIR);
    let block = dir.join(name);
    let write_failure = |source| PublicationsError::Write {
        path: block.clone(),
        source,
    };
    fs::create_dir_all(&dir).map_err(write_failure)?;
    fs::write(&block, render_publications(&entries)).map_err(write_failure)?;

    info!(block = %block.display(), entries = entries.len(), "wrote publications block");
    Ok(PublicationsReport {
        block,
        entries: entries.len(),
    })
}
