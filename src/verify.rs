//! Link verification over a generated site.
//!
//! Every `.html` file under the output directory is scanned for `href` and
//! `src` attribute values. Two kinds of problem are reported:
//!
//! - **Broken**: a relative or root-relative link that does not resolve to a
//!   file in the output tree. Directory links (`about/`, `../`) resolve to
//!   their `index.html`.
//! - **Forbidden**: a link containing one of the configured forbidden target
//!   substrings (case-insensitive), internal or not.
//!
//! External schemes, `mailto:`, `tel:`, `data:` and pure `#anchor` links are
//! never checked for existence.

use crate::blocks::lexical_normalize;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

static LINK_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:href|src)=["']([^"']+)["']"#).expect("link pattern is valid")
});

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").expect("scheme pattern is valid"));

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Output directory not found: {0}")]
    MissingOutput(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProblemKind {
    Broken,
    Forbidden(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    /// Output-relative path of the document containing the link.
    pub document: String,
    pub url: String,
    pub kind: ProblemKind,
}

#[derive(Debug, Default, Serialize)]
pub struct VerifyReport {
    pub documents: usize,
    pub links: usize,
    pub problems: Vec<Problem>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Every `href`/`src` value in `html`, in document order.
pub fn extract_links(html: &str) -> Vec<String> {
    LINK_ATTR
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape(m.as_str().trim()))
        .collect()
}

fn unescape(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn is_external(url: &str) -> bool {
    url.is_empty() || url.starts_with('#') || url.starts_with("//") || SCHEME.is_match(url)
}

fn forbidden_match<'f>(url: &str, forbidden: &'f [String]) -> Option<&'f str> {
    let lowered = url.to_lowercase();
    forbidden
        .iter()
        .map(|f| f.trim())
        .find(|f| !f.is_empty() && lowered.contains(&f.to_lowercase()))
}

/// Output-relative file an internal link points at, or `None` when the link
/// climbs above the output root.
fn link_target(document: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['#', '?']).next().unwrap_or("");
    let joined = if let Some(rooted) = path.strip_prefix('/') {
        PathBuf::from(rooted)
    } else {
        document.parent().unwrap_or(Path::new("")).join(path)
    };
    let mut target = lexical_normalize(&joined)?;
    if path.is_empty() || path.ends_with('/') {
        target.push("index.html");
    }
    Some(target)
}

fn resolves(output: &Path, target: &Path) -> bool {
    let full = output.join(target);
    if full.is_dir() {
        full.join("index.html").is_file()
    } else {
        full.is_file()
    }
}

/// Check every emitted document under `output` for broken and forbidden links.
pub fn verify(output: &Path, forbidden: &[String]) -> Result<VerifyReport, VerifyError> {
    if !output.is_dir() {
        return Err(VerifyError::MissingOutput(output.to_path_buf()));
    }
    let mut report = VerifyReport::default();

    for entry in WalkDir::new(output).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.path().extension().is_none_or(|e| e != "html") {
            continue;
        }
        let Ok(document) = entry.path().strip_prefix(output) else {
            continue;
        };
        let text = String::from_utf8_lossy(&fs::read(entry.path())?).into_owned();
        let name = document.to_string_lossy().replace('\\', "/");
        report.documents += 1;

        for url in extract_links(&text) {
            report.links += 1;
            if let Some(hit) = forbidden_match(&url, forbidden) {
                report.problems.push(Problem {
                    document: name.clone(),
                    url: url.clone(),
                    kind: ProblemKind::Forbidden(hit.to_string()),
                });
                continue;
            }
            if is_external(&url) {
                continue;
            }
            let ok = link_target(document, &url).is_some_and(|target| resolves(output, &target));
            if !ok {
                report.problems.push(Problem {
                    document: name.clone(),
                    url,
                    kind: ProblemKind::Broken,
                });
            }
        }
    }

    debug!(
        documents = report.documents,
        links = report.links,
        problems = report.problems.len(),
        "verified links"
    );
    Ok(report)
}
