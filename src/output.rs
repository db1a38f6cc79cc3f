//! CLI output formatting for every command.
//!
//! Output is an inventory of content, not a log of file operations. Each
//! entity leads with its positional index and title; file paths follow as
//! indented `Source:` or `→` context.
//!
//! # Check
//!
//! ```text
//! Pages
//! 001 Home (2 sections)
//!     001 hero Welcome
//!         Source: blocks/welcome.md
//!     002 section Research
//!         Source: blocks/research.md
//! 002 About (1 section)
//!     001 section Team
//!
//! Posts
//! 001 2024-03-01 First Light
//!
//! Digests
//! 001 2024-05-01 May Issue
//!
//! Links
//!     GitHub → https://github.com/example
//!     Mastodon (placeholder)
//!
//! Config
//!     site.json
//!     layout: standard
//! ```
//!
//! # Build
//!
//! ```text
//! 001 Home → index.html
//! 002 About → about/index.html
//!
//! Posts
//! 001 First Light → blog/first-light/index.html
//!
//! Generated 2 pages, 1 post, 0 digest issues, 9 assets
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function returning `Vec<String>` and a
//! `print_*` wrapper that writes to stdout. Format functions do no I/O.

use crate::config::SITE_CONFIG_FILE;
use crate::generate::{DocumentKind, Emitted, GenerateReport};
use crate::scan::Manifest;
use crate::types::LinkKind;
use crate::verify::{ProblemKind, VerifyReport};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Path shown for a block source: relative to the content root when inside it.
fn display_source(root: &Path, source: &Path) -> String {
    source
        .strip_prefix(root)
        .unwrap_or(source)
        .to_string_lossy()
        .replace('\\', "/")
}

// ============================================================================
// check
// ============================================================================

/// Content dashboard: pages with their sections and block sources, then
/// posts, digest issues, links and config.
pub fn format_dashboard(manifest: &Manifest) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    for (i, page) in manifest.pages.ordered().into_iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            page.title,
            plural(page.sections.len(), "section", "sections")
        ));
        for (j, section) in page.sections.iter().enumerate() {
            let label = if section.title.is_empty() {
                String::new()
            } else {
                format!(" {}", section.title)
            };
            lines.push(format!(
                "{}{} {}{}",
                indent(1),
                format_index(j + 1),
                section.kind.as_str(),
                label
            ));
            if let Some(source) = &section.source {
                lines.push(format!(
                    "{}Source: {}",
                    indent(2),
                    display_source(&manifest.root, source)
                ));
            }
        }
    }

    if !manifest.posts.is_empty() {
        lines.push(String::new());
        lines.push("Posts".to_string());
        for (i, post) in manifest.posts.iter().enumerate() {
            lines.push(format!("{} {} {}", format_index(i + 1), post.date, post.title));
        }
    }

    if !manifest.digests.is_empty() {
        lines.push(String::new());
        lines.push("Digests".to_string());
        for (i, digest) in manifest.digests.iter().enumerate() {
            lines.push(format!("{} {} {}", format_index(i + 1), digest.date, digest.title));
            lines.push(format!(
                "{}Source: {}",
                indent(1),
                display_source(&manifest.root, &digest.source)
            ));
        }
    }

    if !manifest.links.is_empty() {
        lines.push(String::new());
        lines.push("Links".to_string());
        for link in &manifest.links {
            match link.kind {
                LinkKind::Normal => lines.push(format!("{}{} → {}", indent(1), link.label, link.url)),
                LinkKind::Placeholder => lines.push(format!("{}{} (placeholder)", indent(1), link.label)),
            }
        }
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    if manifest.root.join(SITE_CONFIG_FILE).is_file() {
        lines.push(format!("{}{}", indent(1), SITE_CONFIG_FILE));
    } else {
        lines.push(format!("{}(defaults)", indent(1)));
    }
    lines.push(format!("{}layout: {}", indent(1), manifest.config.layout_variant.as_str()));
    lines
}

pub fn print_dashboard(manifest: &Manifest) {
    for line in format_dashboard(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// build
// ============================================================================

fn emitted_lines(lines: &mut Vec<String>, heading: Option<&str>, docs: &[&Emitted]) {
    if docs.is_empty() {
        return;
    }
    if let Some(heading) = heading {
        lines.push(String::new());
        lines.push(heading.to_string());
    }
    for (i, doc) in docs.iter().enumerate() {
        lines.push(format!("{} {} → {}", format_index(i + 1), doc.title, doc.path));
    }
}

/// Generated inventory: documents grouped by kind, then a summary line.
pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    let of_kind = |kind: DocumentKind| -> Vec<&Emitted> {
        report.documents.iter().filter(|d| d.kind == kind).collect()
    };
    let mut lines = Vec::new();
    emitted_lines(&mut lines, None, &of_kind(DocumentKind::Page));
    emitted_lines(&mut lines, Some("Posts"), &of_kind(DocumentKind::Post));
    emitted_lines(&mut lines, Some("Digests"), &of_kind(DocumentKind::Digest));

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}, {}, {}",
        plural(report.count(DocumentKind::Page), "page", "pages"),
        plural(report.count(DocumentKind::Post), "post", "posts"),
        plural(report.count(DocumentKind::Digest), "digest issue", "digest issues"),
        plural(report.generated.len() + report.copied, "asset", "assets"),
    ));
    lines
}

pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// verify
// ============================================================================

pub fn format_verify_output(report: &VerifyReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Checked {}, {}",
        plural(report.documents, "document", "documents"),
        plural(report.links, "link", "links")
    )];
    for problem in &report.problems {
        match &problem.kind {
            ProblemKind::Broken => {
                lines.push(format!("{}Broken {}: {}", indent(1), problem.document, problem.url));
            }
            ProblemKind::Forbidden(target) => lines.push(format!(
                "{}Forbidden {}: {} (matches {})",
                indent(1),
                problem.document,
                problem.url,
                target
            )),
        }
    }
    if report.is_clean() {
        lines.push("No broken or forbidden links".to_string());
    } else {
        lines.push(format!("Found {}", plural(report.problems.len(), "problem", "problems")));
    }
    lines
}

pub fn print_verify_output(report: &VerifyReport) {
    for line in format_verify_output(report) {
        println!("{}", line);
    }
}
