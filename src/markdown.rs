//! Text formatting for content blocks and post bodies.
//!
//! Content blocks are markdown, rendered with `pulldown-cmark` under three
//! adjustments:
//!
//! - raw HTML is shown as escaped text, never passed through;
//! - headings are demoted one level (`#` → `<h2>`, `######` stays `<h6>`),
//!   since every page already owns its `<h1>`;
//! - `javascript:`/`vbscript:` link and image targets are replaced with `#`.
//!
//! Blog bodies use the simpler paragraph formatter: blank-line separated
//! chunks, each escaped into its own `<p>`.

use maud::{Markup, html};
use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html as md_html};
use regex::Regex;
use std::sync::LazyLock;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph pattern is valid"));

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
}

/// Render a markdown block to an HTML fragment.
pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, options()).map(sanitize);
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

fn sanitize(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Heading {
            level,
            id,
            classes,
            attrs,
        }) => Event::Start(Tag::Heading {
            level: demote(level),
            id,
            classes,
            attrs,
        }),
        Event::End(TagEnd::Heading(level)) => Event::End(TagEnd::Heading(demote(level))),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn demote(level: HeadingLevel) -> HeadingLevel {
    match level {
        HeadingLevel::H1 => HeadingLevel::H2,
        HeadingLevel::H2 => HeadingLevel::H3,
        HeadingLevel::H3 => HeadingLevel::H4,
        HeadingLevel::H4 => HeadingLevel::H5,
        HeadingLevel::H5 | HeadingLevel::H6 => HeadingLevel::H6,
    }
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let lower = url.trim().to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("vbscript:") {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// Split text into trimmed, non-empty blank-line separated paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(text.trim())
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

/// Render plain paragraphs, escaping everything.
pub fn render_paragraphs(text: &str) -> Markup {
    html! {
        @for paragraph in split_paragraphs(text) {
            p { (paragraph) }
        }
    }
}

/// First paragraph of `text`, or `""`.
pub fn first_paragraph(text: &str) -> &str {
    split_paragraphs(text).first().copied().unwrap_or("")
}

/// Markdown reduced to its visible text, whitespace collapsed.
///
/// Used for teasers, where markup would be out of place.
pub fn plain_text(text: &str) -> String {
    let mut out = String::new();
    for event in Parser::new_ext(text, options()) {
        match event {
            Event::Text(t) | Event::Code(t) | Event::Html(t) | Event::InlineHtml(t) => {
                out.push_str(&t)
            }
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
