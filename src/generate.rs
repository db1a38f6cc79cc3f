//! Site emission.
//!
//! Takes the [`Manifest`] produced by [`scan`](crate::scan) and writes the
//! complete static site. Nothing is read from the content root here except
//! the asset and media directories copied verbatim.
//!
//! ## Output Structure
//!
//! ```text
//! site/
//! ├── index.html                  # root page (layout variant applies here)
//! ├── about/index.html            # one directory per page
//! ├── blog/<slug>/index.html      # one per blog post
//! ├── digest/<slug>/index.html    # one per digest issue
//! ├── assets/
//! │   ├── css/style.css           # theme variables + base stylesheet
//! │   ├── js/main.js              # reveal, smooth scroll, form submission
//! │   └── img/                    # placeholders + content/media
//! ├── contact.php
//! ├── subscribe.php
//! └── data/.htaccess
//! ```
//!
//! The output directory is wiped before every build, so building the same
//! content twice yields identical trees. Documents are rendered and written
//! in parallel; the report lists them in a fixed order regardless.

use crate::assets;
use crate::forms;
use crate::layout::{self, NAV_SLUGS, RenderContext};
use crate::naming::normalize_slug;
use crate::paths;
use crate::scan::Manifest;
use crate::types::{BlogPost, DigestIssue, Page};
use maud::{DOCTYPE, Markup, html};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Refusing to write into {output}: it would overwrite the content root {source_root}")]
    UnsafeOutput { output: PathBuf, source_root: PathBuf },
    #[error("Two documents would be written to {0}")]
    DuplicateOutput(String),
    #[error("Document path {0} leaves the output directory")]
    EscapingPath(String),
}

/// Footer pages linked under "Legal" when they exist.
const LEGAL_SLUGS: [&str; 2] = ["privacy", "imprint"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DocumentKind {
    Page,
    Post,
    Digest,
}

/// One emitted HTML document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Emitted {
    pub kind: DocumentKind,
    pub title: String,
    /// Output-relative path, e.g. `blog/first-light/index.html`.
    pub path: String,
}

#[derive(Debug, Default, Serialize)]
pub struct GenerateReport {
    pub documents: Vec<Emitted>,
    /// Generated assets and endpoint files, output-relative.
    pub generated: Vec<String>,
    /// Files copied from `content/assets` and `content/media`.
    pub copied: usize,
}

impl GenerateReport {
    pub fn count(&self, kind: DocumentKind) -> usize {
        self.documents.iter().filter(|d| d.kind == kind).count()
    }
}

enum Source<'a> {
    Page(&'a Page),
    Post(&'a BlogPost),
    Digest(&'a DigestIssue),
}

struct Document<'a> {
    path: String,
    /// Page slug the document belongs to; drives the active nav entry.
    owner: &'a str,
    source: Source<'a>,
}

impl Document<'_> {
    fn kind(&self) -> DocumentKind {
        match self.source {
            Source::Page(_) => DocumentKind::Page,
            Source::Post(_) => DocumentKind::Post,
            Source::Digest(_) => DocumentKind::Digest,
        }
    }

    fn title(&self) -> &str {
        match self.source {
            Source::Page(page) => &page.title,
            Source::Post(post) => &post.title,
            Source::Digest(digest) => &digest.title,
        }
    }
}

/// Every document the manifest produces: pages in order, then posts, then
/// digest issues. Fails when two documents share an output path or a path
/// would leave the output directory.
fn documents(manifest: &Manifest) -> Result<Vec<Document<'_>>, GenerateError> {
    let pages = manifest.pages.ordered().into_iter().map(|page| Document {
        path: paths::page_output_path(&page.slug),
        owner: &page.slug,
        source: Source::Page(page),
    });
    let posts = manifest.posts.iter().map(|post| Document {
        path: paths::post_output_path(&post.slug),
        owner: "blog",
        source: Source::Post(post),
    });
    let digests = manifest.digests.iter().map(|digest| Document {
        path: paths::digest_output_path(&digest.slug),
        owner: "digest",
        source: Source::Digest(digest),
    });
    let documents: Vec<Document> = pages.chain(posts).chain(digests).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    for doc in &documents {
        if !paths::is_contained(&doc.path) {
            return Err(GenerateError::EscapingPath(doc.path.clone()));
        }
        if !seen.insert(&doc.path) {
            return Err(GenerateError::DuplicateOutput(doc.path.clone()));
        }
    }
    Ok(documents)
}

pub fn generate(manifest: &Manifest, output: &Path) -> Result<GenerateReport, GenerateError> {
    let documents = documents(manifest)?;
    prepare_output(&manifest.root, output)?;

    documents
        .par_iter()
        .map(|doc| write_document(manifest, output, doc))
        .collect::<Result<Vec<()>, GenerateError>>()?;

    let landing = manifest
        .page("")
        .is_some_and(|root| layout::uses_landing_assets(&manifest.config, root));
    let mut generated = assets::write_generated(output, &manifest.config, landing)?;
    let copied = assets::copy_content_assets(&manifest.root, output)?;
    generated.extend(forms::write_endpoints(output)?);

    let report = GenerateReport {
        documents: documents
            .iter()
            .map(|doc| Emitted {
                kind: doc.kind(),
                title: doc.title().to_string(),
                path: doc.path.clone(),
            })
            .collect(),
        generated,
        copied: copied.len(),
    };
    info!(
        documents = report.documents.len(),
        assets = report.generated.len() + report.copied,
        output = %output.display(),
        "site generated"
    );
    Ok(report)
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.exists() {
        path.canonicalize()
    } else {
        std::path::absolute(path)
    }
}

/// Wipe and recreate `output`, refusing when it is the content root or one
/// of its ancestors.
fn prepare_output(content_root: &Path, output: &Path) -> Result<(), GenerateError> {
    let source_root = absolute(content_root)?;
    let target = absolute(output)?;
    if source_root.starts_with(&target) {
        return Err(GenerateError::UnsafeOutput {
            output: output.to_path_buf(),
            source_root,
        });
    }
    if output.exists() {
        debug!(path = %output.display(), "clearing previous build");
        fs::remove_dir_all(output)?;
    }
    fs::create_dir_all(output)?;
    Ok(())
}

fn write_document(manifest: &Manifest, output: &Path, doc: &Document) -> Result<(), GenerateError> {
    if !paths::is_contained(&doc.path) {
        return Err(GenerateError::EscapingPath(doc.path.clone()));
    }
    let ctx = RenderContext::new(manifest, &doc.path, doc.owner);
    let (body, landing) = match doc.source {
        Source::Page(page) => (
            layout::render_page(&ctx, page),
            layout::uses_landing_assets(&manifest.config, page),
        ),
        Source::Post(post) => (layout::render_post(&ctx, post), false),
        Source::Digest(digest) => (layout::render_digest(&ctx, digest), false),
    };
    let html = assemble(&ctx, doc.title(), body, site_header(&ctx), site_footer(&ctx), landing);

    let path = output.join(&doc.path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, html.into_string())?;
    debug!(document = %doc.path, "wrote document");
    Ok(())
}

// ============================================================================
// Document shell
// ============================================================================

/// Wrap `<main>` content in the full document: head, header, footer and
/// scripts. `landing` adds the landing stylesheet and canvas script.
pub fn assemble(
    ctx: &RenderContext,
    title: &str,
    body: Markup,
    header: Markup,
    footer: Markup,
    landing: bool,
) -> Markup {
    let config = ctx.config();
    let full_title = if ctx.is_root() || title.is_empty() {
        config.site_name.clone()
    } else {
        format!("{title} | {}", config.site_name)
    };
    let mode = if config.uses_local_newsletter() { "local" } else { "provider" };
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (full_title) }
                @if !config.meta_description.is_empty() {
                    meta name="description" content=(config.meta_description);
                }
                link rel="stylesheet" href=(ctx.file_link(assets::CSS_PATH));
                @if landing {
                    link rel="stylesheet" href=(ctx.file_link(assets::LANDING_CSS_PATH));
                }
            }
            body data-newsletter-mode=(mode) data-newsletter-url=(config.newsletter_provider_url.trim()) {
                div.page-shell {
                    (header)
                    main { (body) }
                    (footer)
                }
                script src=(ctx.file_link(assets::JS_PATH)) {}
                @if landing {
                    script src=(ctx.file_link(assets::LANDING_JS_PATH)) {}
                }
            }
        }
    }
}

/// Logo, navigation over the fixed slug list, and the call-to-action button.
fn site_header(ctx: &RenderContext) -> Markup {
    let config = ctx.config();
    let target = normalize_slug(&config.nav_cta_target);
    let cta = if ctx.manifest.has_page(&target) {
        ctx.page_link(&target)
    } else {
        "#".to_string()
    };
    html! {
        header.site-header {
            a.logo href=(ctx.page_link("")) { (config.logo()) }
            nav.nav aria-label="Main" {
                @for slug in NAV_SLUGS {
                    @if let Some(page) = ctx.manifest.page(slug) {
                        a class=[(slug == ctx.slug).then_some("active")] href=(ctx.page_link(slug)) {
                            (page.title)
                        }
                    }
                }
            }
            a.cta href=(cta) { (config.nav_cta_text) }
        }
    }
}

fn site_footer(ctx: &RenderContext) -> Markup {
    let config = ctx.config();
    let legal: Vec<&Page> = LEGAL_SLUGS.iter().filter_map(|slug| ctx.manifest.page(slug)).collect();
    let links = layout::link_list(&ctx.manifest.links);
    html! {
        footer.site-footer {
            div.footer-grid {
                div {
                    p.footer-title { (config.site_name) }
                    @if !config.address.is_empty() { p { (config.address) } }
                    @if !config.footer_note.is_empty() { p { (config.footer_note) } }
                    @if let Some(href) = config.domain_href() {
                        p { a href=(href) { (config.domain.trim()) } }
                    }
                }
                @if let Some(links) = links {
                    div {
                        p.footer-title { "Digital presence" }
                        (links)
                    }
                }
                @if !legal.is_empty() {
                    div {
                        p.footer-title { "Legal" }
                        div.footer-links {
                            @for page in &legal {
                                a href=(ctx.page_link(&page.slug)) { (page.title) }
                            }
                        }
                    }
                }
            }
        }
    }
}
