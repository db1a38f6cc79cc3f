//! Section and page composition.
//!
//! Turns a page's sections into the markup that goes inside `<main>`. Two
//! closed enumerations drive it:
//!
//! - [`SectionKind`] picks the renderer for each section (hero banner, contact
//!   form, digest list, or generic content block);
//! - [`LayoutVariant`] picks how the **root** page is composed. Every other
//!   page uses the standard hero + sections composition.
//!
//! All links are computed per document through [`RenderContext`], which knows
//! the output path of the document being rendered.
//!
//! ## Page anatomy (standard)
//!
//! ```text
//! hero          first hero-kind section (or the first section)
//! overview      root only: cards for the main pages
//! sections      remaining sections in order
//! page-body     blog index, digest index, newsletter, link list
//! ```

use crate::config::{LayoutVariant, SiteConfig};
use crate::markdown::{first_paragraph, plain_text, render_markdown, render_paragraphs};
use crate::naming::normalize_slug;
use crate::paths::{self, Target};
use crate::scan::Manifest;
use crate::types::{BlogPost, DigestIssue, LinkKind, NavLink, Page, Section, SectionKind};
use maud::{Markup, PreEscaped, html};

/// Pages offered in the header navigation, in display order.
pub const NAV_SLUGS: [&str; 7] = ["", "about", "research", "projects", "digest", "blog", "contact"];

/// Digest cards shown by a `digest_list` section.
pub const DIGEST_LIST_LIMIT: usize = 5;

const PLACEHOLDER_HERO: &str = "placeholder-hero.svg";

// ============================================================================
// Render context
// ============================================================================

/// Everything a renderer needs to know about the document being produced.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub manifest: &'a Manifest,
    /// Output path of the current document, e.g. `blog/first-light/index.html`.
    pub document: &'a str,
    /// Slug of the page that owns the document; marks the active nav entry.
    pub slug: &'a str,
}

impl<'a> RenderContext<'a> {
    pub fn new(manifest: &'a Manifest, document: &'a str, slug: &'a str) -> Self {
        Self {
            manifest,
            document,
            slug,
        }
    }

    pub fn config(&self) -> &'a SiteConfig {
        &self.manifest.config
    }

    pub fn is_root(&self) -> bool {
        self.document == "index.html"
    }

    pub fn page_link(&self, slug: &str) -> String {
        paths::page_link(self.document, slug)
    }

    pub fn dir_link(&self, dir: &str) -> String {
        paths::relative_link(self.document, Target::Dir(dir))
    }

    pub fn file_link(&self, file: &str) -> String {
        paths::relative_link(self.document, Target::File(file))
    }

    /// Resolve a call-to-action target.
    ///
    /// Absolute URLs, `mailto:` and `#anchor` targets pass through. Anything
    /// else is treated as a page slug and linked when that page exists;
    /// otherwise the raw value is used.
    pub fn resolve_cta(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() || is_passthrough(raw) {
            return raw.to_string();
        }
        let slug = normalize_slug(raw);
        if self.manifest.has_page(&slug) {
            self.page_link(&slug)
        } else {
            raw.to_string()
        }
    }

    /// Resolve a hero or section image reference to a `src` value.
    pub fn image_src(&self, raw: &str) -> String {
        let image = raw.trim();
        if image.contains("://") || image.starts_with("//") {
            return image.to_string();
        }
        let image = image.trim_start_matches('/');
        if image.is_empty() {
            self.file_link(&format!("assets/img/{PLACEHOLDER_HERO}"))
        } else if image.starts_with("assets/") {
            self.file_link(image)
        } else {
            self.file_link(&format!("assets/img/{image}"))
        }
    }
}

fn is_passthrough(target: &str) -> bool {
    target.contains("://") || target.starts_with("mailto:") || target.starts_with('#')
}

// ============================================================================
// Sections
// ============================================================================

/// Render one section according to its kind.
pub fn render_section(ctx: &RenderContext, section: &Section) -> Markup {
    match &section.kind {
        SectionKind::ContactForm => contact_form(ctx, section),
        SectionKind::DigestList => digest_list(ctx, section),
        SectionKind::Hero | SectionKind::Section | SectionKind::Other(_) => {
            content_section(ctx, section)
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.trim().is_empty()).then_some(value)
}

fn section_classes(section: &Section) -> String {
    let mut classes = format!(
        "content-section width-{} style-{}",
        section.width, section.style_variant
    );
    if section.title.to_lowercase().contains("publications") {
        classes.push_str(" publications-section");
    }
    classes
}

fn content_section(ctx: &RenderContext, section: &Section) -> Markup {
    let cta_href = ctx.resolve_cta(&section.cta_url);
    html! {
        section class=(section_classes(section)) id=[non_empty(&section.section_id)] {
            div.content-grid {
                div.section-body {
                    h2 { (section.title) }
                    (PreEscaped(render_markdown(&section.body)))
                    @if !section.cta_text.is_empty() && !cta_href.is_empty() {
                        a.button.ghost href=(cta_href) { (section.cta_text) }
                    }
                }
                figure.image-frame {
                    img src=(ctx.image_src(&section.hero_image)) alt={ (section.title) " image" };
                }
            }
        }
    }
}

fn contact_form(ctx: &RenderContext, section: &Section) -> Markup {
    let id = non_empty(&section.section_id).unwrap_or("contact-form");
    let heading = non_empty(&section.title).unwrap_or("Contact");
    html! {
        section.content-section.contact-section id=(id) {
            div.content-grid {
                div {
                    h2 { (heading) }
                    (PreEscaped(render_markdown(&section.body)))
                }
                div.contact-card {
                    form.contact-form data-contact-form action=(ctx.file_link("contact.php")) method="post" {
                        div.contact-field {
                            label for="contact-name" { "Name" }
                            input #contact-name name="name" type="text" required;
                        }
                        div.contact-field {
                            label for="contact-email" { "Email" }
                            input #contact-email name="email" type="email" required;
                        }
                        div.contact-field {
                            label for="contact-message" { "Message" }
                            textarea #contact-message name="message" rows="5" required {}
                        }
                        div.contact-field.sr-only aria-hidden="true" {
                            label for="contact-company" { "Company" }
                            input #contact-company name="company" type="text" tabindex="-1" autocomplete="off";
                        }
                        button.button type="submit" { "Send message" }
                        p.form-status aria-live="polite" {}
                    }
                }
            }
        }
    }
}

fn digest_card(ctx: &RenderContext, digest: &DigestIssue) -> Markup {
    html! {
        article.digest-card {
            p.post-date { (digest.date) }
            h3 { a href=(ctx.dir_link(&paths::digest_dir(&digest.slug))) { (digest.title) } }
        }
    }
}

fn digest_list(ctx: &RenderContext, section: &Section) -> Markup {
    let id = non_empty(&section.section_id).unwrap_or("digest");
    let heading = non_empty(&section.title).unwrap_or("Digest");
    let digests = &ctx.manifest.digests;
    html! {
        section.content-section.digest-section id=(id) {
            div.content-grid {
                div {
                    h2 { (heading) }
                    (PreEscaped(render_markdown(&section.body)))
                }
                div {
                    @if digests.is_empty() {
                        p { "No digests yet." }
                    } @else {
                        div.digest-grid {
                            @for digest in digests.iter().take(DIGEST_LIST_LIMIT) {
                                (digest_card(ctx, digest))
                            }
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Page-level fragments
// ============================================================================

/// The banner at the top of a page.
struct Hero {
    heading: String,
    body: String,
    cta: Option<(String, String)>,
    image: String,
}

impl Hero {
    fn from_section(ctx: &RenderContext, page: &Page, section: Option<&Section>) -> Self {
        let heading = section
            .and_then(|s| non_empty(&s.title))
            .unwrap_or(&page.title)
            .to_string();
        let body = section.map(|s| render_markdown(&s.body)).unwrap_or_default();
        let cta = section.and_then(|s| {
            let href = ctx.resolve_cta(&s.cta_url);
            (!s.cta_text.is_empty() && !href.is_empty()).then(|| (s.cta_text.clone(), href))
        });
        let image = ctx.image_src(section.map_or("", |s| s.hero_image.as_str()));
        Self {
            heading,
            body,
            cta,
            image,
        }
    }

    fn actions(&self) -> Markup {
        html! {
            div.hero-actions {
                @if let Some((text, href)) = &self.cta {
                    a.button href=(href) { (text) }
                }
            }
        }
    }

    fn figure(&self) -> Markup {
        html! {
            figure.image-frame {
                img src=(self.image) alt={ (self.heading) " image" };
            }
        }
    }
}

/// A page split into its banner and the remaining sections.
struct Composition<'a> {
    hero: Hero,
    sections: Vec<&'a Section>,
}

impl<'a> Composition<'a> {
    fn new(ctx: &RenderContext, page: &'a Page) -> Self {
        let hide_digests = page.slug.is_empty() && !ctx.config().show_digest_home;
        let visible: Vec<&Section> = page
            .sections
            .iter()
            .filter(|s| !(hide_digests && s.is_digest_list()))
            .collect();
        let hero_index = visible
            .iter()
            .position(|s| s.is_hero())
            .or_else(|| (!visible.is_empty()).then_some(0));
        let hero = Hero::from_section(ctx, page, hero_index.map(|i| visible[i]));
        let sections = visible
            .into_iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != hero_index)
            .map(|(_, s)| s)
            .collect();
        Self { hero, sections }
    }

    fn sections_markup(&self, ctx: &RenderContext) -> Markup {
        html! {
            @for section in &self.sections {
                (render_section(ctx, section))
            }
        }
    }
}

fn newsletter_form(ctx: &RenderContext) -> Markup {
    let config = ctx.config();
    let endpoint = if config.uses_local_newsletter() {
        ctx.file_link("subscribe.php")
    } else {
        config.newsletter_provider_url.trim().to_string()
    };
    html! {
        div.newsletter #newsletter {
            div {
                h3 { "Newsletter" }
                p { "Subscribe for updates, events, and highlights." }
            }
            form.newsletter-form data-newsletter-form action=(endpoint) method="post" {
                label.sr-only for="newsletter-email" { "Email" }
                input #newsletter-email name="email" type="email" placeholder="you@example.org" required;
                div.sr-only aria-hidden="true" {
                    label for="newsletter-company" { "Company" }
                    input #newsletter-company name="company" type="text" tabindex="-1" autocomplete="off";
                }
                button.button type="submit" { "Subscribe" }
                p.form-status aria-live="polite" {}
            }
        }
    }
}

/// Links table as a tag list. Placeholders render without a target.
pub fn link_list(links: &[NavLink]) -> Option<Markup> {
    if links.is_empty() {
        return None;
    }
    Some(html! {
        div.tag-list {
            @for link in links {
                @match link.kind {
                    LinkKind::Placeholder => span.tag { (link.label) },
                    LinkKind::Normal => a.tag.primary href=(link.url) rel="noopener" { (link.label) },
                }
            }
        }
    })
}

fn linkhub_links(links: &[NavLink]) -> Markup {
    html! {
        @if !links.is_empty() {
            div.linkhub-links {
                @for link in links {
                    @match link.kind {
                        LinkKind::Placeholder => span.linkhub-link.placeholder { (link.label) },
                        LinkKind::Normal => a.linkhub-link href=(link.url) rel="noopener" { (link.label) },
                    }
                }
            }
        }
    }
}

fn post_card(ctx: &RenderContext, post: &BlogPost) -> Markup {
    html! {
        article.post-card {
            p.post-date { (post.date) }
            h3 { a href=(ctx.dir_link(&paths::post_dir(&post.slug))) { (post.title) } }
            p { (first_paragraph(&post.body)) }
        }
    }
}

fn blog_index(ctx: &RenderContext) -> Markup {
    let posts = &ctx.manifest.posts;
    html! {
        @if posts.is_empty() {
            p { "No posts yet." }
        } @else {
            div.post-grid {
                @for post in posts {
                    (post_card(ctx, post))
                }
            }
        }
    }
}

fn digest_index(ctx: &RenderContext) -> Markup {
    let digests = &ctx.manifest.digests;
    html! {
        @if digests.is_empty() {
            p { "No digests yet." }
        } @else {
            div.digest-grid {
                @for digest in digests {
                    (digest_card(ctx, digest))
                }
            }
        }
    }
}

/// Cards for the main pages with a teaser from each page's first section.
fn overview(ctx: &RenderContext) -> Option<Markup> {
    let cards: Vec<&Page> = NAV_SLUGS
        .iter()
        .filter(|slug| !matches!(**slug, "" | "blog" | "contact"))
        .filter_map(|slug| ctx.manifest.page(slug))
        .collect();
    if cards.is_empty() {
        return None;
    }
    Some(html! {
        div.card-grid #overview {
            @for page in cards {
                @let teaser = page
                    .sections
                    .first()
                    .map(|s| plain_text(first_paragraph(&s.body)))
                    .unwrap_or_default();
                a.card href=(ctx.page_link(&page.slug)) {
                    h3 { (page.title) }
                    @if !teaser.is_empty() {
                        p { (teaser) }
                    }
                }
            }
        }
    })
}

/// Per-page extras below the sections, wrapped only when non-empty.
fn page_extras(ctx: &RenderContext, slug: &str, newsletter: Option<&Markup>) -> Option<Markup> {
    let blog = (slug == "blog").then(|| blog_index(ctx));
    let digests = (slug == "digest").then(|| digest_index(ctx));
    let links = if slug == "contact" {
        link_list(&ctx.manifest.links)
    } else {
        None
    };
    if blog.is_none() && digests.is_none() && newsletter.is_none() && links.is_none() {
        return None;
    }
    Some(html! {
        section.page-body {
            div.content-block.reveal {
                @if let Some(blog) = blog { (blog) }
                @if let Some(digests) = digests { (digests) }
                @if let Some(newsletter) = newsletter { (newsletter) }
                @if let Some(links) = links { (links) }
            }
        }
    })
}

fn wants_newsletter(slug: &str) -> bool {
    matches!(slug, "" | "contact" | "digest")
}

// ============================================================================
// Page composition
// ============================================================================

/// Compose the `<main>` content for a page.
pub fn render_page(ctx: &RenderContext, page: &Page) -> Markup {
    let composition = Composition::new(ctx, page);
    let newsletter = wants_newsletter(&page.slug).then(|| newsletter_form(ctx));
    if !page.slug.is_empty() {
        return standard(ctx, page, &composition, newsletter.as_ref());
    }
    match ctx.config().layout_variant {
        LayoutVariant::Standard => standard(ctx, page, &composition, newsletter.as_ref()),
        LayoutVariant::Linkhub => linkhub(ctx, &composition, newsletter.as_ref()),
        LayoutVariant::Profile => profile(ctx, page, &composition, newsletter.as_ref()),
        LayoutVariant::MesciaLanding => landing(ctx),
        LayoutVariant::Archive => archive(ctx, page, &composition, newsletter.as_ref()),
    }
}

/// Whether the document for `page` needs the landing stylesheet and script.
pub fn uses_landing_assets(config: &SiteConfig, page: &Page) -> bool {
    page.slug.is_empty() && config.layout_variant == LayoutVariant::MesciaLanding
}

fn hero_intro(ctx: &RenderContext, hero: &Hero) -> Markup {
    let config = ctx.config();
    html! {
        p.eyebrow { (config.site_name) }
        h1 { (hero.heading) }
        @if !config.site_tagline.is_empty() {
            p.subtitle { (config.site_tagline) }
        }
        (PreEscaped(&hero.body))
        (hero.actions())
    }
}

fn standard(
    ctx: &RenderContext,
    page: &Page,
    composition: &Composition,
    newsletter: Option<&Markup>,
) -> Markup {
    let hero = &composition.hero;
    let cards = if page.slug.is_empty() { overview(ctx) } else { None };
    html! {
        section.hero {
            div.hero-orbit {}
            div.hero-inner {
                div { (hero_intro(ctx, hero)) }
                div.hero-art { (hero.figure()) }
            }
        }
        @if let Some(cards) = cards { (cards) }
        (composition.sections_markup(ctx))
        @if let Some(extras) = page_extras(ctx, &page.slug, newsletter) { (extras) }
    }
}

fn linkhub(ctx: &RenderContext, composition: &Composition, newsletter: Option<&Markup>) -> Markup {
    let config = ctx.config();
    html! {
        section.linkhub {
            div.linkhub-inner {
                p.eyebrow { (config.site_name) }
                h1 { (composition.hero.heading) }
                @if !config.site_tagline.is_empty() {
                    p.subtitle { (config.site_tagline) }
                }
                (render_paragraphs(&config.contact_blurb))
                (linkhub_links(&ctx.manifest.links))
                @if let Some(newsletter) = newsletter { (newsletter) }
            }
        }
    }
}

fn profile(
    ctx: &RenderContext,
    page: &Page,
    composition: &Composition,
    newsletter: Option<&Markup>,
) -> Markup {
    let config = ctx.config();
    let hero = &composition.hero;
    html! {
        section.hero {
            div.hero-orbit {}
            div.hero-inner {
                div { (hero_intro(ctx, hero)) }
                div.hero-art {
                    (hero.figure())
                    h3 { "Profile" }
                    (render_paragraphs(&config.contact_blurb))
                }
            }
        }
        section.profile-section {
            @if let Some(cards) = overview(ctx) { (cards) }
        }
        (composition.sections_markup(ctx))
        @if let Some(extras) = page_extras(ctx, &page.slug, newsletter) { (extras) }
    }
}

fn landing(ctx: &RenderContext) -> Markup {
    let config = ctx.config();
    let zones: Vec<&Page> = ctx
        .manifest
        .pages
        .ordered()
        .into_iter()
        .filter(|p| !p.slug.is_empty())
        .collect();
    let enter = zones
        .first()
        .map_or_else(|| "#".to_string(), |p| ctx.page_link(&p.slug));
    html! {
        section.mescia-landing {
            canvas #mescia-canvas {}
            div.mescia-overlay {
                div.landing-zones-container {
                    @for page in &zones {
                        a.landing-zone href=(ctx.page_link(&page.slug)) data-label=(page.title) {
                            span.zone-label { (page.title) }
                        }
                    }
                }
                div.main-entrance {
                    h1 { (config.site_name) }
                    @if !config.site_tagline.is_empty() {
                        p { (config.site_tagline) }
                    }
                    a.enter-button #enter-site-btn href=(enter) { "Enter" }
                }
            }
        }
    }
}

fn archive(
    ctx: &RenderContext,
    page: &Page,
    composition: &Composition,
    newsletter: Option<&Markup>,
) -> Markup {
    let config = ctx.config();
    let cards = overview(ctx);
    let anchors: Vec<(&str, &str)> = composition
        .sections
        .iter()
        .filter_map(|s| {
            let id = non_empty(&s.section_id)?;
            Some((id, non_empty(&s.title).unwrap_or(id)))
        })
        .collect();
    html! {
        section.archive-layout {
            aside.archive-sidebar-left {
                nav.archive-nav {
                    h3 { "The Index" }
                    ul {
                        @if cards.is_some() {
                            li { a href="#overview" { "Overview" } }
                        }
                        @for (id, label) in &anchors {
                            li { a href={ "#" (id) } { (label) } }
                        }
                    }
                }
            }
            div.archive-main {
                header.archive-header {
                    h1 { (composition.hero.heading) }
                    (PreEscaped(&composition.hero.body))
                }
                @if let Some(cards) = &cards { (cards) }
                (composition.sections_markup(ctx))
                @if let Some(extras) = page_extras(ctx, &page.slug, newsletter) { (extras) }
            }
            aside.archive-sidebar-right {
                div.archive-metadata {
                    h3 { (config.site_name) }
                    @if !config.site_tagline.is_empty() {
                        p { (config.site_tagline) }
                    }
                    @if !config.address.is_empty() {
                        p { (config.address) }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Collection item pages
// ============================================================================

fn back_link(ctx: &RenderContext, slug: &str) -> String {
    if ctx.manifest.has_page(slug) {
        ctx.page_link(slug)
    } else {
        ctx.page_link("")
    }
}

fn item_page(eyebrow: &str, title: &str, date: &str, body: Markup, back: (String, &str)) -> Markup {
    html! {
        section.page-hero {
            div.page-hero-inner {
                p.eyebrow { (eyebrow) }
                h1 { (title) }
                p.post-date { (date) }
            }
        }
        section.page-body {
            div.content-block {
                (body)
                a.button.ghost href=(back.0) { (back.1) }
            }
        }
    }
}

/// `<main>` content of a blog post document.
pub fn render_post(ctx: &RenderContext, post: &BlogPost) -> Markup {
    item_page(
        "Blog",
        &post.title,
        &post.date,
        render_paragraphs(&post.body),
        (back_link(ctx, "blog"), "Back to blog"),
    )
}

/// `<main>` content of a digest issue document.
pub fn render_digest(ctx: &RenderContext, digest: &DigestIssue) -> Markup {
    item_page(
        "Digest",
        &digest.title,
        &digest.date,
        PreEscaped(render_markdown(&digest.body)),
        (back_link(ctx, "digest"), "Back to digest"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{digest, manifest, page, post, section};

    fn root_ctx(manifest: &Manifest) -> RenderContext<'_> {
        RenderContext::new(manifest, "index.html", "")
    }

    // =========================================================================
    // Link resolution
    // =========================================================================

    #[test]
    fn cta_passthrough_targets() {
        let m = manifest(vec![page("about", vec![])]);
        let ctx = RenderContext::new(&m, "about/index.html", "about");
        assert_eq!(ctx.resolve_cta("https://x.org"), "https://x.org");
        assert_eq!(ctx.resolve_cta("mailto:a@b.org"), "mailto:a@b.org");
        assert_eq!(ctx.resolve_cta("#team"), "#team");
        assert_eq!(ctx.resolve_cta(""), "");
    }

    #[test]
    fn cta_slug_links_existing_page() {
        let m = manifest(vec![page("about", vec![]), page("contact", vec![])]);
        let ctx = RenderContext::new(&m, "about/index.html", "about");
        assert_eq!(ctx.resolve_cta("contact"), "../contact/");
        assert_eq!(ctx.resolve_cta("/contact/"), "../contact/");
        assert_eq!(ctx.resolve_cta("home"), "home", "no root page in this manifest");
    }

    #[test]
    fn cta_unknown_slug_passes_through() {
        let m = manifest(vec![page("about", vec![])]);
        let ctx = root_ctx(&m);
        assert_eq!(ctx.resolve_cta("missing"), "missing");
    }

    #[test]
    fn image_resolution() {
        let m = manifest(vec![]);
        let ctx = RenderContext::new(&m, "research/index.html", "research");
        assert_eq!(ctx.image_src(""), "../assets/img/placeholder-hero.svg");
        assert_eq!(ctx.image_src("lab.jpg"), "../assets/img/lab.jpg");
        assert_eq!(ctx.image_src("assets/photos/x.png"), "../assets/photos/x.png");
        assert_eq!(
            ctx.image_src("https://cdn.example.org/x.png"),
            "https://cdn.example.org/x.png"
        );
    }

    // =========================================================================
    // Section dispatch
    // =========================================================================

    #[test]
    fn content_section_classes_and_cta() {
        let mut s = section(SectionKind::Section, "Selected Publications");
        s.section_id = "pubs".to_string();
        s.cta_text = "Read more".to_string();
        s.cta_url = "https://x.org".to_string();
        let m = manifest(vec![]);
        let html = render_section(&root_ctx(&m), &s).into_string();
        assert!(html.contains(
            r#"class="content-section width-full style-glass publications-section""#
        ));
        assert!(html.contains(r#"id="pubs""#));
        assert!(html.contains(r#"<a class="button ghost" href="https://x.org">Read more</a>"#));
    }

    #[test]
    fn cta_without_text_is_omitted() {
        let mut s = section(SectionKind::Section, "Plain");
        s.cta_url = "https://x.org".to_string();
        let m = manifest(vec![]);
        let html = render_section(&root_ctx(&m), &s).into_string();
        assert!(!html.contains("button ghost"));
    }

    #[test]
    fn unknown_kind_renders_as_content_section() {
        let s = section(SectionKind::Other("timeline".to_string()), "History");
        let m = manifest(vec![]);
        let html = render_section(&root_ctx(&m), &s).into_string();
        assert!(html.contains("content-section width-full"));
        assert!(html.contains("<h2>History</h2>"));
    }

    #[test]
    fn contact_form_posts_to_sibling_endpoint() {
        let s = section(SectionKind::ContactForm, "");
        let m = manifest(vec![]);
        let ctx = RenderContext::new(&m, "contact/index.html", "contact");
        let html = render_section(&ctx, &s).into_string();
        assert!(html.contains(r#"action="../contact.php""#));
        assert!(html.contains(r#"id="contact-form""#));
        assert!(html.contains(r#"name="company""#));
        assert!(html.contains("<h2>Contact</h2>"));
    }

    #[test]
    fn digest_list_shows_at_most_five() {
        let mut m = manifest(vec![]);
        m.digests = (1..=7).map(|i| digest(&format!("issue-{i}"))).collect();
        let s = section(SectionKind::DigestList, "Latest");
        let html = render_section(&root_ctx(&m), &s).into_string();
        assert_eq!(html.matches("digest-card").count(), 5);
        assert!(html.contains(r#"href="digest/issue-1/""#));
        assert!(!html.contains("issue-6"));
    }

    #[test]
    fn empty_digest_list_shows_message() {
        let m = manifest(vec![]);
        let s = section(SectionKind::DigestList, "Latest");
        let html = render_section(&root_ctx(&m), &s).into_string();
        assert!(html.contains("No digests yet."));
    }

    // =========================================================================
    // Page composition
    // =========================================================================

    #[test]
    fn hero_is_taken_out_of_section_list() {
        let m = manifest(vec![page(
            "",
            vec![
                section(SectionKind::Section, "Research"),
                section(SectionKind::Hero, "Welcome"),
            ],
        )]);
        let html = render_page(&root_ctx(&m), m.page("").unwrap()).into_string();
        assert!(html.contains("<h1>Welcome</h1>"));
        assert_eq!(html.matches("<h2>Research</h2>").count(), 1);
        assert!(!html.contains("<h2>Welcome</h2>"));
        let hero_at = html.find("Welcome").unwrap();
        let research_at = html.find("Research").unwrap();
        assert!(hero_at < research_at);
    }

    #[test]
    fn first_section_serves_as_banner_without_hero() {
        let m = manifest(vec![page(
            "about",
            vec![
                section(SectionKind::Section, "Who we are"),
                section(SectionKind::Section, "Team"),
            ],
        )]);
        let ctx = RenderContext::new(&m, "about/index.html", "about");
        let html = render_page(&ctx, m.page("about").unwrap()).into_string();
        assert!(html.contains("<h1>Who we are</h1>"));
        assert!(!html.contains("<h2>Who we are</h2>"));
        assert!(html.contains("<h2>Team</h2>"));
    }

    #[test]
    fn empty_page_uses_page_title_as_heading() {
        let m = manifest(vec![page("about", vec![])]);
        let ctx = RenderContext::new(&m, "about/index.html", "about");
        let html = render_page(&ctx, m.page("about").unwrap()).into_string();
        assert!(html.contains("<h1>About</h1>"));
    }

    #[test]
    fn root_hides_digest_lists_unless_enabled() {
        let mut m = manifest(vec![page(
            "",
            vec![
                section(SectionKind::Hero, "Welcome"),
                section(SectionKind::DigestList, "Digest"),
            ],
        )]);
        let html = render_page(&root_ctx(&m), m.page("").unwrap()).into_string();
        assert!(!html.contains("digest-section"));

        m.config.show_digest_home = true;
        let html = render_page(&root_ctx(&m), m.page("").unwrap()).into_string();
        assert!(html.contains("digest-section"));
    }

    #[test]
    fn newsletter_on_root_contact_and_digest_only() {
        let m = manifest(vec![
            page("", vec![]),
            page("contact", vec![]),
            page("digest", vec![]),
            page("about", vec![]),
        ]);
        for (slug, expected) in [("", true), ("contact", true), ("digest", true), ("about", false)] {
            let doc = paths::page_output_path(slug);
            let ctx = RenderContext::new(&m, &doc, slug);
            let html = render_page(&ctx, m.page(slug).unwrap()).into_string();
            assert_eq!(html.contains("newsletter-form"), expected, "page {slug:?}");
        }
    }

    #[test]
    fn page_body_wrapper_only_when_needed() {
        let m = manifest(vec![page("about", vec![])]);
        let ctx = RenderContext::new(&m, "about/index.html", "about");
        let html = render_page(&ctx, m.page("about").unwrap()).into_string();
        assert!(!html.contains("page-body"));
    }

    #[test]
    fn provider_newsletter_posts_to_provider() {
        let mut m = manifest(vec![page("", vec![])]);
        m.config.newsletter_mode = "provider".to_string();
        m.config.newsletter_provider_url = "https://lists.example.org/join".to_string();
        let html = render_page(&root_ctx(&m), m.page("").unwrap()).into_string();
        assert!(html.contains(r#"action="https://lists.example.org/join""#));
    }

    #[test]
    fn blog_page_lists_posts_with_teasers() {
        let mut m = manifest(vec![page("blog", vec![])]);
        m.posts = vec![post("first-light", "2024-03-01", "Lead paragraph.\n\nMore.")];
        let ctx = RenderContext::new(&m, "blog/index.html", "blog");
        let html = render_page(&ctx, m.page("blog").unwrap()).into_string();
        assert!(html.contains(r#"href="first-light/""#));
        assert!(html.contains("<p>Lead paragraph.</p>"));
        assert!(!html.contains("More."));
    }

    #[test]
    fn contact_page_shows_link_list() {
        let mut m = manifest(vec![page("contact", vec![])]);
        m.links = vec![
            NavLink {
                label: "GitHub".to_string(),
                url: "https://gh.example".to_string(),
                kind: LinkKind::Normal,
                order: 1,
            },
            NavLink {
                label: "Soon".to_string(),
                url: "#".to_string(),
                kind: LinkKind::Placeholder,
                order: 2,
            },
        ];
        let ctx = RenderContext::new(&m, "contact/index.html", "contact");
        let html = render_page(&ctx, m.page("contact").unwrap()).into_string();
        assert!(html.contains(r#"<a class="tag primary" href="https://gh.example" rel="noopener">GitHub</a>"#));
        assert!(html.contains(r#"<span class="tag">Soon</span>"#));
    }

    #[test]
    fn overview_cards_skip_root_blog_and_contact() {
        let mut research = section(SectionKind::Section, "Topics");
        research.body = "We study **evolution**.\n\nSecond.".to_string();
        let m = manifest(vec![
            page("", vec![]),
            page("research", vec![research]),
            page("blog", vec![]),
            page("contact", vec![]),
        ]);
        let html = render_page(&root_ctx(&m), m.page("").unwrap()).into_string();
        assert!(html.contains(r#"<a class="card" href="research/">"#));
        assert!(html.contains("<p>We study evolution.</p>"));
        assert!(!html.contains(r#"class="card" href="blog/""#));
        assert!(!html.contains(r#"class="card" href="contact/""#));
    }

    // =========================================================================
    // Root variants
    // =========================================================================

    fn variant_manifest(variant: LayoutVariant) -> Manifest {
        let mut hero = section(SectionKind::Hero, "Welcome");
        hero.section_id = "welcome".to_string();
        let mut research = section(SectionKind::Section, "Research");
        research.section_id = "research".to_string();
        let mut m = manifest(vec![
            page("", vec![hero, research]),
            page("research", vec![]),
            page("about", vec![]),
        ]);
        m.config.layout_variant = variant;
        m.config.contact_blurb = "Write to us.".to_string();
        m
    }

    #[test]
    fn linkhub_variant() {
        let m = variant_manifest(LayoutVariant::Linkhub);
        let html = render_page(&root_ctx(&m), m.page("").unwrap()).into_string();
        assert!(html.contains(r#"<section class="linkhub">"#));
        assert!(html.contains("<h1>Welcome</h1>"));
        assert!(html.contains("<p>Write to us.</p>"));
        assert!(html.contains("newsletter-form"));
    }

    #[test]
    fn profile_variant() {
        let m = variant_manifest(LayoutVariant::Profile);
        let html = render_page(&root_ctx(&m), m.page("").unwrap()).into_string();
        assert!(html.contains("profile-section"));
        assert!(html.contains("<p>Write to us.</p>"));
        assert!(html.contains("<h2>Research</h2>"));
    }

    #[test]
    fn landing_variant_has_zone_per_page() {
        let m = variant_manifest(LayoutVariant::MesciaLanding);
        let html = render_page(&root_ctx(&m), m.page("").unwrap()).into_string();
        assert_eq!(html.matches("landing-zone\"").count(), 2);
        assert!(html.contains(r#"data-label="Research""#));
        assert!(html.contains("mescia-canvas"));
        assert!(uses_landing_assets(&m.config, m.page("").unwrap()));
        assert!(!uses_landing_assets(&m.config, m.page("about").unwrap()));
    }

    #[test]
    fn archive_index_lists_real_anchors() {
        let m = variant_manifest(LayoutVariant::Archive);
        let html = render_page(&root_ctx(&m), m.page("").unwrap()).into_string();
        assert!(html.contains(r##"<a href="#research">Research</a>"##));
        assert!(html.contains(r#"id="research""#));
        assert!(html.contains(r##"<a href="#overview">Overview</a>"##));
        assert!(html.contains(r#"id="overview""#));
        assert!(!html.contains(r##"href="#welcome""##), "hero is not in the index");
    }

    #[test]
    fn variants_only_affect_root() {
        let m = variant_manifest(LayoutVariant::Linkhub);
        let ctx = RenderContext::new(&m, "about/index.html", "about");
        let html = render_page(&ctx, m.page("about").unwrap()).into_string();
        assert!(!html.contains("linkhub"));
        assert!(html.contains(r#"<section class="hero">"#));
    }

    // =========================================================================
    // Item pages
    // =========================================================================

    #[test]
    fn post_back_link_falls_back_to_root() {
        let mut m = manifest(vec![]);
        let p = post("first-light", "2024-03-01", "Body");
        m.posts = vec![p.clone()];
        let ctx = RenderContext::new(&m, "blog/first-light/index.html", "blog");
        let html = render_post(&ctx, &p).into_string();
        assert!(html.contains(r#"href="../../""#));
        assert!(html.contains("<p>Body</p>"));
    }

    #[test]
    fn digest_page_links_back_to_digest_page() {
        let m = manifest(vec![page("digest", vec![])]);
        let d = digest("2024-05");
        let ctx = RenderContext::new(&m, "digest/2024-05/index.html", "digest");
        let html = render_digest(&ctx, &d).into_string();
        assert!(html.contains(r#"<a class="button ghost" href="../">Back to digest</a>"#));
        assert!(html.contains(&d.title));
        assert!(html.contains(&d.date));
    }
}
