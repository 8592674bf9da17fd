//! HTML rendering.
//!
//! Turns router output into documents. Uses [maud](https://maud.lambda.xyz/)
//! for compile-time templating; everything except rich-text blocks and
//! rendered markdown is escaped.
//!
//! ## Rendered Pages
//!
//! - **Plain pages**: markdown body converted with pulldown-cmark
//! - **Posts**: optional hero banner, title, date, tags, stream body
//! - **Listings**: posts of one pagination page, with previous/next links
//! - **Not found**: the standalone 404 document
//!
//! The math script is only referenced by documents that display math.

use crate::blocks::{MathScope, blocks_in_scope, body_needs_math};
use crate::config::{self, SiteConfig};
use crate::listing::{Listing, ListingFilter};
use crate::tree::SiteTree;
use crate::types::{BlogPost, HeroImage, ListingStyle, Page, PageKind};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};

const CSS_STATIC: &str = include_str!("../static/style.css");

/// Everything a renderer needs besides the page itself.
pub struct RenderContext<'a> {
    pub tree: &'a SiteTree,
    pub config: &'a SiteConfig,
    css: String,
}

impl<'a> RenderContext<'a> {
    pub fn new(tree: &'a SiteTree, config: &'a SiteConfig) -> Self {
        let color_css = config::generate_color_css(&config.colors);
        Self {
            tree,
            config,
            css: format!("{color_css}\n\n{CSS_STATIC}"),
        }
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(
    ctx: &RenderContext,
    title: &str,
    needs_math: bool,
    current_path: &str,
    content: Markup,
) -> Markup {
    let full_title = if title == ctx.config.site.title {
        title.to_string()
    } else {
        format!("{title} · {}", ctx.config.site.title)
    };
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (full_title) }
                @if !ctx.config.site.base_url.is_empty() && !current_path.is_empty() {
                    link rel="canonical" href={ (ctx.config.site.base_url) (current_path) };
                }
                style { (PreEscaped(&ctx.css)) }
                @if needs_math {
                    script src=(ctx.config.build.math_script) defer {}
                }
            }
            body {
                (site_header(ctx, current_path))
                (content)
            }
        }
    }
}

fn site_header(ctx: &RenderContext, current_path: &str) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/" { (ctx.config.site.title) }
            nav.site-nav { (render_nav(ctx.tree, current_path)) }
        }
    }
}

/// Top-level navigation: visible, numbered children of the home page.
pub fn render_nav(tree: &SiteTree, current_path: &str) -> Markup {
    html! {
        ul {
            @for page in tree.children(tree.root()).filter(|p| p.in_nav && tree.is_visible(p.id)) {
                @let is_current = current_path.starts_with(page.url_path());
                li class=[is_current.then_some("current")] {
                    a href=(page.url_path()) { (page.title) }
                }
            }
        }
    }
}

fn render_hero(hero: &HeroImage) -> Markup {
    html! {
        picture.hero {
            @if let Some(dark) = &hero.image_dark {
                source srcset=(dark) media="(prefers-color-scheme: dark)";
            }
            img src=(hero.image) alt="";
        }
    }
}

/// Tag links under the index the post belongs to.
fn render_tags(ctx: &RenderContext, post_page: &Page, post: &BlogPost) -> Markup {
    let prefix = ctx
        .tree
        .parent(post_page.id)
        .map(|id| ctx.tree.page(id).url_path())
        .unwrap_or("/");
    html! {
        @if !post.tags.is_empty() {
            ul.tags {
                @for slug in &post.tags {
                    @let name = ctx.tree.tag(slug).map(|t| t.name.as_str()).unwrap_or(slug);
                    li { a href=(tag_url(prefix, slug)) { (name) } }
                }
            }
        }
    }
}

fn tag_url(prefix: &str, slug: &str) -> String {
    ListingFilter::Tag {
        slug: slug.to_string(),
    }
    .url(prefix, 1)
}

fn format_date(post: &BlogPost) -> String {
    post.pub_date.format("%-d %B %Y").to_string()
}

/// Post header plus the blocks selected by `scope`.
fn render_post_body(
    ctx: &RenderContext,
    page: &Page,
    post: &BlogPost,
    scope: MathScope,
    link_title: bool,
) -> Markup {
    let article_class = match &post.hero {
        Some(hero) => format!("post {}", hero.text_color.css_class()),
        None => "post".to_string(),
    };
    html! {
        article class=(article_class) {
            @if let Some(hero) = &post.hero {
                (render_hero(hero))
            }
            header.post-header {
                @if link_title {
                    h2 { a href=(page.url_path()) { (page.title) } }
                } @else {
                    h1 { (page.title) }
                }
                time datetime=(post.pub_date.to_rfc3339()) { (format_date(post)) }
                (render_tags(ctx, page, post))
            }
            div.post-body {
                @for block in blocks_in_scope(&post.body, scope) {
                    (block.render())
                }
            }
            @if link_title && scope == MathScope::FirstTextBlock {
                a.read-more href=(page.url_path()) { "Read more" }
            }
        }
    }
}

pub fn markdown_to_html(source: &str) -> String {
    let parser = Parser::new(source);
    let mut body_html = String::new();
    md_html::push_html(&mut body_html, parser);
    body_html
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Render a page that the router matched directly.
///
/// Blog indexes are normally served as listings; matched directly they only
/// get a heading.
pub fn render_page(ctx: &RenderContext, page: &Page) -> Markup {
    match &page.kind {
        PageKind::Generic(generic) => {
            let content = html! {
                main.page {
                    article.page-content {
                        (PreEscaped(markdown_to_html(&generic.body)))
                    }
                }
            };
            base_document(ctx, &page.title, false, page.url_path(), content)
        }
        PageKind::BlogPost(post) => {
            let content = html! {
                main.post-page {
                    (render_post_body(ctx, page, post, MathScope::FullBody, false))
                }
            };
            let needs_math = body_needs_math(&post.body, MathScope::FullBody);
            base_document(ctx, &page.title, needs_math, page.url_path(), content)
        }
        PageKind::BlogIndex(_) => {
            let content = html! {
                main.listing-page { h1 { (page.title) } }
            };
            base_document(ctx, &page.title, false, page.url_path(), content)
        }
    }
}

/// Render one page of a post listing.
pub fn render_listing(ctx: &RenderContext, listing: &Listing) -> Markup {
    let style = listing
        .index
        .as_index()
        .map(|i| i.listing)
        .unwrap_or_default();
    let scope = style.math_scope();
    let window = &listing.window;
    let current_url = listing
        .filter
        .url(listing.index.url_path(), window.number);

    let main_class = match style {
        ListingStyle::Summary => "listing-page summary",
        ListingStyle::Full => "listing-page",
    };
    let content = html! {
        main class=(main_class) {
            h1 { (listing.title) }
            @if listing.posts.is_empty() {
                p.empty { "No posts yet." }
            }
            @for page in &listing.posts {
                @if let Some(post) = page.as_post() {
                    (render_post_body(ctx, page, post, scope, true))
                }
            }
            @if window.max_page > 1 {
                nav.pagination {
                    @if let Some(url) = &listing.previous_url {
                        a.previous href=(url) rel="prev" { "← Newer" }
                    }
                    span.page-number { "Page " (window.number) " of " (window.max_page) }
                    @if let Some(url) = &listing.next_url {
                        a.next href=(url) rel="next" { "Older →" }
                    }
                }
            }
        }
    };

    base_document(ctx, &listing.title, listing.needs_math, &current_url, content)
}

/// The standalone not-found document.
pub fn render_not_found(ctx: &RenderContext) -> Markup {
    let content = html! {
        main.not-found {
            h1 { "Page not found" }
            p { "Sorry, there's nothing at this address. " a href="/" { "Go home" } "." }
        }
    };
    base_document(ctx, "Page not found", false, "", content)
}

// ============================================================================
// Tests
// ============================================================================
