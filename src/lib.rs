//! # ninepints
//!
//! A blog engine built on a typed page tree. Posts are served at dated URLs
//! (`<index>/YYYY/MM/<slug>/`), listings are paginated by tag, year, and
//! month, and the whole site can be exported as static HTML.
//!
//! # Pipeline
//!
//! ```text
//! 1. Scan       content/  →  SiteTree           (page.toml files → typed pages)
//! 2. Resolve    path      →  Resolution         (200 page/listing, 301, 302, 404)
//! 3. Enumerate  SiteTree  →  sorted URL list    (every path that serves a 200)
//! 4. Build      URL list  →  dist/              (one index.html per URL)
//! ```
//!
//! The static build never renders anything the router would not serve: each
//! enumerated path goes back through [`routing::Router::resolve`] before it
//! is written.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pagination`] | Page windows over a counted collection, out-of-range canonicalization |
//! | [`listing`] | Filtered, ordered post collections under a blog index |
//! | [`routing`] | Request path resolution: dated posts, 301s, slug-collision 404s, listings |
//! | [`enumerate`] | Every URL a static build must render, with per-bucket error reporting |
//! | [`tree`] | Page tree with cached URL paths and the tag registry |
//! | [`types`] | Page data model: plain pages, blog indexes, blog posts |
//! | [`blocks`] | Stream body blocks and math detection |
//! | [`scan`] | Content directory loading and validation |
//! | [`config`] | `config.toml` loading, merging, validation, CSS generation |
//! | [`render`] | Maud templates for pages, listings, and the 404 page |
//! | [`generate`] | Parallel static build into an output directory |
//! | [`naming`] | `NNN-name` directory convention and slugs |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Canonical URL Per Post
//!
//! A post is reachable only at `<index>/YYYY/MM/<slug>/`, with year and month
//! taken from its publication timestamp in that timestamp's own offset. A
//! dated URL with the right slug but the wrong date answers with a permanent
//! redirect to the canonical one; the undated `<index>/<slug>/` form is a 404,
//! so search engines never see two addresses for one post.
//!
//! ## Listings Never Carry `page/1/`
//!
//! Page 1 of any listing lives at the bare listing URL. Requests for pages
//! outside the valid range get a temporary redirect to the nearest valid page
//! of the same listing, since the range moves as posts are published. Other
//! spellings of a valid listing URL (`page/02/`, `02022/`) redirect the same
//! way.
//!
//! ## Math Assets On Demand
//!
//! Documents reference the math script only when something they display
//! contains math: a math block, or `\(...\)` / `\[...\]` in rich text.

pub mod blocks;
pub mod config;
pub mod enumerate;
pub mod generate;
pub mod listing;
pub mod naming;
pub mod output;
pub mod pagination;
pub mod render;
pub mod routing;
pub mod scan;
pub mod tree;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
