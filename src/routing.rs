//! Request path resolution.
//!
//! [`Router::resolve`] walks a request path down the page tree. Plain pages
//! use default tree routing (serve on an empty remainder, otherwise descend to
//! the child named by the next segment). Blog indexes intercept the remainder
//! and run it through a small state machine, first match wins:
//!
//! ```text
//! 1. YYYY/MM/slug/...   ≥3 segments, `\d+` and `\d{2}`, a descendant post
//!                       with that slug exists
//!                         not live+public   → 404
//!                         date mismatch or
//!                         non-canonical     → 301 to prefix/YYYY/MM/slug/...
//!                         date match        → post routes the rest
//! 2. slug/...           first segment is the slug of any descendant post → 404
//! 3. listings           ``, page/N, tag/T[/page/N], YYYY[/page/N],
//!                       YYYY/MM[/page/N]
//!    children           default tree routing
//! ```
//!
//! Posts are only reachable through their dated URL. Step 2 makes sure the
//! undated form never resolves to anything, not even to an unrelated child
//! that happens to share the slug.
//!
//! A page is served only when it and every page above it are live and public.
//!
//! Listing pages outside `1..=max_page` get a temporary redirect to the
//! nearest valid page of the same filter. So does any other spelling of a
//! valid listing URL, such as an explicit `page/1/` or zero-padded numbers.

use crate::listing::{Listing, ListingFilter, ListingPage, build_listing};
use crate::tree::SiteTree;
use crate::types::{Page, PageId};
use regex::Regex;
use std::sync::LazyLock;

static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("year pattern is valid"));
static MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}$").expect("month pattern is valid"));

/// HTTP status of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    MovedPermanently,
    Found,
    NotFound,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::MovedPermanently => 301,
            Status::Found => 302,
            Status::NotFound => 404,
        }
    }
}

/// What serving a matched page produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Render the page itself.
    Render,
    Redirect { location: String, permanent: bool },
}

/// Something the router can hand back as "the matched page".
pub trait PageLike {
    /// The page whose metadata (title, slug, dates) the match reports.
    fn meta(&self) -> &Page;
    /// What serving the request produces.
    fn serve(&self) -> Response;
}

impl PageLike for Page {
    fn meta(&self) -> &Page {
        self
    }

    fn serve(&self) -> Response {
        Response::Render
    }
}

/// A page match.
///
/// `RedirectOverride` reports the matched post's metadata unchanged, but
/// serving it yields a permanent redirect to the canonical URL.
#[derive(Debug, Clone)]
pub enum MatchedPage<'a> {
    Real(&'a Page),
    RedirectOverride { page: &'a Page, target: String },
}

impl PageLike for MatchedPage<'_> {
    fn meta(&self) -> &Page {
        match self {
            MatchedPage::Real(page) | MatchedPage::RedirectOverride { page, .. } => page,
        }
    }

    fn serve(&self) -> Response {
        match self {
            MatchedPage::Real(page) => page.serve(),
            MatchedPage::RedirectOverride { target, .. } => Response::Redirect {
                location: target.clone(),
                permanent: true,
            },
        }
    }
}

/// Outcome of resolving a request path.
#[derive(Debug, Clone)]
pub enum Resolution<'a> {
    /// A page matched. Serving it may still redirect (see [`MatchedPage`]).
    Page(MatchedPage<'a>),
    /// A post listing under a blog index.
    Listing(Listing<'a>),
    /// Temporary redirect, from listing pagination.
    Redirect(String),
    NotFound,
}

impl Resolution<'_> {
    pub fn status(&self) -> Status {
        match self {
            Resolution::Page(matched) => match matched.serve() {
                Response::Render => Status::Ok,
                Response::Redirect { permanent: true, .. } => Status::MovedPermanently,
                Response::Redirect { .. } => Status::Found,
            },
            Resolution::Listing(_) => Status::Ok,
            Resolution::Redirect(_) => Status::Found,
            Resolution::NotFound => Status::NotFound,
        }
    }

    /// Redirect target, if resolving produced a redirect.
    pub fn location(&self) -> Option<String> {
        match self {
            Resolution::Page(matched) => match matched.serve() {
                Response::Redirect { location, .. } => Some(location),
                Response::Render => None,
            },
            Resolution::Redirect(location) => Some(location.clone()),
            Resolution::Listing(_) | Resolution::NotFound => None,
        }
    }
}

/// Split a request path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[derive(Clone, Copy)]
pub struct Router<'a> {
    tree: &'a SiteTree,
}

impl<'a> Router<'a> {
    pub fn new(tree: &'a SiteTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &'a SiteTree {
        self.tree
    }

    pub fn resolve(&self, path: &str) -> Resolution<'a> {
        let segments = split_path(path);
        let resolution = self.route(self.tree.root(), &segments);
        tracing::debug!(path, status = resolution.status().code(), "resolved");
        resolution
    }

    fn route(&self, id: PageId, segments: &[&str]) -> Resolution<'a> {
        if self.tree.page(id).as_index().is_some() {
            self.route_blog_index(id, segments)
        } else {
            self.route_default(id, segments)
        }
    }

    /// Default tree routing: serve on an empty remainder, else descend.
    fn route_default(&self, id: PageId, segments: &[&str]) -> Resolution<'a> {
        let page = self.tree.page(id);
        match segments.split_first() {
            None if self.tree.is_visible(id) => Resolution::Page(MatchedPage::Real(page)),
            None => Resolution::NotFound,
            Some((slug, rest)) => match self.tree.child_by_slug(id, slug) {
                Some(child) => self.route(child.id, rest),
                None => Resolution::NotFound,
            },
        }
    }

    fn route_blog_index(&self, id: PageId, segments: &[&str]) -> Resolution<'a> {
        let posts = self.tree.descendant_posts(id);

        if let [year, month, slug, rest @ ..] = segments {
            if YEAR.is_match(year) && MONTH.is_match(month) {
                if let Some(post_page) = posts.iter().find(|p| p.slug == *slug).copied() {
                    return self.route_dated_post(id, post_page, year, month, rest);
                }
            }
        }

        if let Some(first) = segments.first() {
            if posts.iter().any(|p| p.slug == *first) {
                tracing::debug!(slug = *first, "undated post path");
                return Resolution::NotFound;
            }
        }

        if let Some((filter, page)) = parse_listing_path(segments) {
            return self.route_listing(id, segments, filter, page);
        }

        match segments.split_first() {
            Some((slug, rest)) => match self.tree.child_by_slug(id, slug) {
                Some(child) if !child.is_post() => self.route(child.id, rest),
                _ => Resolution::NotFound,
            },
            None => Resolution::NotFound,
        }
    }

    fn route_dated_post(
        &self,
        index: PageId,
        post_page: &'a Page,
        year: &str,
        month: &str,
        rest: &[&str],
    ) -> Resolution<'a> {
        if !self.tree.is_visible(post_page.id) {
            return Resolution::NotFound;
        }
        let Some(post) = post_page.as_post() else {
            return Resolution::NotFound;
        };

        // Compared as text: `02022/03` names the right month but is not the
        // canonical spelling.
        if format!("{year}/{month}") == post.date_segments() {
            return self.route_default(post_page.id, rest);
        }

        let mut target = format!(
            "{}{}/{}",
            self.tree.page(index).url_path(),
            post.date_segments(),
            post_page.slug
        );
        for segment in rest {
            target.push('/');
            target.push_str(segment);
        }
        target.push('/');
        tracing::debug!(from_year = year, from_month = month, %target, "date mismatch");
        Resolution::Page(MatchedPage::RedirectOverride {
            page: post_page,
            target,
        })
    }

    fn route_listing(
        &self,
        index: PageId,
        segments: &[&str],
        filter: ListingFilter,
        page: Option<i64>,
    ) -> Resolution<'a> {
        let index_page = self.tree.page(index);
        if !self.tree.is_visible(index) {
            return Resolution::NotFound;
        }
        match build_listing(self.tree, index, filter, page.unwrap_or(1)) {
            Ok(ListingPage::Found(listing)) => {
                let canonical = listing.filter.url(index_page.url_path(), listing.window.number);
                let requested: String = segments.iter().map(|s| format!("{s}/")).collect();
                if canonical == format!("{}{requested}", index_page.url_path()) {
                    Resolution::Listing(listing)
                } else {
                    Resolution::Redirect(canonical)
                }
            }
            Ok(ListingPage::Redirect(location)) => Resolution::Redirect(location),
            Err(e) => {
                tracing::warn!(index = %index_page.url_path(), error = %e, "listing failed");
                Resolution::NotFound
            }
        }
    }
}

/// Match the listing grammar below a blog index.
///
/// Returns the filter and the explicit page number, if any. Page numbers too
/// large for `i64` saturate so they still redirect to the last page.
pub fn parse_listing_path(segments: &[&str]) -> Option<(ListingFilter, Option<i64>)> {
    let (head, page) = match segments {
        [head @ .., "page", n] if YEAR.is_match(n) => {
            (head, Some(n.parse::<i64>().unwrap_or(i64::MAX)))
        }
        _ => (segments, None),
    };

    let filter = match head {
        [] => ListingFilter::All,
        ["tag", slug] => ListingFilter::Tag {
            slug: (*slug).to_string(),
        },
        [year] if YEAR.is_match(year) => ListingFilter::Year {
            year: year.parse().ok()?,
        },
        [year, month] if YEAR.is_match(year) && MONTH.is_match(month) => {
            let month: u32 = month.parse().ok()?;
            if !(1..=12).contains(&month) {
                return None;
            }
            ListingFilter::Month {
                year: year.parse().ok()?,
                month,
            }
        }
        _ => return None,
    };
    Some((filter, page))
}
