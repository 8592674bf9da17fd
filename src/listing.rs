//! Post listings under a blog index.
//!
//! A listing is one pagination page of a filtered, ordered post collection:
//!
//! | Filter | URL (relative to the index) | Title |
//! |--------|-----------------------------|-------|
//! | all    | `` / `page/N/`              | index title |
//! | tag    | `tag/python/` / `tag/python/page/N/` | `Posts tagged “Python”` |
//! | year   | `2022/` / `2022/page/N/`    | `2022` |
//! | month  | `2022/03/` / `2022/03/page/N/` | `March 2022` |
//!
//! Page 1 never carries a `page/1/` segment. Only live, public posts are
//! listed, newest first; see [`newest_first`].

use crate::blocks::body_needs_math;
use crate::pagination::{PageResult, PageWindow, PaginationError, paginate};
use crate::tree::SiteTree;
use crate::types::{BlogPost, Page, PageId};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    #[error("page {0} is not a blog index")]
    NotAnIndex(PageId),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

/// Which posts of an index a listing shows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum ListingFilter {
    All,
    Tag { slug: String },
    Year { year: i32 },
    Month { year: i32, month: u32 },
}

impl ListingFilter {
    pub fn matches(&self, post: &BlogPost) -> bool {
        match self {
            ListingFilter::All => true,
            ListingFilter::Tag { slug } => post.tags.contains(slug),
            ListingFilter::Year { year } => post.year() == *year,
            ListingFilter::Month { year, month } => {
                post.year() == *year && post.month() == *month
            }
        }
    }

    /// Path below the index prefix, with trailing `/` (empty for `All`).
    pub fn path(&self) -> String {
        match self {
            ListingFilter::All => String::new(),
            ListingFilter::Tag { slug } => format!("tag/{slug}/"),
            ListingFilter::Year { year } => format!("{year}/"),
            ListingFilter::Month { year, month } => format!("{year}/{month:02}/"),
        }
    }

    /// Canonical URL of page `page` of this listing under `prefix`.
    ///
    /// `prefix` is the index's URL path and ends with `/`.
    pub fn url(&self, prefix: &str, page: u64) -> String {
        let mut url = format!("{prefix}{}", self.path());
        if page > 1 {
            url.push_str(&format!("page/{page}/"));
        }
        url
    }

    pub fn title(&self, index_title: &str, tree: &SiteTree) -> String {
        match self {
            ListingFilter::All => index_title.to_string(),
            ListingFilter::Tag { slug } => {
                let name = tree.tag(slug).map(|t| t.name.as_str()).unwrap_or(slug);
                format!("Posts tagged “{name}”")
            }
            ListingFilter::Year { year } => year.to_string(),
            ListingFilter::Month { year, month } => month_label(*year, *month),
        }
    }
}

impl fmt::Display for ListingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingFilter::All => write!(f, "all posts"),
            ListingFilter::Tag { slug } => write!(f, "tag {slug}"),
            ListingFilter::Year { year } => write!(f, "year {year}"),
            ListingFilter::Month { year, month } => write!(f, "month {year}-{month:02}"),
        }
    }
}

/// Human month label, e.g. `March 2022`.
pub fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{year}-{month:02}"))
}

/// Listing order: newest publication first, then newest page id first.
///
/// Page ids follow insertion order, so posts published at the same instant
/// still sort the same way on every run.
pub fn newest_first(a: &Page, b: &Page) -> Ordering {
    let date = |p: &Page| p.as_post().map(|post| post.pub_date);
    date(b).cmp(&date(a)).then_with(|| b.id.cmp(&a.id))
}

/// Live, public posts of `index` matching `filter`, in listing order.
pub fn filtered_posts<'a>(
    tree: &'a SiteTree,
    index: PageId,
    filter: &ListingFilter,
) -> Vec<&'a Page> {
    let mut posts: Vec<&Page> = tree
        .visible_posts(index)
        .into_iter()
        .filter(|p| p.as_post().is_some_and(|post| filter.matches(post)))
        .collect();
    posts.sort_by(|a, b| newest_first(a, b));
    posts
}

/// One rendered page of a listing.
#[derive(Debug, Clone)]
pub struct Listing<'a> {
    pub index: &'a Page,
    pub filter: ListingFilter,
    pub title: String,
    /// Posts on this page, in listing order.
    pub posts: Vec<&'a Page>,
    pub window: PageWindow,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
    /// Whether any displayed post needs math assets.
    pub needs_math: bool,
}

/// Result of asking for a page of a listing.
#[derive(Debug, Clone)]
pub enum ListingPage<'a> {
    Found(Listing<'a>),
    /// The page does not exist; temporary redirect to this canonical URL.
    Redirect(String),
}

/// Build page `requested_page` of `filter` under `index`.
pub fn build_listing<'a>(
    tree: &'a SiteTree,
    index: PageId,
    filter: ListingFilter,
    requested_page: i64,
) -> Result<ListingPage<'a>, ListingError> {
    let index_page = tree.page(index);
    let Some(blog) = index_page.as_index() else {
        return Err(ListingError::NotAnIndex(index));
    };
    let prefix = index_page.url_path();
    let posts = filtered_posts(tree, index, &filter);

    let window = match paginate(posts.len() as u64, blog.posts_per_page, requested_page)? {
        PageResult::Ok(window) => window,
        PageResult::OutOfRange { canonical } => {
            return Ok(ListingPage::Redirect(filter.url(prefix, canonical)));
        }
    };

    let shown = window.slice(&posts).to_vec();
    let scope = blog.listing.math_scope();
    let needs_math = shown
        .iter()
        .filter_map(|p| p.as_post())
        .any(|post| body_needs_math(&post.body, scope));

    let previous_url = window
        .has_previous
        .then(|| filter.url(prefix, window.previous_page_number.unwrap_or(1)));
    let next_url = window.next_page_number.map(|n| filter.url(prefix, n));

    Ok(ListingPage::Found(Listing {
        index: index_page,
        title: filter.title(&index_page.title, tree),
        filter,
        posts: shown,
        window,
        previous_url,
        next_url,
        needs_math,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::Block;
    use crate::test_helpers::{TreeBuilder, found};
    use pretty_assertions::assert_eq;

    fn slugs(listing: &Listing) -> Vec<String> {
        listing.posts.iter().map(|p| p.slug.clone()).collect()
    }

    #[test]
    fn urls_omit_first_page() {
        let tag = ListingFilter::Tag {
            slug: "python".to_string(),
        };
        assert_eq!(tag.url("/blog/", 1), "/blog/tag/python/");
        assert_eq!(tag.url("/blog/", 2), "/blog/tag/python/page/2/");
        assert_eq!(ListingFilter::All.url("/blog/", 1), "/blog/");
        assert_eq!(ListingFilter::All.url("/blog/", 3), "/blog/page/3/");
        let month = ListingFilter::Month {
            year: 2022,
            month: 3,
        };
        assert_eq!(month.url("/blog/", 2), "/blog/2022/03/page/2/");
    }

    #[test]
    fn month_label_is_human_readable() {
        assert_eq!(month_label(2022, 3), "March 2022");
        assert_eq!(month_label(2021, 12), "December 2021");
    }

    #[test]
    fn same_timestamp_breaks_ties_by_insertion() {
        let mut b = TreeBuilder::new(10);
        b.post("first", "2022-03-15T12:00:00+00:00", &[]);
        b.post("second", "2022-03-15T12:00:00+00:00", &[]);
        b.post("older", "2022-03-14T12:00:00+00:00", &[]);
        b.post("third", "2022-03-15T12:00:00+00:00", &[]);
        let (tree, blog) = b.build();

        let listing = found(build_listing(&tree, blog, ListingFilter::All, 1).unwrap());
        assert_eq!(slugs(&listing), vec!["third", "second", "first", "older"]);

        let again = found(build_listing(&tree, blog, ListingFilter::All, 1).unwrap());
        assert_eq!(slugs(&again), slugs(&listing));
    }

    #[test]
    fn seven_posts_paginate_three_three_one() {
        let mut b = TreeBuilder::new(3);
        for day in 1..=7 {
            b.post(&format!("p{day}"), &format!("2022-01-{day:02}T00:00:00+00:00"), &[]);
        }
        let (tree, blog) = b.build();

        let page1 = found(build_listing(&tree, blog, ListingFilter::All, 1).unwrap());
        assert_eq!(slugs(&page1), vec!["p7", "p6", "p5"]);
        assert_eq!(page1.previous_url, None);
        assert_eq!(page1.next_url.as_deref(), Some("/blog/page/2/"));

        let page2 = found(build_listing(&tree, blog, ListingFilter::All, 2).unwrap());
        assert_eq!(page2.previous_url.as_deref(), Some("/blog/"));
        assert_eq!(page2.next_url.as_deref(), Some("/blog/page/3/"));

        let page3 = found(build_listing(&tree, blog, ListingFilter::All, 3).unwrap());
        assert_eq!(slugs(&page3), vec!["p1"]);
        assert_eq!(page3.previous_url.as_deref(), Some("/blog/page/2/"));
        assert_eq!(page3.next_url, None);
    }

    #[test]
    fn out_of_range_redirects_keep_the_filter() {
        let mut b = TreeBuilder::new(3);
        for day in 1..=4 {
            b.post(&format!("p{day}"), &format!("2022-01-{day:02}T00:00:00+00:00"), &["python"]);
        }
        let (tree, blog) = b.build();
        let tag = ListingFilter::Tag {
            slug: "python".to_string(),
        };

        match build_listing(&tree, blog, tag.clone(), 0).unwrap() {
            ListingPage::Redirect(url) => assert_eq!(url, "/blog/tag/python/"),
            other => panic!("expected redirect, got {other:?}"),
        }
        match build_listing(&tree, blog, tag, 9).unwrap() {
            ListingPage::Redirect(url) => assert_eq!(url, "/blog/tag/python/page/2/"),
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn empty_filter_serves_empty_first_page() {
        let mut b = TreeBuilder::new(3);
        b.post("p", "2022-01-01T00:00:00+00:00", &[]);
        let (tree, blog) = b.build();
        let listing = found(
            build_listing(&tree, blog, ListingFilter::Year { year: 1999 }, 1).unwrap(),
        );
        assert!(listing.posts.is_empty());
        assert_eq!(listing.title, "1999");
    }

    #[test]
    fn filters_select_by_tag_year_and_month() {
        let mut b = TreeBuilder::new(10);
        b.post("a", "2021-12-31T10:00:00+00:00", &["Rust"]);
        b.post("b", "2022-03-01T10:00:00+00:00", &["Rust", "Python"]);
        b.post("c", "2022-03-20T10:00:00+00:00", &["Python"]);
        b.post("d", "2022-04-02T10:00:00+00:00", &[]);
        let (tree, blog) = b.build();

        let by_tag = found(
            build_listing(
                &tree,
                blog,
                ListingFilter::Tag {
                    slug: "rust".to_string(),
                },
                1,
            )
            .unwrap(),
        );
        assert_eq!(slugs(&by_tag), vec!["b", "a"]);
        assert_eq!(by_tag.title, "Posts tagged “Rust”");

        let by_year =
            found(build_listing(&tree, blog, ListingFilter::Year { year: 2022 }, 1).unwrap());
        assert_eq!(slugs(&by_year), vec!["d", "c", "b"]);

        let by_month = found(
            build_listing(
                &tree,
                blog,
                ListingFilter::Month {
                    year: 2022,
                    month: 3,
                },
                1,
            )
            .unwrap(),
        );
        assert_eq!(slugs(&by_month), vec!["c", "b"]);
        assert_eq!(by_month.title, "March 2022");
    }

    #[test]
    fn drafts_are_not_listed() {
        let mut b = TreeBuilder::new(10);
        b.post("live", "2022-01-01T00:00:00+00:00", &[]);
        b.draft("draft", "2022-01-02T00:00:00+00:00");
        let (tree, blog) = b.build();
        let listing = found(build_listing(&tree, blog, ListingFilter::All, 1).unwrap());
        assert_eq!(slugs(&listing), vec!["live"]);
    }

    #[test]
    fn math_flag_only_considers_displayed_posts() {
        let mut b = TreeBuilder::new(1);
        let math = b.post("math", "2022-01-01T00:00:00+00:00", &[]);
        b.set_body(
            math,
            vec![Block::Text {
                value: r"<p>\(x\)</p>".to_string(),
            }],
        );
        b.post("plain", "2022-01-02T00:00:00+00:00", &[]);
        let (tree, blog) = b.build();

        let page1 = found(build_listing(&tree, blog, ListingFilter::All, 1).unwrap());
        assert_eq!(slugs(&page1), vec!["plain"]);
        assert!(!page1.needs_math);

        let page2 = found(build_listing(&tree, blog, ListingFilter::All, 2).unwrap());
        assert!(page2.needs_math);
    }

    #[test]
    fn summary_listing_only_scans_first_text_block() {
        let mut b = TreeBuilder::new(10).summary();
        let p = b.post("p", "2022-01-01T00:00:00+00:00", &[]);
        b.set_body(
            p,
            vec![
                Block::Text {
                    value: "<p>intro</p>".to_string(),
                },
                Block::Math {
                    source: "x".to_string(),
                },
            ],
        );
        let (tree, blog) = b.build();
        let listing = found(build_listing(&tree, blog, ListingFilter::All, 1).unwrap());
        assert!(!listing.needs_math);
    }
}
