//! Page data model shared by the tree, the router, and the renderers.
//!
//! Every node in the site tree is a [`Page`]: common metadata (slug, title,
//! visibility, cached URL path) plus a [`PageKind`] carrying what is specific
//! to blog indexes, blog posts, and plain pages.

use crate::blocks::{Block, MathScope};
use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable identity of a page within a [`crate::tree::SiteTree`].
///
/// Ids are handed out in insertion order, which makes them the tie-breaker
/// for posts published at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PageId(pub(crate) usize);

impl PageId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    pub id: PageId,
    /// Single URL segment. Empty only for the root page.
    pub slug: String,
    pub title: String,
    /// Not a draft.
    pub live: bool,
    /// Not access-restricted.
    pub public: bool,
    /// Whether this page is listed in site navigation (numbered directory).
    pub in_nav: bool,
    /// Navigation sort key from the directory number prefix.
    pub sort_key: u32,
    /// Cached URL path, always starting and ending with `/`. Maintained by
    /// the tree whenever a slug or publication date changes.
    pub(crate) url_path: String,
    pub kind: PageKind,
}

impl Page {
    pub fn new(slug: impl Into<String>, title: impl Into<String>, kind: PageKind) -> Self {
        Self {
            id: PageId(0),
            slug: slug.into(),
            title: title.into(),
            live: true,
            public: true,
            in_nav: false,
            sort_key: u32::MAX,
            url_path: String::new(),
            kind,
        }
    }

    pub fn url_path(&self) -> &str {
        &self.url_path
    }

    /// Live and public: the only pages that are served or listed.
    pub fn is_visible(&self) -> bool {
        self.live && self.public
    }

    pub fn as_post(&self) -> Option<&BlogPost> {
        match &self.kind {
            PageKind::BlogPost(post) => Some(post),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<&BlogIndex> {
        match &self.kind {
            PageKind::BlogIndex(index) => Some(index),
            _ => None,
        }
    }

    pub fn is_post(&self) -> bool {
        self.as_post().is_some()
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            PageKind::Generic(_) => "page",
            PageKind::BlogIndex(_) => "index",
            PageKind::BlogPost(_) => "post",
        }
    }
}

#[derive(Debug, Clone)]
pub enum PageKind {
    /// Home, about, and other plain pages.
    Generic(GenericPage),
    BlogIndex(BlogIndex),
    BlogPost(BlogPost),
}

#[derive(Debug, Clone, Default)]
pub struct GenericPage {
    /// Markdown source.
    pub body: String,
}

/// Which part of each post a listing page shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStyle {
    /// Whole post bodies.
    #[default]
    Full,
    /// Only each post's first text block.
    Summary,
}

impl ListingStyle {
    pub fn math_scope(self) -> MathScope {
        match self {
            ListingStyle::Full => MathScope::FullBody,
            ListingStyle::Summary => MathScope::FirstTextBlock,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlogIndex {
    /// Posts per pagination page. Validated to be non-zero when loaded.
    pub posts_per_page: u64,
    pub listing: ListingStyle,
}

#[derive(Debug, Clone)]
pub struct BlogPost {
    pub pub_date: DateTime<FixedOffset>,
    /// Tag slugs; names live in the tree's tag registry.
    pub tags: BTreeSet<String>,
    pub body: Vec<Block>,
    pub hero: Option<HeroImage>,
}

impl BlogPost {
    /// Publication year in the timestamp's own offset.
    pub fn year(&self) -> i32 {
        self.pub_date.year()
    }

    /// Publication month (1-12) in the timestamp's own offset.
    pub fn month(&self) -> u32 {
        self.pub_date.month()
    }

    /// `YYYY/MM` as it appears in the post's URL.
    pub fn date_segments(&self) -> String {
        format!("{}/{:02}", self.year(), self.month())
    }
}

/// Banner image shown above a post, with an optional dark-mode variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeroImage {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_dark: Option<String>,
    pub text_color: HeroTextColor,
}

/// Colour of text overlaid on a hero image, chosen for contrast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroTextColor {
    Light,
    Dark,
    Either,
}

impl HeroTextColor {
    pub fn css_class(self) -> &'static str {
        match self {
            HeroTextColor::Light => "hero-text-light",
            HeroTextColor::Dark => "hero-text-dark",
            HeroTextColor::Either => "hero-text-either",
        }
    }
}

/// A deduplicated label shared by any number of posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub slug: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_on(date: &str) -> BlogPost {
        BlogPost {
            pub_date: DateTime::parse_from_rfc3339(date).unwrap(),
            tags: BTreeSet::new(),
            body: vec![],
            hero: None,
        }
    }

    #[test]
    fn date_segments_zero_pad_month() {
        assert_eq!(post_on("2022-03-15T09:00:00+00:00").date_segments(), "2022/03");
        assert_eq!(post_on("2021-11-01T00:00:00+00:00").date_segments(), "2021/11");
    }

    #[test]
    fn year_and_month_use_the_timestamp_offset() {
        // 23:30 on the 31st in UTC-5 is already the 1st in UTC.
        let post = post_on("2021-12-31T23:30:00-05:00");
        assert_eq!((post.year(), post.month()), (2021, 12));
    }

    #[test]
    fn visibility_needs_live_and_public() {
        let mut page = Page::new("a", "A", PageKind::Generic(GenericPage::default()));
        assert!(page.is_visible());
        page.public = false;
        assert!(!page.is_visible());
        page.public = true;
        page.live = false;
        assert!(!page.is_visible());
    }

    #[test]
    fn listing_style_selects_math_scope() {
        assert_eq!(ListingStyle::Full.math_scope(), MathScope::FullBody);
        assert_eq!(ListingStyle::Summary.math_scope(), MathScope::FirstTextBlock);
    }
}
