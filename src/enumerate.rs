//! Static path enumeration.
//!
//! Produces every URL the router answers with a 200 so a static build can
//! pre-render them: each visible page's canonical URL, and for each visible
//! blog index every page of every listing (all posts, each tag, each year,
//! each year+month that has at least one visible post).
//!
//! Each listing "bucket" gets its own page count from the pagination engine,
//! computed against that bucket's filtered post count. A bucket whose page
//! count cannot be computed is skipped and reported in
//! [`Enumeration::skipped`]; the rest of the pass carries on.

use crate::listing::ListingFilter;
use crate::pagination::{PaginationError, max_page};
use crate::tree::SiteTree;
use crate::types::Page;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A listing bucket left out of the enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBucket {
    /// URL path of the blog index the bucket belongs to.
    pub index: String,
    pub bucket: ListingFilter,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Enumeration {
    /// Strictly sorted, deduplicated URL paths.
    pub paths: Vec<String>,
    pub skipped: Vec<SkippedBucket>,
}

impl Enumeration {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Enumerate every URL a static build must render.
pub fn enumerate(tree: &SiteTree) -> Enumeration {
    let mut paths = BTreeSet::new();
    let mut skipped = Vec::new();

    for page in tree.pages().filter(|p| tree.is_visible(p.id)) {
        paths.insert(page.url_path().to_string());
        if page.as_index().is_some() {
            enumerate_index(tree, page, &mut paths, &mut skipped);
        }
    }

    for bucket in &skipped {
        tracing::warn!(
            index = %bucket.index,
            bucket = %bucket.bucket,
            error = %bucket.error,
            "skipped listing bucket"
        );
    }

    Enumeration {
        paths: paths.into_iter().collect(),
        skipped,
    }
}

/// Visible post counts per listing bucket of one index.
pub fn bucket_counts(tree: &SiteTree, index: &Page) -> BTreeMap<ListingFilter, u64> {
    let mut counts = BTreeMap::new();
    counts.insert(ListingFilter::All, 0);
    for post in tree.visible_posts(index.id).iter().filter_map(|p| p.as_post()) {
        let buckets = post
            .tags
            .iter()
            .map(|slug| ListingFilter::Tag { slug: slug.clone() })
            .chain([
                ListingFilter::All,
                ListingFilter::Year { year: post.year() },
                ListingFilter::Month {
                    year: post.year(),
                    month: post.month(),
                },
            ]);
        for bucket in buckets {
            *counts.entry(bucket).or_insert(0) += 1;
        }
    }
    counts
}

fn enumerate_index(
    tree: &SiteTree,
    index: &Page,
    paths: &mut BTreeSet<String>,
    skipped: &mut Vec<SkippedBucket>,
) {
    let Some(blog) = index.as_index() else {
        return;
    };
    let prefix = index.url_path();

    for (bucket, count) in bucket_counts(tree, index) {
        match bucket_pages(count, blog.posts_per_page) {
            Ok(pages) => {
                for page in 1..=pages {
                    paths.insert(bucket.url(prefix, page));
                }
            }
            Err(e) => skipped.push(SkippedBucket {
                index: prefix.to_string(),
                bucket,
                error: e.to_string(),
            }),
        }
    }
}

fn bucket_pages(count: u64, posts_per_page: u64) -> Result<u64, PaginationError> {
    max_page(count, posts_per_page)
}
