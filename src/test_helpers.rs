//! Shared test utilities for the ninepints test suite.
//!
//! Two ways to get a site under test:
//!
//! - [`TreeBuilder`] assembles a tree in memory: a root page with a single
//!   blog index at `/blog/`, plus whatever posts a test adds.
//! - [`setup_fixtures`] copies `fixtures/content/` into a temp directory for
//!   tests that go through [`crate::scan::scan`].
//!
//! ```rust
//! let mut b = TreeBuilder::new(3);
//! b.post("hello", "2022-03-15T12:00:00+00:00", &["python"]);
//! let (tree, blog) = b.build();
//! let router = Router::new(&tree);
//! assert_status(&router, "/blog/2022/03/hello/", Status::Ok);
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use chrono::DateTime;
use tempfile::TempDir;

use crate::blocks::Block;
use crate::listing::{Listing, ListingPage};
use crate::routing::{Router, Status};
use crate::tree::SiteTree;
use crate::types::{
    BlogIndex, BlogPost, GenericPage, HeroImage, ListingStyle, Page, PageId, PageKind,
};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// In-memory trees
// =========================================================================

struct PendingPost {
    slug: String,
    date: String,
    tags: Vec<String>,
    live: bool,
    public: bool,
    body: Vec<Block>,
    hero: Option<HeroImage>,
}

/// Builds a root page with one blog index at `/blog/`.
pub struct TreeBuilder {
    posts_per_page: u64,
    listing: ListingStyle,
    index_public: bool,
    extra_children: Vec<Page>,
    posts: Vec<PendingPost>,
}

impl TreeBuilder {
    pub fn new(posts_per_page: u64) -> Self {
        Self {
            posts_per_page,
            listing: ListingStyle::Full,
            index_public: true,
            extra_children: Vec::new(),
            posts: Vec::new(),
        }
    }

    pub fn summary(mut self) -> Self {
        self.listing = ListingStyle::Summary;
        self
    }

    /// Make the blog index itself access-restricted.
    pub fn private_index(mut self) -> Self {
        self.index_public = false;
        self
    }

    /// Add a live, public post. Returns a handle for [`Self::set_body`].
    pub fn post(&mut self, slug: &str, date: &str, tags: &[&str]) -> usize {
        self.posts.push(PendingPost {
            slug: slug.to_string(),
            date: date.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            live: true,
            public: true,
            body: Vec::new(),
            hero: None,
        });
        self.posts.len() - 1
    }

    /// Add a post that is not live.
    pub fn draft(&mut self, slug: &str, date: &str) -> usize {
        let handle = self.post(slug, date, &[]);
        self.posts[handle].live = false;
        handle
    }

    /// Add a live post that is access-restricted.
    pub fn private(&mut self, slug: &str, date: &str) -> usize {
        let handle = self.post(slug, date, &[]);
        self.posts[handle].public = false;
        handle
    }

    pub fn set_body(&mut self, handle: usize, body: Vec<Block>) {
        self.posts[handle].body = body;
    }

    pub fn set_hero(&mut self, handle: usize, hero: HeroImage) {
        self.posts[handle].hero = Some(hero);
    }

    /// Add a plain page under the blog index.
    pub fn child_page(&mut self, slug: &str) {
        self.extra_children.push(generic_page(slug));
    }

    pub fn build(self) -> (SiteTree, PageId) {
        let mut tree = SiteTree::new(generic_page("home"));
        let mut index = Page::new(
            "blog",
            "Blog",
            PageKind::BlogIndex(BlogIndex {
                posts_per_page: self.posts_per_page,
                listing: self.listing,
            }),
        );
        index.public = self.index_public;
        let blog = tree.insert(tree.root(), index).unwrap();

        for page in self.extra_children {
            tree.insert(blog, page).unwrap();
        }

        for pending in self.posts {
            let tags: BTreeSet<String> = pending
                .tags
                .iter()
                .map(|t| tree.intern_tag(t).unwrap())
                .collect();
            let mut page = Page::new(
                pending.slug.clone(),
                pending.slug.replace('-', " "),
                PageKind::BlogPost(BlogPost {
                    pub_date: DateTime::parse_from_rfc3339(&pending.date).unwrap(),
                    tags,
                    body: pending.body,
                    hero: pending.hero,
                }),
            );
            page.live = pending.live;
            page.public = pending.public;
            tree.insert(blog, page).unwrap();
        }

        (tree, blog)
    }
}

pub fn generic_page(slug: &str) -> Page {
    Page::new(slug, slug, PageKind::Generic(GenericPage::default()))
}

// =========================================================================
// Assertions
// =========================================================================

/// Unwrap a listing that is expected to exist.
pub fn found(page: ListingPage<'_>) -> Listing<'_> {
    match page {
        ListingPage::Found(listing) => listing,
        ListingPage::Redirect(url) => panic!("expected a listing, got redirect to {url}"),
    }
}

/// Assert the status `path` resolves to.
pub fn assert_status(router: &Router, path: &str, expected: Status) {
    let resolution = router.resolve(path);
    assert_eq!(
        resolution.status(),
        expected,
        "unexpected status for {path} (location: {:?})",
        resolution.location()
    );
}

/// Assert `path` redirects with `status` to `location`.
pub fn assert_redirect(router: &Router, path: &str, status: Status, location: &str) {
    let resolution = router.resolve(path);
    assert_eq!(resolution.status(), status, "unexpected status for {path}");
    assert_eq!(
        resolution.location().as_deref(),
        Some(location),
        "unexpected redirect target for {path}"
    );
}

/// Find a page by URL path. Panics if not found.
pub fn find_page<'a>(tree: &'a SiteTree, url_path: &str) -> &'a Page {
    tree.pages()
        .find(|p| p.url_path() == url_path)
        .unwrap_or_else(|| {
            let urls: Vec<&str> = tree.pages().map(|p| p.url_path()).collect();
            panic!("page '{url_path}' not found. Available: {urls:?}")
        })
}
