//! In-memory page tree.
//!
//! The tree is the site's source of truth for hierarchy, visibility, and slug
//! lookup. Pages are stored in an arena indexed by [`PageId`]; parent/child
//! relations are tree positions, not collections on the pages themselves.
//!
//! Each page caches its URL path. Plain pages and indexes live at
//! `parent/slug/`; posts live at `parent/YYYY/MM/slug/`. The cache is
//! recomputed for the page and all of its descendants whenever a slug or
//! publication date changes through [`SiteTree::set_slug`] or
//! [`SiteTree::set_pub_date`], so it can never drift from the attributes it is
//! derived from.

use crate::naming::{is_valid_slug, slugify};
use crate::types::{Page, PageId, PageKind, Tag};
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("invalid slug {0:?}")]
    InvalidSlug(String),
    #[error("slug {slug:?} is already used under {parent}")]
    DuplicateSlug { parent: String, slug: String },
    #[error("page {0} is not a blog post")]
    NotAPost(PageId),
    #[error("tag {0:?} has no usable slug")]
    EmptyTag(String),
}

#[derive(Debug)]
struct Node {
    page: Page,
    parent: Option<PageId>,
    children: Vec<PageId>,
}

#[derive(Debug)]
pub struct SiteTree {
    nodes: Vec<Node>,
    tags: BTreeMap<String, Tag>,
}

impl SiteTree {
    /// Create a tree whose root (served at `/`) is `root`.
    pub fn new(mut root: Page) -> Self {
        root.id = PageId(0);
        root.slug.clear();
        root.url_path = "/".to_string();
        Self {
            nodes: vec![Node {
                page: root,
                parent: None,
                children: Vec::new(),
            }],
            tags: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> PageId {
        PageId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add `page` as the last child of `parent` and return its id.
    ///
    /// Slugs must be unique among siblings.
    pub fn insert(&mut self, parent: PageId, mut page: Page) -> Result<PageId, TreeError> {
        if !is_valid_slug(&page.slug) {
            return Err(TreeError::InvalidSlug(page.slug));
        }
        if self.child_by_slug(parent, &page.slug).is_some() {
            return Err(TreeError::DuplicateSlug {
                parent: self.page(parent).url_path.clone(),
                slug: page.slug,
            });
        }

        let id = PageId(self.nodes.len());
        page.id = id;
        page.url_path = derive_url_path(&self.page(parent).url_path, &page);
        self.nodes.push(Node {
            page,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn page(&self, id: PageId) -> &Page {
        &self.nodes[id.0].page
    }

    pub fn get(&self, id: PageId) -> Option<&Page> {
        self.nodes.get(id.0).map(|n| &n.page)
    }

    pub fn parent(&self, id: PageId) -> Option<PageId> {
        self.nodes[id.0].parent
    }

    /// All pages in insertion order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.nodes.iter().map(|n| &n.page)
    }

    pub fn children(&self, id: PageId) -> impl Iterator<Item = &Page> {
        self.nodes[id.0].children.iter().map(|c| self.page(*c))
    }

    /// Child of `id` with the given slug, regardless of visibility.
    pub fn child_by_slug(&self, id: PageId, slug: &str) -> Option<&Page> {
        self.children(id).find(|p| p.slug == slug)
    }

    /// Every page below `id`, depth-first in tree order.
    pub fn descendants(&self, id: PageId) -> Vec<&Page> {
        let mut out = Vec::new();
        let mut stack: Vec<PageId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(self.page(next));
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    /// Blog posts below `id`, regardless of visibility.
    pub fn descendant_posts(&self, id: PageId) -> Vec<&Page> {
        self.descendants(id)
            .into_iter()
            .filter(|p| p.is_post())
            .collect()
    }

    /// Whether `id` is served: the page and every page above it are live and
    /// public. A hidden section hides everything below it.
    pub fn is_visible(&self, id: PageId) -> bool {
        let mut next = Some(id);
        while let Some(current) = next {
            if !self.page(current).is_visible() {
                return false;
            }
            next = self.parent(current);
        }
        true
    }

    /// Served blog posts below `id`, in tree order.
    pub fn visible_posts(&self, id: PageId) -> Vec<&Page> {
        self.descendants(id)
            .into_iter()
            .filter(|p| p.is_post() && self.is_visible(p.id))
            .collect()
    }

    /// Look up a tag by name, registering it on first use. Returns the slug.
    pub fn intern_tag(&mut self, name: &str) -> Result<String, TreeError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(TreeError::EmptyTag(name.to_string()));
        }
        self.tags.entry(slug.clone()).or_insert_with(|| Tag {
            slug: slug.clone(),
            name: name.trim().to_string(),
        });
        Ok(slug)
    }

    pub fn tag(&self, slug: &str) -> Option<&Tag> {
        self.tags.get(slug)
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    /// Rename a page and refresh the cached URL paths below it.
    pub fn set_slug(&mut self, id: PageId, slug: &str) -> Result<(), TreeError> {
        if !is_valid_slug(slug) {
            return Err(TreeError::InvalidSlug(slug.to_string()));
        }
        if let Some(parent) = self.parent(id) {
            if self.children(parent).any(|p| p.id != id && p.slug == slug) {
                return Err(TreeError::DuplicateSlug {
                    parent: self.page(parent).url_path.clone(),
                    slug: slug.to_string(),
                });
            }
        }
        self.nodes[id.0].page.slug = slug.to_string();
        self.refresh_url_paths(id);
        Ok(())
    }

    /// Move a post to a new publication date and refresh its URL path.
    pub fn set_pub_date(
        &mut self,
        id: PageId,
        pub_date: DateTime<FixedOffset>,
    ) -> Result<(), TreeError> {
        match &mut self.nodes[id.0].page.kind {
            PageKind::BlogPost(post) => post.pub_date = pub_date,
            _ => return Err(TreeError::NotAPost(id)),
        }
        self.refresh_url_paths(id);
        Ok(())
    }

    fn refresh_url_paths(&mut self, id: PageId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let parent_path = match self.nodes[next.0].parent {
                Some(parent) => self.nodes[parent.0].page.url_path.clone(),
                None => {
                    stack.extend(self.nodes[next.0].children.iter().copied());
                    continue;
                }
            };
            let node = &mut self.nodes[next.0];
            node.page.url_path = derive_url_path(&parent_path, &node.page);
            stack.extend(node.children.iter().copied());
        }
    }
}

fn derive_url_path(parent_path: &str, page: &Page) -> String {
    match &page.kind {
        PageKind::BlogPost(post) => {
            format!("{parent_path}{}/{}/", post.date_segments(), page.slug)
        }
        _ => format!("{parent_path}{}/", page.slug),
    }
}
