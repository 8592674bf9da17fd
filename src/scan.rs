//! Content directory loading.
//!
//! Walks a content directory and builds the [`SiteTree`]. The filesystem is
//! the data source: every directory is a page, described by a `page.toml`.
//!
//! ## Directory Structure
//!
//! ```text
//! content/
//! ├── config.toml                  # Site configuration (optional)
//! ├── page.toml                    # Home page (optional)
//! ├── assets/                      # Copied verbatim to the build root
//! ├── 010-blog/                    # Blog index (numbered = in nav)
//! │   ├── page.toml                # kind = "index"
//! │   ├── hello-world/
//! │   │   └── page.toml            # kind = "post"
//! │   └── second-post/
//! │       └── page.toml
//! └── 020-about/
//!     ├── page.toml                # kind = "page"
//!     └── body.md                  # Markdown body for plain pages
//! ```
//!
//! ## page.toml
//!
//! ```toml
//! kind = "post"                    # "page" (default), "index", or "post"
//! title = "Hello, world"           # defaults to the directory name
//! live = true                      # false = draft
//! public = true                    # false = access-restricted
//!
//! # posts
//! pub_date = "2022-03-15T10:00:00+00:00"
//! tags = ["Python", "Rust"]
//! hero = { image = "/assets/hero.svg", image_dark = "/assets/hero-dark.svg", text_color = "light" }
//!
//! [[body]]
//! type = "text"
//! value = "<p>Hello!</p>"
//!
//! # indexes
//! posts_per_page = 10              # defaults to [blog] posts_per_page
//! listing = "summary"              # "full" (default) or "summary"
//! ```
//!
//! ## Validation
//!
//! - Every directory (except `assets/` and hidden ones) has a `page.toml`
//! - Posts sit directly under a blog index and carry a `pub_date`
//! - Children of a blog index do not collide with the listing grammar
//!   (`tag`, `page`, all-digit slugs)
//!
//! Post directories keep their full name as the slug: `2022-recap/` under an
//! index is served at `.../2022-recap/`, and posts never appear in navigation.
//! The `NNN-` prefix only applies to plain pages and indexes.
//! - Slugs are unique among siblings; indexes have a non-zero page size

use crate::blocks::Block;
use crate::config::{self, SiteConfig};
use crate::naming::{parse_entry_name, parse_post_name};
use crate::tree::{SiteTree, TreeError};
use crate::types::{
    BlogIndex, BlogPost, GenericPage, HeroImage, ListingStyle, Page, PageId, PageKind,
};
use chrono::DateTime;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PAGE_FILE: &str = "page.toml";
const BODY_FILE: &str = "body.md";
const ASSETS_DIR: &str = "assets";

/// Post slugs that would be shadowed by, or shadow, listing URLs.
const RESERVED_INDEX_CHILD_SLUGS: &[&str] = &["tag", "page"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid {}: {source}", .path.display())]
    PageFile {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Directory has no page.toml: {}", .0.display())]
    MissingPageFile(PathBuf),
    #[error("Root page must be a plain page: {}", .0.display())]
    RootKind(PathBuf),
    #[error("Post has no pub_date: {}", .0.display())]
    MissingPubDate(PathBuf),
    #[error("Invalid pub_date {value:?} in {}: {source}", .path.display())]
    InvalidDate {
        path: PathBuf,
        value: String,
        source: chrono::ParseError,
    },
    #[error("Post is not directly under a blog index: {}", .0.display())]
    PostOutsideIndex(PathBuf),
    #[error("Slug {slug:?} under a blog index clashes with listing URLs: {}", .path.display())]
    ReservedSlug { path: PathBuf, slug: String },
    #[error("posts_per_page must be at least 1: {}", .0.display())]
    ZeroPageSize(PathBuf),
    #[error("{}: {source}", .path.display())]
    Tree { path: PathBuf, source: TreeError },
}

/// A loaded site: the page tree plus its configuration.
#[derive(Debug)]
pub struct Site {
    pub tree: SiteTree,
    pub config: SiteConfig,
    /// Content root the site was loaded from.
    pub root: PathBuf,
}

impl Site {
    /// `assets/` under the content root, if present.
    pub fn assets_dir(&self) -> Option<PathBuf> {
        let dir = self.root.join(ASSETS_DIR);
        dir.is_dir().then_some(dir)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PageFileKind {
    #[default]
    Page,
    Index,
    Post,
}

fn yes() -> bool {
    true
}

/// Contents of a `page.toml`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PageFile {
    #[serde(default)]
    kind: PageFileKind,
    title: Option<String>,
    #[serde(default = "yes")]
    live: bool,
    #[serde(default = "yes")]
    public: bool,
    posts_per_page: Option<u64>,
    listing: Option<ListingStyle>,
    pub_date: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    hero: Option<HeroImage>,
    #[serde(default)]
    body: Vec<Block>,
}

impl Default for PageFile {
    fn default() -> Self {
        Self {
            kind: PageFileKind::Page,
            title: None,
            live: true,
            public: true,
            posts_per_page: None,
            listing: None,
            pub_date: None,
            tags: Vec::new(),
            hero: None,
            body: Vec::new(),
        }
    }
}

pub fn scan(root: &Path) -> Result<Site, ScanError> {
    let config = config::load_config(root)?;

    let root_file = match read_page_file(root)? {
        Some(file) => file,
        None => PageFile::default(),
    };
    if root_file.kind != PageFileKind::Page {
        return Err(ScanError::RootKind(root.to_path_buf()));
    }
    let title = root_file
        .title
        .clone()
        .unwrap_or_else(|| config.site.title.clone());
    let mut home = Page::new("", title, PageKind::Generic(read_generic(root)?));
    home.live = root_file.live;
    home.public = root_file.public;

    let mut tree = SiteTree::new(home);
    let root_id = tree.root();
    scan_children(root, root_id, &mut tree, &config)?;

    tracing::debug!(pages = tree.len(), tags = tree.tags().count(), "content scanned");
    Ok(Site {
        tree,
        config,
        root: root.to_path_buf(),
    })
}

fn scan_children(
    dir: &Path,
    parent: PageId,
    tree: &mut SiteTree,
    config: &SiteConfig,
) -> Result<(), ScanError> {
    let is_root = tree.parent(parent).is_none();
    let mut subdirs: Vec<PathBuf> = collect_entries(dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .filter(|p| !(is_root && p.file_name().is_some_and(|n| n == ASSETS_DIR)))
        .collect();

    subdirs.sort_by_key(|d| {
        let name = dir_name(d);
        (parse_entry_name(&name).sort_key(), name)
    });

    for subdir in subdirs {
        let id = scan_page(&subdir, parent, tree, config)?;
        scan_children(&subdir, id, tree, config)?;
    }
    Ok(())
}

fn scan_page(
    dir: &Path,
    parent: PageId,
    tree: &mut SiteTree,
    config: &SiteConfig,
) -> Result<PageId, ScanError> {
    let file = read_page_file(dir)?.ok_or_else(|| ScanError::MissingPageFile(dir.to_path_buf()))?;
    let name = dir_name(dir);
    let parsed = match file.kind {
        PageFileKind::Post => parse_post_name(&name),
        _ => parse_entry_name(&name),
    };
    if tree.page(parent).as_index().is_some() && is_reserved_index_child_slug(&parsed.slug) {
        return Err(ScanError::ReservedSlug {
            path: dir.to_path_buf(),
            slug: parsed.slug,
        });
    }
    let title = file
        .title
        .clone()
        .unwrap_or_else(|| parsed.display_title.clone());

    let kind = match file.kind {
        PageFileKind::Page => PageKind::Generic(read_generic(dir)?),
        PageFileKind::Index => {
            let posts_per_page = file.posts_per_page.unwrap_or(config.blog.posts_per_page);
            if posts_per_page == 0 {
                return Err(ScanError::ZeroPageSize(dir.to_path_buf()));
            }
            PageKind::BlogIndex(BlogIndex {
                posts_per_page,
                listing: file.listing.unwrap_or(config.blog.listing),
            })
        }
        PageFileKind::Post => {
            if tree.page(parent).as_index().is_none() {
                return Err(ScanError::PostOutsideIndex(dir.to_path_buf()));
            }
            PageKind::BlogPost(build_post(dir, file.pub_date.as_deref(), &file, tree)?)
        }
    };

    let mut page = Page::new(parsed.slug.clone(), title, kind);
    page.live = file.live;
    page.public = file.public;
    page.in_nav = parsed.in_nav();
    page.sort_key = parsed.sort_key();

    tree.insert(parent, page).map_err(|source| ScanError::Tree {
        path: dir.to_path_buf(),
        source,
    })
}

fn build_post(
    dir: &Path,
    pub_date: Option<&str>,
    file: &PageFile,
    tree: &mut SiteTree,
) -> Result<BlogPost, ScanError> {
    let value = pub_date.ok_or_else(|| ScanError::MissingPubDate(dir.to_path_buf()))?;
    let pub_date =
        DateTime::parse_from_rfc3339(value).map_err(|source| ScanError::InvalidDate {
            path: dir.to_path_buf(),
            value: value.to_string(),
            source,
        })?;

    let mut tags = BTreeSet::new();
    for name in &file.tags {
        let slug = tree.intern_tag(name).map_err(|source| ScanError::Tree {
            path: dir.to_path_buf(),
            source,
        })?;
        tags.insert(slug);
    }

    Ok(BlogPost {
        pub_date,
        tags,
        body: file.body.clone(),
        hero: file.hero.clone(),
    })
}

fn is_reserved_index_child_slug(slug: &str) -> bool {
    RESERVED_INDEX_CHILD_SLUGS.contains(&slug) || slug.chars().all(|c| c.is_ascii_digit())
}

fn read_page_file(dir: &Path) -> Result<Option<PageFile>, ScanError> {
    let path = dir.join(PAGE_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content)
        .map(Some)
        .map_err(|source| ScanError::PageFile { path, source })
}

fn read_generic(dir: &Path) -> Result<GenericPage, ScanError> {
    let body_path = dir.join(BODY_FILE);
    let body = if body_path.exists() {
        fs::read_to_string(&body_path)?
    } else {
        String::new()
    };
    Ok(GenericPage { body })
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn collect_entries(path: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| !dir_name(p).starts_with('.'))
        .collect();

    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{find_page, setup_fixtures};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_page(root: &Path, rel: &str, toml: &str) {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(PAGE_FILE), toml).unwrap();
    }

    fn blog_with_post(post_toml: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "010-blog", r#"kind = "index""#);
        write_page(tmp.path(), "010-blog/hello", post_toml);
        tmp
    }

    #[test]
    fn fixtures_load() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        let blog = find_page(&site.tree, "/blog/");
        assert_eq!(blog.title, "Blog");
        assert_eq!(blog.as_index().unwrap().posts_per_page, 3);
        assert!(blog.in_nav);
        assert!(site.tree.visible_posts(blog.id).len() >= 7);
        assert!(site.assets_dir().is_some());
    }

    #[test]
    fn fixture_post_url_uses_pub_date() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        let hello = find_page(&site.tree, "/blog/2022/03/hello/");
        assert_eq!(hello.title, "Hello");
        assert!(hello.as_post().unwrap().tags.contains("python"));
    }

    #[test]
    fn about_page_reads_markdown_body() {
        let tmp = setup_fixtures();
        let site = scan(tmp.path()).unwrap();
        let about = find_page(&site.tree, "/about/");
        match &about.kind {
            PageKind::Generic(page) => assert!(page.body.contains("# About")),
            other => panic!("expected a plain page, got {other:?}"),
        }
    }

    #[test]
    fn numbered_directories_sort_first_and_show_in_nav() {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "zzz-hidden", "");
        write_page(tmp.path(), "020-second", "");
        write_page(tmp.path(), "010-first", "");
        let site = scan(tmp.path()).unwrap();
        let children: Vec<(String, bool)> = site
            .tree
            .children(site.tree.root())
            .map(|p| (p.slug.clone(), p.in_nav))
            .collect();
        assert_eq!(
            children,
            vec![
                ("first".to_string(), true),
                ("second".to_string(), true),
                ("zzz-hidden".to_string(), false),
            ]
        );
    }

    #[test]
    fn title_defaults_to_directory_name() {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "010-about-me", "");
        let site = scan(tmp.path()).unwrap();
        assert_eq!(find_page(&site.tree, "/about-me/").title, "about me");
    }

    #[test]
    fn index_inherits_default_page_size() {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "blog", r#"kind = "index""#);
        let site = scan(tmp.path()).unwrap();
        let blog = find_page(&site.tree, "/blog/").as_index().unwrap();
        assert_eq!(blog.posts_per_page, 10);
        assert_eq!(blog.listing, ListingStyle::Full);
    }

    #[test]
    fn zero_page_size_is_error() {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "blog", "kind = \"index\"\nposts_per_page = 0");
        assert!(matches!(scan(tmp.path()), Err(ScanError::ZeroPageSize(_))));
    }

    #[test]
    fn missing_page_file_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("orphan")).unwrap();
        assert!(matches!(
            scan(tmp.path()),
            Err(ScanError::MissingPageFile(_))
        ));
    }

    #[test]
    fn assets_directory_is_not_a_page() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("assets")).unwrap();
        let site = scan(tmp.path()).unwrap();
        assert_eq!(site.tree.len(), 1);
    }

    #[test]
    fn post_without_date_is_error() {
        let tmp = blog_with_post(r#"kind = "post""#);
        assert!(matches!(scan(tmp.path()), Err(ScanError::MissingPubDate(_))));
    }

    #[test]
    fn malformed_date_is_error() {
        let tmp = blog_with_post("kind = \"post\"\npub_date = \"last tuesday\"");
        assert!(matches!(
            scan(tmp.path()),
            Err(ScanError::InvalidDate { .. })
        ));
    }

    #[test]
    fn post_outside_index_is_error() {
        let tmp = TempDir::new().unwrap();
        write_page(
            tmp.path(),
            "stray",
            "kind = \"post\"\npub_date = \"2022-01-01T00:00:00Z\"",
        );
        assert!(matches!(
            scan(tmp.path()),
            Err(ScanError::PostOutsideIndex(_))
        ));
    }

    #[test]
    fn reserved_post_slugs_rejected() {
        for slug in ["tag", "page", "2022"] {
            let tmp = TempDir::new().unwrap();
            write_page(tmp.path(), "blog", r#"kind = "index""#);
            write_page(
                tmp.path(),
                &format!("blog/{slug}"),
                "kind = \"post\"\npub_date = \"2022-01-01T00:00:00Z\"",
            );
            assert!(
                matches!(scan(tmp.path()), Err(ScanError::ReservedSlug { .. })),
                "{slug} should be rejected"
            );
        }
    }

    #[test]
    fn reserved_slugs_rejected_for_any_index_child() {
        for slug in ["2022", "tag", "010-page"] {
            let tmp = TempDir::new().unwrap();
            write_page(tmp.path(), "blog", r#"kind = "index""#);
            write_page(tmp.path(), &format!("blog/{slug}"), r#"title = "Archive""#);
            assert!(
                matches!(scan(tmp.path()), Err(ScanError::ReservedSlug { .. })),
                "{slug} should be rejected"
            );
        }
    }

    #[test]
    fn numeric_slugs_allowed_outside_blog_indexes() {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "archive", r#"title = "Archive""#);
        write_page(tmp.path(), "archive/2022", r#"title = "2022""#);
        let site = scan(tmp.path()).unwrap();
        assert!(site.tree.pages().any(|p| p.url_path() == "/archive/2022/"));
    }

    #[test]
    fn post_directory_keeps_numeric_prefix_in_slug() {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "blog", r#"kind = "index""#);
        write_page(
            tmp.path(),
            "blog/2022-recap",
            "kind = \"post\"\npub_date = \"2022-12-30T00:00:00Z\"",
        );
        let site = scan(tmp.path()).unwrap();
        let recap = site.tree.pages().find(|p| p.is_post()).unwrap();
        assert_eq!(recap.slug, "2022-recap");
        assert_eq!(recap.url_path(), "/blog/2022/12/2022-recap/");
        assert!(!recap.in_nav);
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "about", "tilte = \"typo\"");
        assert!(matches!(scan(tmp.path()), Err(ScanError::PageFile { .. })));
    }

    #[test]
    fn tags_deduplicate_by_slug() {
        let tmp = TempDir::new().unwrap();
        write_page(tmp.path(), "blog", r#"kind = "index""#);
        write_page(
            tmp.path(),
            "blog/a",
            "kind = \"post\"\npub_date = \"2022-01-01T00:00:00Z\"\ntags = [\"Rust Lang\"]",
        );
        write_page(
            tmp.path(),
            "blog/b",
            "kind = \"post\"\npub_date = \"2022-01-02T00:00:00Z\"\ntags = [\"rust-lang\"]",
        );
        let site = scan(tmp.path()).unwrap();
        assert_eq!(site.tree.tags().count(), 1);
        assert_eq!(site.tree.tag("rust-lang").unwrap().name, "Rust Lang");
    }

    #[test]
    fn drafts_and_private_posts_are_loaded_with_flags() {
        let tmp = blog_with_post(
            "kind = \"post\"\npub_date = \"2022-01-01T00:00:00Z\"\nlive = false\npublic = false",
        );
        let site = scan(tmp.path()).unwrap();
        let post = find_page(&site.tree, "/blog/2022/01/hello/");
        assert!(!post.live);
        assert!(!post.public);
    }

    #[test]
    fn hero_and_body_blocks_parse() {
        let tmp = blog_with_post(
            r#"
kind = "post"
pub_date = "2022-01-01T00:00:00+01:00"
hero = { image = "/assets/h.svg", text_color = "dark" }

[[body]]
type = "math"
source = "e^{i\\pi}"
"#,
        );
        let site = scan(tmp.path()).unwrap();
        let post = find_page(&site.tree, "/blog/2022/01/hello/")
            .as_post()
            .unwrap();
        assert_eq!(post.body.len(), 1);
        assert_eq!(post.hero.as_ref().unwrap().image, "/assets/h.svg");
    }

    #[test]
    fn root_must_be_plain_page() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(PAGE_FILE), r#"kind = "index""#).unwrap();
        assert!(matches!(scan(tmp.path()), Err(ScanError::RootKind(_))));
    }
}
