//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Pages
//! 001 Nine Pints /
//!     002 Blog /blog/ (index, 3 per page, 7 posts)
//!         003 Hello /blog/2022/03/hello/
//!             Tags: python
//!         004 Unfinished /blog/2023/01/unfinished/ [draft]
//!     005 About /about/
//!
//! Tags
//!     maths (Maths, 1 post)
//!     python (Python, 2 posts)
//!
//! Config
//!     config.toml
//!     assets/
//! ```
//!
//! ## Resolve
//!
//! ```text
//! /blog/2021/01/hello/
//!     301 → /blog/2022/03/hello/
//!     post (non-canonical URL): Hello
//! ```
//!
//! ## Build
//!
//! ```text
//! Wrote 23 pages → dist
//!     Not found page: dist/err-404.html
//!     Assets: 2 files
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::enumerate::{Enumeration, bucket_counts};
use crate::generate::BuildReport;
use crate::routing::{MatchedPage, PageLike, Resolution};
use crate::scan::Site;
use crate::tree::SiteTree;
use crate::types::{Page, PageId};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Visibility markers: `[draft]`, `[private]`, or both.
fn page_flags(page: &Page) -> String {
    let mut flags = String::new();
    if !page.live {
        flags.push_str(" [draft]");
    }
    if !page.public {
        flags.push_str(" [private]");
    }
    flags
}

/// Format a page header line: positional index, title, URL, detail.
///
/// ```text
/// 002 Blog /blog/ (index, 3 per page, 7 posts)
/// ```
fn page_line(tree: &SiteTree, position: usize, page: &Page) -> String {
    let detail = match page.as_index() {
        Some(index) => format!(
            " (index, {} per page, {})",
            index.posts_per_page,
            plural(tree.visible_posts(page.id).len(), "post")
        ),
        None => String::new(),
    };
    format!(
        "{} {} {}{}{}",
        format_index(position),
        page.title,
        page.url_path(),
        detail,
        page_flags(page)
    )
}

// ============================================================================
// Scan
// ============================================================================

/// Format the loaded site as a page tree, tag registry, and config summary.
pub fn format_scan_output(site: &Site) -> Vec<String> {
    let tree = &site.tree;
    let mut lines = vec!["Pages".to_string()];
    let root = tree.page(tree.root());
    lines.push(page_line(tree, 1, root));
    let mut counter = 1;
    walk_pages(tree, tree.root(), 1, &mut counter, &mut lines);

    if tree.tags().next().is_some() {
        lines.push(String::new());
        lines.push("Tags".to_string());
        for tag in tree.tags() {
            let count = tree
                .pages()
                .filter(|p| tree.is_visible(p.id))
                .filter_map(|p| p.as_post())
                .filter(|post| post.tags.contains(&tag.slug))
                .count();
            lines.push(format!(
                "    {} ({}, {})",
                tag.slug,
                tag.name,
                plural(count, "post")
            ));
        }
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    if site.root.join("config.toml").exists() {
        lines.push("    config.toml".to_string());
    }
    if site.assets_dir().is_some() {
        lines.push("    assets/".to_string());
    }

    lines
}

fn walk_pages(
    tree: &SiteTree,
    parent: PageId,
    depth: usize,
    counter: &mut usize,
    lines: &mut Vec<String>,
) {
    for page in tree.children(parent) {
        *counter += 1;
        let pad = indent(depth);
        lines.push(format!("{pad}{}", page_line(tree, *counter, page)));
        if let Some(post) = page.as_post() {
            if !post.tags.is_empty() {
                let tags: Vec<&str> = post.tags.iter().map(String::as_str).collect();
                lines.push(format!("{pad}    Tags: {}", tags.join(", ")));
            }
        }
        walk_pages(tree, page.id, depth + 1, counter, lines);
    }
}

/// Print scan output to stdout.
pub fn print_scan_output(site: &Site) {
    for line in format_scan_output(site) {
        println!("{}", line);
    }
}

// ============================================================================
// Paths
// ============================================================================

/// One path per line, then any skipped listing buckets.
pub fn format_paths_output(enumeration: &Enumeration) -> Vec<String> {
    let mut lines = enumeration.paths.clone();
    if !enumeration.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for bucket in &enumeration.skipped {
            lines.push(format!(
                "    {} {}: {}",
                bucket.index, bucket.bucket, bucket.error
            ));
        }
    }
    lines
}

pub fn print_paths_output(enumeration: &Enumeration) {
    for line in format_paths_output(enumeration) {
        println!("{}", line);
    }
}

/// Per-bucket post counts of every blog index, for `paths --counts`.
pub fn format_bucket_counts(tree: &SiteTree) -> Vec<String> {
    let mut lines = Vec::new();
    for index in tree.pages().filter(|p| p.as_index().is_some()) {
        lines.push(format!("{}{}", index.url_path(), page_flags(index)));
        for (bucket, count) in bucket_counts(tree, index) {
            lines.push(format!("    {bucket}: {}", plural(count as usize, "post")));
        }
    }
    lines
}

// ============================================================================
// Resolve
// ============================================================================

/// Describe what a request path resolves to.
pub fn format_resolution(path: &str, resolution: &Resolution) -> Vec<String> {
    let status = resolution.status().code();
    let mut lines = vec![path.to_string()];
    match resolution.location() {
        Some(location) => lines.push(format!("    {status} → {location}")),
        None => lines.push(format!("    {status}")),
    }
    match resolution {
        Resolution::Page(matched) => {
            let page = matched.meta();
            let kind = match matched {
                MatchedPage::Real(_) => page.kind_name(),
                MatchedPage::RedirectOverride { .. } => "post (non-canonical URL)",
            };
            lines.push(format!("    {}: {}", kind, page.title));
        }
        Resolution::Listing(listing) => {
            lines.push(format!(
                "    Listing: {} (page {} of {})",
                listing.title, listing.window.number, listing.window.max_page
            ));
            for post in &listing.posts {
                lines.push(format!("        {}", post.url_path()));
            }
            if listing.needs_math {
                lines.push("    Needs math".to_string());
            }
        }
        Resolution::Redirect(_) | Resolution::NotFound => {}
    }
    lines
}

pub fn print_resolution(path: &str, resolution: &Resolution) {
    for line in format_resolution(path, resolution) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(report: &BuildReport, output_dir: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Wrote {} → {}",
        plural(report.written.len(), "page"),
        output_dir.display()
    )];
    lines.push(format!(
        "    Not found page: {}",
        report.not_found_page.display()
    ));
    if report.assets_copied > 0 {
        lines.push(format!("    Assets: {}", plural(report.assets_copied, "file")));
    }
    for unexpected in &report.unexpected {
        lines.push(format!(
            "    Not written: {} ({})",
            unexpected.path, unexpected.status
        ));
    }
    for bucket in &report.skipped {
        lines.push(format!(
            "    Skipped: {} {}: {}",
            bucket.index, bucket.bucket, bucket.error
        ));
    }
    lines
}

pub fn print_build_output(report: &BuildReport, output_dir: &Path) {
    for line in format_build_output(report, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
