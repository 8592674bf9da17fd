//! Directory names and slugs.
//!
//! Content directories follow the `NNN-name` convention: an optional numeric
//! prefix that orders the page in navigation, followed by the page slug.
//! Unnumbered directories still become pages but stay out of navigation.
//!
//! - `010-blog/`   → slug `blog`, sort key 10, in nav
//! - `020-about-me/` → slug `about-me`, sort key 20, in nav
//! - `hello-world/` → slug `hello-world`, not in nav
//!
//! Tag names are turned into slugs with [`slugify`], which transliterates to
//! ASCII first so `Über Café` and `uber-cafe` land on the same tag.

use deunicode::deunicode;

/// Result of parsing a content directory name like `010-blog`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g., `10` from `010-blog`)
    pub number: Option<u32>,
    /// URL slug: the name with the number prefix removed.
    pub slug: String,
    /// Default title: slug with dashes converted to spaces.
    pub display_title: String,
}

impl ParsedName {
    pub fn in_nav(&self) -> bool {
        self.number.is_some()
    }

    /// Sort key for navigation; unnumbered entries sort last.
    pub fn sort_key(&self) -> u32 {
        self.number.unwrap_or(u32::MAX)
    }
}

/// Parse a directory name following the `NNN-name` convention.
///
/// A purely numeric name (`2022`) is a slug, not a prefix.
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some((prefix, rest)) = name.split_once('-') {
        if let (false, Ok(num)) = (rest.is_empty(), prefix.parse::<u32>()) {
            return ParsedName {
                number: Some(num),
                slug: rest.to_string(),
                display_title: rest.replace('-', " "),
            };
        }
    }
    parse_post_name(name)
}

/// Post directories take their name verbatim: `2022-recap` is slug
/// `2022-recap`, never a nav entry.
pub fn parse_post_name(name: &str) -> ParsedName {
    ParsedName {
        number: None,
        slug: name.to_string(),
        display_title: name.replace('-', " "),
    }
}

/// Turn a free-form label into a URL slug.
///
/// ASCII-transliterates, lowercases, and collapses every run of
/// non-alphanumerics into a single `-`, trimming dashes at both ends.
pub fn slugify(label: &str) -> String {
    let ascii = deunicode(label).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Whether `slug` is usable as a single URL path segment.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
