//! Page-bounds arithmetic for post listings.
//!
//! Every listing view (all posts, by tag, by year, by month) and the static
//! path enumerator go through [`paginate`], so the routes the resolver accepts
//! and the URLs the exporter writes can never disagree about how many pages
//! exist.
//!
//! ## Rules
//!
//! ```text
//! max_page = max(ceil(total / size), 1)
//!
//! requested < 1            → OutOfRange { canonical: 1 }
//! requested > max_page     → OutOfRange { canonical: max_page }
//! otherwise                → Ok(window)
//! ```
//!
//! An empty collection still has exactly one (empty) page, so page 1 of an
//! empty tag or month serves an empty listing instead of redirecting.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page size must be at least 1")]
    ZeroPageSize,
}

/// Outcome of a pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageResult {
    /// The requested page exists.
    Ok(PageWindow),
    /// The requested page does not exist; redirect to `canonical`.
    ///
    /// When `canonical` is 1 the redirect target must omit the page segment.
    OutOfRange { canonical: u64 },
}

/// A valid page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number.
    pub number: u64,
    /// Last valid page number for this collection.
    pub max_page: u64,
    /// Zero-based start index, inclusive.
    pub start: u64,
    /// Zero-based end index, exclusive. Clamped to the collection length.
    pub end: u64,
    pub has_previous: bool,
    pub has_next: bool,
    /// Previous page number, `None` when the previous page is page 1 (whose
    /// URL carries no page segment) or when there is no previous page.
    pub previous_page_number: Option<u64>,
    pub next_page_number: Option<u64>,
}

impl PageWindow {
    /// Slice `items` down to this page. `items` must be the collection the
    /// window was computed for.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let len = items.len();
        let start = usize::try_from(self.start).unwrap_or(len).min(len);
        let end = usize::try_from(self.end).unwrap_or(len).min(len);
        &items[start..end]
    }
}

/// Number of pages needed to show `total_count` items, never less than 1.
pub fn max_page(total_count: u64, page_size: u64) -> Result<u64, PaginationError> {
    if page_size == 0 {
        return Err(PaginationError::ZeroPageSize);
    }
    Ok(total_count.div_ceil(page_size).max(1))
}

/// Compute the window for `requested_page` of a `total_count`-item collection.
///
/// `requested_page` is signed so that `page/0/` and other under-range requests
/// reach here and get a redirect rather than a parse failure.
pub fn paginate(
    total_count: u64,
    page_size: u64,
    requested_page: i64,
) -> Result<PageResult, PaginationError> {
    let max_page = max_page(total_count, page_size)?;

    if requested_page < 1 {
        return Ok(PageResult::OutOfRange { canonical: 1 });
    }
    let number = requested_page.unsigned_abs();
    if number > max_page {
        return Ok(PageResult::OutOfRange {
            canonical: max_page,
        });
    }

    let start = (number - 1).saturating_mul(page_size);
    let full_end = number.saturating_mul(page_size);
    let has_previous = number > 1;
    let has_next = full_end < total_count;

    Ok(PageResult::Ok(PageWindow {
        number,
        max_page,
        start,
        end: full_end.min(total_count),
        has_previous,
        has_next,
        previous_page_number: (number > 2).then(|| number - 1),
        next_page_number: has_next.then(|| number + 1),
    }))
}
