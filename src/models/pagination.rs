//! Pagination types shared by every list query

use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;

/// Largest page size any listing may request
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Build parameters from a raw `page` query value.
    ///
    /// Missing, non-numeric and non-positive values all mean the first page.
    /// Numbers too large for a `u32` saturate, so they stay past the end.
    pub fn from_raw_page(raw: Option<&str>, per_page: u32) -> Self {
        let page = raw.and_then(parse_page).unwrap_or(1);
        Self::new(page, per_page)
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * (self.per_page as i64)
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

fn parse_page(value: &str) -> Option<u32> {
    match value.trim().parse::<u32>() {
        Ok(page) => Some(page),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(u32::MAX),
        Err(_) => None,
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Total number of pages. An empty listing still has one (empty) page.
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 || self.total <= 0 {
            return 1;
        }
        let pages = (self.total as u64).div_ceil(self.per_page as u64);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Convert the items, keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_raw_page() {
        assert_eq!(ListParams::from_raw_page(None, 4).page, 1);
        assert_eq!(ListParams::from_raw_page(Some("abc"), 4).page, 1);
        assert_eq!(ListParams::from_raw_page(Some("0"), 4).page, 1);
        assert_eq!(ListParams::from_raw_page(Some("-3"), 4).page, 1);
        assert_eq!(ListParams::from_raw_page(Some(" 3 "), 4).page, 3);
        assert_eq!(ListParams::from_raw_page(Some("-99999999999"), 4).page, 1);
    }

    #[test]
    fn test_oversized_page_saturates() {
        for raw in ["4294967295", "4294967296", "99999999999999999999999999"] {
            let params = ListParams::from_raw_page(Some(raw), 4);
            assert_eq!(params.page, u32::MAX, "page={}", raw);
            assert!(params.offset() > 0);
        }
    }

    #[test]
    fn test_offset_and_limit() {
        let params = ListParams::new(3, 5);
        assert_eq!(params.offset(), 10);
        assert_eq!(params.limit(), 5);
    }

    #[test]
    fn test_per_page_is_clamped() {
        assert_eq!(ListParams::new(1, 0).per_page, 1);
        assert_eq!(ListParams::new(1, 1000).per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_empty_result_has_one_page() {
        let result: PagedResult<i64> = PagedResult::new(vec![], 0, &ListParams::new(1, 4));
        assert_eq!(result.total_pages(), 1);
        assert!(!result.has_next());
        assert!(!result.has_prev());
        assert!(result.is_empty());
    }

    #[test]
    fn test_page_past_the_end() {
        let result: PagedResult<i64> = PagedResult::new(vec![], 9, &ListParams::new(7, 4));
        assert_eq!(result.total_pages(), 3);
        assert!(!result.has_next());
        assert!(result.has_prev());
    }

    proptest! {
        #[test]
        fn total_pages_covers_every_item(total in 1i64..10_000, per_page in 1u32..=100) {
            let result: PagedResult<()> = PagedResult::new(vec![], total, &ListParams::new(1, per_page));
            let pages = result.total_pages() as i64;
            prop_assert!(pages * per_page as i64 >= total);
            prop_assert!((pages - 1) * (per_page as i64) < total);
        }
    }
}
