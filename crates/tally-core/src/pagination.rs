//! # Pagination
//!
//! Page/limit coercion and the metadata block returned with every listing.
//!
//! ```text
//! page=2, limit=10, total=25
//!
//!   rows:  0 ........ 9 | 10 ....... 19 | 20 .. 24
//!          page 1       | page 2 ◄──    | page 3
//!                       skip=10, take=10
//!
//!   meta: { total: 25, limit: 10, currentPage: 2, nextPage: 3, totalPages: 3 }
//! ```

use serde::{Deserialize, Serialize};

use crate::DEFAULT_PAGE_LIMIT;

/// Offset/limit pair derived from a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// Coerced page number (≥ 1).
    pub page: i64,
    /// Rows to skip.
    pub skip: i64,
    /// Rows to take (≥ 1).
    pub take: i64,
}

/// Converts a page request into `skip`/`take`.
///
/// Both inputs are clamped to a minimum of 1.
///
/// ## Example
/// ```rust
/// use tally_core::pagination_params;
///
/// let p = pagination_params(0, 10);
/// assert_eq!((p.page, p.skip, p.take), (1, 0, 10));
///
/// let p = pagination_params(2, 0);
/// assert_eq!((p.page, p.skip, p.take), (2, 1, 1));
/// ```
pub fn pagination_params(page: i64, limit: i64) -> PaginationParams {
    let take = limit.max(1);
    let page = page.max(1);
    PaginationParams {
        page,
        skip: (page - 1).saturating_mul(take),
        take,
    }
}

impl PaginationParams {
    /// Builds params from optional request values (defaults 1 / 10).
    pub fn from_request(page: Option<i64>, limit: Option<i64>) -> Self {
        pagination_params(page.unwrap_or(1), limit.unwrap_or(DEFAULT_PAGE_LIMIT))
    }
}

/// Listing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub limit: i64,
    pub current_page: i64,
    pub next_page: Option<i64>,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(params: PaginationParams, total: i64) -> Self {
        let PaginationParams { page, take, .. } = params;
        PageMeta {
            total,
            limit: take,
            current_page: page,
            next_page: if page.saturating_mul(take) < total {
                Some(page + 1)
            } else {
                None
            },
            // ceil(total / take) without the `total + take` overflow
            total_pages: total / take + i64::from(total % take != 0),
        }
    }
}

/// One page of results plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_to_minimum_one() {
        assert_eq!(pagination_params(0, 10), pagination_params(1, 10));
        assert_eq!(pagination_params(2, 0), pagination_params(2, 1));
        assert_eq!(pagination_params(-5, -5), pagination_params(1, 1));
    }

    #[test]
    fn test_skip() {
        let p = pagination_params(3, 10);
        assert_eq!(p.skip, 20);
        assert_eq!(p.take, 10);
    }

    #[test]
    fn test_defaults() {
        let p = PaginationParams::from_request(None, None);
        assert_eq!((p.page, p.skip, p.take), (1, 0, 10));
    }

    #[test]
    fn test_meta_first_of_three_pages() {
        let meta = PageMeta::new(pagination_params(1, 10), 25);
        assert_eq!(
            meta,
            PageMeta {
                total: 25,
                limit: 10,
                current_page: 1,
                next_page: Some(2),
                total_pages: 3,
            }
        );
    }

    #[test]
    fn test_meta_last_page_and_empty() {
        let meta = PageMeta::new(pagination_params(3, 10), 25);
        assert_eq!(meta.next_page, None);

        let meta = PageMeta::new(pagination_params(2, 10), 20);
        assert_eq!(meta.next_page, None);
        assert_eq!(meta.total_pages, 2);

        let meta = PageMeta::new(pagination_params(1, 10), 0);
        assert_eq!(meta.next_page, None);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn test_meta_with_max_limit() {
        let meta = PageMeta::new(pagination_params(1, i64::MAX), 1);
        assert_eq!(meta.limit, i64::MAX);
        assert_eq!(meta.total_pages, 1);
        assert_eq!(meta.next_page, None);

        let meta = PageMeta::new(pagination_params(i64::MAX, i64::MAX), 0);
        assert_eq!(meta.total_pages, 0);
        assert_eq!(meta.next_page, None);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let meta = PageMeta::new(pagination_params(1, 10), 25);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["nextPage"], 2);
        assert_eq!(json["totalPages"], 3);
    }
}
