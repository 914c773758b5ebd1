// Common types used across services
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;

use serde::{Deserialize, Serialize};

/// Query parameters accepted by every paginated list endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Offset into the result set for this page, clamped to a sane ceiling
    /// so a malicious `per_page` can't be used to force an unbounded scan.
    pub fn offset(&self) -> i64 {
        let page = self.page.max(1) as i64;
        let per_page = self.per_page() as i64;
        (page - 1) * per_page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.clamp(1, 100)
    }
}

/// Pagination envelope wrapping a page of results, matching the `{total,
/// totalPages, hasNext, hasPrev}` shape every list endpoint returns.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        let per_page = request.per_page() as i64;
        let total_pages = if total == 0 { 1 } else { (total + per_page - 1) / per_page };
        let page = request.page.max(1) as i64;

        Self {
            items,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_offset() {
        let req = PageRequest { page: 3, per_page: 20 };
        assert_eq!(req.offset(), 40);
    }

    #[test]
    fn test_page_request_clamps_per_page() {
        let req = PageRequest { page: 1, per_page: 1000 };
        assert_eq!(req.per_page(), 100);
    }

    #[test]
    fn test_page_computes_total_pages_and_flags() {
        let page = Page::new(vec![1, 2, 3], 45, PageRequest { page: 2, per_page: 20 });
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn test_page_empty_result_has_one_total_page() {
        let page: Page<i32> = Page::new(vec![], 0, PageRequest::default());
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next);
        assert!(!page.has_prev);
    }
}
