//! Cursor pagination for list endpoints.
//!
//! The cursor is the id of the last item on the previous page; the next page
//! starts strictly after it. Ids only grow, so pages stay stable while new
//! items are appended.

use serde::{Deserialize, Serialize};

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub cursor: Option<u64>,
    pub count: Option<u32>,
}

impl PaginationParams {
    /// Effective page size, clamped to [1, MAX_PAGE_SIZE].
    pub fn effective_count(&self) -> u32 {
        self.count.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Select one page from `items` (sorted by `key`) and the cursor for the next.
    pub fn page<T>(&self, items: Vec<T>, key: impl Fn(&T) -> u64) -> (Vec<T>, Option<u64>) {
        let size = self.effective_count() as usize;
        let mut page: Vec<T> = items
            .into_iter()
            .filter(|item| self.cursor.map_or(true, |after| key(item) > after))
            .take(size + 1)
            .collect();
        let more = page.len() > size;
        page.truncate(size);
        let next = if more { page.last().map(&key) } else { None };
        (page, next)
    }
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    /// Pass as `cursor` to fetch the next page; absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<u64>,
}
