//! Page window for list and search operations.

use serde::{Deserialize, Serialize};

/// Default number of items per page.
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Largest page size a caller may request.
pub const MAX_PER_PAGE: i64 = 100;

/// A page/size window. Always within range: deserialized windows are
/// clamped the same way as [`Page::new`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "PageParams")]
pub struct Page {
    /// Current page (1-indexed).
    page: i64,
    /// Items per page.
    per_page: i64,
}

/// Unchecked page window as it arrives from a caller.
#[derive(Debug, Deserialize)]
struct PageParams {
    #[serde(default = "first_page")]
    page: i64,
    #[serde(default = "default_per_page")]
    per_page: i64,
}

fn first_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

impl From<PageParams> for Page {
    fn from(params: PageParams) -> Self {
        Page::new(params.page, params.per_page)
    }
}

impl Page {
    /// Create a page window, clamping out-of-range inputs.
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Current page (1-indexed).
    pub fn page(&self) -> i64 {
        self.page
    }

    /// Items per page.
    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Get the offset for SQL queries.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Get the limit for SQL queries.
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// Slice an in-memory, already ordered sequence to this window.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skip = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(self.per_page).unwrap_or(0);
        items.into_iter().skip(skip).take(take).collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        let p = Page::new(3, 10);
        assert_eq!(p.offset(), 20);
        assert_eq!(p.limit(), 10);
    }

    #[test]
    fn test_page_clamps() {
        assert_eq!(Page::new(0, 0), Page { page: 1, per_page: 1 });
        assert_eq!(Page::new(-4, 500).per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_page_apply() {
        let p = Page::new(2, 2);
        assert_eq!(p.apply(1..=5), vec![3, 4]);
        assert!(Page::new(9, 2).apply(1..=5).is_empty());
    }

    #[test]
    fn test_deserialize_clamps() {
        let page: Page = serde_json::from_str(&format!(
            r#"{{"page": {}, "per_page": -1}}"#,
            i64::MIN
        ))
        .unwrap();
        assert_eq!(page, Page::new(1, 1));
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 1);

        let page: Page = serde_json::from_str(r#"{"per_page": 1000}"#).unwrap();
        assert_eq!(page, Page::new(1, MAX_PER_PAGE));

        let page: Page = serde_json::from_str("{}").unwrap();
        assert_eq!(page, Page::default());
    }

    #[test]
    fn test_offset_saturates() {
        let page = Page::new(i64::MAX, MAX_PER_PAGE);
        assert_eq!(page.offset(), i64::MAX);
    }
}
