//! Pagination requests and results

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const DEFAULT_PAGE: u64 = 1;

/// Page size and number, as sent by a caller
///
/// Deserializes from the request parameter names `pagesize` and `p`, with
/// `page_size`/`page` accepted as aliases. A missing page size falls back to
/// the configured [`PageDefaults::page_size`] when the request is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(rename = "pagesize", alias = "page_size", default)]
    pub page_size: Option<u64>,
    #[serde(rename = "p", alias = "page", default = "default_page")]
    pub page: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_size: None,
            page: DEFAULT_PAGE,
        }
    }
}

impl PageRequest {
    /// Creates a request with an explicit page size
    pub fn new(page_size: u64, page: u64) -> Self {
        Self {
            page_size: Some(page_size),
            page,
        }
    }

    /// Creates a request that uses the configured page size
    pub fn page(page: u64) -> Self {
        Self {
            page_size: None,
            page,
        }
    }

    /// Fills in the default page size and clamps both values
    ///
    /// The page size ends up in `1..=max_page_size` and the page number is at
    /// least 1.
    pub fn resolve(&self, defaults: &PageDefaults) -> PageWindow {
        let max = defaults.max_page_size.max(1);
        PageWindow {
            page_size: self.page_size.unwrap_or(defaults.page_size).clamp(1, max),
            page: self.page.max(1),
        }
    }
}

/// A resolved page: the rows a paginated fetch actually reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub page_size: u64,
    pub page: u64,
}

impl PageWindow {
    /// Rows to skip: `page_size * (page - 1)`
    pub fn offset(&self) -> u64 {
        self.page_size.saturating_mul(self.page.max(1) - 1)
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

/// Total match count and the rows of one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub rows: Vec<T>,
}

/// Length-aware page with navigation metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginator<T> {
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub data: Vec<T>,
}

impl<T> Paginator<T> {
    pub fn new(page: Page<T>, window: PageWindow) -> Self {
        let per_page = window.page_size.max(1);
        let last_page = page.total.div_ceil(per_page).max(1);
        Self {
            total: page.total,
            per_page,
            current_page: window.page.max(1),
            last_page,
            data: page.rows,
        }
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }
}

/// Pagination defaults loaded from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageDefaults {
    pub page_size: u64,
    pub max_page_size: u64,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: 1000,
        }
    }
}
