use serde::Deserialize;

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Hard cap on page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// List filters for patients. Search and pagination always compose with
/// the caller's doctor predicate in the repository; they can narrow a
/// doctor's view but never widen it.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientFilter {
    /// Case-insensitive substring match over name, document, insurance,
    /// city and email.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: Option<i64>,
    /// Page size, clamped to `MAX_PAGE_SIZE`.
    pub per_page: Option<i64>,
}

impl Default for PatientFilter {
    fn default() -> Self {
        Self {
            search: None,
            page: None,
            per_page: None,
        }
    }
}

impl PatientFilter {
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
            .filter(|n| *n >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }
}

/// Pagination for consultation listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn per_page(&self) -> i64 {
        self.per_page
            .filter(|n| *n >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page.filter(|p| *p >= 1).unwrap_or(1) - 1) * self.per_page()
    }
}
