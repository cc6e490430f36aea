use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Page/limit query parameters shared by all list endpoints.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageParams {
    /// Clamp to valid bounds (page >= 1, limit 1..=100).
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination envelope echoed back by list endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

impl Pagination {
    pub fn new(params: PageParams, total: i64) -> Self {
        Self {
            page: params.page,
            limit: params.limit,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_normalized_clamps_limit() {
        let params = PageParams { page: 1, limit: 1000 }.normalized();
        assert_eq!(params.limit, MAX_LIMIT);

        let params = PageParams { page: 1, limit: 0 }.normalized();
        assert_eq!(params.limit, 1);
    }

    #[test]
    fn test_normalized_clamps_page() {
        let params = PageParams { page: -3, limit: 10 }.normalized();
        assert_eq!(params.page, 1);
    }

    #[test]
    fn test_offset() {
        let params = PageParams { page: 3, limit: 10 };
        assert_eq!(params.offset(), 20);
    }
}
