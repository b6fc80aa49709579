//! Pagination helpers shared by all list endpoints.

use serde::Serialize;
use utoipa::ToSchema;

const MIN_LIMIT: i64 = 1;
const MAX_LIMIT: i64 = 100;

/// Normalized page/limit pair used to build LIMIT/OFFSET clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    /// Normalize raw query values: page >= 1, limit clamped to 1..=100.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        PageParams {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(MIN_LIMIT, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination envelope included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(params: PageParams, total: i64) -> Self {
        Pagination {
            page: params.page,
            limit: params.limit,
            total,
            total_pages: if total == 0 {
                0
            } else {
                (total + params.limit - 1) / params.limit
            },
        }
    }
}
