// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Offset pagination shared by every list endpoint.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Raw `?page=&limit=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Apply defaults, reject non-positive values and cap `limit`.
    pub fn from_params(params: PageParams) -> Result<Self> {
        let page = params.page.unwrap_or(DEFAULT_PAGE);
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

        if page < 1 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if limit < 1 {
            return Err(AppError::validation("limit must be at least 1"));
        }

        let page = u32::try_from(page).map_err(|_| AppError::validation("page is too large"))?;
        let limit = limit.min(MAX_LIMIT) as u32;
        Ok(Self { page, limit })
    }

    /// Rows to skip: `(page - 1) * limit`, saturating. Page 0 reads as page 1.
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE as u32,
            limit: DEFAULT_LIMIT as u32,
        }
    }
}

/// Pagination block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u32,
    /// `ceil(total / limit)`
    pub pages: u32,
}

impl PageInfo {
    pub fn new(request: PageRequest, total: u32) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: total.div_ceil(request.limit),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u32) -> Self {
        Self {
            items,
            pagination: PageInfo::new(request, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, limit: Option<i64>) -> PageParams {
        PageParams { page, limit }
    }

    #[test]
    fn test_defaults() {
        let req = PageRequest::from_params(PageParams::default()).unwrap();
        assert_eq!(req, PageRequest { page: 1, limit: 20 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_rejects_non_positive_values() {
        for (page, limit) in [(Some(0), None), (Some(-3), None), (None, Some(0)), (None, Some(-1))] {
            let err = PageRequest::from_params(params(page, limit)).unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
        }
    }

    #[test]
    fn test_limit_is_capped() {
        let req = PageRequest::from_params(params(Some(3), Some(5000))).unwrap();
        assert_eq!(req.limit, 100);
        assert_eq!(req.offset(), 200);
    }

    #[test]
    fn test_offset_of_page_zero_is_zero() {
        let req = PageRequest { page: 0, limit: 20 };
        assert_eq!(req.offset(), 0);
        let far = PageRequest { page: u32::MAX, limit: 100 };
        assert_eq!(far.offset(), u32::MAX);
    }

    #[test]
    fn test_page_count_rounds_up() {
        let req = PageRequest { page: 1, limit: 20 };
        assert_eq!(PageInfo::new(req, 0).pages, 0);
        assert_eq!(PageInfo::new(req, 20).pages, 1);
        assert_eq!(PageInfo::new(req, 21).pages, 2);
    }
}
