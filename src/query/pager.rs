//! Pager
//!
//! A pager turns (limit, current page) into a LIMIT/OFFSET range. Its total
//! comes from running the same query in count mode.

use serde::{Deserialize, Serialize};

use crate::statement::Range;

/// Requested paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerSpec {
    /// Rows per page. Zero disables the pager.
    pub limit: u64,
    /// Identifies the pager when several are shown on one page
    #[serde(default)]
    pub element: u32,
    /// Zero-based page the caller is on
    #[serde(default)]
    pub page: u64,
}

impl PagerSpec {
    pub fn new(limit: u64, element: u32) -> Self {
        Self {
            limit,
            element,
            page: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.limit > 0
    }

    /// Window for the current page.
    pub fn range(&self) -> Option<Range> {
        if !self.is_active() {
            return None;
        }
        Some(Range::new(self.page.saturating_mul(self.limit), self.limit))
    }

    /// Pager state once the total row count is known.
    pub fn state(&self, total: u64) -> PagerState {
        let total_pages = if self.limit == 0 {
            0
        } else {
            total.div_ceil(self.limit)
        };
        PagerState {
            element: self.element,
            limit: self.limit,
            page: self.page,
            total,
            total_pages,
        }
    }
}

/// Resolved pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PagerState {
    pub element: u32,
    pub limit: u64,
    pub page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PagerState {
    /// True when the current page lies past the last page.
    pub fn is_beyond_last_page(&self) -> bool {
        self.page > 0 && self.page >= self.total_pages
    }
}
