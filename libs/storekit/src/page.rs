//! Pagination envelope attached to list and search results.

use serde::{Deserialize, Serialize};

use crate::query::ListOptions;

/// Derived paging metadata. Recomputed for every response, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u64,
    pub has_next_page: bool,
}

impl PageInfo {
    #[must_use]
    pub fn new(total: u64, page: u32, per_page: u32) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(u64::from(per_page))
        };
        Self {
            total,
            page,
            per_page,
            total_pages,
            has_next_page: u64::from(page) * u64::from(per_page) < total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, opts: &ListOptions) -> Self {
        Self {
            items,
            page_info: PageInfo::new(total, opts.page, opts.per_page),
        }
    }

    pub fn empty(opts: &ListOptions) -> Self {
        Self::new(Vec::new(), 0, opts)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_info: self.page_info,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
