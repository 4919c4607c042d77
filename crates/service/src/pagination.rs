//! Pagination utilities for service layer
//!
//! Provides a simple `Pagination` struct and helpers to normalize inputs.

use serde::Deserialize;

/// Pagination parameters
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Pagination {
    /// 1-based page index
    #[serde(default = "default_page")]
    pub page: u32,
    /// items per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 { 1 }
fn default_per_page() -> u32 { 20 }

impl Pagination {
    /// Clamp to sane defaults and convert to `u64`
    pub fn normalize(self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, 100);
        ((page - 1) as u64, per_page as u64)
    }

    /// Cut one page out of an already filtered and ordered list.
    pub fn apply<T>(self, items: Vec<T>) -> common::types::Page<T> {
        let (idx, per) = self.normalize();
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip((idx * per) as usize)
            .take(per as usize)
            .collect();
        common::types::Page { items, page: idx as u32 + 1, per_page: per as u32, total }
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}

#[cfg(test)]
mod tests {
    use super::Pagination;

    #[test]
    fn normalize_clamps_zero_to_defaults() {
        let (idx, per) = Pagination { page: 0, per_page: 0 }.normalize();
        assert_eq!(idx, 0);
        assert_eq!(per, 1);
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let (idx, per) = Pagination { page: 5, per_page: 1000 }.normalize();
        assert_eq!(idx, 4);
        assert_eq!(per, 100);
    }

    #[test]
    fn apply_slices_requested_page() {
        let page = Pagination { page: 2, per_page: 3 }.apply((1..=8).collect::<Vec<_>>());
        assert_eq!(page.items, vec![4, 5, 6]);
        assert_eq!(page.total, 8);
        assert_eq!(page.page, 2);
        let past_end = Pagination { page: 9, per_page: 3 }.apply((1..=8).collect::<Vec<_>>());
        assert!(past_end.items.is_empty());
    }

    #[test]
    fn apply_caps_oversized_pages_at_one_hundred() {
        let page = Pagination { page: 1, per_page: 500 }.apply((0..250).collect::<Vec<_>>());
        assert_eq!(page.items.len(), 100);
        assert_eq!(page.per_page, 100);
        assert_eq!(page.total, 250);
        let last = Pagination { page: 3, per_page: 500 }.apply((0..250).collect::<Vec<_>>());
        assert_eq!(last.items, (200..250).collect::<Vec<_>>());
    }
}
