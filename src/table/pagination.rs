use std::ops::Range;

use serde::Serialize;

use crate::table::view::TableError;

/// Page sizes offered when a table does not choose its own.
pub const DEFAULT_PAGE_SIZES: &[usize] = &[10, 20, 30, 40, 50];
pub const EMPLOYEE_PAGE_SIZES: &[usize] = &[5, 10, 20, 50];
pub const CLOCK_PAGE_SIZES: &[usize] = &[10, 20, 50, 100];

/// Position of a table within its rows. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    page: usize,
    page_size: usize,
    total_rows: usize,
    allowed_sizes: &'static [usize],
}

impl Pagination {
    /// Starts on the first page. `page_size` defaults to the smallest
    /// allowed size.
    pub fn new(
        page_size: Option<usize>,
        allowed_sizes: &'static [usize],
        total_rows: usize,
    ) -> Result<Self, TableError> {
        let fallback = allowed_sizes.first().copied().unwrap_or(10);
        let page_size = match page_size {
            Some(size) if allowed_sizes.contains(&size) => size,
            Some(size) => {
                return Err(TableError::InvalidPageSize {
                    size,
                    allowed: allowed_sizes.to_vec(),
                });
            }
            None => fallback,
        };

        Ok(Self {
            page: 1,
            page_size,
            total_rows,
            allowed_sizes,
        })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn allowed_sizes(&self) -> &'static [usize] {
        self.allowed_sizes
    }

    /// Never zero: an empty table still has one (empty) page.
    pub fn page_count(&self) -> usize {
        self.total_rows.div_ceil(self.page_size).max(1)
    }

    /// Jumps to `page`, clamped into range.
    pub fn jump(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count());
    }

    pub fn first(&mut self) {
        self.page = 1;
    }

    pub fn last(&mut self) {
        self.page = self.page_count();
    }

    pub fn next(&mut self) {
        self.jump(self.page + 1);
    }

    pub fn prev(&mut self) {
        self.jump(self.page.saturating_sub(1));
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    /// Changes the page size and goes back to the first page.
    pub fn set_page_size(&mut self, size: usize) -> Result<(), TableError> {
        if !self.allowed_sizes.contains(&size) {
            return Err(TableError::InvalidPageSize {
                size,
                allowed: self.allowed_sizes.to_vec(),
            });
        }
        self.page_size = size;
        self.page = 1;
        Ok(())
    }

    /// Indices of the current page's rows within the full row set.
    pub fn range(&self) -> Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(self.total_rows);
        let end = (start + self.page_size).min(self.total_rows);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigates_and_clamps() {
        let mut pagination = Pagination::new(Some(10), DEFAULT_PAGE_SIZES, 95).unwrap();
        assert_eq!(pagination.page_count(), 10);
        assert!(!pagination.has_prev());

        pagination.next();
        assert_eq!(pagination.range(), 10..20);
        pagination.last();
        assert_eq!(pagination.range(), 90..95);
        assert!(!pagination.has_next());
        pagination.next();
        assert_eq!(pagination.page(), 10);

        pagination.jump(42);
        assert_eq!(pagination.page(), 10);
        pagination.jump(0);
        assert_eq!(pagination.page(), 1);
        pagination.prev();
        assert_eq!(pagination.page(), 1);
    }

    #[test]
    fn changing_page_size_resets_to_first_page() {
        let mut pagination = Pagination::new(None, CLOCK_PAGE_SIZES, 500).unwrap();
        assert_eq!(pagination.page_size(), 10);
        pagination.jump(7);
        pagination.set_page_size(50).unwrap();
        assert_eq!(pagination.page(), 1);
        assert_eq!(pagination.range(), 0..50);
    }

    #[test]
    fn only_allowed_sizes_are_accepted() {
        assert!(matches!(
            Pagination::new(Some(30), EMPLOYEE_PAGE_SIZES, 3),
            Err(TableError::InvalidPageSize { size: 30, .. })
        ));
        let mut pagination = Pagination::new(Some(5), EMPLOYEE_PAGE_SIZES, 3).unwrap();
        assert!(pagination.set_page_size(7).is_err());
        assert_eq!(pagination.page_size(), 5);
    }

    #[test]
    fn empty_tables_have_one_empty_page() {
        let pagination = Pagination::new(None, DEFAULT_PAGE_SIZES, 0).unwrap();
        assert_eq!(pagination.page_count(), 1);
        assert_eq!(pagination.range(), 0..0);
    }
}
