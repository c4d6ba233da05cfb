use std::collections::BTreeSet;

use crate::table::view::TableError;

/// Rows that can be selected carry a stable identifier.
pub trait RowId {
    fn row_id(&self) -> i64;
}

/// Ids of the selected rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<i64>);

impl Selection {
    /// Parses a comma-separated id list.
    pub fn parse(raw: &str) -> Result<Self, TableError> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>()
                    .map_err(|_| TableError::InvalidSelection(part.to_string()))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Selection)
    }

    pub fn toggle(&mut self, id: i64) {
        if !self.0.remove(&id) {
            self.0.insert(id);
        }
    }

    /// Selects every row of the visible page, and only those.
    pub fn select_page<R: RowId>(&mut self, page: &[R]) {
        self.0.extend(page.iter().map(RowId::row_id));
    }

    /// Drops ids that are not on the visible page.
    pub fn restrict_to<R: RowId>(&mut self, page: &[R]) {
        let visible: BTreeSet<i64> = page.iter().map(RowId::row_id).collect();
        self.0.retain(|id| visible.contains(id));
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.contains(&id)
    }

    pub fn ids(&self) -> Vec<i64> {
        self.0.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every row of the page is selected.
    pub fn covers_page<R: RowId>(&self, page: &[R]) -> bool {
        !page.is_empty() && page.iter().all(|row| self.contains(row.row_id()))
    }
}
