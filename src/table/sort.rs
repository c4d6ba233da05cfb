use std::cmp::Ordering;

use serde::Serialize;

use crate::table::column::{Column, find_column};
use crate::table::view::TableError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub column: String,
    pub direction: Direction,
}

/// Ordered sort keys; the first key has the highest priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SortState(Vec<SortKey>);

impl SortState {
    /// Parses `col.asc,col2.desc`. A bare column id sorts ascending.
    pub fn parse(raw: &str) -> Result<Self, TableError> {
        let mut keys: Vec<SortKey> = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let (column, direction) = match part.rsplit_once('.') {
                Some((column, "asc")) => (column, Direction::Asc),
                Some((column, "desc")) => (column, Direction::Desc),
                Some(_) => return Err(TableError::InvalidSort(part.to_string())),
                None => (part, Direction::Asc),
            };
            if column.is_empty() {
                return Err(TableError::InvalidSort(part.to_string()));
            }
            if keys.iter().any(|key| key.column == column) {
                continue;
            }
            keys.push(SortKey {
                column: column.to_string(),
                direction,
            });
        }
        Ok(Self(keys))
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn direction(&self, column: &str) -> Option<Direction> {
        self.0
            .iter()
            .find(|key| key.column == column)
            .map(|key| key.direction)
    }

    /// Cycles a column through ascending, descending and unsorted.
    ///
    /// Without `multi` every other key is dropped first.
    pub fn toggle(&mut self, column: &str, multi: bool) {
        let current = self.direction(column);
        if !multi {
            self.0.retain(|key| key.column == column);
        }
        match current {
            None => self.0.push(SortKey {
                column: column.to_string(),
                direction: Direction::Asc,
            }),
            Some(Direction::Asc) => {
                if let Some(key) = self.0.iter_mut().find(|key| key.column == column) {
                    key.direction = Direction::Desc;
                }
            }
            Some(Direction::Desc) => self.0.retain(|key| key.column != column),
        }
    }

    /// Checks every key names a sortable column.
    pub fn validate<T>(&self, columns: &[Column<T>]) -> Result<(), TableError> {
        for key in &self.0 {
            match find_column(columns, &key.column) {
                None => return Err(TableError::UnknownColumn(key.column.clone())),
                Some(column) if !column.sortable => {
                    return Err(TableError::NotSortable(key.column.clone()));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Sorts rows in place. The sort is stable, so rows with equal keys
    /// keep their incoming order.
    pub fn apply<T>(&self, rows: &mut [T], columns: &[Column<T>]) {
        let keys: Vec<(&Column<T>, Direction)> = self
            .0
            .iter()
            .filter_map(|key| find_column(columns, &key.column).map(|c| (c, key.direction)))
            .collect();
        if keys.is_empty() {
            return;
        }

        rows.sort_by(|a, b| {
            keys.iter().fold(Ordering::Equal, |ordering, (column, direction)| {
                ordering.then_with(|| {
                    let ordering = column.value(a).compare(&column.value(b));
                    match direction {
                        Direction::Asc => ordering,
                        Direction::Desc => ordering.reverse(),
                    }
                })
            })
        });
    }

    /// The query-string form, the inverse of [`SortState::parse`].
    pub fn to_query(&self) -> String {
        self.0
            .iter()
            .map(|key| {
                let direction = match key.direction {
                    Direction::Asc => "asc",
                    Direction::Desc => "desc",
                };
                format!("{}.{}", key.column, direction)
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}
