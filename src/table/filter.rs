use serde::Serialize;

use crate::table::column::{Column, find_column};
use crate::table::view::TableError;

/// Row filter of one table.
///
/// A table filters either by one free-text term across all filterable
/// columns, or by per-column terms, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FilterState {
    #[default]
    None,
    Global { term: String },
    Columns { terms: Vec<(String, String)> },
}

impl FilterState {
    /// Builds the filter from the query's global term and column terms.
    /// Blank terms are ignored.
    pub fn build(global: Option<&str>, columns: Vec<(String, String)>) -> Result<Self, TableError> {
        let global = global.map(str::trim).filter(|term| !term.is_empty());
        let columns: Vec<(String, String)> = columns
            .into_iter()
            .map(|(column, term)| (column, term.trim().to_string()))
            .filter(|(_, term)| !term.is_empty())
            .collect();

        match (global, columns.is_empty()) {
            (Some(_), false) => Err(TableError::MixedFilters),
            (Some(term), true) => Ok(FilterState::Global {
                term: term.to_string(),
            }),
            (None, false) => Ok(FilterState::Columns { terms: columns }),
            (None, true) => Ok(FilterState::None),
        }
    }

    pub fn validate<T>(&self, columns: &[Column<T>]) -> Result<(), TableError> {
        if let FilterState::Columns { terms } = self {
            for (id, _) in terms {
                match find_column(columns, id) {
                    None => return Err(TableError::UnknownColumn(id.clone())),
                    Some(column) if !column.filterable => {
                        return Err(TableError::NotFilterable(id.clone()));
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    pub fn matches<T>(&self, row: &T, columns: &[Column<T>]) -> bool {
        match self {
            FilterState::None => true,
            FilterState::Global { term } => {
                let needle = term.to_lowercase();
                columns
                    .iter()
                    .filter(|column| column.filterable)
                    .any(|column| column.value(row).contains(&needle))
            }
            FilterState::Columns { terms } => terms.iter().all(|(id, term)| {
                find_column(columns, id)
                    .is_some_and(|column| column.value(row).contains(&term.to_lowercase()))
            }),
        }
    }

    pub fn apply<T>(&self, rows: Vec<T>, columns: &[Column<T>]) -> Vec<T> {
        if *self == FilterState::None {
            return rows;
        }
        rows.into_iter().filter(|row| self.matches(row, columns)).collect()
    }
}
