//! The query-string surface of a table and the page it produces.
//!
//! A table request carries its whole state (`sort`, `toggle`, `multi`, `q`,
//! `filter.<column>`, `page`, `page_size`, `selected`, `select_all_page`)
//! plus the user's last action on it (`nav`, `resize`, `toggle_row`). The
//! response echoes the resulting state so the page can send it back.

use serde::Serialize;
use thiserror::Error;

use crate::error::AppError;
use crate::table::column::{Column, ColumnMeta};
use crate::table::filter::FilterState;
use crate::table::pagination::Pagination;
use crate::table::selection::{RowId, Selection};
use crate::table::sort::SortState;

/// Shown instead of rows when nothing matches.
pub const EMPTY_PLACEHOLDER: &str = "No results.";

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
    #[error("Column cannot be sorted: {0}")]
    NotSortable(String),
    #[error("Column cannot be filtered: {0}")]
    NotFilterable(String),
    #[error("Invalid sort: {0}")]
    InvalidSort(String),
    #[error("Page size {size} is not one of {allowed:?}")]
    InvalidPageSize { size: usize, allowed: Vec<usize> },
    #[error("Invalid page: {0}")]
    InvalidPage(String),
    #[error("Use either the global filter or column filters, not both")]
    MixedFilters,
    #[error("Invalid row id in selection: {0}")]
    InvalidSelection(String),
}

impl From<TableError> for AppError {
    fn from(e: TableError) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// A pager button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNav {
    First,
    Prev,
    Next,
    Last,
}

impl PageNav {
    fn parse(raw: &str) -> Result<Self, TableError> {
        match raw.trim() {
            "first" => Ok(PageNav::First),
            "prev" => Ok(PageNav::Prev),
            "next" => Ok(PageNav::Next),
            "last" => Ok(PageNav::Last),
            other => Err(TableError::InvalidPage(format!("nav={}", other))),
        }
    }
}

/// Table state decoded from a query string.
#[derive(Debug, Clone, Default)]
pub struct TableQuery {
    pub sort: SortState,
    pub toggle: Option<String>,
    pub multi: bool,
    pub global: Option<String>,
    pub column_filters: Vec<(String, String)>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    /// Moves from `page`.
    pub nav: Option<PageNav>,
    /// A new page size picked while on `page`.
    pub resize: Option<usize>,
    pub selection: Selection,
    pub select_all_page: bool,
    /// Row checkboxes clicked, flipped in order.
    pub toggled_rows: Vec<i64>,
}

fn parse_flag(value: &str) -> bool {
    matches!(value, "true" | "1" | "on")
}

fn parse_number(key: &str, value: &str) -> Result<usize, TableError> {
    value
        .trim()
        .parse()
        .map_err(|_| TableError::InvalidPage(format!("{}={}", key, value)))
}

impl TableQuery {
    /// Decodes query pairs. Keys the table does not know are ignored, so
    /// the same query string may carry other parameters.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, TableError> {
        let mut query = TableQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                "sort" => query.sort = SortState::parse(value)?,
                "toggle" if !value.trim().is_empty() => query.toggle = Some(value.trim().to_string()),
                "multi" => query.multi = parse_flag(value),
                "q" => query.global = Some(value.clone()),
                "page" => query.page = Some(parse_number(key, value)?),
                "page_size" => query.page_size = Some(parse_number(key, value)?),
                "nav" => query.nav = Some(PageNav::parse(value)?),
                "resize" => query.resize = Some(parse_number(key, value)?),
                "selected" => query.selection = Selection::parse(value)?,
                "select_all_page" => query.select_all_page = parse_flag(value),
                "toggle_row" => query.toggled_rows.push(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| TableError::InvalidSelection(value.clone()))?,
                ),
                _ => {
                    if let Some(column) = key.strip_prefix("filter.") {
                        query.column_filters.push((column.to_string(), value.clone()));
                    }
                }
            }
        }
        Ok(query)
    }

    fn resolve<T>(&self, columns: &[Column<T>]) -> Result<(SortState, FilterState), TableError> {
        let mut sort = self.sort.clone();
        if let Some(column) = &self.toggle {
            sort.toggle(column, self.multi);
        }
        sort.validate(columns)?;

        let filter = FilterState::build(self.global.as_deref(), self.column_filters.clone())?;
        filter.validate(columns)?;
        Ok((sort, filter))
    }

    /// Where the request lands among `total_rows` rows. A resize always
    /// goes back to the first page.
    pub fn paginate(
        &self,
        allowed_sizes: &'static [usize],
        total_rows: usize,
    ) -> Result<Pagination, TableError> {
        let mut pagination = Pagination::new(self.page_size, allowed_sizes, total_rows)?;
        pagination.jump(self.page.unwrap_or(1));
        match self.nav {
            Some(PageNav::First) => pagination.first(),
            Some(PageNav::Prev) => pagination.prev(),
            Some(PageNav::Next) => pagination.next(),
            Some(PageNav::Last) => pagination.last(),
            None => {}
        }
        if let Some(size) = self.resize {
            pagination.set_page_size(size)?;
        }
        Ok(pagination)
    }

    /// Filters and sorts loaded rows without paging them, as exports need.
    pub fn arrange<T>(&self, rows: Vec<T>, columns: &[Column<T>]) -> Result<Vec<T>, TableError> {
        let (sort, filter) = self.resolve(columns)?;
        let mut rows = filter.apply(rows, columns);
        sort.apply(&mut rows, columns);
        Ok(rows)
    }
}

/// Pagination as rendered by the page.
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_rows: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub allowed_sizes: &'static [usize],
}

/// One rendered page of a table.
#[derive(Debug, Clone, Serialize)]
pub struct TableView<T> {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<T>,
    pub sort: SortState,
    /// `sort` in its query-string form.
    pub sort_query: String,
    pub filter: FilterState,
    pub pagination: PageInfo,
    pub selected: Vec<i64>,
    pub selected_count: usize,
    /// Bulk actions only run over a non-empty selection.
    pub bulk_actions_enabled: bool,
    pub all_page_selected: bool,
    pub placeholder: Option<&'static str>,
}

impl<T: RowId> TableView<T> {
    /// Builds a page from every loaded row: filter, sort, then slice.
    pub fn client(
        rows: Vec<T>,
        columns: &[Column<T>],
        query: &TableQuery,
        allowed_sizes: &'static [usize],
    ) -> Result<Self, TableError> {
        let (sort, filter) = query.resolve(columns)?;
        let mut rows = filter.apply(rows, columns);
        sort.apply(&mut rows, columns);

        let pagination = query.paginate(allowed_sizes, rows.len())?;
        let page_rows: Vec<T> = rows.drain(pagination.range()).collect();

        Ok(Self::assemble(page_rows, columns, query, sort, filter, pagination))
    }

    /// Builds a page whose rows were fetched already paged, out of `total`.
    ///
    /// Sorting and filtering are the fetcher's job here, and it pages with
    /// [`TableQuery::paginate`]; the state is only echoed back.
    pub fn server(
        page_rows: Vec<T>,
        total_rows: usize,
        columns: &[Column<T>],
        query: &TableQuery,
        allowed_sizes: &'static [usize],
    ) -> Result<Self, TableError> {
        let (sort, filter) = query.resolve(columns)?;
        let pagination = query.paginate(allowed_sizes, total_rows)?;

        Ok(Self::assemble(page_rows, columns, query, sort, filter, pagination))
    }

    fn assemble(
        rows: Vec<T>,
        columns: &[Column<T>],
        query: &TableQuery,
        sort: SortState,
        filter: FilterState,
        pagination: Pagination,
    ) -> Self {
        let mut selection = query.selection.clone();
        if query.select_all_page {
            selection.select_page(&rows);
        }
        for &id in &query.toggled_rows {
            selection.toggle(id);
        }
        selection.restrict_to(&rows);

        Self {
            columns: columns.iter().map(Column::meta).collect(),
            all_page_selected: selection.covers_page(&rows),
            placeholder: rows.is_empty().then_some(EMPTY_PLACEHOLDER),
            rows,
            sort_query: sort.to_query(),
            sort,
            filter,
            pagination: PageInfo {
                page: pagination.page(),
                page_size: pagination.page_size(),
                page_count: pagination.page_count(),
                total_rows: pagination.total_rows(),
                has_prev: pagination.has_prev(),
                has_next: pagination.has_next(),
                allowed_sizes: pagination.allowed_sizes(),
            },
            selected: selection.ids(),
            selected_count: selection.len(),
            bulk_actions_enabled: !selection.is_empty(),
        }
    }
}
