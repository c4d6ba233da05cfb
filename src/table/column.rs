use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// The value of one cell, as seen by sorting, filtering and export.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Blank,
    Int(i64),
    Float(f64),
    Text(String),
    /// Rendered in the offset it carries.
    Timestamp(DateTime<FixedOffset>),
}

impl CellValue {
    fn rank(&self) -> u8 {
        match self {
            CellValue::Blank => 0,
            CellValue::Int(_) | CellValue::Float(_) => 1,
            CellValue::Timestamp(_) => 2,
            CellValue::Text(_) => 3,
        }
    }

    /// Total order over cells. Blanks sort first; numbers compare by value
    /// whatever their representation.
    pub fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Int(a), CellValue::Int(b)) => a.cmp(b),
            (CellValue::Int(a), CellValue::Float(b)) => (*a as f64).total_cmp(b),
            (CellValue::Float(a), CellValue::Int(b)) => a.total_cmp(&(*b as f64)),
            (CellValue::Float(a), CellValue::Float(b)) => a.total_cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (CellValue::Timestamp(a), CellValue::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }

    /// Case-insensitive substring match against the display form.
    ///
    /// `needle` must already be lowercase.
    pub fn contains(&self, needle: &str) -> bool {
        self.to_string().to_lowercase().contains(needle)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Blank => Ok(()),
            CellValue::Int(value) => write!(f, "{}", value),
            CellValue::Float(value) => write!(f, "{}", value),
            CellValue::Text(value) => f.write_str(value),
            CellValue::Timestamp(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<DateTime<FixedOffset>> for CellValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        CellValue::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        CellValue::Timestamp(value.fixed_offset())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Blank, Into::into)
    }
}

/// A column of a table over rows of type `T`.
pub struct Column<T> {
    pub id: &'static str,
    pub header: &'static str,
    pub accessor: fn(&T) -> CellValue,
    pub sortable: bool,
    pub filterable: bool,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Column<T> {}

impl<T> Column<T> {
    pub const fn new(id: &'static str, header: &'static str, accessor: fn(&T) -> CellValue) -> Self {
        Self {
            id,
            header,
            accessor,
            sortable: true,
            filterable: true,
        }
    }

    pub const fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub const fn unfilterable(mut self) -> Self {
        self.filterable = false;
        self
    }

    pub fn value(&self, row: &T) -> CellValue {
        (self.accessor)(row)
    }

    pub fn meta(&self) -> ColumnMeta {
        ColumnMeta {
            id: self.id,
            header: self.header,
            sortable: self.sortable,
            filterable: self.filterable,
        }
    }
}

/// What the page needs to know to draw a column header.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnMeta {
    pub id: &'static str,
    pub header: &'static str,
    pub sortable: bool,
    pub filterable: bool,
}

pub fn find_column<'a, T>(columns: &'a [Column<T>], id: &str) -> Option<&'a Column<T>> {
    columns.iter().find(|column| column.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blanks_sort_before_everything() {
        assert_eq!(CellValue::Blank.compare(&CellValue::Int(-5)), Ordering::Less);
        assert_eq!(CellValue::Blank.compare(&"a".into()), Ordering::Less);
        assert_eq!(CellValue::Blank.compare(&CellValue::Blank), Ordering::Equal);
    }

    #[test]
    fn numbers_compare_across_representations() {
        assert_eq!(CellValue::Int(2).compare(&CellValue::Float(1.5)), Ordering::Greater);
        assert_eq!(CellValue::Float(2.0).compare(&CellValue::Int(2)), Ordering::Equal);
    }

    #[test]
    fn text_compares_case_insensitively_first() {
        let a: CellValue = "alice".into();
        let b: CellValue = "Bob".into();
        assert_eq!(a.compare(&b), Ordering::Less);
    }

    #[test]
    fn missing_values_render_blank() {
        let missing: CellValue = Option::<String>::None.into();
        assert_eq!(missing.to_string(), "");
        assert!(missing.is_blank());
        assert!(CellValue::from("Ana Silva").contains("silva"));
    }

    #[test]
    fn timestamps_render_in_their_own_offset() {
        use chrono::TimeZone;
        let utc = Utc.with_ymd_and_hms(2026, 10, 19, 1, 30, 0).unwrap();
        let local = utc.with_timezone(&FixedOffset::west_opt(3 * 3600).unwrap());
        assert_eq!(CellValue::from(utc).to_string(), "2026-10-19 01:30:00");
        assert_eq!(CellValue::from(local).to_string(), "2026-10-18 22:30:00");
        assert_eq!(CellValue::from(utc).compare(&local.into()), Ordering::Equal);
    }
}
