use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::table::column::{CellValue, Column};

pub const NO_DATA: &str = "No data to export";

/// A rectangular block of cells with a header row, ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// One row per item, one cell per column.
    pub fn from_columns<T>(items: &[T], columns: &[Column<T>]) -> Result<Self> {
        if items.is_empty() {
            return Err(AppError::Validation(NO_DATA.to_string()));
        }

        Ok(Self {
            headers: columns.iter().map(|column| column.header.to_string()).collect(),
            rows: items
                .iter()
                .map(|item| columns.iter().map(|column| column.value(item)).collect())
                .collect(),
        })
    }

    /// One row per item; headers are the first item's field names.
    ///
    /// Fields missing from a later item render blank.
    pub fn from_records<S: Serialize>(items: &[S]) -> Result<Self> {
        let records = items
            .iter()
            .map(|item| match serde_json::to_value(item) {
                Ok(Value::Object(fields)) => Ok(fields),
                Ok(_) => Err(AppError::Export("Rows must serialize to objects".to_string())),
                Err(e) => Err(AppError::Export(e.to_string())),
            })
            .collect::<Result<Vec<_>>>()?;

        let Some(first) = records.first() else {
            return Err(AppError::Validation(NO_DATA.to_string()));
        };
        let headers: Vec<String> = first.keys().cloned().collect();

        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|header| record.get(header).map_or(CellValue::Blank, json_cell))
                    .collect()
            })
            .collect();

        Ok(Self { headers, rows })
    }
}

fn json_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Blank,
        Value::Bool(flag) => CellValue::Text(flag.to_string()),
        Value::Number(number) => match number.as_i64() {
            Some(int) => CellValue::Int(int),
            None => number.as_f64().map_or(CellValue::Blank, CellValue::Float),
        },
        Value::String(text) => CellValue::Text(text.clone()),
        nested => CellValue::Text(nested.to_string()),
    }
}
