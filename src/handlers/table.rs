use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use garde::Validate;
use serde::Deserialize;

use crate::error::Result;
use crate::table::view::TableQuery;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Selected rows for a bulk action.
#[derive(Debug, Deserialize, Validate)]
pub struct BulkDeleteRequest {
    #[garde(length(min = 1, max = 500))]
    pub ids: Vec<i64>,
}

/// Decodes the raw query pairs of a table request.
pub fn table_query(pairs: &[(String, String)]) -> Result<TableQuery> {
    Ok(TableQuery::from_pairs(pairs)?)
}

/// Answers with a file the browser saves under `file_name`.
pub fn download(bytes: Vec<u8>, content_type: &'static str, file_name: &str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}
