use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use garde::Validate;
use serde::Deserialize;

use crate::{
    error::Result,
    handlers::table::{
        BulkDeleteRequest, CSV_CONTENT_TYPE, XLSX_CONTENT_TYPE, download, table_query,
    },
    models::session::Session,
    services::clocks as clock_service,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
    pub employee_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

/// One page of the clock records table.
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let query = table_query(&pairs)?;
    let view = clock_service::table(&state, &session, &query).await?;
    Ok(Json(view).into_response())
}

#[axum::debug_handler]
pub async fn get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let clock = clock_service::get(&state, &session, id).await?;
    Ok(Json(clock).into_response())
}

#[axum::debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Response> {
    clock_service::delete(&state, &session, id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[axum::debug_handler]
pub async fn bulk_delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<Response> {
    payload.validate()?;
    let outcome = clock_service::bulk_delete(&state, &session, &payload.ids).await?;
    Ok(Json(outcome).into_response())
}

/// Today's statistics and who is on site.
#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response> {
    let dashboard = clock_service::load_dashboard(&state, &session).await?;
    Ok(Json(dashboard).into_response())
}

/// The employees currently on site, as CSV.
#[axum::debug_handler]
pub async fn export_present(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response> {
    let (file_name, bytes) = clock_service::export_present_csv(&state, &session).await?;
    Ok(download(bytes, CSV_CONTENT_TYPE, &file_name))
}

#[axum::debug_handler]
pub async fn day(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<DayQuery>,
) -> Result<Response> {
    let view = clock_service::load_day(&state, &session, query.date, query.employee_id).await?;
    Ok(Json(view).into_response())
}

#[axum::debug_handler]
pub async fn export_csv(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let query = table_query(&pairs)?;
    let bytes = clock_service::export_csv(&state, &session, &query).await?;
    Ok(download(bytes, CSV_CONTENT_TYPE, "clocks.csv"))
}

/// The filtered clocks, grouped by employee.
#[axum::debug_handler]
pub async fn export_xlsx(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let query = table_query(&pairs)?;
    let bytes = clock_service::export_xlsx(&state, &session, &query).await?;
    Ok(download(bytes, XLSX_CONTENT_TYPE, "clocks.xlsx"))
}

#[axum::debug_handler]
pub async fn export_monthly(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<MonthQuery>,
) -> Result<Response> {
    let (file_name, bytes) =
        clock_service::export_monthly(&state, &session, query.month.as_deref()).await?;
    tracing::info!("📤 Monthly export {} generated", file_name);
    Ok(download(bytes, XLSX_CONTENT_TYPE, &file_name))
}
