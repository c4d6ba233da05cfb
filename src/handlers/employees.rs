use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use garde::Validate;

use crate::{
    error::Result,
    handlers::table::{
        BulkDeleteRequest, CSV_CONTENT_TYPE, XLSX_CONTENT_TYPE, download, table_query,
    },
    models::session::Session,
    services::employees as employee_service,
    state::AppState,
    validation::employee::EmployeeForm,
};

/// One page of the employees table.
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let query = table_query(&pairs)?;
    let view = employee_service::table(&state, &session, &query).await?;
    Ok(Json(view).into_response())
}

#[axum::debug_handler]
pub async fn get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let employee = employee_service::get(&state, &session, id).await?;
    Ok(Json(employee).into_response())
}

#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<EmployeeForm>,
) -> Result<Response> {
    let employee = employee_service::create(&state, &session, payload).await?;
    Ok((StatusCode::CREATED, Json(employee)).into_response())
}

#[axum::debug_handler]
pub async fn update(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
    Json(payload): Json<EmployeeForm>,
) -> Result<Response> {
    let employee = employee_service::update(&state, &session, id, payload).await?;
    Ok(Json(employee).into_response())
}

#[axum::debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Response> {
    employee_service::delete(&state, &session, id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Deletes the selected employees in order, reporting where it stopped.
#[axum::debug_handler]
pub async fn bulk_delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<Response> {
    payload.validate()?;
    let outcome = employee_service::bulk_delete(&state, &session, &payload.ids).await?;
    Ok(Json(outcome).into_response())
}

#[axum::debug_handler]
pub async fn export_csv(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let query = table_query(&pairs)?;
    let bytes = employee_service::export_csv(&state, &session, &query).await?;
    Ok(download(bytes, CSV_CONTENT_TYPE, "employees.csv"))
}

#[axum::debug_handler]
pub async fn export_xlsx(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let query = table_query(&pairs)?;
    let bytes = employee_service::export_xlsx(&state, &session, &query).await?;
    Ok(download(bytes, XLSX_CONTENT_TYPE, "employees.xlsx"))
}
