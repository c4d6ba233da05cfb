use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::Result,
    kiosk::capture::{GEOLOCATION_POLICY, LocationError, LocationFix},
    models::clock::ClockType,
    services::kiosk as kiosk_service,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub clock_type: ClockType,
}

/// Never logged: the PIN is the employee's credential.
#[derive(Deserialize)]
pub struct PinRequest {
    pub pin: String,
}

/// What the device reported for the geolocation request.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LocationReport {
    Failed { error: LocationError },
    Fix(LocationFix),
}

#[derive(Deserialize)]
pub struct PhotoRequest {
    pub photo: String,
}

/// Opens an attempt for the clock-in or clock-out kiosk page.
#[axum::debug_handler]
pub async fn start(
    State(state): State<AppState>,
    Json(payload): Json<StartRequest>,
) -> Result<Response> {
    let view = kiosk_service::start(&state, payload.clock_type).await;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

#[axum::debug_handler]
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    Ok(Json(kiosk_service::view(&state, id).await?).into_response())
}

#[axum::debug_handler]
pub async fn cancel(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    kiosk_service::cancel(&state, id).await;
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[axum::debug_handler]
pub async fn submit_pin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PinRequest>,
) -> Result<Response> {
    Ok(Json(kiosk_service::submit_pin(&state, id, &payload.pin).await?).into_response())
}

#[axum::debug_handler]
pub async fn confirm(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    Ok(Json(kiosk_service::confirm(&state, id).await?).into_response())
}

#[axum::debug_handler]
pub async fn back(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    Ok(Json(kiosk_service::back(&state, id).await?).into_response())
}

#[axum::debug_handler]
pub async fn location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LocationReport>,
) -> Result<Response> {
    let outcome = match payload {
        LocationReport::Fix(fix) => Ok(fix),
        LocationReport::Failed { error } => Err(error),
    };
    Ok(Json(kiosk_service::capture_location(&state, id, outcome).await?).into_response())
}

#[axum::debug_handler]
pub async fn photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PhotoRequest>,
) -> Result<Response> {
    Ok(Json(kiosk_service::capture_photo(&state, id, &payload.photo).await?).into_response())
}

#[axum::debug_handler]
pub async fn retry(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Response> {
    Ok(Json(kiosk_service::retry(&state, id).await?).into_response())
}

/// How the page should ask the device for a position.
pub async fn geolocation_policy() -> impl IntoResponse {
    Json(GEOLOCATION_POLICY)
}
