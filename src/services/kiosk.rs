use uuid::Uuid;

use crate::error::Result;
use crate::kiosk::capture::{LocationError, LocationFix};
use crate::kiosk::flow::AttemptView;
use crate::models::clock::ClockType;
use crate::state::AppState;

/// Opens a kiosk attempt for a clock-in or clock-out.
pub async fn start(state: &AppState, clock_type: ClockType) -> AttemptView {
    let attempt = state.kiosk.start(clock_type).await;
    let attempt = attempt.lock().await;
    attempt.view()
}

pub async fn view(state: &AppState, id: Uuid) -> Result<AttemptView> {
    let attempt = state.kiosk.get(id).await?;
    let attempt = attempt.lock().await;
    Ok(attempt.view())
}

/// Abandons an attempt.
pub async fn cancel(state: &AppState, id: Uuid) {
    state.kiosk.remove(id).await;
}

pub async fn submit_pin(state: &AppState, id: Uuid, pin: &str) -> Result<AttemptView> {
    let attempt = state.kiosk.get(id).await?;
    let mut attempt = attempt.lock().await;
    attempt.submit_pin(&state.backend, pin).await?;
    Ok(attempt.view())
}

pub async fn confirm(state: &AppState, id: Uuid) -> Result<AttemptView> {
    let attempt = state.kiosk.get(id).await?;
    let mut attempt = attempt.lock().await;
    attempt.confirm()?;
    Ok(attempt.view())
}

pub async fn back(state: &AppState, id: Uuid) -> Result<AttemptView> {
    let attempt = state.kiosk.get(id).await?;
    let mut attempt = attempt.lock().await;
    attempt.back()?;
    Ok(attempt.view())
}

pub async fn capture_location(
    state: &AppState,
    id: Uuid,
    outcome: std::result::Result<LocationFix, LocationError>,
) -> Result<AttemptView> {
    let attempt = state.kiosk.get(id).await?;
    let mut attempt = attempt.lock().await;
    attempt.capture_location(outcome)?;
    Ok(attempt.view())
}

/// Submits the clock once the photo is in.
///
/// A rejected submission still answers with the attempt's view, now on the
/// error screen.
pub async fn capture_photo(state: &AppState, id: Uuid, photo: &str) -> Result<AttemptView> {
    let attempt = state.kiosk.get(id).await?;
    let mut attempt = attempt.lock().await;
    attempt.capture_photo(&state.backend, photo).await?;
    Ok(attempt.view())
}

pub async fn retry(state: &AppState, id: Uuid) -> Result<AttemptView> {
    let attempt = state.kiosk.get(id).await?;
    let mut attempt = attempt.lock().await;
    attempt.retry()?;
    Ok(attempt.view())
}
