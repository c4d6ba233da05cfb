use axum::http::StatusCode;
use chrono::Utc;
use garde::Validate;
use uuid::Uuid;

use crate::crypto::csrf::{self, CSRF_TOKEN_TTL_SECS};
use crate::error::{AppError, Result};
use crate::models::session::Session;
use crate::models::user::User;
use crate::repositories::user as user_repo;
use crate::state::AppState;
use crate::store::csrf_key;
use crate::validation::auth::LoginRequest;

/// A freshly opened admin session.
pub struct SignedIn {
    pub session_id: Uuid,
    pub csrf_token: String,
    pub user_id: i64,
}

fn session_ttl_secs(state: &AppState) -> u64 {
    (state.config.session_duration_days.max(1) * 86400) as u64
}

/// Authenticates against the backend and opens a session holding its tokens.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - The submitted credentials.
///
/// # Returns
///
/// The new session id and its CSRF token.
pub async fn login(state: &AppState, request: &LoginRequest) -> Result<SignedIn> {
    request.validate()?;

    let tokens = user_repo::login(&state.backend, &request.email, &request.password)
        .await
        .map_err(|e| match e {
            AppError::Authentication(_) => {
                AppError::Authentication("Invalid email or password".to_string())
            }
            AppError::RateLimitExceeded(_) => AppError::RateLimitExceeded(
                "Too many attempts. Please try again later".to_string(),
            ),
            other => {
                tracing::error!("❌ Login request failed: {}", other);
                AppError::Backend {
                    status: StatusCode::BAD_GATEWAY,
                    message: "Unable to reach the server. Please try again".to_string(),
                }
            }
        })?;

    let now = Utc::now();
    let session = Session {
        user_id: tokens.id,
        access_token: tokens.access,
        refresh_token: tokens.refresh,
        created_at: now,
        expires_at: now + chrono::Duration::days(state.config.session_duration_days),
    };

    let session_id = Uuid::new_v4();
    state
        .store
        .save_session(session_id, &session, session_ttl_secs(state))
        .await?;
    tracing::info!("✅ Session saved: session:{}", session_id);

    let csrf_token = issue_csrf_token(state).await?;

    Ok(SignedIn {
        session_id,
        csrf_token,
        user_id: session.user_id,
    })
}

/// Generates a CSRF token and records it in the store.
pub async fn issue_csrf_token(state: &AppState) -> Result<String> {
    let token = csrf::generate_csrf_token();
    state
        .store
        .set_ex(&csrf_key(&token), "valid", CSRF_TOKEN_TTL_SECS)
        .await?;
    tracing::debug!("🔐 Issued CSRF token {}...", csrf::token_prefix(&token));
    Ok(token)
}

/// Removes a session and its CSRF token. Missing entries are fine.
pub async fn end_session(state: &AppState, session_id: Uuid, csrf_token: Option<&str>) -> Result<()> {
    state.store.delete_session(session_id).await?;
    if let Some(token) = csrf_token {
        state.store.del(&csrf_key(token)).await?;
    }
    tracing::info!("✅ Session {} closed", session_id);
    Ok(())
}

/// The admin behind a session.
pub async fn current_user(state: &AppState, session: &Session) -> Result<User> {
    user_repo::identity(&state.backend, &session.access_token).await
}
