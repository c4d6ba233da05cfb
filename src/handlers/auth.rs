use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_cookies::cookie::{SameSite, time::Duration};
use tower_cookies::{Cookie, Cookies};

use crate::{
    error::Result,
    middleware_layer::auth::{CSRF_COOKIE, SESSION_COOKIE, SessionId, clear_auth_cookies},
    models::session::Session,
    services::auth as auth_service,
    state::AppState,
    validation::auth::LoginRequest,
};

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}

/// Creates a cookie with the given name, value, and max age.
///
/// The session cookie is HttpOnly; the CSRF cookie has to stay readable so
/// the page can echo it in the `x-csrf-token` header.
fn create_secure_cookie(
    name: &'static str,
    value: String,
    max_age_secs: i64,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    if name != CSRF_COOKIE {
        cookie.set_http_only(true);
    }
    if secure {
        cookie.set_secure(true);
    }
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie.set_path("/");
    cookie
}

/// Handles admin login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt - Payload: {:?}", payload);

    let signed_in = auth_service::login(&state, &payload).await?;
    let secure = state.config.secure_cookies;

    cookies.add(create_secure_cookie(
        SESSION_COOKIE,
        signed_in.session_id.to_string(),
        state.config.session_duration_days * 86400,
        secure,
    ));
    cookies.add(create_secure_cookie(
        CSRF_COOKIE,
        signed_in.csrf_token,
        crate::crypto::csrf::CSRF_TOKEN_TTL_SECS as i64,
        secure,
    ));
    tracing::info!("✅ User logged in: {}", signed_in.user_id);

    let response = AuthResponse {
        success: true,
        message: "Login successful".to_string(),
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles admin logout.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(SessionId(session_id)): Extension<SessionId>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
) -> Result<Response> {
    tracing::info!("👋 Logout for user: {}", session.user_id);

    let csrf_token = cookies.get(CSRF_COOKIE).map(|c| c.value().to_string());
    auth_service::end_session(&state, session_id, csrf_token.as_deref()).await?;
    clear_auth_cookies(&cookies);

    let response = AuthResponse {
        success: true,
        message: "Logout successful".to_string(),
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// The signed-in admin's profile.
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response> {
    let user = auth_service::current_user(&state, &session).await?;
    Ok(Json(user).into_response())
}
