use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    error::{AppError, ForcedSignOut},
    services::auth as auth_service,
    state::AppState,
};

pub const SESSION_COOKIE: &str = "session_id";
pub const CSRF_COOKIE: &str = "csrf_token";

/// Id of the session a request was authenticated with.
#[derive(Clone, Copy, Debug)]
pub struct SessionId(pub Uuid);

/// Extracts the session token from the request cookies.
///
/// # Arguments
///
/// * `cookies` - The request cookies.
///
/// # Returns
///
/// An `Option` containing the session ID if found.
pub fn extract_session_token(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Expires both auth cookies on the client.
pub fn clear_auth_cookies(cookies: &Cookies) {
    for name in [SESSION_COOKIE, CSRF_COOKIE] {
        let mut cookie = Cookie::new(name, "");
        cookie.set_path("/");
        cookies.remove(cookie);
    }
}

/// A middleware that requires a valid session to be present.
///
/// The session is handed to handlers as an `Extension<Session>`. When the
/// backend rejects the session's token further down, the response carries a
/// [`ForcedSignOut`] marker and the session is torn down here.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// The handler's `Response`, or a 401 when no live session exists.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    tracing::debug!("🔐 Checking authentication...");

    let Some(session_id) = extract_session_token(&cookies) else {
        tracing::warn!("❌ No session_id cookie found");
        return AppError::Authentication("Not signed in".to_string()).into_response();
    };

    let session = match state.store.load_session(session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            tracing::warn!("❌ Session {} not found or expired", session_id);
            clear_auth_cookies(&cookies);
            return AppError::SessionExpired.into_response();
        }
        Err(e) => return e.into_response(),
    };

    tracing::debug!("✅ User authenticated: {}", session.user_id);
    request.extensions_mut().insert(SessionId(session_id));
    request.extensions_mut().insert(session);

    let response = next.run(request).await;

    if response.extensions().get::<ForcedSignOut>().is_some() {
        let csrf_token = cookies.get(CSRF_COOKIE).map(|c| c.value().to_string());
        if let Err(e) = auth_service::end_session(&state, session_id, csrf_token.as_deref()).await {
            tracing::error!("❌ Failed to drop rejected session {}: {}", session_id, e);
        }
        clear_auth_cookies(&cookies);
        tracing::info!("👋 Session {} signed out after backend 401", session_id);
    }

    response
}

/// Redirects between the login page and the dashboard pages.
///
/// `/dashboard` and below need a live session; `/login` is skipped when
/// one already exists. Every other path passes through.
pub async fn guard_pages(
    State(state): State<AppState>,
    cookies: Cookies,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let protected = path == "/dashboard" || path.starts_with("/dashboard/");
    let login = path == "/login" || path.starts_with("/login/");
    if !protected && !login {
        return next.run(request).await;
    }

    let signed_in = match extract_session_token(&cookies) {
        Some(id) => matches!(state.store.load_session(id).await, Ok(Some(_))),
        None => false,
    };

    match (protected, signed_in) {
        (true, false) => {
            tracing::debug!("🔒 {} requires a session, redirecting to /login", path);
            Redirect::to("/login").into_response()
        }
        (false, true) => Redirect::to("/dashboard").into_response(),
        _ => next.run(request).await,
    }
}
