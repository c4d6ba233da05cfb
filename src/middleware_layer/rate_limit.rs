use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sonic_rs::JsonValueTrait;

use crate::{error::AppError, state::AppState};

/// Failed logins tolerated per email before the address is locked out.
pub const MAX_LOGIN_ATTEMPTS: i64 = 5;
/// How long failed logins are remembered, in seconds.
pub const LOGIN_WINDOW_SECS: u64 = 43200;
/// Login bodies are tiny; anything bigger is refused before parsing.
const MAX_LOGIN_BODY: usize = 16 * 1024;

fn login_key(email: &str) -> String {
    format!("rate_limit:login:{}", email.trim().to_lowercase())
}

fn extract_email(body_bytes: &[u8]) -> Option<String> {
    let json = sonic_rs::from_slice::<sonic_rs::Value>(body_bytes).ok()?;
    json.get("email")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// A middleware that rate limits login attempts per email.
///
/// A client error from the login handler counts as a failed attempt; a
/// success clears the counter.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `req` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an error `AppError`.
pub async fn rate_limit_login(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_LOGIN_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return AppError::Validation("Login request too large".to_string()).into_response();
        }
    };

    let email = extract_email(&body_bytes).unwrap_or_else(|| "unknown".to_string());
    let key = login_key(&email);

    match state.store.get(&key).await {
        Ok(Some(count)) if count.parse::<i64>().unwrap_or(0) >= MAX_LOGIN_ATTEMPTS => {
            let ttl = state.store.ttl(&key).await.ok().flatten().unwrap_or(0);
            tracing::warn!("❌ Login locked out for {}", email);
            return AppError::RateLimitExceeded(format!(
                "Too many failed login attempts. Try again in {} minutes",
                ttl / 60
            ))
            .into_response();
        }
        Ok(_) => {}
        Err(e) => tracing::error!("❌ Rate limit lookup failed: {}", e),
    }

    let response = next.run(Request::from_parts(parts, Body::from(body_bytes))).await;

    if response.status().is_client_error() {
        match state.store.incr_with_expiry(&key, LOGIN_WINDOW_SECS).await {
            Ok(count) => tracing::debug!("Failed login {} for {}", count, email),
            Err(e) => tracing::error!("❌ Failed to count login attempt: {}", e),
        }
    } else if response.status().is_success() {
        if let Err(e) = state.store.del(&key).await {
            tracing::error!("❌ Failed to reset login counter: {}", e);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_keyed_by_normalized_email() {
        assert_eq!(login_key(" Admin@Example.com "), "rate_limit:login:admin@example.com");
    }

    #[test]
    fn email_is_read_from_the_json_body() {
        assert_eq!(
            extract_email(br#"{"email":"a@b.co","password":"x"}"#).as_deref(),
            Some("a@b.co")
        );
        assert_eq!(extract_email(b"not json"), None);
    }
}
