use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Marker placed on responses whose backend call was rejected with a 401.
///
/// The auth middleware looks for it and tears the session down.
#[derive(Clone, Copy, Debug)]
pub struct ForcedSignOut;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend could not be reached or its body could not be read.
    #[error("Backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("Backend error ({status}): {message}")]
    Backend { status: StatusCode, message: String },

    /// An authentication error.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The backend rejected the session's bearer token.
    #[error("Session expired")]
    SessionExpired,

    /// An authorization error.
    #[error("Authorization failed")]
    Unauthorized,

    /// A resource not found error.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested action does not apply to the current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The device could not provide a capability (location, camera).
    #[error("Device capability error: {0}")]
    Capability(String),

    /// A multipart error.
    #[error("Multipart error: {0}")]
    Multipart(String),

    /// A spreadsheet could not be produced.
    #[error("Export error: {0}")]
    Export(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),

    /// A rate limit exceeded error.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        let message = report
            .iter()
            .map(|(path, error)| {
                let path = path.to_string();
                if path.is_empty() {
                    error.message().to_string()
                } else {
                    format!("{}: {}", path, error.message())
                }
            })
            .collect::<Vec<_>>()
            .join("; ");
        AppError::Validation(message)
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        AppError::Multipart(e.body_text())
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::Export(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        AppError::Export(e.to_string())
    }
}

impl AppError {
    /// The message a user should see for this error, if it carries one.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            AppError::Backend { message, .. }
            | AppError::Authentication(message)
            | AppError::NotFound(message)
            | AppError::Validation(message)
            | AppError::RateLimitExceeded(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut redirect = None;

        let (status, message) = match self {
            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Session store error".to_string())
            }

            AppError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "File system error".to_string())
            }

            AppError::Http(ref e) => {
                tracing::error!("Backend request failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Unable to reach the server. Please try again".to_string(),
                )
            }

            AppError::Backend { status, ref message } => {
                if status.is_server_error() {
                    tracing::error!("Backend error {}: {}", status, message);
                    (StatusCode::BAD_GATEWAY, message.clone())
                } else {
                    tracing::warn!("Backend rejected request {}: {}", status, message);
                    (status, message.clone())
                }
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }

            AppError::SessionExpired => {
                tracing::warn!("Backend rejected the session token, signing out");
                redirect = Some("/login");
                (StatusCode::UNAUTHORIZED, "Session expired".to_string())
            }

            AppError::Unauthorized => {
                tracing::warn!("Authorization failed");
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }

            AppError::NotFound(ref msg) => {
                tracing::debug!("Resource not found: {}", msg);
                (StatusCode::NOT_FOUND, msg.clone())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Conflict(ref msg) => {
                tracing::debug!("Conflict: {}", msg);
                (StatusCode::CONFLICT, msg.clone())
            }

            AppError::Capability(ref msg) => {
                tracing::debug!("Device capability error: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, msg.clone())
            }

            AppError::Multipart(ref msg) => {
                tracing::error!("Multipart error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Export(ref msg) => {
                tracing::error!("Export error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Export failed".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::RateLimitExceeded(ref msg) => {
                tracing::warn!("Rate limit exceeded: {}", msg);
                (StatusCode::TOO_MANY_REQUESTS, msg.clone())
            }
        };

        let body = match redirect {
            Some(to) => sonic_rs::to_string(&sonic_rs::json!({
                "error": message,
                "redirect": to
            })),
            None => sonic_rs::to_string(&sonic_rs::json!({
                "error": message
            })),
        }
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        let mut response =
            (status, [(header::CONTENT_TYPE, "application/json")], body).into_response();
        if redirect.is_some() {
            response.extensions_mut().insert(ForcedSignOut);
        }
        response
    }
}
