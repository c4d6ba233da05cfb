use std::time::Duration;

use axum::http::StatusCode;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

/// Which of the two client configurations a request goes out with.
#[derive(Clone, Copy)]
pub enum Auth<'a> {
    /// Credentials in the body: a 401 means they were wrong.
    Login,
    /// No credentials: the kiosk endpoints.
    Public,
    /// The admin's bearer token.
    Bearer(&'a str),
}

/// Client for the external REST backend.
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct ErrorItem {
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorItem>,
    #[serde(default)]
    detail: Option<String>,
}

/// Extracts the user-facing message from a backend error body.
///
/// The backend reports `{"errors": [{"detail": "..."}]}`; plain
/// `{"detail": "..."}` bodies are accepted too.
pub fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = sonic_rs::from_slice(body).ok()?;
    parsed
        .errors
        .into_iter()
        .find_map(|item| item.detail)
        .or(parsed.detail)
        .filter(|detail| !detail.trim().is_empty())
}

/// Maps a failed backend response onto the error taxonomy.
pub fn map_error_status(status: StatusCode, body: &[u8], auth: Auth<'_>) -> AppError {
    let detail = error_detail(body);
    match status {
        StatusCode::UNAUTHORIZED => match auth {
            Auth::Bearer(_) => AppError::SessionExpired,
            Auth::Login => AppError::Authentication(
                detail.unwrap_or_else(|| "Invalid email or password".to_string()),
            ),
            Auth::Public => AppError::Authentication(
                detail.unwrap_or_else(|| "This request was not authorized".to_string()),
            ),
        },
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimitExceeded(
            detail.unwrap_or_else(|| "Too many attempts. Please try again later".to_string()),
        ),
        StatusCode::NOT_FOUND => {
            AppError::NotFound(detail.unwrap_or_else(|| "Resource not found".to_string()))
        }
        status if status.is_client_error() => AppError::Backend {
            status,
            message: detail.unwrap_or_else(|| "The request was rejected".to_string()),
        },
        status => AppError::Backend {
            status,
            message: detail
                .unwrap_or_else(|| "Unable to reach the server. Please try again".to_string()),
        },
    }
}

impl BackendClient {
    /// Creates a client for the backend at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("timeclock/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts a request against `path`, attaching the bearer token when asked.
    pub fn request(&self, method: Method, path: &str, auth: Auth<'_>) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match auth {
            Auth::Login | Auth::Public => builder,
            Auth::Bearer(token) => builder.bearer_auth(token),
        }
    }

    /// Sends a request and decodes a JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        auth: Auth<'_>,
    ) -> Result<T> {
        let response = self.send(builder, auth).await?;
        Ok(response.json::<T>().await?)
    }

    /// Sends a request whose success body is ignored.
    pub async fn send_empty(&self, builder: RequestBuilder, auth: Auth<'_>) -> Result<()> {
        self.send(builder, auth).await.map(|_| ())
    }

    async fn send(&self, builder: RequestBuilder, auth: Auth<'_>) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let body = response.bytes().await.unwrap_or_default();
        let status = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        tracing::debug!("Backend {} answered {}", url, status);
        Err(map_error_status(status, &body, auth))
    }
}
