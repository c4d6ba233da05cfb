use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};
use chrono::{FixedOffset, Offset, Utc};

/// Where sessions, CSRF tokens and login counters live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionBackend {
    /// A Redis server at the given URL.
    Redis(String),
    /// The process itself. Sessions are lost on restart.
    Memory,
}

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the REST backend, without a trailing slash.
    pub backend_url: String,
    /// Timeout applied to every backend request.
    pub backend_timeout_secs: u64,
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The session store.
    pub session_backend: SessionBackend,
    /// The duration of a session in days.
    pub session_duration_days: i64,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
    /// How long an idle kiosk attempt is kept, in seconds.
    pub kiosk_attempt_ttl_secs: u64,
    /// Directory holding the static pages.
    pub public_dir: String,
    /// Offset of the site's local time, used for calendar days and exports.
    pub utc_offset: FixedOffset,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let backend_url = env::var("BACKEND_URL")
            .context("BACKEND_URL must be set (e.g. http://127.0.0.1:8000)")?
            .trim_end_matches('/')
            .to_string();

        let session_backend = match env::var("SESSION_STORE").as_deref() {
            Ok("memory") => SessionBackend::Memory,
            _ => SessionBackend::Redis(
                env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            ),
        };

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| {
                "http://localhost:3000,http://127.0.0.1:3000,http://[::1]:3000".to_string()
            })
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let utc_offset =
            parse_utc_offset(&env::var("UTC_OFFSET_MINUTES").unwrap_or_else(|_| "0".to_string()))?;

        Ok(Self {
            backend_url,
            backend_timeout_secs: env::var("BACKEND_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid BACKEND_TIMEOUT_SECS")?,
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            session_backend,
            session_duration_days: env::var("SESSION_DURATION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .context("Invalid SESSION_DURATION_DAYS")?,
            secure_cookies: env::var("APP_ENV")
                .unwrap_or_else(|_| "development".to_string())
                == "production",
            allowed_origins,
            kiosk_attempt_ttl_secs: env::var("KIOSK_ATTEMPT_TTL_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .context("Invalid KIOSK_ATTEMPT_TTL_SECS")?,
            public_dir: env::var("PUBLIC_DIR").unwrap_or_else(|_| "files/public".to_string()),
            utc_offset,
        })
    }

    /// A configuration suited to running against a local backend with the
    /// in-memory session store.
    pub fn local(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            backend_timeout_secs: 30,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            session_backend: SessionBackend::Memory,
            session_duration_days: 7,
            secure_cookies: false,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            kiosk_attempt_ttl_secs: 900,
            public_dir: "files/public".to_string(),
            utc_offset: Utc.fix(),
        }
    }
}

/// Parses a signed offset from UTC in minutes, e.g. `-180` or `60`.
fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let minutes: i32 = raw.trim().parse().context("Invalid UTC_OFFSET_MINUTES")?;
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .context("UTC_OFFSET_MINUTES must be within a day")
}
