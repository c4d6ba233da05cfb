use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use http::{HeaderValue, Method, header};
use tower_cookies::CookieManagerLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod backend;
pub mod config;
pub mod error;
pub mod state;
pub mod store;

pub mod crypto {
    pub mod csrf;
}

pub mod models {
    pub mod clock;
    pub mod employee;
    pub mod session;
    pub mod user;
}

pub mod kiosk {
    pub mod capture;
    pub mod flow;
    pub mod registry;
}

pub mod table {
    pub mod bulk;
    pub mod column;
    pub mod filter;
    pub mod pagination;
    pub mod selection;
    pub mod sort;
    pub mod view;
}

pub mod export {
    pub mod clocks;
    pub mod csv;
    pub mod sheet;
    pub mod xlsx;
}

pub mod repositories {
    pub mod clock;
    pub mod employee;
    pub mod user;
}

pub mod services {
    pub mod account;
    pub mod auth;
    pub mod clocks;
    pub mod employees;
    pub mod kiosk;
}

pub mod handlers {
    pub mod account;
    pub mod auth;
    pub mod clocks;
    pub mod employees;
    pub mod kiosk;
    pub mod table;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod csrf;
    pub mod rate_limit;
}

pub mod validation {
    pub mod auth;
    pub mod employee;
}

use state::AppState;

/// Captured photos arrive as data URLs, so bodies are allowed a few MB.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the application router.
///
/// # Arguments
///
/// * `state` - The application state.
///
/// # Returns
///
/// The router with every route, guard and layer attached.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("⚠️ Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::COOKIE,
            header::HeaderName::from_static(middleware_layer::csrf::CSRF_HEADER),
        ])
        .allow_credentials(true)
        .expose_headers([header::CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(86400));

    let kiosk_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(30)
            .use_headers()
            .finish()
            .context("Invalid kiosk rate limit configuration")?,
    );

    let login_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::rate_limit::rate_limit_login,
        ))
        .with_state(state.clone());

    let kiosk_routes = Router::new()
        .route("/api/kiosk/attempts", post(handlers::kiosk::start))
        .route(
            "/api/kiosk/attempts/{id}",
            get(handlers::kiosk::get).delete(handlers::kiosk::cancel),
        )
        .route("/api/kiosk/attempts/{id}/pin", post(handlers::kiosk::submit_pin))
        .route("/api/kiosk/attempts/{id}/confirm", post(handlers::kiosk::confirm))
        .route("/api/kiosk/attempts/{id}/back", post(handlers::kiosk::back))
        .route("/api/kiosk/attempts/{id}/location", post(handlers::kiosk::location))
        .route("/api/kiosk/attempts/{id}/photo", post(handlers::kiosk::photo))
        .route("/api/kiosk/attempts/{id}/retry", post(handlers::kiosk::retry))
        .route(
            "/api/kiosk/geolocation-policy",
            get(handlers::kiosk::geolocation_policy),
        )
        .layer(tower_governor::GovernorLayer::new(kiosk_governor_conf))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/account/info", put(handlers::account::update_info))
        .route("/api/account/password", put(handlers::account::update_password))
        .route(
            "/api/admin/employees",
            get(handlers::employees::list).post(handlers::employees::create),
        )
        .route(
            "/api/admin/employees/bulk-delete",
            post(handlers::employees::bulk_delete),
        )
        .route(
            "/api/admin/employees/export.csv",
            get(handlers::employees::export_csv),
        )
        .route(
            "/api/admin/employees/export.xlsx",
            get(handlers::employees::export_xlsx),
        )
        .route(
            "/api/admin/employees/{id}",
            get(handlers::employees::get)
                .put(handlers::employees::update)
                .delete(handlers::employees::delete),
        )
        .route("/api/admin/clocks", get(handlers::clocks::list))
        .route("/api/admin/clocks/bulk-delete", post(handlers::clocks::bulk_delete))
        .route("/api/admin/clocks/dashboard", get(handlers::clocks::dashboard))
        .route(
            "/api/admin/clocks/dashboard/export.csv",
            get(handlers::clocks::export_present),
        )
        .route("/api/admin/clocks/day", get(handlers::clocks::day))
        .route("/api/admin/clocks/export.csv", get(handlers::clocks::export_csv))
        .route("/api/admin/clocks/export.xlsx", get(handlers::clocks::export_xlsx))
        .route(
            "/api/admin/clocks/export/monthly.xlsx",
            get(handlers::clocks::export_monthly),
        )
        .route(
            "/api/admin/clocks/{id}",
            get(handlers::clocks::get).delete(handlers::clocks::delete),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::csrf::verify_csrf,
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    let public_dir = state.config.public_dir.clone();

    let app = Router::new()
        .merge(login_routes)
        .merge(kiosk_routes)
        .merge(protected_routes)
        .fallback_service(ServeDir::new(public_dir))
        .layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::guard_pages,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors);

    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let config = config::Config::local("http://127.0.0.1:9");
        let state = AppState::with_store(&config, store::SessionStore::memory()).unwrap();
        build_router(state).unwrap()
    }

    async fn status_of(uri: &str) -> (StatusCode, Option<String>) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        (response.status(), location)
    }

    #[tokio::test]
    async fn admin_api_rejects_anonymous_requests() {
        assert_eq!(status_of("/api/admin/clocks").await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("/api/auth/me").await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn dashboard_pages_send_anonymous_visitors_to_login() {
        let (status, location) = status_of("/dashboard/employees").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/login"));
    }
}
