#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

use timeclock::{build_router, config::Config, state::AppState, store::SessionStore};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "Correct-horse1";
const ACCESS_TOKEN: &str = "access-token";

/// One multipart field received by the mock clock endpoint.
#[derive(Debug, Clone)]
pub struct ReceivedPart {
    pub text: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub len: usize,
}

/// In-process stand-in for the REST backend.
#[derive(Default)]
pub struct MockBackend {
    pub employees: Mutex<Vec<Value>>,
    pub clocks: Mutex<Vec<Value>>,
    pub pin_lookups: Mutex<Vec<String>>,
    pub submissions: Mutex<Vec<BTreeMap<String, ReceivedPart>>>,
    pub delete_calls: Mutex<Vec<i64>>,
    pub failing_deletes: Mutex<HashSet<i64>>,
    pub revoked: AtomicBool,
    pub reject_clocks: AtomicBool,
    pub unauthorized_clocks: AtomicBool,
    next_id: AtomicI64,
}

impl MockBackend {
    fn seeded() -> Self {
        let backend = MockBackend {
            next_id: AtomicI64::new(100),
            ..MockBackend::default()
        };
        *backend.employees.lock().unwrap() = vec![
            employee(1, "Bruno", "Costa", "1111"),
            employee(2, "Carla", "Dias", "2222"),
            employee(3, "Diego", "Alves", "3333"),
            employee(4, "Elisa", "Moura", "4444"),
            employee(7, "Ana", "Silva", "4821"),
        ];
        backend
    }

    fn authorized(&self, headers: &HeaderMap) -> Result<(), Response> {
        let expected = format!("Bearer {}", ACCESS_TOKEN);
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        if bearer == Some(expected.as_str()) && !self.revoked.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(error(StatusCode::UNAUTHORIZED, "Given token not valid for any token type"))
        }
    }
}

pub fn employee(id: i64, first: &str, last: &str, pin: &str) -> Value {
    json!({
        "id": id,
        "firstName": first,
        "lastName": last,
        "phoneNumber": "0612345678",
        "pinCode": pin,
        "monthlyScore": 12.5
    })
}

fn error(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "errors": [{ "detail": detail }] }))).into_response()
}

type Mock = State<Arc<MockBackend>>;

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == ADMIN_EMAIL && body["password"] == ADMIN_PASSWORD {
        Json(json!({ "id": 1, "access": ACCESS_TOKEN, "refresh": "refresh-token" })).into_response()
    } else {
        error(StatusCode::UNAUTHORIZED, "No active account found with the given credentials")
    }
}

async fn identity(State(mock): Mock, headers: HeaderMap) -> Response {
    if let Err(denied) = mock.authorized(&headers) {
        return denied;
    }
    Json(json!({
        "id": 1,
        "firstName": "Admin",
        "lastName": "User",
        "email": ADMIN_EMAIL,
        "phoneNumber": "0600000000"
    }))
    .into_response()
}

async fn list_employees(State(mock): Mock, headers: HeaderMap) -> Response {
    if let Err(denied) = mock.authorized(&headers) {
        return denied;
    }
    Json(mock.employees.lock().unwrap().clone()).into_response()
}

async fn create_employee(State(mock): Mock, headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
    if let Err(denied) = mock.authorized(&headers) {
        return denied;
    }
    body["id"] = json!(mock.next_id.fetch_add(1, Ordering::SeqCst));
    mock.employees.lock().unwrap().push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn delete_employee(State(mock): Mock, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(denied) = mock.authorized(&headers) {
        return denied;
    }
    mock.delete_calls.lock().unwrap().push(id);
    if mock.failing_deletes.lock().unwrap().contains(&id) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Employee could not be deleted");
    }
    mock.employees.lock().unwrap().retain(|e| e["id"] != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn employee_by_pin(State(mock): Mock, Json(body): Json<Value>) -> Response {
    let pin = body["pinCode"].as_str().unwrap_or_default().to_string();
    mock.pin_lookups.lock().unwrap().push(pin.clone());
    let found = mock
        .employees
        .lock()
        .unwrap()
        .iter()
        .find(|e| e["pinCode"] == pin.as_str())
        .cloned();
    match found {
        Some(employee) => Json(employee).into_response(),
        None => error(StatusCode::NOT_FOUND, "Employee not found with this PIN"),
    }
}

async fn list_clocks(State(mock): Mock, headers: HeaderMap) -> Response {
    if let Err(denied) = mock.authorized(&headers) {
        return denied;
    }
    Json(mock.clocks.lock().unwrap().clone()).into_response()
}

async fn create_clock(State(mock): Mock, mut multipart: Multipart) -> Response {
    let mut parts = BTreeMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default();
        let text = match file_name {
            Some(_) => None,
            None => String::from_utf8(bytes.to_vec()).ok(),
        };
        parts.insert(
            name,
            ReceivedPart { text, file_name, content_type, len: bytes.len() },
        );
    }
    mock.submissions.lock().unwrap().push(parts.clone());

    if mock.reject_clocks.load(Ordering::SeqCst) {
        return error(StatusCode::BAD_REQUEST, "Already clocked in today");
    }
    if mock.unauthorized_clocks.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, Json(json!({}))).into_response();
    }

    let text = |name: &str| parts.get(name).and_then(|p| p.text.clone()).unwrap_or_default();
    let pin = text("pin_code");
    let employee_id = mock
        .employees
        .lock()
        .unwrap()
        .iter()
        .find(|e| e["pinCode"] == pin.as_str())
        .and_then(|e| e["id"].as_i64())
        .unwrap_or(0);

    let record = json!({
        "id": mock.next_id.fetch_add(1, Ordering::SeqCst),
        "clockType": text("clock_type"),
        "employee": employee_id,
        "pinCode": pin,
        "locationLat": text("location_lat").parse::<f64>().unwrap_or(0.0),
        "locationLng": text("location_lng").parse::<f64>().unwrap_or(0.0),
        "photo": "http://backend.test/media/clock.jpg",
        "timestamp": chrono::Utc::now().to_rfc3339()
    });
    mock.clocks.lock().unwrap().push(record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn spawn_mock_backend(mock: Arc<MockBackend>) -> String {
    let app = Router::new()
        .route("/api/users/login-email/", post(login))
        .route("/api/users/identity/", post(identity))
        .route(
            "/api/employees/employees/",
            get(list_employees).post(create_employee),
        )
        .route("/api/employees/employees/by-pin/", post(employee_by_pin))
        .route(
            "/api/employees/employees/{id}/",
            axum::routing::delete(delete_employee),
        )
        .route(
            "/api/employees/clock-records/",
            get(list_clocks).post(create_clock),
        )
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// The real router, wired to a fresh mock backend and an in-memory store.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub backend: Arc<MockBackend>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Signs in and returns the CSRF token to echo on mutations.
    pub async fn login(&self) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200, "Login failed");
        response
            .cookies()
            .find(|c| c.name() == "csrf_token")
            .map(|c| c.value().to_string())
            .expect("CSRF token not found in login response")
    }

    /// Runs a whole kiosk clock for `pin` and returns the final view.
    pub async fn clock(&self, clock_type: &str, pin: &str) -> Value {
        let post = |path: String, body: Value| {
            let request = self.client.post(self.url(&path)).json(&body);
            async move { request.send().await.unwrap().json::<Value>().await.unwrap() }
        };

        let view = post("/api/kiosk/attempts".into(), json!({ "clock_type": clock_type })).await;
        let attempt = format!("/api/kiosk/attempts/{}", view["id"].as_str().unwrap());
        post(format!("{}/pin", attempt), json!({ "pin": pin })).await;
        post(format!("{}/confirm", attempt), json!({})).await;
        post(
            format!("{}/location", attempt),
            json!({ "lat": 48.85, "lng": 2.35, "accuracy": 10.0 }),
        )
        .await;
        post(format!("{}/photo", attempt), json!({ "photo": jpeg_data_url() })).await
    }
}

pub async fn spawn_app() -> TestApp {
    let backend = Arc::new(MockBackend::seeded());
    let backend_url = spawn_mock_backend(backend.clone()).await;

    let config = Config::local(backend_url);
    let state = AppState::with_store(&config, SessionStore::memory()).unwrap();
    let app = build_router(state).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap(),
        backend,
    }
}

pub fn jpeg_data_url() -> String {
    use base64::Engine as _;
    let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01];
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(jpeg)
    )
}
