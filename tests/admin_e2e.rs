mod common;

use std::sync::atomic::Ordering;

use serde_json::{Value, json};

use common::{ADMIN_EMAIL, spawn_app};

#[tokio::test]
async fn test_login_sets_session_and_csrf_cookies() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": "Wrong-password1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid email or password");

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": common::ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let cookies: Vec<_> = response.cookies().map(|c| (c.name().to_string(), c.http_only())).collect();
    assert!(cookies.contains(&("session_id".to_string(), true)));
    assert!(cookies.contains(&("csrf_token".to_string(), false)));

    let me: Value = app
        .client
        .get(app.url("/api/auth/me"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn test_admin_routes_need_a_session() {
    let app = spawn_app().await;
    let response = app.client.get(app.url("/api/admin/employees")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_mutations_need_the_csrf_header() {
    let app = spawn_app().await;
    let csrf_token = app.login().await;

    let response = app
        .client
        .post(app.url("/api/admin/employees/bulk-delete"))
        .json(&json!({ "ids": [1] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing CSRF token header");

    let response = app
        .client
        .post(app.url("/api/admin/employees/bulk-delete"))
        .header("x-csrf-token", "forged-token-value")
        .json(&json!({ "ids": [1] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .post(app.url("/api/admin/employees/bulk-delete"))
        .header("x-csrf-token", &csrf_token)
        .json(&json!({ "ids": [1] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(app.backend.delete_calls.lock().unwrap().contains(&1));
}

#[tokio::test]
async fn test_employee_table_sorts_filters_and_pages() {
    let app = spawn_app().await;
    app.login().await;

    let view: Value = app
        .client
        .get(app.url("/api/admin/employees?sort=first_name.asc&page_size=5"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = view["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["first_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Ana", "Bruno", "Carla", "Diego", "Elisa"]);
    assert_eq!(view["pagination"]["total_rows"], 5);
    assert_eq!(view["pagination"]["page_count"], 1);
    assert!(view["placeholder"].is_null());

    let view: Value = app
        .client
        .get(app.url("/api/admin/employees?sort=first_name.asc&toggle=first_name"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["sort_query"], "first_name.desc");
    assert_eq!(view["rows"][0]["first_name"], "Elisa");

    let view: Value = app
        .client
        .get(app.url("/api/admin/employees?filter.last_name=zzz"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["rows"].as_array().unwrap().len(), 0);
    assert_eq!(view["placeholder"], "No results.");

    let response = app
        .client
        .get(app.url("/api/admin/employees?page_size=7"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_bulk_delete_stops_at_the_first_failure() {
    let app = spawn_app().await;
    let csrf_token = app.login().await;
    app.backend.failing_deletes.lock().unwrap().insert(3);

    let outcome: Value = app
        .client
        .post(app.url("/api/admin/employees/bulk-delete"))
        .header("x-csrf-token", &csrf_token)
        .json(&json!({ "ids": [1, 2, 3, 4] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(outcome["requested"], 4);
    assert_eq!(outcome["completed"], json!([1, 2]));
    assert_eq!(outcome["failed"]["id"], 3);
    assert_eq!(app.backend.delete_calls.lock().unwrap().as_slice(), [1, 2, 3]);

    let remaining: Vec<i64> = app
        .backend
        .employees
        .lock()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert_eq!(remaining, [3, 4, 7]);
}

#[tokio::test]
async fn test_backend_401_signs_the_admin_out() {
    let app = spawn_app().await;
    app.login().await;
    app.backend.revoked.store(true, Ordering::SeqCst);

    let response = app.client.get(app.url("/api/admin/employees")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["redirect"], "/login");

    app.backend.revoked.store(false, Ordering::SeqCst);
    let response = app.client.get(app.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_logins_are_locked_after_five_failures() {
    let app = spawn_app().await;

    for _ in 0..5 {
        let response = app
            .client
            .post(app.url("/api/auth/login"))
            .json(&json!({ "email": ADMIN_EMAIL, "password": "Wrong-password1" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": common::ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 429);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Too many failed login attempts"));
}

#[tokio::test]
async fn test_dashboard_pages_redirect_to_login() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/dashboard")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers()["location"], "/login");

    app.login().await;
    let response = app.client.get(app.url("/login")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(response.headers()["location"], "/dashboard");
}

#[tokio::test]
async fn test_exports_download_files() {
    let app = spawn_app().await;
    app.login().await;

    let response = app
        .client
        .get(app.url("/api/admin/employees/export.csv?sort=id.asc"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("employees.csv"));
    let csv = response.text().await.unwrap();
    assert!(csv.starts_with("ID,First name,Last name,Phone number,PIN code,Monthly score"));
    assert_eq!(csv.lines().count(), 6);

    let response = app
        .client
        .get(app.url("/api/admin/clocks/export.xlsx"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No data to export");
}

#[tokio::test]
async fn test_employee_form_is_validated_before_the_backend() {
    let app = spawn_app().await;
    let csrf_token = app.login().await;

    let response = app
        .client
        .post(app.url("/api/admin/employees"))
        .header("x-csrf-token", &csrf_token)
        .json(&json!({
            "first_name": "Fabio",
            "last_name": "Reis",
            "phone_number": "0612345678",
            "pin_code": "12a4"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.backend.employees.lock().unwrap().len(), 5);

    let response = app
        .client
        .post(app.url("/api/admin/employees"))
        .header("x-csrf-token", &csrf_token)
        .json(&json!({
            "first_name": " Fabio ",
            "last_name": "Reis",
            "phone_number": "0612345678",
            "pin_code": "1234"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["first_name"], "Fabio");

    let stored = app.backend.employees.lock().unwrap().last().cloned().unwrap();
    assert_eq!(stored["firstName"], "Fabio");
    assert_eq!(stored["pinCode"], "1234");
}

#[tokio::test]
async fn test_repeated_ids_are_deleted_once_and_the_selection_clears() {
    let app = spawn_app().await;
    let csrf_token = app.login().await;

    let outcome: Value = app
        .client
        .post(app.url("/api/admin/employees/bulk-delete"))
        .header("x-csrf-token", &csrf_token)
        .json(&json!({ "ids": [3, 3, 4] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(outcome["requested"], 2);
    assert_eq!(outcome["completed"], json!([3, 4]));
    assert!(outcome["failed"].is_null());
    assert_eq!(outcome["selected"], json!([]));
    assert_eq!(app.backend.delete_calls.lock().unwrap().as_slice(), [3, 4]);
}

#[tokio::test]
async fn test_row_checkboxes_drive_the_selection() {
    let app = spawn_app().await;
    app.login().await;

    let view: Value = app
        .client
        .get(app.url("/api/admin/employees?sort=id.asc&page_size=5&toggle_row=2&toggle_row=7&toggle_row=99"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["selected"], json!([2, 7]));
    assert_eq!(view["selected_count"], 2);
    assert_eq!(view["bulk_actions_enabled"], true);
}

#[tokio::test]
async fn test_present_employees_export_uses_record_fields() {
    let app = spawn_app().await;
    app.login().await;

    let response = app
        .client
        .get(app.url("/api/admin/clocks/dashboard/export.csv"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No data to export");

    let view = app.clock("in", "4821").await;
    assert_eq!(view["step"], "success");

    let response = app
        .client
        .get(app.url("/api/admin/clocks/dashboard/export.csv"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("present-") && disposition.ends_with(".csv\""));
    let csv = response.text().await.unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("employee_id,name,initials,phone_number,clocked_in_at"));
    assert!(lines.next().unwrap().starts_with("7,Employee #7,"));
    assert_eq!(lines.next(), None);
}
