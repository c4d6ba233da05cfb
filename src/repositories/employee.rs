use reqwest::Method;
use serde::Serialize;

use crate::backend::{Auth, BackendClient};
use crate::error::Result;
use crate::kiosk::capture::Pin;
use crate::models::employee::Employee;
use crate::validation::employee::EmployeeForm;

const EMPLOYEES: &str = "/api/employees/employees/";

fn employee_path(id: i64) -> String {
    format!("{}{}/", EMPLOYEES, id)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PinLookup<'a> {
    pin_code: &'a str,
}

/// Lists every employee.
pub async fn list(backend: &BackendClient, token: &str) -> Result<Vec<Employee>> {
    let auth = Auth::Bearer(token);
    backend
        .send_json(backend.request(Method::GET, EMPLOYEES, auth), auth)
        .await
}

/// Finds an employee by their ID.
pub async fn find(backend: &BackendClient, token: &str, id: i64) -> Result<Employee> {
    let auth = Auth::Bearer(token);
    backend
        .send_json(backend.request(Method::GET, &employee_path(id), auth), auth)
        .await
}

pub async fn create(backend: &BackendClient, token: &str, form: &EmployeeForm) -> Result<Employee> {
    let auth = Auth::Bearer(token);
    backend
        .send_json(backend.request(Method::POST, EMPLOYEES, auth).json(form), auth)
        .await
}

pub async fn update(
    backend: &BackendClient,
    token: &str,
    id: i64,
    form: &EmployeeForm,
) -> Result<Employee> {
    let auth = Auth::Bearer(token);
    backend
        .send_json(
            backend.request(Method::PUT, &employee_path(id), auth).json(form),
            auth,
        )
        .await
}

pub async fn delete(backend: &BackendClient, token: &str, id: i64) -> Result<()> {
    let auth = Auth::Bearer(token);
    backend
        .send_empty(backend.request(Method::DELETE, &employee_path(id), auth), auth)
        .await
}

/// Resolves a kiosk PIN to its employee. No credentials are sent.
pub async fn find_by_pin(backend: &BackendClient, pin: &Pin) -> Result<Employee> {
    let path = format!("{}by-pin/", EMPLOYEES);
    let body = PinLookup {
        pin_code: pin.as_str(),
    };
    backend
        .send_json(
            backend.request(Method::POST, &path, Auth::Public).json(&body),
            Auth::Public,
        )
        .await
}
