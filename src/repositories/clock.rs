use chrono::Utc;
use reqwest::Method;
use reqwest::multipart::{Form, Part};

use crate::backend::{Auth, BackendClient};
use crate::error::Result;
use crate::kiosk::capture::{PHOTO_MIME_TYPE, Pin};
use crate::kiosk::flow::{ClockGateway, ClockSubmission};
use crate::models::clock::ClockRecord;
use crate::models::employee::Employee;
use crate::repositories::employee as employee_repo;

const CLOCK_RECORDS: &str = "/api/employees/clock-records/";

fn clock_path(id: i64) -> String {
    format!("{}{}/", CLOCK_RECORDS, id)
}

/// Lists every clock record.
pub async fn list(backend: &BackendClient, token: &str) -> Result<Vec<ClockRecord>> {
    let auth = Auth::Bearer(token);
    backend
        .send_json(backend.request(Method::GET, CLOCK_RECORDS, auth), auth)
        .await
}

pub async fn find(backend: &BackendClient, token: &str, id: i64) -> Result<ClockRecord> {
    let auth = Auth::Bearer(token);
    backend
        .send_json(backend.request(Method::GET, &clock_path(id), auth), auth)
        .await
}

pub async fn delete(backend: &BackendClient, token: &str, id: i64) -> Result<()> {
    let auth = Auth::Bearer(token);
    backend
        .send_empty(backend.request(Method::DELETE, &clock_path(id), auth), auth)
        .await
}

/// Builds the multipart body of a clock submission.
pub fn submission_form(submission: &ClockSubmission) -> Result<Form> {
    let photo = Part::bytes(submission.photo.bytes().to_vec())
        .file_name(submission.photo.file_name(Utc::now()))
        .mime_str(PHOTO_MIME_TYPE)?;

    Ok(Form::new()
        .text("clock_type", submission.clock_type.as_str())
        .text("pin_code", submission.pin.as_str().to_string())
        .text("location_lat", submission.location.lat().to_string())
        .text("location_lng", submission.location.lng().to_string())
        .part("photo", photo))
}

/// Records a clock event. Public: the PIN authenticates the employee.
pub async fn create(backend: &BackendClient, submission: &ClockSubmission) -> Result<ClockRecord> {
    let form = submission_form(submission)?;
    backend
        .send_json(
            backend
                .request(Method::POST, CLOCK_RECORDS, Auth::Public)
                .multipart(form),
            Auth::Public,
        )
        .await
}

impl ClockGateway for BackendClient {
    async fn employee_by_pin(&self, pin: &Pin) -> Result<Employee> {
        employee_repo::find_by_pin(self, pin).await
    }

    async fn submit_clock(&self, submission: &ClockSubmission) -> Result<ClockRecord> {
        create(self, submission).await
    }
}
