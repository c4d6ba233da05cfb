//! The kiosk clock wizard.
//!
//! One [`ClockAttempt`] per kiosk interaction. Each step is a variant of
//! [`ClockStep`] carrying only what has been captured so far, so a later step
//! can never observe a missing PIN or location. The backend is reached
//! through [`ClockGateway`] at exactly two points: the PIN lookup and the
//! final submission.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::kiosk::capture::{
    CaptureError, CapturedPhoto, Coordinates, LocationError, LocationFix, Pin,
};
use crate::models::clock::{ClockRecord, ClockType};
use crate::models::employee::Employee;

/// Steps shown in the progress indicator (PIN through Success).
pub const TOTAL_STEPS: u8 = 5;

const PIN_NOT_FOUND: &str = "Employee not found with this PIN";

/// Everything the backend needs to record a clock event.
#[derive(Debug, Clone)]
pub struct ClockSubmission {
    pub clock_type: ClockType,
    pub pin: Pin,
    pub location: Coordinates,
    pub photo: CapturedPhoto,
}

/// The two backend calls the wizard makes.
pub trait ClockGateway {
    fn employee_by_pin(&self, pin: &Pin) -> impl Future<Output = Result<Employee>> + Send;

    fn submit_clock(
        &self,
        submission: &ClockSubmission,
    ) -> impl Future<Output = Result<ClockRecord>> + Send;
}

#[derive(Debug, Clone)]
pub enum ClockStep {
    PinEntry {
        error: Option<String>,
    },
    Confirmation {
        employee: Employee,
        pin: Pin,
    },
    LocationCapture {
        employee: Employee,
        pin: Pin,
        error: Option<LocationError>,
    },
    PhotoCapture {
        employee: Employee,
        pin: Pin,
        location: Coordinates,
        warning: Option<String>,
    },
    Success {
        employee: Employee,
        clocked_at: DateTime<Utc>,
    },
    /// Submission failed. Retrying keeps the PIN and location.
    Error {
        employee: Employee,
        pin: Pin,
        location: Coordinates,
        message: String,
    },
}

impl ClockStep {
    pub fn name(&self) -> &'static str {
        match self {
            ClockStep::PinEntry { .. } => "pin_entry",
            ClockStep::Confirmation { .. } => "confirmation",
            ClockStep::LocationCapture { .. } => "location_capture",
            ClockStep::PhotoCapture { .. } => "photo_capture",
            ClockStep::Success { .. } => "success",
            ClockStep::Error { .. } => "error",
        }
    }

    /// Position in the progress indicator. The error screen has none.
    pub fn progress(&self) -> Option<u8> {
        match self {
            ClockStep::PinEntry { .. } => Some(1),
            ClockStep::Confirmation { .. } => Some(2),
            ClockStep::LocationCapture { .. } => Some(3),
            ClockStep::PhotoCapture { .. } => Some(4),
            ClockStep::Success { .. } => Some(5),
            ClockStep::Error { .. } => None,
        }
    }

    fn employee(&self) -> Option<&Employee> {
        match self {
            ClockStep::PinEntry { .. } => None,
            ClockStep::Confirmation { employee, .. }
            | ClockStep::LocationCapture { employee, .. }
            | ClockStep::PhotoCapture { employee, .. }
            | ClockStep::Success { employee, .. }
            | ClockStep::Error { employee, .. } => Some(employee),
        }
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Cannot {action} during {step}")]
    InvalidAction {
        action: &'static str,
        step: &'static str,
    },
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("{0}")]
    PinLookup(String),
    #[error("{}", .0.message())]
    Location(LocationError),
}

impl From<FlowError> for AppError {
    fn from(e: FlowError) -> Self {
        match e {
            FlowError::InvalidAction { .. } => AppError::Conflict(e.to_string()),
            FlowError::Capture(capture) => AppError::Validation(capture.to_string()),
            FlowError::PinLookup(message) => AppError::NotFound(message),
            FlowError::Location(kind) => AppError::Capability(kind.message().to_string()),
        }
    }
}

/// What the kiosk page renders for an attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptView {
    pub id: Uuid,
    pub clock_type: ClockType,
    pub step: &'static str,
    pub progress: Option<u8>,
    pub total_steps: u8,
    pub employee_name: Option<String>,
    pub error: Option<String>,
    pub warning: Option<String>,
    pub location: Option<Coordinates>,
    pub clocked_at: Option<DateTime<Utc>>,
    /// Clock submissions sent so far, retries included.
    pub submissions: u32,
}

/// One kiosk interaction.
#[derive(Debug)]
pub struct ClockAttempt {
    id: Uuid,
    clock_type: ClockType,
    step: ClockStep,
    submissions: u32,
}

impl ClockAttempt {
    pub fn new(clock_type: ClockType) -> Self {
        Self {
            id: Uuid::new_v4(),
            clock_type,
            step: ClockStep::PinEntry { error: None },
            submissions: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn clock_type(&self) -> ClockType {
        self.clock_type
    }

    pub fn step(&self) -> &ClockStep {
        &self.step
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidAction {
            action,
            step: self.step.name(),
        }
    }

    /// Looks the PIN up and moves to the confirmation screen.
    ///
    /// A malformed PIN never reaches the backend. A failed lookup keeps the
    /// attempt on the PIN screen with the error attached.
    pub async fn submit_pin<G: ClockGateway>(
        &mut self,
        gateway: &G,
        raw_pin: &str,
    ) -> std::result::Result<(), FlowError> {
        if !matches!(self.step, ClockStep::PinEntry { .. }) {
            return Err(self.invalid("submit a PIN"));
        }

        let pin = Pin::parse(raw_pin)?;

        match gateway.employee_by_pin(&pin).await {
            Ok(employee) => {
                tracing::info!("✅ PIN resolved to employee {}", employee.id);
                self.step = ClockStep::Confirmation { employee, pin };
                Ok(())
            }
            Err(e) => {
                tracing::warn!("❌ PIN lookup failed: {}", e);
                let message = match e {
                    AppError::NotFound(detail) | AppError::Backend { message: detail, .. } => {
                        detail
                    }
                    AppError::RateLimitExceeded(detail) => detail,
                    _ => PIN_NOT_FOUND.to_string(),
                };
                self.step = ClockStep::PinEntry {
                    error: Some(message.clone()),
                };
                Err(FlowError::PinLookup(message))
            }
        }
    }

    /// The employee affirms the displayed identity.
    pub fn confirm(&mut self) -> std::result::Result<(), FlowError> {
        match &self.step {
            ClockStep::Confirmation { employee, pin } => {
                self.step = ClockStep::LocationCapture {
                    employee: employee.clone(),
                    pin: pin.clone(),
                    error: None,
                };
                Ok(())
            }
            _ => Err(self.invalid("confirm")),
        }
    }

    /// Goes back one screen, dropping what that screen had captured.
    pub fn back(&mut self) -> std::result::Result<(), FlowError> {
        let previous = match &self.step {
            ClockStep::Confirmation { .. } => ClockStep::PinEntry { error: None },
            ClockStep::LocationCapture { employee, pin, .. } => ClockStep::Confirmation {
                employee: employee.clone(),
                pin: pin.clone(),
            },
            ClockStep::PhotoCapture { employee, pin, .. } => ClockStep::LocationCapture {
                employee: employee.clone(),
                pin: pin.clone(),
                error: None,
            },
            _ => return Err(self.invalid("go back")),
        };
        self.step = previous;
        Ok(())
    }

    /// Records the device's answer to the geolocation request.
    pub fn capture_location(
        &mut self,
        outcome: std::result::Result<LocationFix, LocationError>,
    ) -> std::result::Result<(), FlowError> {
        let ClockStep::LocationCapture { employee, pin, .. } = &self.step else {
            return Err(self.invalid("capture a location"));
        };

        let fix = match outcome {
            Ok(fix) => fix,
            Err(kind) => {
                tracing::debug!("Geolocation failed: {:?}", kind);
                self.step = ClockStep::LocationCapture {
                    employee: employee.clone(),
                    pin: pin.clone(),
                    error: Some(kind),
                };
                return Err(FlowError::Location(kind));
            }
        };

        let location = Coordinates::new(fix.lat, fix.lng)?;
        self.step = ClockStep::PhotoCapture {
            employee: employee.clone(),
            pin: pin.clone(),
            location,
            warning: fix.low_accuracy_warning(),
        };
        Ok(())
    }

    /// Takes the confirmed photo and submits the clock event.
    ///
    /// The submission is sent exactly once. Its failure is not an error of
    /// this call: the attempt moves to the error screen instead.
    pub async fn capture_photo<G: ClockGateway>(
        &mut self,
        gateway: &G,
        raw_photo: &str,
    ) -> std::result::Result<(), FlowError> {
        let ClockStep::PhotoCapture {
            employee,
            pin,
            location,
            ..
        } = &self.step
        else {
            return Err(self.invalid("capture a photo"));
        };

        let photo = CapturedPhoto::from_data_url(raw_photo)?;
        let employee = employee.clone();
        let submission = ClockSubmission {
            clock_type: self.clock_type,
            pin: pin.clone(),
            location: *location,
            photo,
        };

        self.submissions += 1;
        match gateway.submit_clock(&submission).await {
            Ok(record) => {
                tracing::info!(
                    "✅ Clock {} recorded for employee {} (record {})",
                    self.clock_type,
                    employee.id,
                    record.id
                );
                self.step = ClockStep::Success {
                    employee,
                    clocked_at: record.timestamp,
                };
            }
            Err(e) => {
                tracing::error!("❌ Clock submission failed: {}", e);
                let message = e
                    .user_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Failed to clock {}", self.clock_type));
                self.step = ClockStep::Error {
                    employee,
                    pin: submission.pin,
                    location: submission.location,
                    message,
                };
            }
        }
        Ok(())
    }

    /// Leaves the error screen for a new photo, keeping PIN and location.
    pub fn retry(&mut self) -> std::result::Result<(), FlowError> {
        match &self.step {
            ClockStep::Error {
                employee,
                pin,
                location,
                ..
            } => {
                self.step = ClockStep::PhotoCapture {
                    employee: employee.clone(),
                    pin: pin.clone(),
                    location: *location,
                    warning: None,
                };
                Ok(())
            }
            _ => Err(self.invalid("retry")),
        }
    }

    pub fn view(&self) -> AttemptView {
        let (error, warning, location, clocked_at) = match &self.step {
            ClockStep::PinEntry { error } => (error.clone(), None, None, None),
            ClockStep::Confirmation { .. } => (None, None, None, None),
            ClockStep::LocationCapture { error, .. } => {
                (error.map(|kind| kind.message().to_string()), None, None, None)
            }
            ClockStep::PhotoCapture {
                location, warning, ..
            } => (None, warning.clone(), Some(*location), None),
            ClockStep::Success { clocked_at, .. } => (None, None, None, Some(*clocked_at)),
            ClockStep::Error {
                location, message, ..
            } => (Some(message.clone()), None, Some(*location), None),
        };

        AttemptView {
            id: self.id,
            clock_type: self.clock_type,
            step: self.step.name(),
            progress: self.step.progress(),
            total_steps: TOTAL_STEPS,
            employee_name: self.step.employee().map(Employee::display_name),
            error,
            warning,
            location,
            clocked_at,
            submissions: self.submissions,
        }
    }
}
