use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::employee::Employee;

/// Direction of a clock event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockType {
    In,
    Out,
}

impl ClockType {
    /// The wire value (`in` / `out`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockType::In => "in",
            ClockType::Out => "out",
        }
    }

    /// The label used in tables and exports.
    pub fn label(&self) -> &'static str {
        match self {
            ClockType::In => "In",
            ClockType::Out => "Out",
        }
    }
}

impl fmt::Display for ClockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(ClockType::In),
            "out" => Ok(ClockType::Out),
            other => Err(format!("Unknown clock type: {}", other)),
        }
    }
}

/// The employee a clock record points at.
///
/// Depending on the endpoint the backend sends either the bare id or the
/// whole employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmployeeRef {
    Embedded(Employee),
    Id(i64),
}

impl EmployeeRef {
    pub fn id(&self) -> i64 {
        match self {
            EmployeeRef::Embedded(employee) => employee.id,
            EmployeeRef::Id(id) => *id,
        }
    }

    pub fn employee(&self) -> Option<&Employee> {
        match self {
            EmployeeRef::Embedded(employee) => Some(employee),
            EmployeeRef::Id(_) => None,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            EmployeeRef::Embedded(employee) => employee.display_name(),
            EmployeeRef::Id(id) => format!("Employee #{}", id),
        }
    }
}

/// An immutable clock event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct ClockRecord {
    pub id: i64,
    pub clock_type: ClockType,
    pub employee: EmployeeRef,
    #[serde(default)]
    pub pin_code: Option<String>,
    pub location_lat: f64,
    pub location_lng: f64,
    /// URL of the stored photo.
    #[serde(default)]
    pub photo: Option<String>,
    /// Server-assigned time of the event.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ClockRecord {
    /// A Google Maps link to where the clock happened.
    pub fn maps_url(&self) -> String {
        maps_url(self.location_lat, self.location_lng)
    }
}

/// A Google Maps link for a coordinate pair.
pub fn maps_url(lat: f64, lng: f64) -> String {
    format!("https://www.google.com/maps?q={},{}", lat, lng)
}
