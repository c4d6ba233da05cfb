use serde::{Deserialize, Serialize};

/// An employee as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct Employee {
    /// The backend identifier.
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Absent when the employee is embedded in a clock record.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// The 4-digit kiosk PIN.
    #[serde(default)]
    pub pin_code: String,
    /// Monthly performance score computed by the backend.
    #[serde(default)]
    pub monthly_score: Option<f64>,
}

impl Employee {
    /// "First Last", as shown on the kiosk and in exports.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Two-letter initials used when no photo is available.
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .collect::<String>()
            .to_uppercase()
    }
}
