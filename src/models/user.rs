use serde::{Deserialize, Serialize};

/// The signed-in admin, as returned by the identity endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "camelCase"))]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// URL of the profile picture.
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Tokens issued by the backend on a successful login.
#[derive(Deserialize)]
pub struct LoginTokens {
    pub id: i64,
    pub access: String,
    pub refresh: String,
}
