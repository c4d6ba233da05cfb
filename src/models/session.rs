use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Represents an admin session.
///
/// The bearer tokens are wiped from memory when the value is dropped.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Session {
    /// The backend ID of the signed-in user.
    pub user_id: i64,
    /// Bearer token attached to every authenticated backend call.
    pub access_token: String,
    /// Refresh token. Kept for the backend; never refreshed proactively.
    pub refresh_token: String,
    /// The timestamp when the session was created.
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    #[zeroize(skip)]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
