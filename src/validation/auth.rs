use garde::Validate;
use serde::{Deserialize, Serialize};

/// Checks the new-password rules: at least one uppercase letter, one
/// lowercase letter and one digit. Length is checked separately.
pub fn password_strength(password: &str, _ctx: &()) -> garde::Result {
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(garde::Error::new(
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(garde::Error::new(
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(garde::Error::new("Password must contain at least one digit"));
    }
    Ok(())
}

/// The request payload for admin login.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 8, max = 128))]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// The request payload for changing the admin's password.
#[derive(Deserialize, Validate)]
pub struct PasswordChangeRequest {
    #[garde(length(min = 8))]
    pub current_password: String,
    #[garde(length(min = 8, max = 128), custom(password_strength))]
    pub new_password: String,
    #[garde(matches(new_password))]
    pub confirm_password: String,
}

/// What the backend receives for a password change.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdate<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// The text fields of the account form. The optional image travels as a
/// separate multipart part.
#[derive(Debug, Clone, Default, Validate)]
pub struct AccountInfoForm {
    #[garde(length(chars, min = 2, max = 150))]
    pub first_name: String,
    #[garde(length(chars, min = 2, max = 150))]
    pub last_name: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 10, max = 20))]
    pub phone_number: String,
}
