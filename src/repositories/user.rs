use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::backend::{Auth, BackendClient};
use crate::error::Result;
use crate::models::user::{LoginTokens, User};
use crate::validation::auth::{AccountInfoForm, PasswordUpdate};

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// A profile picture uploaded with the account form.
pub struct AvatarUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

/// Exchanges credentials for backend tokens.
pub async fn login(backend: &BackendClient, email: &str, password: &str) -> Result<LoginTokens> {
    let body = Credentials { email, password };
    backend
        .send_json(
            backend
                .request(Method::POST, "/api/users/login-email/", Auth::Login)
                .json(&body),
            Auth::Login,
        )
        .await
}

/// The signed-in admin's profile.
pub async fn identity(backend: &BackendClient, token: &str) -> Result<User> {
    let auth = Auth::Bearer(token);
    backend
        .send_json(
            backend.request(Method::POST, "/api/users/identity/", auth),
            auth,
        )
        .await
}

pub async fn update_info(
    backend: &BackendClient,
    token: &str,
    info: &AccountInfoForm,
    avatar: Option<AvatarUpload>,
) -> Result<User> {
    let mut form = Form::new()
        .text("first_name", info.first_name.clone())
        .text("last_name", info.last_name.clone())
        .text("email", info.email.clone())
        .text("phone_number", info.phone_number.clone());

    if let Some(avatar) = avatar {
        let part = Part::bytes(avatar.bytes)
            .file_name(avatar.file_name)
            .mime_str(&avatar.mime_type)?;
        form = form.part("image", part);
    }

    let auth = Auth::Bearer(token);
    backend
        .send_json(
            backend
                .request(Method::PUT, "/api/users/update-info/", auth)
                .multipart(form),
            auth,
        )
        .await
}

pub async fn update_password(
    backend: &BackendClient,
    token: &str,
    update: &PasswordUpdate<'_>,
) -> Result<()> {
    let auth = Auth::Bearer(token);
    backend
        .send_empty(
            backend
                .request(Method::PUT, "/api/users/update-password/", auth)
                .json(update),
            auth,
        )
        .await
}
