use axum::{
    Extension, Json,
    extract::{Multipart, State},
    response::{IntoResponse, Response},
};

use crate::{
    error::{AppError, Result},
    handlers::auth::AuthResponse,
    models::session::Session,
    repositories::user::AvatarUpload,
    services::account as account_service,
    state::AppState,
    validation::auth::{AccountInfoForm, PasswordChangeRequest},
};

/// Reads the account form: four text fields and an optional `image` part.
async fn read_account_form(
    mut multipart: Multipart,
) -> Result<(AccountInfoForm, Option<AvatarUpload>)> {
    let mut form = AccountInfoForm::default();
    let mut avatar = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "first_name" => form.first_name = field.text().await?.trim().to_string(),
            "last_name" => form.last_name = field.text().await?.trim().to_string(),
            "email" => form.email = field.text().await?.trim().to_string(),
            "phone_number" => form.phone_number = field.text().await?.trim().to_string(),
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    avatar = Some(account_service::check_avatar(bytes.to_vec(), file_name)?);
                }
            }
            other => {
                return Err(AppError::Validation(format!("Unexpected field: {}", other)));
            }
        }
    }

    Ok((form, avatar))
}

/// Updates the admin's profile.
#[axum::debug_handler]
pub async fn update_info(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    multipart: Multipart,
) -> Result<Response> {
    let (form, avatar) = read_account_form(multipart).await?;
    tracing::debug!(
        "📝 Account update for user {} (image: {})",
        session.user_id,
        avatar.is_some()
    );
    let user = account_service::update_info(&state, &session, form, avatar).await?;
    Ok(Json(user).into_response())
}

/// Changes the admin's password.
#[axum::debug_handler]
pub async fn update_password(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<PasswordChangeRequest>,
) -> Result<Response> {
    tracing::info!("🔑 Change password for user: {}", session.user_id);
    account_service::update_password(&state, &session, &payload).await?;

    let response = AuthResponse {
        success: true,
        message: "Password changed successfully".to_string(),
    };
    Ok(Json(response).into_response())
}
