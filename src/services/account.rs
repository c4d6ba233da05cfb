use garde::Validate;

use crate::error::{AppError, Result};
use crate::models::session::Session;
use crate::models::user::User;
use crate::repositories::user::{self as user_repo, AvatarUpload};
use crate::state::AppState;
use crate::validation::auth::{AccountInfoForm, PasswordChangeRequest, PasswordUpdate};

/// Largest accepted profile picture.
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// Checks an uploaded avatar is a real image of acceptable size.
pub fn check_avatar(bytes: Vec<u8>, file_name: Option<String>) -> Result<AvatarUpload> {
    if bytes.is_empty() {
        return Err(AppError::Validation("Image is empty".to_string()));
    }
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(AppError::Validation("Image must be at most 5 MB".to_string()));
    }

    let kind = infer::get(&bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .ok_or_else(|| AppError::Validation("Image must be a picture".to_string()))?;

    Ok(AvatarUpload {
        file_name: file_name.unwrap_or_else(|| format!("avatar.{}", kind.extension())),
        mime_type: kind.mime_type().to_string(),
        bytes,
    })
}

pub async fn update_info(
    state: &AppState,
    session: &Session,
    form: AccountInfoForm,
    avatar: Option<AvatarUpload>,
) -> Result<User> {
    form.validate()?;
    let user = user_repo::update_info(&state.backend, &session.access_token, &form, avatar).await?;
    tracing::info!("✅ Account info updated for user {}", session.user_id);
    Ok(user)
}

pub async fn update_password(
    state: &AppState,
    session: &Session,
    request: &PasswordChangeRequest,
) -> Result<()> {
    request.validate()?;
    let update = PasswordUpdate {
        current_password: &request.current_password,
        new_password: &request.new_password,
    };
    user_repo::update_password(&state.backend, &session.access_token, &update).await?;
    tracing::info!("✅ Password changed for user {}", session.user_id);
    Ok(())
}
