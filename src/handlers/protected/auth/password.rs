use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth;
use crate::database::models::User;
use crate::error::ApiError;
use crate::handlers::{protected::message, required_text};
use crate::middleware::{ApiResult, AuthUser, JsonBody};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

fn check_length(field: &str, password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        Err(ApiError::invalid_field(field, "Password must be at least 6 characters"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// POST /api/auth/change-password
pub async fn change_password_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    let current = required_text("currentPassword", body.current_password)?;
    let new_password = body.new_password.unwrap_or_default();
    check_length("newPassword", &new_password)?;

    let user = User::find_by_id(&state.pool, caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let verified = match user.password_hash.as_deref() {
        Some(hash) => auth::verify_password(&current, hash).await?,
        None => false,
    };
    if !verified {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let hash = auth::hash_password(&new_password).await?;
    User::set_password_hash(&state.pool, caller.id, &hash).await?;

    tracing::info!(user_id = %caller.id, "password changed");
    Ok(message("Password changed successfully"))
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub password: Option<String>,
}

/// POST /api/password/set - first password for accounts created without one
pub async fn set_password_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<SetPasswordRequest>,
) -> ApiResult<Json<Value>> {
    let password = body.password.unwrap_or_default();
    check_length("password", &password)?;

    let hash = auth::hash_password(&password).await?;
    if !User::set_password_hash(&state.pool, caller.id, &hash).await? {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(message("Password set successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_characters_is_enough() {
        assert!(check_length("newPassword", "abcdef").is_ok());
        assert_eq!(check_length("newPassword", "abcde").unwrap_err().status_code(), 400);
    }
}
