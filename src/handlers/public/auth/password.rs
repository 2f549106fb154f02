// handlers/public/auth/password.rs - password recovery

use axum::{extract::State, response::Json};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth;
use crate::config;
use crate::database::models::{user, User};
use crate::error::ApiError;
use crate::handlers::required_text;
use crate::middleware::{ApiResult, JsonBody};
use crate::state::AppState;

const GENERIC_RESET_MESSAGE: &str = "If an account exists, a reset code has been sent";

/// Shorter minimum than signup, matching change-password.
const MIN_RESET_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

/// POST /api/auth/forgot-password
///
/// Always answers 200 so the endpoint cannot be used to probe for accounts.
/// Outside production the code is echoed back for testing.
pub async fn forgot_password_post(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ForgotPasswordRequest>,
) -> ApiResult<Json<Value>> {
    let email = required_text("email", body.email)?;
    if !user::is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }

    let Some(account) = User::find_by_email(&state.pool, &email).await? else {
        return Ok(Json(json!({ "message": GENERIC_RESET_MESSAGE })));
    };

    let security = &config::config().security;
    let code = auth::generate_reset_code();
    let expires = Utc::now() + Duration::minutes(security.reset_token_ttl_minutes);

    sqlx::query("UPDATE users SET reset_token_hash = $1, reset_token_expires = $2 WHERE id = $3")
        .bind(auth::hash_reset_code(&code))
        .bind(expires)
        .bind(account.id)
        .execute(&state.pool)
        .await?;

    tracing::info!(user_id = %account.id, "password reset code issued");

    if security.expose_reset_tokens {
        Ok(Json(json!({
            "message": "Password reset token generated",
            "resetToken": code,
            "expiresIn": format!("{} minutes", security.reset_token_ttl_minutes),
        })))
    } else {
        Ok(Json(json!({ "message": GENERIC_RESET_MESSAGE })))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub new_password: Option<String>,
    /// Narrows the lookup when supplied.
    pub email: Option<String>,
}

/// POST /api/auth/reset-password
pub async fn reset_password_post(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ResetPasswordRequest>,
) -> ApiResult<Json<Value>> {
    let token = required_text("token", body.token)?;
    let new_password = body.new_password.unwrap_or_default();
    if new_password.chars().count() < MIN_RESET_PASSWORD_LEN {
        return Err(ApiError::invalid_field(
            "newPassword",
            "Password must be at least 6 characters",
        ));
    }

    let user_id: Option<uuid::Uuid> = sqlx::query_scalar(
        "SELECT id FROM users \
         WHERE reset_token_hash = $1 AND reset_token_expires > NOW() \
           AND ($2::text IS NULL OR LOWER(email) = LOWER($2))",
    )
    .bind(auth::hash_reset_code(&token))
    .bind(body.email.as_deref().map(str::trim))
    .fetch_optional(&state.pool)
    .await?;

    let Some(user_id) = user_id else {
        return Err(ApiError::bad_request("Invalid or expired reset token"));
    };

    let hash = auth::hash_password(&new_password).await?;
    User::set_password_hash(&state.pool, user_id, &hash).await?;

    tracing::info!(user_id = %user_id, "password reset completed");
    Ok(Json(json!({ "message": "Password reset successfully" })))
}
