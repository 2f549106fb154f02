// handlers/public/auth/register.rs - POST /api/auth/signup

use axum::extract::State;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::AuthResponse;
use crate::auth;
use crate::database::models::{user, User, USER_COLUMNS};
use crate::error::ApiError;
use crate::handlers::{non_negative, optional_text, required_text};
use crate::middleware::{ApiResult, Created, JsonBody};
use crate::state::AppState;
use crate::types::Role;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub hourly_rate: Option<Decimal>,
    pub phone: Option<String>,
}

/// Create an account and return it with an access token.
///
/// Self-service signups are independent accounts; workers that belong to an
/// owner are created through `/api/workers`.
pub async fn signup_post(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SignupRequest>,
) -> ApiResult<Created<AuthResponse>> {
    let email = required_text("email", body.email)?;
    if !user::is_valid_email(&email) {
        return Err(ApiError::invalid_field("email", "Valid email required"));
    }
    let email = user::normalize_email(&email);

    let password = body.password.unwrap_or_default();
    auth::validate_password_strength(&password).map_err(|msg| ApiError::invalid_field("password", msg))?;

    let name = required_text("name", body.name)?;
    let hourly_rate = body.hourly_rate.map(|r| non_negative("hourlyRate", r)).transpose()?;

    if User::email_taken(&state.pool, &email).await? {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let password_hash = auth::hash_password(&password).await?;
    let role = body.role.unwrap_or(Role::Owner);

    let created = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, password_hash, name, role, hourly_rate, phone) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
    ))
    .bind(&email)
    .bind(&password_hash)
    .bind(&name)
    .bind(role.as_str())
    .bind(hourly_rate)
    .bind(optional_text(body.phone))
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(user_id = %created.id, role = %role, "account created");

    let access_token = auth::issue_token(created.id)?;
    Ok(Created(AuthResponse {
        user: created.account_view(&state.pool).await?,
        access_token,
    }))
}
