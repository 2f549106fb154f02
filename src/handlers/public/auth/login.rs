// handlers/public/auth/login.rs - POST /api/auth/login

use axum::{extract::State, response::Json};
use serde::Deserialize;

use super::AuthResponse;
use crate::auth;
use crate::database::models::User;
use crate::error::ApiError;
use crate::handlers::required_text;
use crate::middleware::{ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Authenticate with email and password.
///
/// Unknown email and wrong password both answer 401 "Invalid credentials".
pub async fn login_post(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = required_text("email", body.email)?;
    let password = required_text("password", body.password)?;

    let Some(user) = User::find_by_email(&state.pool, &email).await? else {
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    if !user.active {
        return Err(ApiError::unauthorized("Account is disabled"));
    }

    let Some(hash) = user.password_hash.as_deref() else {
        return Err(ApiError::unauthorized("Invalid credentials"));
    };
    if !auth::verify_password(&password, hash).await? {
        tracing::info!(user_id = %user.id, "failed login");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let access_token = auth::issue_token(user.id)?;
    Ok(Json(AuthResponse {
        user: user.account_view(&state.pool).await?,
        access_token,
    }))
}
