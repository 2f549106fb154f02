use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth;
use crate::database::models::{user, AccountView, User, USER_COLUMNS};
use crate::error::ApiError;
use crate::handlers::{optional_text, protected::message, required_text};
use crate::middleware::{ApiResult, AuthUser, JsonBody};
use crate::state::AppState;

async fn load_caller(state: &AppState, caller: &AuthUser) -> ApiResult<User> {
    User::find_by_id(&state.pool, caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// GET /api/auth/me
pub async fn me_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<AccountView>> {
    let user = load_caller(&state, &caller).await?;
    Ok(Json(user.account_view(&state.pool).await?))
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

/// PUT /api/auth/profile
pub async fn profile_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<ProfileUpdate>,
) -> ApiResult<Json<AccountView>> {
    let name = match body.name {
        Some(name) => Some(required_text("name", Some(name))?),
        None => None,
    };

    let updated = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET name = COALESCE($1, name), phone = COALESCE($2, phone), \
         photo_url = COALESCE($3, photo_url), updated_at = NOW() \
         WHERE id = $4 RETURNING {USER_COLUMNS}"
    ))
    .bind(name)
    .bind(optional_text(body.phone))
    .bind(optional_text(body.photo_url))
    .bind(caller.id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(updated.account_view(&state.pool).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmailRequest {
    pub new_email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/change-email
pub async fn change_email_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<ChangeEmailRequest>,
) -> ApiResult<Json<Value>> {
    let new_email = required_text("newEmail", body.new_email)?;
    if !user::is_valid_email(&new_email) {
        return Err(ApiError::invalid_field("newEmail", "Valid email required"));
    }
    let new_email = user::normalize_email(&new_email);
    let password = required_text("password", body.password)?;

    let user = load_caller(&state, &caller).await?;
    if user.email != new_email && User::email_taken(&state.pool, &new_email).await? {
        return Err(ApiError::bad_request("Email already in use"));
    }

    let verified = match user.password_hash.as_deref() {
        Some(hash) => auth::verify_password(&password, hash).await?,
        None => false,
    };
    if !verified {
        return Err(ApiError::unauthorized("Incorrect password"));
    }

    sqlx::query("UPDATE users SET email = $1, updated_at = NOW() WHERE id = $2")
        .bind(&new_email)
        .bind(caller.id)
        .execute(&state.pool)
        .await?;

    tracing::info!(user_id = %caller.id, "email changed");
    Ok(Json(json!({
        "message": "Email changed successfully",
        "newEmail": new_email,
    })))
}

/// DELETE /api/auth/account
///
/// Owned jobs, records and managed workers go with the row via FK cascades.
pub async fn account_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = %caller.id, role = %caller.role, "account deleted");
    Ok(message("Account deleted successfully"))
}

/// POST /api/auth/reset-all-data
///
/// Wipes the owner's business data but keeps the account and its workers.
pub async fn reset_all_data_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    if !caller.is_owner() {
        return Err(ApiError::forbidden("Only owners can reset data"));
    }

    let mut tx = state.pool.begin().await?;
    sqlx::query(
        "DELETE FROM worker_job_assignments \
         WHERE job_id IN (SELECT id FROM jobs WHERE owner_id = $1)",
    )
    .bind(caller.id)
    .execute(&mut *tx)
    .await?;
    for table in ["timesheets", "receipts", "documents", "alerts", "ai_insights", "worker_payments", "jobs"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE owner_id = $1"))
            .bind(caller.id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    tracing::warn!(user_id = %caller.id, "all business data reset");
    Ok(message("All data reset successfully"))
}
