//! Owner-managed worker accounts. Every route here sits behind
//! `require_owner_middleware`.
use std::collections::HashMap;

use axum::{
    extract::{Extension, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth;
use crate::database::models::{user, User, UserProfile, USER_COLUMNS};
use crate::error::ApiError;
use crate::handlers::{bounded, non_negative, optional_text, protected::message, required_text, MAX_RATE};
use crate::middleware::{ApiPath, ApiResult, AuthUser, Created, JsonBody};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BankInfo {
    pub bank_name: Option<String>,
    pub account_holder_name: Option<String>,
    pub account_number: Option<String>,
    pub routing_number: Option<String>,
    pub account_type: Option<String>,
}

#[derive(Debug, FromRow)]
struct WorkerRow {
    #[sqlx(flatten)]
    user: User,
    #[sqlx(flatten)]
    bank: BankInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerView {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(rename = "assignedJobIDs")]
    pub assigned_job_ids: Vec<Uuid>,
    pub bank_info: BankInfo,
}

/// Worker profile plus the temporary password when one was generated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedWorker {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_password: Option<String>,
}

/// GET /api/workers
pub async fn workers_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<WorkerView>>> {
    let rows = sqlx::query_as::<_, WorkerRow>(&format!(
        "SELECT {USER_COLUMNS}, bank_name, account_holder_name, account_number, routing_number, account_type \
         FROM users WHERE owner_id = $1 AND role = 'worker' ORDER BY name"
    ))
    .bind(caller.id)
    .fetch_all(&state.pool)
    .await?;

    let assignments: Vec<(Uuid, Uuid)> = sqlx::query_as(
        "SELECT wja.worker_id, wja.job_id FROM worker_job_assignments wja \
         JOIN jobs j ON wja.job_id = j.id WHERE j.owner_id = $1",
    )
    .bind(caller.id)
    .fetch_all(&state.pool)
    .await?;
    let mut by_worker: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (worker_id, job_id) in assignments {
        by_worker.entry(worker_id).or_default().push(job_id);
    }

    Ok(Json(
        rows.into_iter()
            .map(|row| WorkerView {
                assigned_job_ids: by_worker.remove(&row.user.id).unwrap_or_default(),
                profile: row.user.profile(),
                bank_info: row.bank,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkerRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// POST /api/workers
pub async fn worker_create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<CreateWorkerRequest>,
) -> ApiResult<Created<CreatedWorker>> {
    let email = required_text("email", body.email)?;
    if !user::is_valid_email(&email) {
        return Err(ApiError::invalid_field("email", "Valid email required"));
    }
    let email = user::normalize_email(&email);
    let name = required_text("name", body.name)?;
    let hourly_rate = body
        .hourly_rate
        .map(|r| bounded("hourlyRate", non_negative("hourlyRate", r)?, MAX_RATE))
        .transpose()?;

    let (password, generated) = match optional_text(body.password) {
        Some(p) => {
            auth::validate_password_strength(&p).map_err(|msg| ApiError::invalid_field("password", msg))?;
            (p, false)
        }
        None => (auth::generate_temp_password(), true),
    };

    if User::email_taken(&state.pool, &email).await? {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let password_hash = auth::hash_password(&password).await?;
    let worker = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, password_hash, name, role, hourly_rate, phone, owner_id) \
         VALUES ($1, $2, $3, 'worker', $4, $5, $6) RETURNING {USER_COLUMNS}"
    ))
    .bind(&email)
    .bind(&password_hash)
    .bind(&name)
    .bind(hourly_rate)
    .bind(optional_text(body.phone))
    .bind(caller.id)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(worker_id = %worker.id, owner_id = %caller.id, "worker created; invite email queued");

    Ok(Created(CreatedWorker {
        profile: worker.profile(),
        temp_password: generated.then_some(password),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkerRequest {
    pub name: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

/// PUT /api/workers/:id
pub async fn worker_update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    JsonBody(body): JsonBody<UpdateWorkerRequest>,
) -> ApiResult<Json<UserProfile>> {
    let name = match body.name {
        Some(n) => Some(required_text("name", Some(n))?),
        None => None,
    };
    let hourly_rate = body
        .hourly_rate
        .map(|r| bounded("hourlyRate", non_negative("hourlyRate", r)?, MAX_RATE))
        .transpose()?;

    let worker = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET name = COALESCE($1, name), hourly_rate = COALESCE($2, hourly_rate), \
         phone = COALESCE($3, phone), active = COALESCE($4, active), updated_at = NOW() \
         WHERE id = $5 AND owner_id = $6 AND role = 'worker' RETURNING {USER_COLUMNS}"
    ))
    .bind(name)
    .bind(hourly_rate)
    .bind(optional_text(body.phone))
    .bind(body.active)
    .bind(id)
    .bind(caller.id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Worker not found"))?;

    Ok(Json(worker.profile()))
}

/// DELETE /api/workers/:id
pub async fn worker_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1 AND owner_id = $2 AND role = 'worker'")
        .bind(id)
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Worker not found"));
    }

    tracing::info!(worker_id = %id, owner_id = %caller.id, "worker deleted");
    Ok(message("Worker deleted"))
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssignedJob {
    pub id: Uuid,
    pub job_name: String,
    pub client_name: String,
    pub status: String,
}

/// GET /api/workers/:id/assigned-jobs
pub async fn assigned_jobs_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<AssignedJob>>> {
    let jobs = sqlx::query_as::<_, AssignedJob>(
        "SELECT j.id, j.job_name, j.client_name, j.status FROM jobs j \
         JOIN worker_job_assignments wja ON j.id = wja.job_id \
         WHERE wja.worker_id = $1 AND j.owner_id = $2 ORDER BY j.created_at DESC",
    )
    .bind(id)
    .bind(caller.id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(jobs))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPasswordRequest {
    pub new_password: Option<String>,
}

/// POST /api/workers/:id/reset-password
pub async fn worker_reset_password_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    JsonBody(body): JsonBody<WorkerPasswordRequest>,
) -> ApiResult<Json<Value>> {
    let new_password = body.new_password.unwrap_or_default();
    auth::validate_password_strength(&new_password).map_err(|msg| ApiError::invalid_field("newPassword", msg))?;

    let worker = User::find_worker(&state.pool, caller.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Worker not found"))?;

    let hash = auth::hash_password(&new_password).await?;
    User::set_password_hash(&state.pool, worker.id, &hash).await?;

    tracing::info!(worker_id = %worker.id, owner_id = %caller.id, "worker password reset; notification queued");
    Ok(message("Password reset successfully"))
}

/// POST /api/workers/:id/send-invite
///
/// Issues a fresh temporary password. Mail delivery is out of process; the
/// credentials are returned so the owner can share them directly.
pub async fn send_invite_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let worker = User::find_worker(&state.pool, caller.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Worker not found"))?;

    let temp_password = auth::generate_temp_password();
    let hash = auth::hash_password(&temp_password).await?;
    User::set_password_hash(&state.pool, worker.id, &hash).await?;

    tracing::info!(worker_id = %worker.id, owner = %caller.name, "worker invite issued");
    Ok(Json(json!({
        "message": "Invitation sent",
        "email": worker.email,
        "tempPassword": temp_password,
    })))
}
