//! Per-worker permission flags.
use axum::{
    extract::{Extension, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{types::Json as Jsonb, PgPool};
use uuid::Uuid;

use crate::database::models::{User, USER_COLUMNS};
use crate::error::ApiError;
use crate::middleware::{ApiPath, ApiResult, AuthUser, JsonBody};
use crate::services::preferences::{apply_permission_patch, PermissionPatch};
use crate::state::AppState;
use crate::types::{Permission, Role, WorkerPermissions};

fn not_managed() -> ApiError {
    ApiError::not_found("Worker not found or not under your management")
}

/// Any user whose `owner_id` is the caller, whatever their role.
async fn find_managed(pool: &PgPool, owner_id: Uuid, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND owner_id = $2"))
        .bind(user_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
}

/// GET /api/permissions/worker/:worker_id (owner)
pub async fn worker_permissions_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(worker_id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let worker = find_managed(&state.pool, caller.id, worker_id)
        .await?
        .ok_or_else(not_managed)?;
    Ok(Json(json!({
        "workerId": worker.id,
        "name": worker.name,
        "email": worker.email,
        "role": worker.role(),
        "permissions": worker.permissions(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct PermissionsRequest {
    pub permissions: Option<Value>,
}

/// Validate a `{permissions}` body against the worker's current flags.
pub fn resolve_patch(current: WorkerPermissions, body: Option<&Value>) -> Result<WorkerPermissions, ApiError> {
    let patch = body
        .and_then(Value::as_object)
        .ok_or_else(|| ApiError::bad_request("Valid permissions object required"))?;

    match apply_permission_patch(current, patch) {
        PermissionPatch::Applied(next) => Ok(next),
        PermissionPatch::UnknownKeys(invalid) => Err(ApiError::invalid_input(
            "Invalid permission keys",
            json!({ "invalid": invalid, "valid": Permission::valid_keys() }),
        )),
        PermissionPatch::NotBoolean(key) => Err(ApiError::invalid_field(&key, "Permission values must be true or false")),
    }
}

/// PUT /api/permissions/worker/:worker_id (owner)
pub async fn worker_permissions_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(worker_id): ApiPath<Uuid>,
    JsonBody(body): JsonBody<PermissionsRequest>,
) -> ApiResult<Json<Value>> {
    if !body.permissions.as_ref().is_some_and(Value::is_object) {
        return Err(ApiError::bad_request("Valid permissions object required"));
    }

    let worker = find_managed(&state.pool, caller.id, worker_id)
        .await?
        .ok_or_else(not_managed)?;
    if worker.role() != Role::Worker {
        return Err(ApiError::bad_request("Can only set permissions for workers"));
    }

    let permissions = resolve_patch(worker.permissions(), body.permissions.as_ref())?;
    sqlx::query("UPDATE users SET worker_permissions = $1, updated_at = NOW() WHERE id = $2")
        .bind(Jsonb(permissions))
        .bind(worker.id)
        .execute(&state.pool)
        .await?;

    tracing::info!(owner_id = %caller.id, worker_id = %worker.id, "worker permissions updated");
    Ok(Json(json!({
        "message": "Worker permissions updated successfully",
        "workerId": worker.id,
        "permissions": permissions,
    })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPermissionSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub permissions: WorkerPermissions,
    pub created_at: DateTime<Utc>,
}

/// GET /api/permissions/workers (owner)
pub async fn workers_permissions_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let workers = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE owner_id = $1 AND role = 'worker' ORDER BY name"
    ))
    .bind(caller.id)
    .fetch_all(&state.pool)
    .await?;

    let workers: Vec<WorkerPermissionSummary> = workers
        .iter()
        .map(|w| WorkerPermissionSummary {
            id: w.id,
            name: w.name.clone(),
            email: w.email.clone(),
            active: w.active,
            permissions: w.permissions(),
            created_at: w.created_at,
        })
        .collect();
    let count = workers.len();
    Ok(Json(json!({ "workers": workers, "count": count })))
}

/// GET /api/permissions/my-permissions
pub async fn my_permissions_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let user = User::find_by_id(&state.pool, caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let permissions = match user.role() {
        Role::Owner => WorkerPermissions::all_granted(),
        Role::Worker => user.permissions(),
    };
    Ok(Json(json!({ "role": user.role(), "permissions": permissions })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_requires_an_object() {
        let err = resolve_patch(WorkerPermissions::default(), None).unwrap_err();
        assert_eq!(err.message(), "Valid permissions object required");
        assert!(resolve_patch(WorkerPermissions::default(), Some(&json!(["canViewFinancials"]))).is_err());
    }

    #[test]
    fn unknown_keys_list_valid_ones() {
        let err = resolve_patch(WorkerPermissions::default(), Some(&json!({ "canDeleteJobs": true }))).unwrap_err();
        let body = err.to_json();
        assert_eq!(body["error"], "Invalid permission keys");
        assert_eq!(body["invalid"][0], "canDeleteJobs");
        assert_eq!(body["valid"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn patch_keeps_unmentioned_flags() {
        let mut current = WorkerPermissions::default();
        current.can_view_all_jobs = true;
        let next = resolve_patch(current, Some(&json!({ "canViewFinancials": true }))).unwrap();
        assert!(next.can_view_financials);
        assert!(next.can_view_all_jobs);
        assert!(next.can_upload_receipts);
    }
}
