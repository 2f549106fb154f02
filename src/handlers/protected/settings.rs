//! Company-level settings kept on the owner's user row: the permission
//! template new workers start from and the AI thresholds.
use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde_json::{json, Value};
use sqlx::types::Json as Jsonb;

use crate::error::ApiError;
use crate::middleware::{ApiResult, AuthUser, JsonBody};
use crate::services::preferences::{AiSettings, PermissionTemplateUpdate};
use crate::state::AppState;
use crate::types::WorkerPermissions;

/// GET /api/settings/permissions - workers read their owner's template
pub async fn permissions_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<WorkerPermissions>> {
    let stored: Option<Option<Jsonb<WorkerPermissions>>> =
        sqlx::query_scalar("SELECT worker_permissions FROM users WHERE id = $1")
            .bind(caller.scope_owner_id())
            .fetch_optional(&state.pool)
            .await?;
    let stored = stored.ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(stored.map(|p| p.0).unwrap_or_default()))
}

/// PUT /api/settings/permissions (owner)
pub async fn permissions_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<PermissionTemplateUpdate>,
) -> ApiResult<Json<Value>> {
    let permissions = body.merged_with_defaults();
    sqlx::query("UPDATE users SET worker_permissions = $1, updated_at = NOW() WHERE id = $2")
        .bind(Jsonb(permissions))
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    Ok(Json(json!({ "message": "Permissions saved", "permissions": permissions })))
}

/// GET /api/settings/ai (owner)
pub async fn ai_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<AiSettings>> {
    let stored: Option<Option<Jsonb<AiSettings>>> = sqlx::query_scalar("SELECT ai_settings FROM users WHERE id = $1")
        .bind(caller.id)
        .fetch_optional(&state.pool)
        .await?;
    let stored = stored.ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(stored.map(|s| s.0).unwrap_or_default()))
}

/// PUT /api/settings/ai (owner) - absent fields take the defaults
pub async fn ai_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(settings): JsonBody<AiSettings>,
) -> ApiResult<Json<Value>> {
    settings.validate().map_err(ApiError::bad_request)?;
    sqlx::query("UPDATE users SET ai_settings = $1, updated_at = NOW() WHERE id = $2")
        .bind(Jsonb(settings))
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    Ok(Json(json!({ "message": "AI settings saved", "settings": settings })))
}
