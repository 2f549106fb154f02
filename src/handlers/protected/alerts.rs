use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::Alert;
use crate::error::ApiError;
use crate::handlers::protected::message;
use crate::middleware::{ApiPath, ApiResult, AuthUser};
use crate::state::AppState;

const ALERT_LIST_LIMIT: i64 = 100;

/// GET /api/alerts - newest first, capped at 100
pub async fn alerts_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Alert>>> {
    let alerts = sqlx::query_as::<_, Alert>(
        "SELECT a.*, j.job_name FROM alerts a LEFT JOIN jobs j ON a.job_id = j.id \
         WHERE a.owner_id = $1 ORDER BY a.created_at DESC LIMIT $2",
    )
    .bind(caller.id)
    .bind(ALERT_LIST_LIMIT)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(alerts))
}

/// GET /api/alerts/unread-count
pub async fn unread_count_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts WHERE owner_id = $1 AND read = FALSE")
        .bind(caller.id)
        .fetch_one(&state.pool)
        .await?;
    Ok(Json(json!({ "count": count })))
}

/// PUT /api/alerts/:id/read
pub async fn alert_read_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("UPDATE alerts SET read = TRUE WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Alert not found"));
    }
    Ok(message("Alert marked as read"))
}

/// PUT /api/alerts/read-all
pub async fn read_all_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    sqlx::query("UPDATE alerts SET read = TRUE WHERE owner_id = $1 AND read = FALSE")
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    Ok(message("All alerts marked as read"))
}

/// DELETE /api/alerts/:id
pub async fn alert_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM alerts WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Alert not found"));
    }
    Ok(message("Alert deleted"))
}
