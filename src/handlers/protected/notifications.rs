use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config;
use crate::database::models::Notification;
use crate::error::ApiError;
use crate::handlers::protected::message;
use crate::middleware::{ApiPath, ApiQuery, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    /// Clamp to `1..=max` (default `default`) and a non-negative offset.
    pub fn resolve(&self, default: i64, max: i64) -> (i64, i64) {
        let limit = self.limit.unwrap_or(default).clamp(1, max);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
    pub has_more: bool,
}

/// GET /api/notifications?limit&offset
pub async fn notifications_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<NotificationPage>> {
    let api = &config::config().api;
    let (limit, offset) = page.resolve(api.notifications_page_size, api.notifications_max_page_size);

    let (notifications, unread_count) = futures::try_join!(
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(caller.id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE")
            .bind(caller.id)
            .fetch_one(&state.pool),
    )?;

    let has_more = notifications.len() as i64 == limit;
    Ok(Json(NotificationPage {
        notifications,
        unread_count,
        has_more,
    }))
}

/// PUT /api/notifications/:id/read
pub async fn notification_read_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let notification = sqlx::query_as::<_, Notification>(
        "UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(caller.id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Notification not found"))?;
    Ok(Json(json!({ "notification": notification })))
}

/// PUT /api/notifications/mark-all-read
pub async fn mark_all_read_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE")
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    Ok(message("All notifications marked as read"))
}

/// DELETE /api/notifications/:id
pub async fn notification_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(message("Notification deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_caps() {
        assert_eq!(PageQuery::default().resolve(20, 100), (20, 0));
        let big = PageQuery { limit: Some(500), offset: Some(-3) };
        assert_eq!(big.resolve(20, 100), (100, 0));
        let zero = PageQuery { limit: Some(0), offset: Some(40) };
        assert_eq!(zero.resolve(20, 100), (1, 40));
    }
}
