//! Per-user preference blobs stored as JSON columns on `users`.
//!
//! GET returns the stored value (or a default when unset); PUT writes the
//! column and echoes back what was stored.
use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiResult, AuthUser, JsonBody};
use crate::services::preferences::{AiAutomationSettings, AiAutomationUpdate};
use crate::state::AppState;
use crate::types::Theme;

/// JSON preference columns on `users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceColumn {
    AiAutomation,
    Notifications,
    DataRetention,
}

impl PreferenceColumn {
    fn column(&self) -> &'static str {
        match self {
            PreferenceColumn::AiAutomation => "ai_automation_settings",
            PreferenceColumn::Notifications => "notification_preferences",
            PreferenceColumn::DataRetention => "data_retention_settings",
        }
    }
}

fn user_not_found() -> ApiError {
    ApiError::not_found("User not found")
}

/// Stored blob, or `{}` when the column is NULL. 404 when the user row is gone.
pub(crate) async fn read_preference(pool: &PgPool, user_id: Uuid, column: PreferenceColumn) -> ApiResult<Value> {
    let stored: Option<Option<Value>> =
        sqlx::query_scalar(&format!("SELECT {} FROM users WHERE id = $1", column.column()))
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    let stored = stored.ok_or_else(user_not_found)?;
    Ok(stored.unwrap_or_else(|| Value::Object(Map::new())))
}

pub(crate) async fn write_preference(
    pool: &PgPool,
    user_id: Uuid,
    column: PreferenceColumn,
    value: &Value,
) -> ApiResult<Value> {
    let name = column.column();
    let stored: Option<Option<Value>> = sqlx::query_scalar(&format!(
        "UPDATE users SET {name} = $1, updated_at = NOW() WHERE id = $2 RETURNING {name}"
    ))
    .bind(value)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(stored.ok_or_else(user_not_found)?.unwrap_or(Value::Null))
}

/// Free-form preference bodies must be JSON objects.
fn require_object(body: Value) -> ApiResult<Value> {
    if body.is_object() {
        Ok(body)
    } else {
        Err(ApiError::bad_request("Preferences must be a JSON object"))
    }
}

/// GET /api/preferences/ai-automation
pub async fn ai_automation_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    Ok(Json(read_preference(&state.pool, caller.id, PreferenceColumn::AiAutomation).await?))
}

/// PUT /api/preferences/ai-automation - absent fields take the defaults
pub async fn ai_automation_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<AiAutomationUpdate>,
) -> ApiResult<Json<Value>> {
    let settings: AiAutomationSettings = body.merged_with_defaults();
    let value = serde_json::to_value(settings).map_err(|e| ApiError::internal_server_error(e.to_string()))?;
    let stored = write_preference(&state.pool, caller.id, PreferenceColumn::AiAutomation, &value).await?;
    Ok(Json(json!({
        "message": "AI automation settings updated successfully",
        "settings": stored,
    })))
}

/// GET /api/preferences/notifications
pub async fn notifications_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    Ok(Json(read_preference(&state.pool, caller.id, PreferenceColumn::Notifications).await?))
}

/// PUT /api/preferences/notifications
pub async fn notifications_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Json<Value>> {
    let body = require_object(body)?;
    let stored = write_preference(&state.pool, caller.id, PreferenceColumn::Notifications, &body).await?;
    Ok(Json(json!({
        "message": "Notification preferences updated successfully",
        "preferences": stored,
    })))
}

/// GET /api/preferences/data-retention
pub async fn data_retention_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    Ok(Json(read_preference(&state.pool, caller.id, PreferenceColumn::DataRetention).await?))
}

/// PUT /api/preferences/data-retention
pub async fn data_retention_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Json<Value>> {
    let body = require_object(body)?;
    let stored = write_preference(&state.pool, caller.id, PreferenceColumn::DataRetention, &body).await?;
    Ok(Json(json!({
        "message": "Data retention settings updated successfully",
        "settings": stored,
    })))
}

/// GET /api/preferences/theme - `light` when unset
pub async fn theme_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let stored: Option<Option<String>> = sqlx::query_scalar("SELECT theme FROM users WHERE id = $1")
        .bind(caller.id)
        .fetch_optional(&state.pool)
        .await?;
    let theme = stored.ok_or_else(user_not_found)?.unwrap_or_else(|| Theme::Light.to_string());
    Ok(Json(json!({ "theme": theme })))
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme: Option<String>,
}

/// Accepts exactly `light`, `dark` or `system`.
pub fn parse_theme(raw: Option<&str>) -> ApiResult<Theme> {
    raw.and_then(|t| t.parse::<Theme>().ok())
        .ok_or_else(|| ApiError::bad_request("Invalid theme. Must be light, dark, or system"))
}

/// PUT /api/preferences/theme
pub async fn theme_put(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<ThemeRequest>,
) -> ApiResult<Json<Value>> {
    let theme = parse_theme(body.theme.as_deref())?;
    let stored: Option<Option<String>> =
        sqlx::query_scalar("UPDATE users SET theme = $1, updated_at = NOW() WHERE id = $2 RETURNING theme")
            .bind(theme.as_str())
            .bind(caller.id)
            .fetch_optional(&state.pool)
            .await?;
    let stored = stored.ok_or_else(user_not_found)?;
    Ok(Json(json!({
        "message": "Theme updated successfully",
        "theme": stored,
    })))
}

/// GET /api/preferences/all
pub async fn all_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let row: Option<(Option<Value>, Option<Value>, Option<String>, Option<Value>)> = sqlx::query_as(
        "SELECT ai_automation_settings, notification_preferences, theme, data_retention_settings \
         FROM users WHERE id = $1",
    )
    .bind(caller.id)
    .fetch_optional(&state.pool)
    .await?;
    let (ai, notifications, theme, retention) = row.ok_or_else(user_not_found)?;

    let or_empty = |v: Option<Value>| v.unwrap_or_else(|| Value::Object(Map::new()));
    Ok(Json(json!({
        "aiAutomation": or_empty(ai),
        "notifications": or_empty(notifications),
        "theme": theme.unwrap_or_else(|| Theme::Light.to_string()),
        "dataRetention": or_empty(retention),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_must_be_known() {
        assert_eq!(parse_theme(Some("dark")).unwrap(), Theme::Dark);
        let err = parse_theme(Some("neon")).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Invalid theme. Must be light, dark, or system");
        assert!(parse_theme(None).is_err());
    }

    #[test]
    fn free_form_preferences_require_objects() {
        assert!(require_object(json!({ "email": true })).is_ok());
        assert!(require_object(json!([1, 2])).is_err());
        assert!(require_object(json!("loud")).is_err());
    }

    #[test]
    fn columns_map_to_users_table() {
        assert_eq!(PreferenceColumn::AiAutomation.column(), "ai_automation_settings");
        assert_eq!(PreferenceColumn::Notifications.column(), "notification_preferences");
        assert_eq!(PreferenceColumn::DataRetention.column(), "data_retention_settings");
    }
}
