//! Stored AI insights. Generation runs elsewhere; this API only files and
//! serves the results.
use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{AiInsight, Job};
use crate::error::ApiError;
use crate::handlers::{parse_choice, protected::message, required_text};
use crate::middleware::{ApiPath, ApiResult, AuthUser, Created, JsonBody};
use crate::state::AppState;
use crate::types::{InsightSeverity, Permission};

const INSIGHT_SELECT: &str = "SELECT ai.*, j.job_name FROM ai_insights ai LEFT JOIN jobs j ON ai.job_id = j.id";

/// GET /api/ai-insights - workers see their owner's insights
pub async fn insights_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<AiInsight>>> {
    caller.require_permission(Permission::SeeAiInsights)?;
    let insights = sqlx::query_as::<_, AiInsight>(&format!(
        "{INSIGHT_SELECT} WHERE ai.owner_id = $1 ORDER BY ai.created_at DESC"
    ))
    .bind(caller.scope_owner_id())
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(insights))
}

/// GET /api/ai-insights/:id
pub async fn insight_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<AiInsight>> {
    caller.require_permission(Permission::SeeAiInsights)?;
    let insight = sqlx::query_as::<_, AiInsight>(&format!("{INSIGHT_SELECT} WHERE ai.id = $1 AND ai.owner_id = $2"))
        .bind(id)
        .bind(caller.scope_owner_id())
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Insight not found"))?;
    Ok(Json(insight))
}

#[derive(Debug, Deserialize)]
pub struct InsightRequest {
    pub insight: Option<String>,
    pub category: Option<String>,
    pub severity: Option<String>,
    pub actionable: Option<bool>,
    #[serde(rename = "jobID", alias = "jobId")]
    pub job_id: Option<Uuid>,
}

/// POST /api/ai-insights (owner)
pub async fn insight_create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<InsightRequest>,
) -> ApiResult<Created<AiInsight>> {
    let insight = required_text("insight", body.insight)?;
    let category = required_text("category", body.category)?;
    let severity: InsightSeverity = match body.severity.as_deref() {
        Some(raw) => parse_choice("severity", raw)?,
        None => InsightSeverity::Info,
    };

    if let Some(job_id) = body.job_id {
        Job::find_owned(&state.pool, job_id, caller.id)
            .await?
            .ok_or_else(|| ApiError::not_found("Job not found"))?;
    }

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO ai_insights (owner_id, job_id, category, severity, insight, actionable) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(caller.id)
    .bind(body.job_id)
    .bind(&category)
    .bind(severity.as_str())
    .bind(&insight)
    .bind(body.actionable.unwrap_or(false))
    .fetch_one(&state.pool)
    .await?;

    let created = sqlx::query_as::<_, AiInsight>(&format!("{INSIGHT_SELECT} WHERE ai.id = $1"))
        .bind(id)
        .fetch_one(&state.pool)
        .await?;
    Ok(Created(created))
}

/// DELETE /api/ai-insights/:id (owner)
pub async fn insight_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM ai_insights WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Insight not found"));
    }
    Ok(message("Insight deleted successfully"))
}
