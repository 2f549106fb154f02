use axum::{
    extract::{Extension, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::middleware::{ApiResult, AuthUser};
use crate::services::export::{self, CsvExport};
use crate::state::AppState;
use crate::types::Permission;

/// CSV attachment response.
pub struct CsvDownload(pub CsvExport);

impl IntoResponse for CsvDownload {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.0.filename);
        (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.0.data,
        )
            .into_response()
    }
}

/// GET /api/export/jobs
pub async fn jobs_csv_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<CsvDownload> {
    let export = export::export_jobs(&state.pool, &caller).await?;
    tracing::info!(user_id = %caller.id, rows = export.count, "jobs exported");
    Ok(CsvDownload(export))
}

/// GET /api/export/receipts
pub async fn receipts_csv_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<CsvDownload> {
    let export = export::export_receipts(&state.pool, &caller).await?;
    tracing::info!(user_id = %caller.id, rows = export.count, "receipts exported");
    Ok(CsvDownload(export))
}

/// GET /api/export/timesheets
pub async fn timesheets_csv_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<CsvDownload> {
    let export = export::export_timesheets(&state.pool, &caller).await?;
    tracing::info!(user_id = %caller.id, rows = export.count, "timesheets exported");
    Ok(CsvDownload(export))
}

/// GET /api/export/all - the three CSV documents inline as JSON
pub async fn all_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let exports = export::export_all(&state.pool, &caller).await?;
    let total = exports.total_records();
    tracing::info!(user_id = %caller.id, total, "full export generated");
    Ok(Json(json!({
        "message": "Export generated successfully",
        "exports": exports,
        "totalRecords": total,
        "exportedAt": Utc::now(),
    })))
}

/// GET /api/export/summary - record counts only
pub async fn summary_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let owner_id = caller.scope_owner_id();
    let (jobs, receipts, timesheets): (i64, i64, i64) = if caller.is_owner() {
        futures::try_join!(
            count(&state, "SELECT COUNT(*) FROM jobs WHERE owner_id = $1", owner_id),
            count(&state, "SELECT COUNT(*) FROM receipts WHERE owner_id = $1", owner_id),
            count(&state, "SELECT COUNT(*) FROM timesheets WHERE owner_id = $1", owner_id),
        )?
    } else {
        let (jobs, timesheets) = futures::try_join!(
            count(&state, "SELECT COUNT(*) FROM worker_job_assignments WHERE worker_id = $1", caller.id),
            count(&state, "SELECT COUNT(*) FROM timesheets WHERE worker_id = $1", caller.id),
        )?;
        let receipts = if caller.has_permission(Permission::ViewFinancials) {
            count(&state, "SELECT COUNT(*) FROM receipts WHERE owner_id = $1", owner_id).await?
        } else {
            0
        };
        (jobs, receipts, timesheets)
    };

    Ok(Json(json!({
        "jobs": jobs,
        "receipts": receipts,
        "timesheets": timesheets,
        "totalRecords": jobs + receipts + timesheets,
    })))
}

async fn count(state: &AppState, sql: &str, id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(sql).bind(id).fetch_one(&state.pool).await
}
