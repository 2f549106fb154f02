use axum::{
    extract::{Extension, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{Job, Receipt};
use crate::error::ApiError;
use crate::handlers::{money, non_negative, optional_date, optional_text, protected::message, required_date, required_text};
use crate::middleware::{ApiPath, ApiResult, AuthUser, Created, JsonBody, require_job_access};
use crate::state::AppState;
use crate::types::{Permission, Role};

const RECEIPT_SELECT: &str = "SELECT r.*, j.job_name FROM receipts r LEFT JOIN jobs j ON r.job_id = j.id";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    #[serde(rename = "jobID")]
    pub job_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub vendor: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub ai_processed: Option<bool>,
    pub ai_confidence: Option<f64>,
    pub ai_flags: Option<Vec<String>>,
    pub ai_suggested_category: Option<String>,
}

/// Owner whose books a receipt list reads from. Workers need `canViewFinancials`.
fn list_owner(caller: &AuthUser) -> ApiResult<Uuid> {
    match caller.role {
        Role::Owner => Ok(caller.id),
        Role::Worker => {
            caller.require_permission(Permission::ViewFinancials)?;
            Ok(caller.scope_owner_id())
        }
    }
}

async fn load_receipt(state: &AppState, id: Uuid) -> ApiResult<Receipt> {
    sqlx::query_as::<_, Receipt>(&format!("{RECEIPT_SELECT} WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Receipt not found"))
}

/// GET /api/receipts
pub async fn receipts_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Receipt>>> {
    let owner_id = list_owner(&caller)?;
    let receipts = sqlx::query_as::<_, Receipt>(&format!(
        "{RECEIPT_SELECT} WHERE r.owner_id = $1 ORDER BY r.created_at DESC"
    ))
    .bind(owner_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(receipts))
}

/// GET /api/receipts/job/:job_id
pub async fn job_receipts_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(job_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Receipt>>> {
    let owner_id = list_owner(&caller)?;
    let receipts = sqlx::query_as::<_, Receipt>(&format!(
        "{RECEIPT_SELECT} WHERE r.job_id = $1 AND r.owner_id = $2 ORDER BY r.created_at DESC"
    ))
    .bind(job_id)
    .bind(owner_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(receipts))
}

/// POST /api/receipts
///
/// Worker receipts are filed under the job's owner, or under the worker's
/// owner when no job is given.
pub async fn receipt_create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<ReceiptPayload>,
) -> ApiResult<Created<Receipt>> {
    caller.require_permission(Permission::UploadReceipts)?;

    let amount = body
        .amount
        .ok_or_else(|| ApiError::invalid_field("amount", "amount is required"))?;
    let amount = money("amount", non_negative("amount", amount)?)?;
    let vendor = required_text("vendor", body.vendor)?;
    let receipt_date = required_date("date", body.date.as_deref())?;

    let owner_id = match (caller.role, body.job_id) {
        (Role::Owner, Some(job_id)) => {
            Job::find_owned(&state.pool, job_id, caller.id)
                .await?
                .ok_or_else(|| ApiError::not_found("Job not found"))?;
            caller.id
        }
        (Role::Owner, None) => caller.id,
        (Role::Worker, Some(job_id)) => require_job_access(&state.pool, &caller, job_id).await?.owner_id,
        (Role::Worker, None) => caller.scope_owner_id(),
    };

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO receipts (owner_id, job_id, amount, vendor, category, receipt_date, image_url, notes, \
         ai_processed, ai_confidence, ai_flags, ai_suggested_category) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id",
    )
    .bind(owner_id)
    .bind(body.job_id)
    .bind(amount)
    .bind(&vendor)
    .bind(optional_text(body.category))
    .bind(receipt_date)
    .bind(optional_text(body.image_url))
    .bind(optional_text(body.notes))
    .bind(body.ai_processed.unwrap_or(false))
    .bind(body.ai_confidence)
    .bind(body.ai_flags)
    .bind(optional_text(body.ai_suggested_category))
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(receipt_id = %id, owner_id = %owner_id, submitted_by = %caller.id, "receipt created");
    Ok(Created(load_receipt(&state, id).await?))
}

/// PUT /api/receipts/:id
pub async fn receipt_update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    JsonBody(body): JsonBody<ReceiptPayload>,
) -> ApiResult<Json<Receipt>> {
    let amount = body.amount.map(|a| money("amount", non_negative("amount", a)?)).transpose()?;
    let vendor = match body.vendor {
        Some(v) => Some(required_text("vendor", Some(v))?),
        None => None,
    };
    let receipt_date = optional_date("date", body.date.as_deref())?;

    if let Some(job_id) = body.job_id {
        Job::find_owned(&state.pool, job_id, caller.id)
            .await?
            .ok_or_else(|| ApiError::not_found("Job not found"))?;
    }

    let result = sqlx::query(
        "UPDATE receipts SET job_id = COALESCE($1, job_id), amount = COALESCE($2, amount), \
         vendor = COALESCE($3, vendor), category = COALESCE($4, category), \
         receipt_date = COALESCE($5, receipt_date), image_url = COALESCE($6, image_url), \
         notes = COALESCE($7, notes), ai_processed = COALESCE($8, ai_processed), \
         ai_confidence = COALESCE($9, ai_confidence), ai_flags = COALESCE($10, ai_flags), \
         ai_suggested_category = COALESCE($11, ai_suggested_category) \
         WHERE id = $12 AND owner_id = $13",
    )
    .bind(body.job_id)
    .bind(amount)
    .bind(vendor)
    .bind(optional_text(body.category))
    .bind(receipt_date)
    .bind(optional_text(body.image_url))
    .bind(optional_text(body.notes))
    .bind(body.ai_processed)
    .bind(body.ai_confidence)
    .bind(body.ai_flags)
    .bind(optional_text(body.ai_suggested_category))
    .bind(id)
    .bind(caller.id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Receipt not found"));
    }
    Ok(Json(load_receipt(&state, id).await?))
}

/// DELETE /api/receipts/:id
pub async fn receipt_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM receipts WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Receipt not found"));
    }
    Ok(message("Receipt deleted"))
}
