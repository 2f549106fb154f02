//! Client payments against a job. Create and delete keep `jobs.amount_paid`
//! in step inside one transaction.
use axum::{
    extract::{Extension, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{ClientPayment, Job};
use crate::error::ApiError;
use crate::handlers::{money, optional_text, protected::message, required_date, required_text};
use crate::middleware::{ApiPath, ApiResult, AuthUser, Created, JsonBody};
use crate::state::AppState;

/// GET /api/client-payments/job/:job_id
pub async fn job_client_payments_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(job_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<ClientPayment>>> {
    if Job::find_owned(&state.pool, job_id, caller.id).await?.is_none() {
        return Err(ApiError::forbidden("Access denied or Job not found"));
    }

    let payments = sqlx::query_as::<_, ClientPayment>(
        "SELECT * FROM client_payments WHERE job_id = $1 ORDER BY date DESC, created_at DESC",
    )
    .bind(job_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(payments))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPaymentRequest {
    #[serde(alias = "jobID")]
    pub job_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub method: Option<String>,
    pub date: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// POST /api/client-payments
pub async fn client_payment_create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<ClientPaymentRequest>,
) -> ApiResult<Created<ClientPayment>> {
    let (Some(job_id), Some(amount), Some(_), Some(_)) = (body.job_id, body.amount, &body.method, &body.date) else {
        return Err(ApiError::bad_request("Missing required fields: jobId, amount, method, date"));
    };
    if amount <= Decimal::ZERO {
        return Err(ApiError::invalid_field("amount", "amount must be greater than 0"));
    }
    money("amount", amount)?;
    let method = required_text("method", body.method)?;
    let date = required_date("date", body.date.as_deref())?;

    let mut tx = state.pool.begin().await?;

    let owned: Option<Uuid> = sqlx::query_scalar("SELECT id FROM jobs WHERE id = $1 AND owner_id = $2 FOR UPDATE")
        .bind(job_id)
        .bind(caller.id)
        .fetch_optional(&mut *tx)
        .await?;
    if owned.is_none() {
        return Err(ApiError::not_found("Job not found"));
    }

    let payment = sqlx::query_as::<_, ClientPayment>(
        "INSERT INTO client_payments (job_id, amount, method, date, reference, notes, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(job_id)
    .bind(amount)
    .bind(&method)
    .bind(date)
    .bind(optional_text(body.reference))
    .bind(optional_text(body.notes))
    .bind(caller.id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE jobs SET amount_paid = amount_paid + $1, updated_at = NOW() WHERE id = $2")
        .bind(amount)
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(payment_id = %payment.id, job_id = %job_id, %amount, "client payment recorded");
    Ok(Created(payment))
}

/// DELETE /api/client-payments/:id
pub async fn client_payment_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let mut tx = state.pool.begin().await?;

    let found: Option<(Uuid, Decimal)> = sqlx::query_as(
        "SELECT cp.job_id, cp.amount FROM client_payments cp \
         JOIN jobs j ON cp.job_id = j.id WHERE cp.id = $1 AND j.owner_id = $2 FOR UPDATE OF cp, j",
    )
    .bind(id)
    .bind(caller.id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some((job_id, amount)) = found else {
        return Err(ApiError::not_found("Payment not found"));
    };

    sqlx::query("DELETE FROM client_payments WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE jobs SET amount_paid = GREATEST(0, amount_paid - $1), updated_at = NOW() WHERE id = $2")
        .bind(amount)
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(payment_id = %id, job_id = %job_id, "client payment deleted");
    Ok(message("Payment deleted successfully"))
}
