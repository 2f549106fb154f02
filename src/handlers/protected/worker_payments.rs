//! Payroll records. Also mounted at `/api/payments` for older clients.
use axum::{
    extract::{Extension, State},
    response::Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::{PaymentTotals, User, WorkerPayment};
use crate::error::ApiError;
use crate::handlers::{
    bounded, money, non_negative, optional_date, optional_text, parse_choice, protected::message, required_date, MAX_HOURS,
    MAX_RATE,
};
use crate::middleware::{ApiPath, ApiResult, AuthUser, Created, JsonBody};
use crate::services::financials;
use crate::state::AppState;
use crate::types::{PaymentMethod, Role};

const PAYMENT_SELECT: &str = "SELECT wp.*, u.email AS worker_email FROM worker_payments wp \
     JOIN users u ON wp.worker_id = u.id";

fn hours_worked(value: Decimal) -> Result<Decimal, ApiError> {
    bounded("hoursWorked", non_negative("hoursWorked", value)?, MAX_HOURS)
}

fn hourly_rate(value: Decimal) -> Result<Decimal, ApiError> {
    bounded("hourlyRate", non_negative("hourlyRate", value)?, MAX_RATE)
}

/// Hours times rate, rejected when it would not fit the earnings column.
fn earnings(hours: Decimal, rate: Decimal) -> Result<Decimal, ApiError> {
    financials::calculated_earnings(hours, rate)
        .and_then(|total| money("calculatedEarnings", total).ok())
        .ok_or_else(|| ApiError::invalid_field("hoursWorked", "hoursWorked times hourlyRate is too large"))
}

/// Workers may only look at their own payroll.
fn ensure_self_or_owner(caller: &AuthUser, worker_id: Uuid) -> ApiResult<()> {
    if caller.role == Role::Worker && caller.id != worker_id {
        tracing::warn!(user_id = %caller.id, %worker_id, "payroll access denied");
        return Err(ApiError::forbidden("Access denied"));
    }
    Ok(())
}

/// GET /api/worker-payments (owner)
pub async fn payments_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<WorkerPayment>>> {
    caller.require_owner()?;
    let payments = sqlx::query_as::<_, WorkerPayment>(&format!(
        "{PAYMENT_SELECT} WHERE wp.owner_id = $1 ORDER BY wp.payment_date DESC, wp.created_at DESC"
    ))
    .bind(caller.id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(payments))
}

/// GET /api/worker-payments/worker/:worker_id
pub async fn worker_payments_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(worker_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<WorkerPayment>>> {
    ensure_self_or_owner(&caller, worker_id)?;

    let mut query = QueryBuilder::<Postgres>::new(PAYMENT_SELECT);
    query.push(" WHERE wp.worker_id = ").push_bind(worker_id);
    if caller.is_owner() {
        query.push(" AND wp.owner_id = ").push_bind(caller.id);
    }
    query.push(" ORDER BY wp.payment_date DESC, wp.created_at DESC");

    let payments = query.build_query_as::<WorkerPayment>().fetch_all(&state.pool).await?;
    Ok(Json(payments))
}

#[derive(Debug, Serialize)]
pub struct PayrollSummary {
    #[serde(rename = "workerID")]
    pub worker_id: Uuid,
    #[serde(rename = "workerName")]
    pub worker_name: String,
    #[serde(rename = "workerEmail")]
    pub worker_email: String,
    #[serde(rename = "workerPhone")]
    pub worker_phone: Option<String>,
    #[serde(flatten)]
    pub totals: PaymentTotals,
}

/// GET /api/worker-payments/summary/:worker_id
pub async fn payroll_summary_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(worker_id): ApiPath<Uuid>,
) -> ApiResult<Json<PayrollSummary>> {
    ensure_self_or_owner(&caller, worker_id)?;

    let worker = match caller.role {
        Role::Owner => User::find_worker(&state.pool, caller.id, worker_id).await?,
        Role::Worker => User::find_by_id(&state.pool, worker_id).await?,
    }
    .ok_or_else(|| ApiError::not_found("Worker not found"))?;

    let mut query = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) AS total_payments, \
         COALESCE(SUM(amount), 0) AS total_paid, \
         COALESCE(SUM(hours_worked), 0) AS total_hours, \
         ROUND(COALESCE(AVG(hourly_rate), 0), 2) AS average_rate, \
         MIN(payment_date) AS first_payment_date, \
         MAX(payment_date) AS last_payment_date \
         FROM worker_payments WHERE worker_id = ",
    );
    query.push_bind(worker_id);
    if caller.is_owner() {
        query.push(" AND owner_id = ").push_bind(caller.id);
    }
    let totals = query.build_query_as::<PaymentTotals>().fetch_one(&state.pool).await?;

    Ok(Json(PayrollSummary {
        worker_id: worker.id,
        worker_name: worker.name,
        worker_email: worker.email,
        worker_phone: worker.phone,
        totals,
    }))
}

/// GET /api/worker-payments/:id - the paying owner or the paid worker
pub async fn payment_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<WorkerPayment>> {
    let filter = match caller.role {
        Role::Owner => "wp.owner_id",
        Role::Worker => "wp.worker_id",
    };
    let payment = sqlx::query_as::<_, WorkerPayment>(&format!("{PAYMENT_SELECT} WHERE wp.id = $1 AND {filter} = $2"))
        .bind(id)
        .bind(caller.id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Payment record not found"))?;
    Ok(Json(payment))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    #[serde(rename = "workerID", alias = "workerId")]
    pub worker_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub payment_date: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub hours_worked: Option<Decimal>,
    pub hourly_rate: Option<Decimal>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub reference_number: Option<String>,
}

#[derive(Debug)]
struct NewPayment {
    worker_id: Uuid,
    amount: Decimal,
    payment_date: NaiveDate,
    period_start: NaiveDate,
    period_end: NaiveDate,
    hours_worked: Decimal,
    hourly_rate: Decimal,
    payment_method: PaymentMethod,
}

impl NewPayment {
    fn parse(body: &PaymentPayload) -> Result<Self, ApiError> {
        let required = |field: &str, v: Option<Decimal>| {
            v.ok_or_else(|| ApiError::invalid_field(field, format!("{field} is required")))
        };
        let period_start = required_date("periodStart", body.period_start.as_deref())?;
        let period_end = required_date("periodEnd", body.period_end.as_deref())?;
        if period_end < period_start {
            return Err(ApiError::invalid_field("periodEnd", "periodEnd cannot be before periodStart"));
        }
        Ok(Self {
            worker_id: body
                .worker_id
                .ok_or_else(|| ApiError::invalid_field("workerID", "workerID is required"))?,
            amount: money("amount", non_negative("amount", required("amount", body.amount)?)?)?,
            payment_date: required_date("paymentDate", body.payment_date.as_deref())?,
            period_start,
            period_end,
            hours_worked: hours_worked(required("hoursWorked", body.hours_worked)?)?,
            hourly_rate: hourly_rate(required("hourlyRate", body.hourly_rate)?)?,
            payment_method: parse_choice("paymentMethod", body.payment_method.as_deref().unwrap_or_default())?,
        })
    }
}

/// POST /api/worker-payments (owner)
pub async fn payment_create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<PaymentPayload>,
) -> ApiResult<Created<WorkerPayment>> {
    caller.require_owner()?;
    let new = NewPayment::parse(&body)?;
    let earnings = earnings(new.hours_worked, new.hourly_rate)?;

    let worker = User::find_by_id(&state.pool, new.worker_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Worker not found"))?;
    if worker.owner_id != Some(caller.id) {
        return Err(ApiError::forbidden("Worker does not belong to your organization"));
    }

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO worker_payments (owner_id, worker_id, worker_name, amount, payment_date, period_start, \
         period_end, hours_worked, hourly_rate, calculated_earnings, payment_method, notes, reference_number) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING id",
    )
    .bind(caller.id)
    .bind(worker.id)
    .bind(&worker.name)
    .bind(new.amount)
    .bind(new.payment_date)
    .bind(new.period_start)
    .bind(new.period_end)
    .bind(new.hours_worked)
    .bind(new.hourly_rate)
    .bind(earnings)
    .bind(new.payment_method.as_str())
    .bind(optional_text(body.notes))
    .bind(optional_text(body.reference_number))
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(payment_id = %id, worker_id = %worker.id, amount = %new.amount, "worker payment recorded");

    let payment = sqlx::query_as::<_, WorkerPayment>(&format!("{PAYMENT_SELECT} WHERE wp.id = $1"))
        .bind(id)
        .fetch_one(&state.pool)
        .await?;
    Ok(Created(payment))
}

/// Append `SET` assignments for the supplied fields. Returns false when nothing was given.
/// `stored` is the row's current `(hours_worked, hourly_rate)`, used to recompute earnings.
fn push_payment_updates(
    query: &mut QueryBuilder<'_, Postgres>,
    body: PaymentPayload,
    stored: (Decimal, Decimal),
) -> Result<bool, ApiError> {
    let mut set = query.separated(", ");
    let mut any = false;

    if let Some(amount) = body.amount {
        set.push("amount = ").push_bind_unseparated(money("amount", non_negative("amount", amount)?)?);
        any = true;
    }
    if let Some(date) = optional_date("paymentDate", body.payment_date.as_deref())? {
        set.push("payment_date = ").push_bind_unseparated(date);
        any = true;
    }
    if let Some(date) = optional_date("periodStart", body.period_start.as_deref())? {
        set.push("period_start = ").push_bind_unseparated(date);
        any = true;
    }
    if let Some(date) = optional_date("periodEnd", body.period_end.as_deref())? {
        set.push("period_end = ").push_bind_unseparated(date);
        any = true;
    }

    let hours = body.hours_worked.map(hours_worked).transpose()?;
    let rate = body.hourly_rate.map(hourly_rate).transpose()?;
    if let Some(h) = hours {
        set.push("hours_worked = ").push_bind_unseparated(h);
    }
    if let Some(r) = rate {
        set.push("hourly_rate = ").push_bind_unseparated(r);
    }
    if hours.is_some() || rate.is_some() {
        let total = earnings(hours.unwrap_or(stored.0), rate.unwrap_or(stored.1))?;
        set.push("calculated_earnings = ").push_bind_unseparated(total);
        any = true;
    }

    if let Some(method) = body.payment_method.as_deref() {
        let method: PaymentMethod = parse_choice("paymentMethod", method)?;
        set.push("payment_method = ").push_bind_unseparated(method.as_str());
        any = true;
    }
    if let Some(notes) = body.notes {
        set.push("notes = ").push_bind_unseparated(notes);
        any = true;
    }
    if let Some(reference) = body.reference_number {
        set.push("reference_number = ").push_bind_unseparated(reference);
        any = true;
    }
    Ok(any)
}

/// PUT /api/worker-payments/:id (owner)
pub async fn payment_update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    JsonBody(body): JsonBody<PaymentPayload>,
) -> ApiResult<Json<WorkerPayment>> {
    caller.require_owner()?;

    let stored: (Decimal, Decimal) =
        sqlx::query_as("SELECT hours_worked, hourly_rate FROM worker_payments WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(caller.id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Payment record not found"))?;

    let mut query = QueryBuilder::<Postgres>::new("UPDATE worker_payments SET ");
    if !push_payment_updates(&mut query, body, stored)? {
        return Err(ApiError::bad_request("No fields to update"));
    }
    query.push(", updated_at = NOW() WHERE id = ").push_bind(id);
    query.push(" AND owner_id = ").push_bind(caller.id);

    let result = query.build().execute(&state.pool).await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Payment record not found"));
    }

    let payment = sqlx::query_as::<_, WorkerPayment>(&format!("{PAYMENT_SELECT} WHERE wp.id = $1"))
        .bind(id)
        .fetch_one(&state.pool)
        .await?;
    Ok(Json(payment))
}

/// DELETE /api/worker-payments/:id (owner)
pub async fn payment_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    caller.require_owner()?;
    let result = sqlx::query("DELETE FROM worker_payments WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Payment record not found"));
    }
    Ok(message("Payment record deleted successfully"))
}
