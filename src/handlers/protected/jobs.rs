use std::collections::HashMap;

use axum::{
    extract::{Extension, State},
    response::Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::models::{Job, JobWithCosts, User, JOB_COST_COLUMNS};
use crate::error::ApiError;
use crate::handlers::{money, non_negative, optional_date, optional_text, parse_choice, protected::message, required_date, required_text};
use crate::middleware::{ApiPath, ApiResult, AuthUser, Created, JsonBody, require_job_access};
use crate::services::financials::JobFinancials;
use crate::services::geofence::{Coordinates, DEFAULT_RADIUS_METERS};
use crate::state::AppState;
use crate::types::{JobStatus, Role};

/// Job with derived money fields and the assigned worker ids.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    #[serde(flatten)]
    pub job: Job,
    #[serde(flatten)]
    pub financials: JobFinancials,
    pub assigned_workers: Vec<Uuid>,
}

impl JobView {
    fn new(row: JobWithCosts, assigned_workers: Vec<Uuid>) -> Self {
        let financials = JobFinancials::compute(
            row.job.project_value,
            row.job.amount_paid,
            row.labor_cost,
            row.receipt_expenses,
        );
        Self {
            job: row.job,
            financials,
            assigned_workers,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub job_name: Option<String>,
    pub client_name: Option<String>,
    pub address: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geofence_enabled: Option<bool>,
    pub geofence_radius: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub project_value: Option<Decimal>,
    pub amount_paid: Option<Decimal>,
    pub assigned_workers: Option<Vec<Uuid>>,
}

/// Validated column values for an insert or a full-row update.
#[derive(Debug)]
struct JobFields {
    job_name: String,
    client_name: String,
    address: Option<String>,
    location: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    geofence_enabled: bool,
    geofence_radius: i32,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    status: JobStatus,
    notes: Option<String>,
    project_value: Decimal,
    amount_paid: Decimal,
}

impl JobFields {
    /// Client payments may push `amount_paid` past the project value, so
    /// the ceiling is only enforced when the caller sets either figure.
    fn validate(self, check_overpayment: bool) -> Result<Self, ApiError> {
        if self.project_value <= Decimal::ZERO {
            return Err(ApiError::invalid_field("projectValue", "projectValue must be greater than 0"));
        }
        money("projectValue", self.project_value)?;
        non_negative("amountPaid", self.amount_paid)?;
        money("amountPaid", self.amount_paid)?;
        if check_overpayment && self.amount_paid > self.project_value {
            return Err(ApiError::bad_request("Amount paid cannot exceed project value"));
        }
        if let Some(coords) = Coordinates::from_options(self.latitude, self.longitude) {
            if !coords.is_valid() {
                return Err(ApiError::invalid_field("latitude", "Coordinates out of range"));
            }
        }
        if self.geofence_radius <= 0 {
            return Err(ApiError::invalid_field("geofenceRadius", "geofenceRadius must be positive"));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ApiError::invalid_field("endDate", "endDate cannot be before startDate"));
            }
        }
        Ok(self)
    }

    fn from_create(body: JobPayload) -> Result<Self, ApiError> {
        let status = match body.status.as_deref() {
            Some(raw) => parse_choice("status", raw)?,
            None => JobStatus::Active,
        };
        Self {
            job_name: required_text("jobName", body.job_name)?,
            client_name: required_text("clientName", body.client_name)?,
            address: optional_text(body.address),
            location: optional_text(body.location),
            latitude: body.latitude,
            longitude: body.longitude,
            geofence_enabled: body.geofence_enabled.unwrap_or(false),
            geofence_radius: body.geofence_radius.unwrap_or(DEFAULT_RADIUS_METERS),
            start_date: required_date("startDate", body.start_date.as_deref())?,
            end_date: optional_date("endDate", body.end_date.as_deref())?,
            status,
            notes: optional_text(body.notes),
            project_value: body
                .project_value
                .ok_or_else(|| ApiError::invalid_field("projectValue", "projectValue is required"))?,
            amount_paid: body.amount_paid.unwrap_or(Decimal::ZERO),
        }
        .validate(true)
    }

    /// Overlay the supplied fields on the stored job.
    fn merged(current: &Job, body: JobPayload) -> Result<Self, ApiError> {
        let touches_money = body.project_value.is_some() || body.amount_paid.is_some();
        let status = match body.status.as_deref() {
            Some(raw) => parse_choice("status", raw)?,
            None => parse_choice("status", &current.status)?,
        };
        Self {
            job_name: match body.job_name {
                Some(v) => required_text("jobName", Some(v))?,
                None => current.job_name.clone(),
            },
            client_name: match body.client_name {
                Some(v) => required_text("clientName", Some(v))?,
                None => current.client_name.clone(),
            },
            address: optional_text(body.address).or_else(|| current.address.clone()),
            location: optional_text(body.location).or_else(|| current.location.clone()),
            latitude: body.latitude.or(current.latitude),
            longitude: body.longitude.or(current.longitude),
            geofence_enabled: body.geofence_enabled.unwrap_or(current.geofence_enabled),
            geofence_radius: body.geofence_radius.unwrap_or(current.geofence_radius),
            start_date: optional_date("startDate", body.start_date.as_deref())?.unwrap_or(current.start_date),
            end_date: optional_date("endDate", body.end_date.as_deref())?.or(current.end_date),
            status,
            notes: optional_text(body.notes).or_else(|| current.notes.clone()),
            project_value: body.project_value.unwrap_or(current.project_value),
            amount_paid: body.amount_paid.unwrap_or(current.amount_paid),
        }
        .validate(touches_money)
    }
}

async fn assignments_for(pool: &PgPool, job_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Uuid>>, sqlx::Error> {
    let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
        "SELECT job_id, worker_id FROM worker_job_assignments WHERE job_id = ANY($1) ORDER BY assigned_at",
    )
    .bind(job_ids)
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (job_id, worker_id) in rows {
        map.entry(job_id).or_default().push(worker_id);
    }
    Ok(map)
}

/// Replace a job's assignment set. Ids that are not the owner's workers are ignored.
async fn replace_assignments(
    tx: &mut Transaction<'_, Postgres>,
    job_id: Uuid,
    owner_id: Uuid,
    workers: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM worker_job_assignments WHERE job_id = $1")
        .bind(job_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query(
        "INSERT INTO worker_job_assignments (job_id, worker_id) \
         SELECT $1, id FROM users WHERE id = ANY($2) AND owner_id = $3 AND role = 'worker' \
         ON CONFLICT (worker_id, job_id) DO NOTHING",
    )
    .bind(job_id)
    .bind(workers)
    .bind(owner_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn load_view(pool: &PgPool, job_id: Uuid) -> ApiResult<JobView> {
    let row = Job::with_costs(pool, job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;
    let assigned = Job::assigned_worker_ids(pool, job_id).await?;
    Ok(JobView::new(row, assigned))
}

/// GET /api/jobs - owners see their jobs, workers their assigned ones
pub async fn jobs_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<JobView>>> {
    let rows = match caller.role {
        Role::Owner => {
            sqlx::query_as::<_, JobWithCosts>(&format!(
                "SELECT j.*, {JOB_COST_COLUMNS} FROM jobs j WHERE j.owner_id = $1 ORDER BY j.created_at DESC"
            ))
            .bind(caller.id)
            .fetch_all(&state.pool)
            .await?
        }
        Role::Worker => {
            sqlx::query_as::<_, JobWithCosts>(&format!(
                "SELECT j.*, {JOB_COST_COLUMNS} FROM jobs j \
                 JOIN worker_job_assignments wja ON j.id = wja.job_id \
                 WHERE wja.worker_id = $1 ORDER BY j.created_at DESC"
            ))
            .bind(caller.id)
            .fetch_all(&state.pool)
            .await?
        }
    };

    let ids: Vec<Uuid> = rows.iter().map(|r| r.job.id).collect();
    let mut assignments = assignments_for(&state.pool, &ids).await?;

    Ok(Json(
        rows.into_iter()
            .map(|row| {
                let assigned = assignments.remove(&row.job.id).unwrap_or_default();
                JobView::new(row, assigned)
            })
            .collect(),
    ))
}

/// GET /api/jobs/:id
pub async fn job_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<JobView>> {
    require_job_access(&state.pool, &caller, id).await?;
    Ok(Json(load_view(&state.pool, id).await?))
}

/// POST /api/jobs (owner)
pub async fn job_create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(mut body): JsonBody<JobPayload>,
) -> ApiResult<Created<JobView>> {
    let workers = body.assigned_workers.take();
    let fields = JobFields::from_create(body)?;

    let mut tx = state.pool.begin().await?;
    let job_id: Uuid = sqlx::query_scalar(
        "INSERT INTO jobs (owner_id, job_name, client_name, address, location, latitude, longitude, \
         geofence_enabled, geofence_radius, start_date, end_date, status, notes, project_value, amount_paid) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) RETURNING id",
    )
    .bind(caller.id)
    .bind(&fields.job_name)
    .bind(&fields.client_name)
    .bind(&fields.address)
    .bind(&fields.location)
    .bind(fields.latitude)
    .bind(fields.longitude)
    .bind(fields.geofence_enabled)
    .bind(fields.geofence_radius)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(fields.status.as_str())
    .bind(&fields.notes)
    .bind(fields.project_value)
    .bind(fields.amount_paid)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(workers) = workers.filter(|w| !w.is_empty()) {
        replace_assignments(&mut tx, job_id, caller.id, &workers).await?;
    }
    tx.commit().await?;

    tracing::info!(job_id = %job_id, owner_id = %caller.id, "job created");
    Ok(Created(load_view(&state.pool, job_id).await?))
}

/// PUT /api/jobs/:id (owner)
pub async fn job_update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    JsonBody(mut body): JsonBody<JobPayload>,
) -> ApiResult<Json<JobView>> {
    let current = Job::find_owned(&state.pool, id, caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    let workers = body.assigned_workers.take();
    let fields = JobFields::merged(&current, body)?;

    let mut tx = state.pool.begin().await?;
    sqlx::query(
        "UPDATE jobs SET job_name = $1, client_name = $2, address = $3, location = $4, latitude = $5, \
         longitude = $6, geofence_enabled = $7, geofence_radius = $8, start_date = $9, end_date = $10, \
         status = $11, notes = $12, project_value = $13, amount_paid = $14, updated_at = NOW() \
         WHERE id = $15",
    )
    .bind(&fields.job_name)
    .bind(&fields.client_name)
    .bind(&fields.address)
    .bind(&fields.location)
    .bind(fields.latitude)
    .bind(fields.longitude)
    .bind(fields.geofence_enabled)
    .bind(fields.geofence_radius)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(fields.status.as_str())
    .bind(&fields.notes)
    .bind(fields.project_value)
    .bind(fields.amount_paid)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if let Some(workers) = workers {
        replace_assignments(&mut tx, id, caller.id, &workers).await?;
    }
    tx.commit().await?;

    Ok(Json(load_view(&state.pool, id).await?))
}

/// DELETE /api/jobs/:id (owner)
pub async fn job_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM jobs WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Job not found"));
    }

    tracing::info!(job_id = %id, "job deleted");
    Ok(message("Job deleted"))
}

#[derive(Debug, Deserialize)]
pub struct AssignWorkerRequest {
    #[serde(rename = "workerID", alias = "workerId")]
    pub worker_id: Option<Uuid>,
}

/// POST /api/jobs/:id/assign-worker (owner)
pub async fn assign_worker_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    JsonBody(body): JsonBody<AssignWorkerRequest>,
) -> ApiResult<Json<Value>> {
    let worker_id = body
        .worker_id
        .ok_or_else(|| ApiError::invalid_field("workerID", "workerID is required"))?;

    Job::find_owned(&state.pool, id, caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;
    User::find_worker(&state.pool, caller.id, worker_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Worker not found"))?;

    sqlx::query(
        "INSERT INTO worker_job_assignments (worker_id, job_id) VALUES ($1, $2) \
         ON CONFLICT (worker_id, job_id) DO NOTHING",
    )
    .bind(worker_id)
    .bind(id)
    .execute(&state.pool)
    .await?;

    tracing::info!(job_id = %id, worker_id = %worker_id, "worker assigned");
    Ok(Json(json!({ "message": "Worker assigned to job" })))
}

/// DELETE /api/jobs/:id/unassign-worker/:worker_id (owner)
pub async fn unassign_worker_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath((id, worker_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<Json<Value>> {
    Job::find_owned(&state.pool, id, caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    sqlx::query("DELETE FROM worker_job_assignments WHERE job_id = $1 AND worker_id = $2")
        .bind(id)
        .bind(worker_id)
        .execute(&state.pool)
        .await?;

    tracing::info!(job_id = %id, worker_id = %worker_id, "worker unassigned");
    Ok(message("Worker unassigned from job"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> JobPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn create_applies_defaults() {
        let fields = JobFields::from_create(payload(json!({
            "jobName": "Deck rebuild",
            "clientName": "Lopez",
            "projectValue": 12000,
            "startDate": "2024-05-01"
        })))
        .unwrap();
        assert_eq!(fields.status, JobStatus::Active);
        assert_eq!(fields.amount_paid, Decimal::ZERO);
        assert_eq!(fields.geofence_radius, DEFAULT_RADIUS_METERS);
        assert!(!fields.geofence_enabled);
    }

    #[test]
    fn create_rejects_overpayment_and_zero_value() {
        let overpaid = JobFields::from_create(payload(json!({
            "jobName": "Roof", "clientName": "Kim", "projectValue": 100,
            "amountPaid": 150, "startDate": "2024-05-01"
        })));
        assert_eq!(overpaid.unwrap_err().message(), "Amount paid cannot exceed project value");

        let zero = JobFields::from_create(payload(json!({
            "jobName": "Roof", "clientName": "Kim", "projectValue": 0, "startDate": "2024-05-01"
        })));
        assert!(zero.is_err());
    }

    fn stored_job(project_value: i64, amount_paid: i64) -> Job {
        Job {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            job_name: "Porch".into(),
            client_name: "Okafor".into(),
            address: None,
            location: None,
            latitude: None,
            longitude: None,
            geofence_enabled: false,
            geofence_radius: 100,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: None,
            status: "active".into(),
            notes: None,
            project_value: Decimal::new(project_value, 0),
            amount_paid: Decimal::new(amount_paid, 0),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn update_leaves_overpaid_job_editable() {
        let current = stored_job(100, 150);
        let fields = JobFields::merged(&current, payload(json!({ "notes": "rename only" }))).unwrap();
        assert_eq!(fields.notes.as_deref(), Some("rename only"));
        assert_eq!(fields.amount_paid, Decimal::new(150, 0));
    }

    #[test]
    fn update_checks_overpayment_when_money_changes() {
        let current = stored_job(100, 150);
        let result = JobFields::merged(&current, payload(json!({ "projectValue": 120 })));
        assert_eq!(result.unwrap_err().message(), "Amount paid cannot exceed project value");

        let raised = JobFields::merged(&current, payload(json!({ "projectValue": 200 }))).unwrap();
        assert_eq!(raised.project_value, Decimal::new(200, 0));
    }

    #[test]
    fn create_rejects_value_beyond_column_range() {
        let result = JobFields::from_create(payload(json!({
            "jobName": "Tower", "clientName": "Ruiz", "projectValue": 1e15, "startDate": "2024-05-01"
        })));
        assert_eq!(result.unwrap_err().status_code(), 400);
    }

    #[test]
    fn create_rejects_unknown_status() {
        let result = JobFields::from_create(payload(json!({
            "jobName": "Roof", "clientName": "Kim", "projectValue": 10,
            "startDate": "2024-05-01", "status": "paused"
        })));
        assert_eq!(result.unwrap_err().status_code(), 400);
    }

    #[test]
    fn view_serializes_money_and_assignments() {
        let owner = Uuid::new_v4();
        let row = JobWithCosts {
            job: Job {
                id: Uuid::new_v4(),
                owner_id: owner,
                job_name: "Kitchen".into(),
                client_name: "Ng".into(),
                address: None,
                location: None,
                latitude: None,
                longitude: None,
                geofence_enabled: false,
                geofence_radius: 100,
                start_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                end_date: None,
                status: "active".into(),
                notes: None,
                project_value: Decimal::new(10000, 0),
                amount_paid: Decimal::new(2500, 0),
                created_at: chrono::Utc::now(),
            },
            labor_cost: Decimal::new(3000, 0),
            receipt_expenses: Decimal::new(1500, 0),
        };
        let worker = Uuid::new_v4();
        let body = serde_json::to_value(JobView::new(row, vec![worker])).unwrap();

        assert_eq!(body["ownerID"], json!(owner));
        assert_eq!(body["profit"], json!(5500.0));
        assert_eq!(body["remainingBalance"], json!(7500.0));
        assert_eq!(body["totalCost"], json!(4500.0));
        assert_eq!(body["assignedWorkers"], json!([worker]));
    }
}
