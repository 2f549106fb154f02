use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    #[serde(rename = "ownerID")]
    pub owner_id: Uuid,
    pub job_name: String,
    pub client_name: String,
    pub address: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geofence_enabled: bool,
    /// Meters.
    pub geofence_radius: i32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: String,
    pub notes: Option<String>,
    pub project_value: Decimal,
    pub amount_paid: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Job row plus the cost aggregates computed in SQL.
#[derive(Debug, Clone, FromRow)]
pub struct JobWithCosts {
    #[sqlx(flatten)]
    pub job: Job,
    pub labor_cost: Decimal,
    pub receipt_expenses: Decimal,
}

/// Aggregates appended to `j.*` in job listings.
pub const JOB_COST_COLUMNS: &str = "\
    COALESCE((SELECT SUM(t.hours * COALESCE(w.hourly_rate, 0)) \
              FROM timesheets t LEFT JOIN users w ON t.worker_id = w.id \
              WHERE t.job_id = j.id), 0) AS labor_cost, \
    COALESCE((SELECT SUM(r.amount) FROM receipts r WHERE r.job_id = j.id), 0) AS receipt_expenses";

impl Job {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_owned(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn with_costs(pool: &PgPool, id: Uuid) -> Result<Option<JobWithCosts>, sqlx::Error> {
        sqlx::query_as::<_, JobWithCosts>(&format!("SELECT j.*, {JOB_COST_COLUMNS} FROM jobs j WHERE j.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn assigned_worker_ids(pool: &PgPool, job_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>("SELECT worker_id FROM worker_job_assignments WHERE job_id = $1")
            .bind(job_id)
            .fetch_all(pool)
            .await
    }

    pub async fn is_assigned(pool: &PgPool, job_id: Uuid, worker_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM worker_job_assignments WHERE job_id = $1 AND worker_id = $2)",
        )
        .bind(job_id)
        .bind(worker_id)
        .fetch_one(pool)
        .await
    }
}
