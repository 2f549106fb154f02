use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::services::financials;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Timesheet {
    pub id: Uuid,
    #[serde(rename = "ownerID")]
    pub owner_id: Uuid,
    #[serde(rename = "workerID")]
    pub worker_id: Uuid,
    #[sqlx(default)]
    pub worker_name: Option<String>,
    #[sqlx(default)]
    pub hourly_rate: Option<Decimal>,
    #[serde(rename = "jobID")]
    pub job_id: Uuid,
    #[sqlx(default)]
    pub job_name: Option<String>,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub hours: Option<Decimal>,
    pub status: String,
    pub notes: Option<String>,
    pub clock_in_location: Option<String>,
    pub clock_out_location: Option<String>,
    pub clock_in_latitude: Option<f64>,
    pub clock_in_longitude: Option<f64>,
    pub clock_out_latitude: Option<f64>,
    pub clock_out_longitude: Option<f64>,
    pub distance_from_job_site: Option<f64>,
    pub is_location_valid: Option<bool>,
    pub ai_flags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// Timesheet as returned by list endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetView {
    #[serde(flatten)]
    pub timesheet: Timesheet,
    pub effective_hours: Decimal,
}

impl From<Timesheet> for TimesheetView {
    fn from(timesheet: Timesheet) -> Self {
        let effective_hours =
            financials::effective_hours(timesheet.hours, timesheet.clock_in, timesheet.clock_out);
        Self {
            timesheet,
            effective_hours,
        }
    }
}

/// Listing select with worker and job names joined in.
pub const TIMESHEET_LIST_SELECT: &str = "\
    SELECT t.*, u.name AS worker_name, u.hourly_rate, j.job_name \
    FROM timesheets t \
    JOIN users u ON t.worker_id = u.id \
    JOIN jobs j ON t.job_id = j.id";

impl Timesheet {
    /// The caller's open shift, if any.
    pub async fn active_for_worker(pool: &PgPool, worker_id: Uuid) -> Result<Option<Timesheet>, sqlx::Error> {
        sqlx::query_as::<_, Timesheet>(&format!(
            "{TIMESHEET_LIST_SELECT} WHERE t.worker_id = $1 AND t.status = 'working' \
             ORDER BY t.clock_in DESC LIMIT 1"
        ))
        .bind(worker_id)
        .fetch_optional(pool)
        .await
    }
}
