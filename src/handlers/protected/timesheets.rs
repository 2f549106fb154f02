use axum::{
    extract::{Extension, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{Job, Timesheet, TimesheetView, User, TIMESHEET_LIST_SELECT};
use crate::error::ApiError;
use crate::handlers::{bounded, non_negative, optional_text, parse_choice, protected::message, MAX_SHIFT_HOURS};
use crate::middleware::{ApiPath, ApiResult, AuthUser, Created, JsonBody, require_job_access};
use crate::services::{financials, geofence};
use crate::state::AppState;
use crate::types::{Permission, Role, TimesheetStatus};

async fn load_view(state: &AppState, id: Uuid) -> ApiResult<TimesheetView> {
    let timesheet = sqlx::query_as::<_, Timesheet>(&format!("{TIMESHEET_LIST_SELECT} WHERE t.id = $1"))
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Timesheet not found"))?;
    Ok(timesheet.into())
}

/// GET /api/timesheets - owners see every shift on their jobs, workers their own
pub async fn timesheets_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<TimesheetView>>> {
    let filter = match caller.role {
        Role::Owner => "t.owner_id = $1",
        Role::Worker => "t.worker_id = $1",
    };
    let rows = sqlx::query_as::<_, Timesheet>(&format!(
        "{TIMESHEET_LIST_SELECT} WHERE {filter} ORDER BY t.clock_in DESC"
    ))
    .bind(caller.id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(rows.into_iter().map(TimesheetView::from).collect()))
}

/// GET /api/timesheets/active - the caller's open shift or `null`
pub async fn active_get(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Option<TimesheetView>>> {
    let active = Timesheet::active_for_worker(&state.pool, caller.id).await?;
    Ok(Json(active.map(TimesheetView::from)))
}

/// GET /api/timesheets/job/:job_id
pub async fn job_timesheets_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(job_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<TimesheetView>>> {
    require_job_access(&state.pool, &caller, job_id).await?;
    let rows = sqlx::query_as::<_, Timesheet>(&format!(
        "{TIMESHEET_LIST_SELECT} WHERE t.job_id = $1 ORDER BY t.clock_in DESC"
    ))
    .bind(job_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(rows.into_iter().map(TimesheetView::from).collect()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntryRequest {
    #[serde(rename = "jobID")]
    pub job_id: Option<Uuid>,
    #[serde(rename = "userID")]
    pub user_id: Option<Uuid>,
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_out: Option<DateTime<Utc>>,
    pub hours: Option<Decimal>,
    pub notes: Option<String>,
}

fn shift_hours(value: Decimal) -> Result<Decimal, ApiError> {
    bounded("hours", non_negative("hours", value)?, MAX_SHIFT_HOURS)
}

/// Hours for a manual entry: explicit hours win, else the clock span.
fn manual_hours(
    hours: Option<Decimal>,
    clock_in: DateTime<Utc>,
    clock_out: Option<DateTime<Utc>>,
) -> Result<Option<Decimal>, ApiError> {
    if let Some(out) = clock_out {
        if out < clock_in {
            return Err(ApiError::invalid_field("clockOut", "clockOut cannot be before clockIn"));
        }
    }
    match hours {
        Some(h) => shift_hours(h).map(Some),
        None => Ok(clock_out.map(|out| financials::elapsed_hours(clock_in, out))),
    }
}

/// POST /api/timesheets - manual time entry
pub async fn timesheet_create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<ManualEntryRequest>,
) -> ApiResult<Created<TimesheetView>> {
    let job_id = body
        .job_id
        .ok_or_else(|| ApiError::invalid_field("jobID", "jobID is required"))?;
    let worker_id = body.user_id.unwrap_or(caller.id);

    let job = match caller.role {
        Role::Worker if worker_id != caller.id => {
            return Err(ApiError::forbidden("Workers can only create timesheets for themselves"));
        }
        Role::Worker => require_job_access(&state.pool, &caller, job_id).await?,
        Role::Owner => {
            if worker_id != caller.id {
                User::find_worker(&state.pool, caller.id, worker_id)
                    .await?
                    .ok_or_else(|| ApiError::not_found("Worker not found"))?;
            }
            Job::find_owned(&state.pool, job_id, caller.id)
                .await?
                .ok_or_else(|| ApiError::not_found("Job not found"))?
        }
    };

    let clock_in = body.clock_in.unwrap_or_else(Utc::now);
    let hours = manual_hours(body.hours, clock_in, body.clock_out)?;
    let status = if body.clock_out.is_some() {
        TimesheetStatus::Completed
    } else {
        TimesheetStatus::Working
    };

    if status == TimesheetStatus::Working && Timesheet::active_for_worker(&state.pool, worker_id).await?.is_some() {
        return Err(ApiError::bad_request("Already clocked in to a job"));
    }

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO timesheets (owner_id, worker_id, job_id, clock_in, clock_out, hours, status, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
    )
    .bind(job.owner_id)
    .bind(worker_id)
    .bind(job.id)
    .bind(clock_in)
    .bind(body.clock_out)
    .bind(hours)
    .bind(status.as_str())
    .bind(optional_text(body.notes))
    .fetch_one(&state.pool)
    .await?;

    Ok(Created(load_view(&state, id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockInRequest {
    #[serde(rename = "jobID")]
    pub job_id: Option<Uuid>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location: Option<String>,
}

/// Distance and validity recorded on a clock-in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockInLocation {
    pub distance_from_job_site: Option<f64>,
    pub is_location_valid: Option<bool>,
}

/// Check a clock-in position against the job site.
///
/// With an enabled geofence the caller must send coordinates inside the
/// radius; otherwise the distance is only recorded.
pub fn verify_clock_in_location(job: &Job, position: Option<geofence::Coordinates>) -> Result<ClockInLocation, ApiError> {
    if let Some(pos) = position {
        if !pos.is_valid() {
            return Err(ApiError::invalid_field("latitude", "Coordinates out of range"));
        }
    }

    let site = geofence::Coordinates::from_options(job.latitude, job.longitude);
    let check = match (site, position) {
        (Some(site), Some(pos)) => Some(geofence::check(site, pos, job.geofence_radius)),
        _ => None,
    };

    if job.geofence_enabled && site.is_some() {
        match check {
            None => return Err(ApiError::bad_request("Location is required to clock in to this job")),
            Some(c) if !c.within_radius => {
                return Err(ApiError::invalid_input(
                    "You are outside the job site geofence",
                    serde_json::json!({
                        "distance": c.distance_meters,
                        "allowedRadius": job.geofence_radius,
                    }),
                ));
            }
            Some(_) => {}
        }
    }

    Ok(ClockInLocation {
        distance_from_job_site: check.map(|c| c.distance_meters),
        is_location_valid: check.map(|c| c.within_radius),
    })
}

/// POST /api/timesheets/clock-in
pub async fn clock_in_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<ClockInRequest>,
) -> ApiResult<Created<TimesheetView>> {
    let job_id = body
        .job_id
        .ok_or_else(|| ApiError::invalid_field("jobID", "jobID is required"))?;

    if Timesheet::active_for_worker(&state.pool, caller.id).await?.is_some() {
        return Err(ApiError::bad_request("Already clocked in to a job"));
    }

    let job = require_job_access(&state.pool, &caller, job_id).await?;
    let position = geofence::Coordinates::from_options(body.latitude, body.longitude);
    let location = verify_clock_in_location(&job, position)?;

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO timesheets (owner_id, worker_id, job_id, clock_in, status, clock_in_location, \
         clock_in_latitude, clock_in_longitude, distance_from_job_site, is_location_valid) \
         VALUES ($1, $2, $3, NOW(), 'working', $4, $5, $6, $7, $8) RETURNING id",
    )
    .bind(job.owner_id)
    .bind(caller.id)
    .bind(job.id)
    .bind(optional_text(body.location))
    .bind(body.latitude)
    .bind(body.longitude)
    .bind(location.distance_from_job_site)
    .bind(location.is_location_valid)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(timesheet_id = %id, worker_id = %caller.id, job_id = %job.id, "clocked in");
    Ok(Created(load_view(&state, id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ClockOutRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// POST /api/timesheets/clock-out
pub async fn clock_out_post(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<ClockOutRequest>,
) -> ApiResult<Json<TimesheetView>> {
    let active = Timesheet::active_for_worker(&state.pool, caller.id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Not clocked in"))?;

    let now = Utc::now();
    let hours = financials::elapsed_hours(active.clock_in, now);

    sqlx::query(
        "UPDATE timesheets SET clock_out = $1, status = 'completed', hours = $2, clock_out_location = $3, \
         clock_out_latitude = $4, clock_out_longitude = $5, notes = COALESCE($6, notes) WHERE id = $7",
    )
    .bind(now)
    .bind(hours)
    .bind(optional_text(body.location))
    .bind(body.latitude)
    .bind(body.longitude)
    .bind(optional_text(body.notes))
    .bind(active.id)
    .execute(&state.pool)
    .await?;

    tracing::info!(timesheet_id = %active.id, worker_id = %caller.id, %hours, "clocked out");
    Ok(Json(load_view(&state, active.id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetUpdate {
    pub hours: Option<Decimal>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub ai_flags: Option<Vec<String>>,
}

/// PUT /api/timesheets/:id - owners, or workers allowed to approve timesheets
pub async fn timesheet_update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    JsonBody(body): JsonBody<TimesheetUpdate>,
) -> ApiResult<Json<TimesheetView>> {
    caller.require_permission(Permission::ApproveTimesheets)?;

    let hours = body.hours.map(shift_hours).transpose()?;
    let status = body
        .status
        .as_deref()
        .map(|raw| parse_choice::<TimesheetStatus>("status", raw))
        .transpose()?;

    let result = sqlx::query(
        "UPDATE timesheets SET hours = COALESCE($1, hours), status = COALESCE($2, status), \
         notes = COALESCE($3, notes), ai_flags = COALESCE($4, ai_flags) \
         WHERE id = $5 AND owner_id = $6",
    )
    .bind(hours)
    .bind(status.map(|s| s.as_str()))
    .bind(body.notes)
    .bind(body.ai_flags)
    .bind(id)
    .bind(caller.scope_owner_id())
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Timesheet not found"));
    }
    Ok(Json(load_view(&state, id).await?))
}

/// DELETE /api/timesheets/:id (owner)
pub async fn timesheet_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM timesheets WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Timesheet not found"));
    }
    Ok(message("Timesheet deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use geofence::Coordinates;

    fn job(site: Option<(f64, f64)>, geofence_enabled: bool) -> Job {
        Job {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            job_name: "Garage".into(),
            client_name: "Patel".into(),
            address: None,
            location: None,
            latitude: site.map(|s| s.0),
            longitude: site.map(|s| s.1),
            geofence_enabled,
            geofence_radius: 100,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: None,
            status: "active".into(),
            notes: None,
            project_value: Decimal::new(5000, 0),
            amount_paid: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn distance_recorded_without_enforcement() {
        let site = job(Some((40.0, -74.0)), false);
        let far = Coordinates::new(40.01, -74.0);
        let loc = verify_clock_in_location(&site, Some(far)).unwrap();
        assert_eq!(loc.is_location_valid, Some(false));
        assert!(loc.distance_from_job_site.unwrap() > 1000.0);
    }

    #[test]
    fn enabled_geofence_rejects_outside_or_missing_position() {
        let site = job(Some((40.0, -74.0)), true);
        let far = Coordinates::new(40.01, -74.0);
        assert_eq!(verify_clock_in_location(&site, Some(far)).unwrap_err().status_code(), 400);
        assert_eq!(verify_clock_in_location(&site, None).unwrap_err().status_code(), 400);

        let near = Coordinates::new(40.0003, -74.0);
        assert_eq!(verify_clock_in_location(&site, Some(near)).unwrap().is_location_valid, Some(true));
    }

    #[test]
    fn job_without_coordinates_records_nothing() {
        let site = job(None, true);
        let loc = verify_clock_in_location(&site, Some(Coordinates::new(1.0, 1.0))).unwrap();
        assert_eq!(loc.distance_from_job_site, None);
        assert_eq!(loc.is_location_valid, None);
    }

    #[test]
    fn manual_hours_prefers_explicit_value() {
        let start = Utc::now();
        let end = start + Duration::minutes(90);
        assert_eq!(manual_hours(None, start, Some(end)).unwrap(), Some(Decimal::new(150, 2)));
        assert_eq!(manual_hours(Some(Decimal::new(8, 0)), start, Some(end)).unwrap(), Some(Decimal::new(8, 0)));
        assert_eq!(manual_hours(None, start, None).unwrap(), None);
        assert!(manual_hours(None, end, Some(start)).is_err());
        assert!(manual_hours(Some(Decimal::new(10_000, 0)), start, None).is_err());
    }
}
