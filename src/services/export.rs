//! CSV exports of jobs, receipts and timesheets.
//!
//! Every cell is quoted, nulls become empty quoted cells, dates render as
//! `YYYY-MM-DD` and an empty result set yields an empty document (no header).
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::types::Permission;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("csv encoding failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Jobs,
    Receipts,
    Timesheets,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Jobs => "jobs",
            ExportKind::Receipts => "receipts",
            ExportKind::Timesheets => "timesheets",
        }
    }

    pub fn filename(&self, on: NaiveDate) -> String {
        format!("{}-export-{}.csv", self.as_str(), on.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CsvExport {
    pub filename: String,
    pub data: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllExports {
    pub jobs: CsvExport,
    pub receipts: CsvExport,
    pub timesheets: CsvExport,
}

impl AllExports {
    pub fn total_records(&self) -> usize {
        self.jobs.count + self.receipts.count + self.timesheets.count
    }
}

/// Render rows as a fully quoted CSV document.
pub fn to_csv(headers: &[&str], rows: &[Vec<String>]) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Encoding(e.to_string()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| ExportError::Encoding(e.to_string()))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn day(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

fn timestamp_day(value: DateTime<Utc>) -> String {
    day(value.date_naive())
}

fn clock_time(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn finish(kind: ExportKind, headers: &[&str], rows: Vec<Vec<String>>) -> Result<CsvExport, ExportError> {
    Ok(CsvExport {
        filename: kind.filename(Utc::now().date_naive()),
        data: to_csv(headers, &rows)?,
        count: rows.len(),
    })
}

#[derive(Debug, FromRow)]
struct JobExportRow {
    id: Uuid,
    job_name: String,
    client_name: String,
    address: Option<String>,
    status: String,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    #[sqlx(default)]
    project_value: Option<Decimal>,
    #[sqlx(default)]
    amount_paid: Option<Decimal>,
    #[sqlx(default)]
    remaining_balance: Option<Decimal>,
    #[sqlx(default)]
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

pub async fn export_jobs(pool: &PgPool, user: &AuthUser) -> Result<CsvExport, ExportError> {
    if user.is_owner() {
        let rows = sqlx::query_as::<_, JobExportRow>(
            "SELECT j.id, j.job_name, j.client_name, j.address, j.status, j.start_date, j.end_date, \
                    j.project_value, j.amount_paid, (j.project_value - j.amount_paid) AS remaining_balance, \
                    j.notes, j.created_at \
             FROM jobs j WHERE j.owner_id = $1 ORDER BY j.created_at DESC",
        )
        .bind(user.id)
        .fetch_all(pool)
        .await?;

        let headers = [
            "Job ID", "Job Name", "Client Name", "Address", "Status", "Start Date", "End Date",
            "Project Value", "Amount Paid", "Remaining Balance", "Notes", "Created At",
        ];
        let rows = rows
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.job_name,
                    r.client_name,
                    cell(r.address),
                    r.status,
                    day(r.start_date),
                    cell(r.end_date.map(day)),
                    cell(r.project_value),
                    cell(r.amount_paid),
                    cell(r.remaining_balance),
                    cell(r.notes),
                    timestamp_day(r.created_at),
                ]
            })
            .collect();
        finish(ExportKind::Jobs, &headers, rows)
    } else {
        let rows = sqlx::query_as::<_, JobExportRow>(
            "SELECT j.id, j.job_name, j.client_name, j.address, j.status, j.start_date, j.end_date, j.created_at \
             FROM jobs j JOIN worker_job_assignments wja ON j.id = wja.job_id \
             WHERE wja.worker_id = $1 ORDER BY j.created_at DESC",
        )
        .bind(user.id)
        .fetch_all(pool)
        .await?;

        let headers = [
            "Job ID", "Job Name", "Client Name", "Address", "Status", "Start Date", "End Date", "Created At",
        ];
        let rows = rows
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.job_name,
                    r.client_name,
                    cell(r.address),
                    r.status,
                    day(r.start_date),
                    cell(r.end_date.map(day)),
                    timestamp_day(r.created_at),
                ]
            })
            .collect();
        finish(ExportKind::Jobs, &headers, rows)
    }
}

#[derive(Debug, FromRow)]
struct ReceiptExportRow {
    id: Uuid,
    job_name: Option<String>,
    vendor: String,
    amount: Decimal,
    receipt_date: NaiveDate,
    notes: Option<String>,
    image_url: Option<String>,
    ai_confidence: Option<f64>,
    created_at: DateTime<Utc>,
}

/// Owners export their receipts. Workers export their owner's receipts only
/// when they hold `canViewFinancials`; otherwise the export is empty.
pub async fn export_receipts(pool: &PgPool, user: &AuthUser) -> Result<CsvExport, ExportError> {
    let headers = [
        "Receipt ID", "Job Name", "Vendor", "Amount", "Date", "Notes", "Image URL", "AI Confidence", "Created At",
    ];

    if !user.has_permission(Permission::ViewFinancials) {
        return finish(ExportKind::Receipts, &headers, Vec::new());
    }

    let rows = sqlx::query_as::<_, ReceiptExportRow>(
        "SELECT r.id, j.job_name, r.vendor, r.amount, r.receipt_date, r.notes, r.image_url, \
                r.ai_confidence, r.created_at \
         FROM receipts r LEFT JOIN jobs j ON r.job_id = j.id \
         WHERE r.owner_id = $1 ORDER BY r.created_at DESC",
    )
    .bind(user.scope_owner_id())
    .fetch_all(pool)
    .await?;

    let rows = rows
        .into_iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                cell(r.job_name),
                r.vendor,
                r.amount.to_string(),
                day(r.receipt_date),
                cell(r.notes),
                cell(r.image_url),
                cell(r.ai_confidence),
                timestamp_day(r.created_at),
            ]
        })
        .collect();
    finish(ExportKind::Receipts, &headers, rows)
}

#[derive(Debug, FromRow)]
struct TimesheetExportRow {
    id: Uuid,
    #[sqlx(default)]
    worker_name: Option<String>,
    job_name: Option<String>,
    clock_in: DateTime<Utc>,
    clock_out: Option<DateTime<Utc>>,
    hours: Option<Decimal>,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

pub async fn export_timesheets(pool: &PgPool, user: &AuthUser) -> Result<CsvExport, ExportError> {
    let owner = user.is_owner();
    let sql = if owner {
        "SELECT t.id, u.name AS worker_name, j.job_name, t.clock_in, t.clock_out, t.hours, t.status, \
                t.notes, t.created_at \
         FROM timesheets t LEFT JOIN jobs j ON t.job_id = j.id LEFT JOIN users u ON t.worker_id = u.id \
         WHERE t.owner_id = $1 ORDER BY t.created_at DESC"
    } else {
        "SELECT t.id, j.job_name, t.clock_in, t.clock_out, t.hours, t.status, t.notes, t.created_at \
         FROM timesheets t LEFT JOIN jobs j ON t.job_id = j.id \
         WHERE t.worker_id = $1 ORDER BY t.created_at DESC"
    };

    let rows = sqlx::query_as::<_, TimesheetExportRow>(sql)
        .bind(user.id)
        .fetch_all(pool)
        .await?;

    let mut headers = vec!["Timesheet ID"];
    if owner {
        headers.push("Worker Name");
    }
    headers.extend(["Job Name", "Clock In", "Clock Out", "Hours", "Status", "Notes", "Created At"]);

    let rows = rows
        .into_iter()
        .map(|r| {
            let mut row = vec![r.id.to_string()];
            if owner {
                row.push(cell(r.worker_name));
            }
            row.extend([
                cell(r.job_name),
                clock_time(r.clock_in),
                cell(r.clock_out.map(clock_time)),
                cell(r.hours),
                r.status,
                cell(r.notes),
                timestamp_day(r.created_at),
            ]);
            row
        })
        .collect();
    finish(ExportKind::Timesheets, &headers, rows)
}

/// All three exports, queried concurrently.
pub async fn export_all(pool: &PgPool, user: &AuthUser) -> Result<AllExports, ExportError> {
    let (jobs, receipts, timesheets) = futures::try_join!(
        export_jobs(pool, user),
        export_receipts(pool, user),
        export_timesheets(pool, user),
    )?;
    Ok(AllExports {
        jobs,
        receipts,
        timesheets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_every_cell_and_escapes_quotes() {
        let rows = vec![
            vec!["1".to_string(), "Kitchen \"Reno\"".to_string(), String::new()],
            vec!["2".to_string(), "Deck, rear".to_string(), "note".to_string()],
        ];
        let csv = to_csv(&["ID", "Name", "Notes"], &rows).unwrap();
        assert_eq!(
            csv,
            "\"ID\",\"Name\",\"Notes\"\n\"1\",\"Kitchen \"\"Reno\"\"\",\"\"\n\"2\",\"Deck, rear\",\"note\""
        );
    }

    #[test]
    fn empty_rows_produce_empty_document() {
        assert_eq!(to_csv(&["ID"], &[]).unwrap(), "");
    }

    #[test]
    fn filenames_carry_kind_and_date() {
        let on = NaiveDate::from_ymd_opt(2024, 11, 5).unwrap();
        assert_eq!(ExportKind::Jobs.filename(on), "jobs-export-2024-11-05.csv");
        assert_eq!(ExportKind::Timesheets.filename(on), "timesheets-export-2024-11-05.csv");
    }

    #[test]
    fn cells_render_nulls_and_dates() {
        assert_eq!(cell::<String>(None), "");
        assert_eq!(cell(Some(Decimal::new(125050, 2))), "1250.50");
        let ts = DateTime::parse_from_rfc3339("2024-02-29T23:15:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(timestamp_day(ts), "2024-02-29");
        assert_eq!(clock_time(ts), "2024-02-29 23:15:00");
    }
}
