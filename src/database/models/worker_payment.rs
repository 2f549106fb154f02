use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPayment {
    pub id: Uuid,
    #[serde(rename = "ownerID")]
    pub owner_id: Uuid,
    #[serde(rename = "workerID")]
    pub worker_id: Uuid,
    pub worker_name: Option<String>,
    #[sqlx(default)]
    pub worker_email: Option<String>,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub hours_worked: Decimal,
    pub hourly_rate: Decimal,
    pub calculated_earnings: Decimal,
    pub payment_method: String,
    pub notes: Option<String>,
    pub reference_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate totals for one worker's payment history.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTotals {
    pub total_payments: i64,
    pub total_paid: Decimal,
    pub total_hours: Decimal,
    #[serde(rename = "avgHourlyRate")]
    pub average_rate: Decimal,
    pub first_payment_date: Option<NaiveDate>,
    pub last_payment_date: Option<NaiveDate>,
}
