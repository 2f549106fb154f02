use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: Uuid,
    #[serde(rename = "ownerID")]
    pub owner_id: Uuid,
    #[serde(rename = "jobID")]
    pub job_id: Option<Uuid>,
    /// Present when the query joins `jobs`.
    #[sqlx(default)]
    pub job_name: Option<String>,
    pub amount: Decimal,
    pub vendor: String,
    pub category: Option<String>,
    #[serde(rename = "date")]
    pub receipt_date: NaiveDate,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub ai_processed: bool,
    pub ai_confidence: Option<f64>,
    pub ai_flags: Option<Vec<String>>,
    pub ai_suggested_category: Option<String>,
    pub created_at: DateTime<Utc>,
}
