use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    #[serde(rename = "ownerID")]
    pub owner_id: Uuid,
    #[serde(rename = "jobID")]
    pub job_id: Option<Uuid>,
    #[sqlx(default)]
    pub job_name: Option<String>,
    #[serde(rename = "fileURL")]
    pub file_url: String,
    pub file_type: String,
    pub title: String,
    pub notes: Option<String>,
    pub ai_processed: bool,
    pub ai_summary: Option<String>,
    pub ai_extracted_data: Option<Value>,
    pub ai_confidence: Option<f64>,
    pub ai_flags: Option<Vec<String>>,
    pub document_category: Option<String>,
    pub created_at: DateTime<Utc>,
}
