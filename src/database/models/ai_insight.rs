use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored insight record. Generation happens outside this service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AiInsight {
    pub id: Uuid,
    #[serde(rename = "ownerID")]
    pub owner_id: Uuid,
    #[serde(rename = "jobID")]
    pub job_id: Option<Uuid>,
    #[sqlx(default)]
    pub job_name: Option<String>,
    pub category: String,
    pub severity: String,
    pub insight: String,
    pub actionable: bool,
    pub created_at: DateTime<Utc>,
}
