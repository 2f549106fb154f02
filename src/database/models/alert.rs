use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    #[serde(rename = "ownerID")]
    pub owner_id: Uuid,
    #[serde(rename = "jobID")]
    pub job_id: Option<Uuid>,
    #[sqlx(default)]
    pub job_name: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "actionURL")]
    pub action_url: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
