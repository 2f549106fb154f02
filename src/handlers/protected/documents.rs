use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{Document, Job};
use crate::error::ApiError;
use crate::handlers::{optional_text, parse_choice, protected::message, required_text};
use crate::middleware::{ApiPath, ApiResult, AuthUser, Created, JsonBody};
use crate::state::AppState;
use crate::types::FileType;

const DOCUMENT_SELECT: &str = "SELECT d.*, j.job_name FROM documents d LEFT JOIN jobs j ON d.job_id = j.id";

/// GET /api/documents
pub async fn documents_list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Document>>> {
    let docs = sqlx::query_as::<_, Document>(&format!(
        "{DOCUMENT_SELECT} WHERE d.owner_id = $1 ORDER BY d.created_at DESC"
    ))
    .bind(caller.id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(docs))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    #[serde(rename = "jobID")]
    pub job_id: Option<Uuid>,
    #[serde(rename = "fileURL")]
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub ai_processed: Option<bool>,
    pub ai_summary: Option<String>,
    pub ai_extracted_data: Option<Value>,
    pub ai_confidence: Option<f64>,
    pub ai_flags: Option<Vec<String>>,
    pub document_category: Option<String>,
}

/// POST /api/documents
pub async fn document_create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<DocumentPayload>,
) -> ApiResult<Created<Document>> {
    let file_url = required_text("fileURL", body.file_url)?;
    let title = required_text("title", body.title)?;
    let file_type: FileType = parse_choice("fileType", body.file_type.as_deref().unwrap_or_default())?;

    if let Some(job_id) = body.job_id {
        Job::find_owned(&state.pool, job_id, caller.id)
            .await?
            .ok_or_else(|| ApiError::not_found("Job not found"))?;
    }

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO documents (owner_id, job_id, file_url, file_type, title, notes, ai_processed, \
         ai_summary, ai_extracted_data, ai_confidence, ai_flags, document_category) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id",
    )
    .bind(caller.id)
    .bind(body.job_id)
    .bind(&file_url)
    .bind(file_type.as_str())
    .bind(&title)
    .bind(optional_text(body.notes))
    .bind(body.ai_processed.unwrap_or(false))
    .bind(optional_text(body.ai_summary))
    .bind(body.ai_extracted_data)
    .bind(body.ai_confidence)
    .bind(body.ai_flags)
    .bind(optional_text(body.document_category))
    .fetch_one(&state.pool)
    .await?;

    let doc = sqlx::query_as::<_, Document>(&format!("{DOCUMENT_SELECT} WHERE d.id = $1"))
        .bind(id)
        .fetch_one(&state.pool)
        .await?;
    Ok(Created(doc))
}

/// DELETE /api/documents/:id
pub async fn document_delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let result = sqlx::query("DELETE FROM documents WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(caller.id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Document not found"));
    }
    Ok(message("Document deleted"))
}
