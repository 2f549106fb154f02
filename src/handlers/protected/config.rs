use axum::response::Json;
use serde_json::{json, Value};

/// GET /api/config/keys - client-side provider configuration. Nothing secret
/// is served here; OCR and AI run without server-held keys.
pub async fn keys_get() -> Json<Value> {
    Json(json!({
        "aiProvider": "puter",
        "ocrProvider": "tesseract",
        "requiresApiKeys": false,
    }))
}
