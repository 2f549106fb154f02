// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler here runs behind `jwt_auth_middleware` and receives the
// caller as `Extension<AuthUser>`. Owner-only route groups are additionally
// wrapped in `require_owner_middleware`; finer checks happen per handler.

pub mod ai_insights; // /api/ai-insights
pub mod alerts; // /api/alerts
pub mod auth; // /api/auth (account), /api/password
pub mod client_payments; // /api/client-payments
pub mod config; // /api/config
pub mod documents; // /api/documents
pub mod export; // /api/export
pub mod jobs; // /api/jobs
pub mod notifications; // /api/notifications
pub mod permissions; // /api/permissions
pub mod preferences; // /api/preferences
pub mod receipts; // /api/receipts
pub mod settings; // /api/settings
pub mod support; // /api/support
pub mod timesheets; // /api/timesheets
pub mod worker_payments; // /api/worker-payments, /api/payments
pub mod workers; // /api/workers

use serde_json::{json, Value};

/// `{ "message": ... }` acknowledgement body.
pub(crate) fn message(text: &str) -> axum::Json<Value> {
    axum::Json(json!({ "message": text }))
}
