use axum::{extract::Extension, response::Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::user::is_valid_email;
use crate::error::ApiError;
use crate::handlers::required_text;
use crate::middleware::{ApiResult, AuthUser, JsonBody};

pub const SUPPORT_INBOX: &str = "siteledger@siteledger.ai";

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// `SUPPORT-<unix millis>-<first 8 chars of the user id>`
pub fn ticket_id(millis: i64, user_id: Uuid) -> String {
    let id = user_id.to_string();
    format!("SUPPORT-{}-{}", millis, &id[..8])
}

/// POST /api/support/contact
///
/// No mail transport is configured; the request is logged for the support
/// inbox and a ticket id is returned.
pub async fn contact_post(
    Extension(caller): Extension<AuthUser>,
    JsonBody(body): JsonBody<ContactRequest>,
) -> ApiResult<Json<Value>> {
    let name = required_text("name", body.name)?;
    let email = required_text("email", body.email)?;
    if !is_valid_email(&email) {
        return Err(ApiError::invalid_field("email", "Valid email is required"));
    }
    let subject = required_text("subject", body.subject)?;
    let message = required_text("message", body.message)?;

    let ticket = ticket_id(Utc::now().timestamp_millis(), caller.id);
    tracing::info!(
        ticket = %ticket,
        to = SUPPORT_INBOX,
        user_id = %caller.id,
        from_name = %name,
        from_email = %email,
        subject = %subject,
        message_len = message.len(),
        "support request received"
    );

    Ok(Json(json!({
        "message": "Support request submitted successfully",
        "ticketId": ticket,
        "estimatedResponseTime": "24 hours",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_id_uses_millis_and_short_user_id() {
        let user_id = Uuid::parse_str("3f2a9c1e-0000-4000-8000-000000000000").unwrap();
        assert_eq!(ticket_id(1_700_000_000_123, user_id), "SUPPORT-1700000000123-3f2a9c1e");
    }
}
