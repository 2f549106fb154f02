// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::services::export::ExportError;

/// Every failure a SiteLedger handler can return, with its HTTP status.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),
    InvalidInput {
        message: String,
        details: Value,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),
    InsufficientPermissions {
        required: String,
    },

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::InvalidInput { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::InsufficientPermissions { .. } => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::InvalidInput { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::InsufficientPermissions { .. } => "Insufficient permissions",
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, field_errors } => {
                let mut response = json!({
                    "error": message,
                    "code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }

                response
            }
            ApiError::InvalidInput { message, details } => {
                let mut response = json!({
                    "error": message,
                    "code": "INVALID_INPUT"
                });
                if let (Some(body), Some(extra)) = (response.as_object_mut(), details.as_object()) {
                    for (key, value) in extra {
                        body.insert(key.clone(), value.clone());
                    }
                }
                response
            }
            ApiError::InsufficientPermissions { required } => {
                json!({
                    "error": self.message(),
                    "code": self.error_code(),
                    "required": required,
                    "message": "You do not have permission to perform this action"
                })
            }
            _ => {
                json!({
                    "error": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::InvalidInput { .. } => "INVALID_INPUT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::InsufficientPermissions { .. } => "INSUFFICIENT_PERMISSIONS",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), reason.into());
        ApiError::validation_error("Validation failed", Some(field_errors))
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn invalid_input(message: impl Into<String>, details: Value) -> Self {
        ApiError::InvalidInput {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn insufficient_permissions(required: impl Into<String>) -> Self {
        ApiError::InsufficientPermissions {
            required: required.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Conversions from library errors
impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Sqlx(sqlx_err) => ApiError::from(sqlx_err),
            DatabaseError::Migration(migrate_err) => {
                tracing::error!("Migration error: {}", migrate_err);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            other => {
                tracing::error!("Database configuration error: {}", other);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("Not found"),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                tracing::error!("Database unavailable: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                tracing::warn!("Unique constraint violation: {}", db_err);
                ApiError::conflict("Resource already exists")
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                tracing::warn!("Foreign key violation: {}", db_err);
                ApiError::bad_request("Referenced record does not exist")
            }
            other => {
                // Full detail goes to the log; clients see a generic message
                tracing::error!("SQLx error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Sqlx(sqlx_err) => ApiError::from(sqlx_err),
            other => {
                tracing::error!("Export failed: {}", other);
                ApiError::internal_server_error("Failed to generate export")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => ApiError::unauthorized("Token expired"),
            AuthError::InvalidToken => ApiError::unauthorized("Invalid token"),
            other => {
                tracing::error!("Authentication subsystem error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

// std::error::Error
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Handlers return ApiError directly
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_uses_error_key() {
        let body = ApiError::not_found("Job not found").to_json();
        assert_eq!(body["error"], "Job not found");
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[test]
    fn insufficient_permissions_names_flag() {
        let err = ApiError::insufficient_permissions("canViewFinancials");
        assert_eq!(err.status_code(), 403);
        let body = err.to_json();
        assert_eq!(body["error"], "Insufficient permissions");
        assert_eq!(body["required"], "canViewFinancials");
    }

    #[test]
    fn invalid_input_merges_details() {
        let err = ApiError::invalid_input(
            "Invalid permission keys",
            json!({ "invalid": ["canFly"], "valid": ["canViewFinancials"] }),
        );
        let body = err.to_json();
        assert_eq!(err.status_code(), 400);
        assert_eq!(body["invalid"][0], "canFly");
        assert_eq!(body["error"], "Invalid permission keys");
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn token_errors_map_to_401() {
        let expired: ApiError = AuthError::TokenExpired.into();
        assert_eq!(expired.status_code(), 401);
        assert_eq!(expired.message(), "Token expired");
    }
}
