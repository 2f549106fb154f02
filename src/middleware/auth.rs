use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::auth;
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{Role, WorkerPermissions};

/// Authenticated user context, loaded fresh from the database on every request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub hourly_rate: Option<Decimal>,
    pub owner_id: Option<Uuid>,
    pub permissions: WorkerPermissions,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role(),
            hourly_rate: user.hourly_rate,
            owner_id: user.owner_id,
            permissions: user.permissions(),
        }
    }
}

/// JWT authentication middleware that validates tokens and attaches the caller's user row
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_jwt_from_headers(&headers).map_err(|msg| ApiError::unauthorized(msg).into_response())?;

    let claims = auth::decode_jwt(&token).map_err(|e| ApiError::from(e).into_response())?;

    let user = User::find_by_id(&state.pool, claims.user_id)
        .await
        .map_err(|e| ApiError::from(e).into_response())?
        .ok_or_else(|| ApiError::unauthorized("User not found").into_response())?;

    if !user.active {
        tracing::warn!(user_id = %user.id, "rejected request from disabled account");
        return Err(ApiError::unauthorized("Account is disabled").into_response());
    }

    request.extensions_mut().insert(AuthUser::from(&user));

    Ok(next.run(request).await)
}

/// Bearer token from the `Authorization` header, if any.
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("No token provided")?;

    let auth_str = auth_header.to_str().map_err(|_| "Invalid token")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err("No token provided"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_or_malformed_header_is_rejected() {
        let headers = HeaderMap::new();
        assert_eq!(extract_jwt_from_headers(&headers), Err("No token provided"));

        let mut basic = HeaderMap::new();
        basic.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_jwt_from_headers(&basic), Err("No token provided"));

        let mut empty = HeaderMap::new();
        empty.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_jwt_from_headers(&empty), Err("No token provided"));
    }
}
