use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

pub mod password;

pub use password::{
    generate_reset_code, generate_temp_password, hash_password, hash_reset_code, validate_password_strength,
    verify_password,
};

/// Access token claims. Only the user id travels in the token; the role and
/// permissions are reloaded from the database on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid) -> Self {
        let expiry_hours = config::config().security.jwt_expiry_hours;
        Self::with_expiry(user_id, Duration::hours(expiry_hours as i64))
    }

    pub fn with_expiry(user_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    InvalidToken,

    #[error(transparent)]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Task(String),
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    generate_jwt_with_secret(claims, &config::config().security.jwt_secret)
}

pub fn generate_jwt_with_secret(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Issue an access token for a user with the configured lifetime.
pub fn issue_token(user_id: Uuid) -> Result<String, AuthError> {
    generate_jwt(&Claims::new(user_id))
}

pub fn decode_jwt(token: &str) -> Result<Claims, AuthError> {
    decode_jwt_with_secret(token, &config::config().security.jwt_secret)
}

pub fn decode_jwt_with_secret(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
}
