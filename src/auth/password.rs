use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::AuthError;
use crate::config;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password with the configured bcrypt cost on the blocking pool.
pub async fn hash_password(plain: &str) -> Result<String, AuthError> {
    let plain = plain.to_string();
    let cost = config::config().security.bcrypt_cost;
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .map_err(|e| AuthError::Task(e.to_string()))?
        .map_err(AuthError::from)
}

pub async fn verify_password(plain: &str, hash: &str) -> Result<bool, AuthError> {
    let plain = plain.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
        .await
        .map_err(|e| AuthError::Task(e.to_string()))?
        .map_err(AuthError::from)
}

/// At least eight characters with an uppercase letter, a lowercase letter and a digit.
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a number");
    }
    Ok(())
}

/// Temporary password handed to newly invited workers.
pub fn generate_temp_password() -> String {
    let entropy = Uuid::new_v4().simple().to_string();
    format!("Sl{}7", &entropy[..10])
}

/// Short, human-typeable password reset code.
pub fn generate_reset_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

/// SHA-256 hex digest of a reset code, as stored in `users.reset_token_hash`.
pub fn hash_reset_code(code: &str) -> String {
    format!("{:x}", Sha256::digest(code.trim().to_uppercase().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_rules() {
        assert!(validate_password_strength("Sup3rSecret").is_ok());
        assert_eq!(
            validate_password_strength("Ab1"),
            Err("Password must be at least 8 characters")
        );
        assert!(validate_password_strength("alllowercase1").is_err());
        assert!(validate_password_strength("ALLUPPERCASE1").is_err());
        assert!(validate_password_strength("NoDigitsHere").is_err());
    }

    #[test]
    fn temp_passwords_pass_strength_rules() {
        for _ in 0..20 {
            let pw = generate_temp_password();
            assert!(validate_password_strength(&pw).is_ok(), "weak temp password {pw}");
        }
    }

    #[test]
    fn reset_code_hash_ignores_case_and_whitespace() {
        let code = generate_reset_code();
        assert_eq!(code.len(), 8);
        assert_eq!(hash_reset_code(&code), hash_reset_code(&format!(" {} ", code.to_lowercase())));
        assert_eq!(hash_reset_code(&code).len(), 64);
    }

    #[tokio::test]
    async fn hashes_and_verifies() {
        let hash = hash_password("Sup3rSecret").await.unwrap();
        assert!(verify_password("Sup3rSecret", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
    }
}
