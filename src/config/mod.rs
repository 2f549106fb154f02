use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Secret used when `JWT_SECRET` is unset outside production.
const DEVELOPMENT_JWT_SECRET: &str = "siteledger-development-secret-do-not-use-in-production";

/// Minimum secret length accepted in production.
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub enable_response_compression: bool,
    pub max_request_size_bytes: usize,
    pub notifications_page_size: i64,
    pub notifications_max_page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub reset_token_ttl_minutes: i64,
    /// Echo password reset codes in API responses (never in production).
    pub expose_reset_tokens: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set in production")]
    MissingJwtSecret,

    #[error("JWT_SECRET must be at least {MIN_PRODUCTION_SECRET_LEN} characters in production")]
    WeakJwtSecret,

    #[error("bcrypt cost {0} is outside the supported range 4..=31")]
    InvalidBcryptCost(u32),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")).as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Per-environment defaults; individual env vars are applied afterwards
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("SITELEDGER_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_ENABLE_RESPONSE_COMPRESSION") {
            self.api.enable_response_compression =
                v.parse().unwrap_or(self.api.enable_response_compression);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("CORS_ORIGIN") {
            self.security.cors_origins = parse_origins(&v);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("BCRYPT_COST").or_else(|_| env::var("BCRYPT_ROUNDS")) {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("RESET_TOKEN_TTL_MINUTES") {
            self.security.reset_token_ttl_minutes =
                v.parse().unwrap_or(self.security.reset_token_ttl_minutes);
        }

        self
    }

    /// Startup checks that cannot be expressed as defaults.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment == Environment::Production {
            if self.security.jwt_secret.is_empty() {
                return Err(ConfigError::MissingJwtSecret);
            }
            if self.security.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(ConfigError::WeakJwtSecret);
            }
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(self.security.bcrypt_cost));
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                enable_response_compression: false,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                notifications_page_size: 20,
                notifications_max_page_size: 100,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: Vec::new(), // empty means permissive
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7,
                bcrypt_cost: 10,
                reset_token_ttl_minutes: 60,
                expose_reset_tokens: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                enable_response_compression: true,
                max_request_size_bytes: 10 * 1024 * 1024,
                notifications_page_size: 20,
                notifications_max_page_size: 100,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: Vec::new(),
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7,
                bcrypt_cost: 10,
                reset_token_ttl_minutes: 60,
                expose_reset_tokens: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: false,
                enable_response_compression: true,
                max_request_size_bytes: 10 * 1024 * 1024,
                notifications_page_size: 20,
                notifications_max_page_size: 100,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: Vec::new(),
                jwt_secret: String::new(), // must come from JWT_SECRET
                jwt_expiry_hours: 24 * 7,
                bcrypt_cost: 12,
                reset_token_ttl_minutes: 60,
                expose_reset_tokens: false,
            },
        }
    }
}

/// Split a comma separated `CORS_ORIGIN` value, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

// Loaded on first access and shared for the life of the process
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Shorthand used by handlers and the CLI
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.security.bcrypt_cost, 10);
        assert!(config.security.expose_reset_tokens);
        assert!(!config.security.jwt_secret.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.security.bcrypt_cost, 12);
        assert!(!config.security.expose_reset_tokens);
        assert!(config.api.enable_response_compression);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn production_requires_long_secret() {
        let mut config = AppConfig::production();
        assert!(matches!(config.validate(), Err(ConfigError::MissingJwtSecret)));

        config.security.jwt_secret = "short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::WeakJwtSecret)));

        config.security.jwt_secret = "x".repeat(MIN_PRODUCTION_SECRET_LEN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_bcrypt_cost() {
        let mut config = AppConfig::development();
        config.security.bcrypt_cost = 2;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBcryptCost(2))));
    }

    #[test]
    fn parses_comma_separated_origins() {
        let origins = parse_origins("https://app.siteledger.ai, http://localhost:3001,,");
        assert_eq!(origins, vec!["https://app.siteledger.ai", "http://localhost:3001"]);
    }
}
