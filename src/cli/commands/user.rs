use anyhow::{anyhow, Context};
use chrono::Duration;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::database::models::User;
use crate::database::DatabaseManager;

async fn connect() -> anyhow::Result<PgPool> {
    let pool = DatabaseManager::create_pool(&config::config().database)?;
    DatabaseManager::health_check(&pool)
        .await
        .context("database is not reachable")?;
    Ok(pool)
}

pub async fn migrate(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;
    DatabaseManager::migrate(&pool).await?;
    DatabaseManager::close(&pool).await;
    output_success(&output_format, "Migrations applied", None)
}

/// Mint a token without a login round trip; handy for manual API testing.
pub async fn token(user_id: Uuid, hours: Option<i64>, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;
    let user = User::find_by_id(&pool, user_id)
        .await?
        .ok_or_else(|| anyhow!("no user with id {user_id}"))?;

    let claims = match hours {
        Some(h) if h > 0 => Claims::with_expiry(user.id, Duration::hours(h)),
        Some(h) => return Err(anyhow!("--hours must be positive, got {h}")),
        None => Claims::new(user.id),
    };
    let token = auth::generate_jwt(&claims)?;

    match output_format {
        OutputFormat::Text => println!("{token}"),
        OutputFormat::Json => output_success(
            &output_format,
            "Token issued",
            Some(json!({ "userId": user.id, "email": user.email, "role": user.role(), "accessToken": token })),
        )?,
    }
    Ok(())
}

pub async fn reset_password(email: &str, password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    auth::validate_password_strength(password).map_err(|e| anyhow!(e))?;

    let pool = connect().await?;
    let user = User::find_by_email(&pool, email)
        .await?
        .ok_or_else(|| anyhow!("no account for {email}"))?;

    let hash = auth::hash_password(password).await?;
    User::set_password_hash(&pool, user.id, &hash).await?;
    tracing::info!(user_id = %user.id, "password reset from admin cli");

    output_success(
        &output_format,
        &format!("Password updated for {}", user.email),
        Some(json!({ "userId": user.id })),
    )
}
