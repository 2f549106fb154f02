use anyhow::Context;
use tokio::signal;

use siteledger::config;
use siteledger::database::DatabaseManager;
use siteledger::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    siteledger::init_tracing("info,tower_http=info,sqlx=warn");

    let config = config::config();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting SiteLedger API in {:?} mode", config.environment);

    let pool = DatabaseManager::create_pool(&config.database)?;
    if config.database.run_migrations {
        if let Err(e) = DatabaseManager::migrate(&pool).await {
            // Keep serving; /health reports the database as unavailable.
            tracing::error!("Migrations failed: {}", e);
        }
    }

    let app = siteledger::app(AppState::new(pool.clone()));

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("SiteLedger API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close(&pool).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
