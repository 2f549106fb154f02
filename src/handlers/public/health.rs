use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "SiteLedger API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/health",
            "auth": "/api/auth",
            "jobs": "/api/jobs",
            "receipts": "/api/receipts",
            "timesheets": "/api/timesheets",
            "documents": "/api/documents",
            "workers": "/api/workers",
            "payments": "/api/worker-payments",
            "clientPayments": "/api/client-payments",
            "alerts": "/api/alerts",
            "insights": "/api/ai-insights",
            "notifications": "/api/notifications",
            "preferences": "/api/preferences",
            "settings": "/api/settings",
            "permissions": "/api/permissions",
            "support": "/api/support",
            "export": "/api/export"
        }
    }))
}

/// GET /health - liveness plus a database ping; 503 when the database is unreachable
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();
    let version = env!("CARGO_PKG_VERSION");

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "version": version,
                "database": "connected"
            })),
        ),
        Err(e) => {
            tracing::warn!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "version": version,
                    "database": "unavailable"
                })),
            )
        }
    }
}
