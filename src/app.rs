// app.rs - Router assembly
//
// public        - /, /health, /api/auth/{signup,login,forgot-password,reset-password}
// protected     - everything else under /api, behind jwt_auth_middleware
// owner-only    - route groups additionally wrapped in require_owner_middleware

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{self, AppConfig};
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, require_owner_middleware};
use crate::state::AppState;

/// Full application router with global middleware applied.
pub fn app(state: AppState) -> Router {
    let config = config::config();

    let protected_api = Router::new()
        .merge(account_routes())
        .nest("/api/jobs", job_routes())
        .nest("/api/receipts", receipt_routes())
        .nest("/api/timesheets", timesheet_routes())
        .nest("/api/documents", document_routes())
        .nest("/api/workers", worker_routes())
        .nest("/api/worker-payments", worker_payment_routes())
        .nest("/api/payments", legacy_payment_routes())
        .nest("/api/client-payments", client_payment_routes())
        .nest("/api/alerts", alert_routes())
        .nest("/api/ai-insights", insight_routes())
        .nest("/api/notifications", notification_routes())
        .nest("/api/preferences", preference_routes())
        .nest("/api/settings", settings_routes())
        .nest("/api/permissions", permission_routes())
        .nest("/api/support", support_routes())
        .nest("/api/export", export_routes())
        .nest("/api/config", config_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut router = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(public_auth_routes())
        .merge(protected_api)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.api.enable_response_compression {
        router = router.layer(CompressionLayer::new());
    }
    if config.security.enable_cors {
        router = router.layer(cors_layer(config));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

/// Explicit origins when configured, otherwise any origin.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

/// Wrap a route group so only owners reach the handlers.
fn owner_only(routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(middleware::from_fn(require_owner_middleware))
}

fn public_auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/signup", post(auth::signup_post))
        .route("/api/auth/login", post(auth::login_post))
        .route("/api/auth/forgot-password", post(auth::forgot_password_post))
        .route("/api/auth/reset-password", post(auth::reset_password_post))
}

fn account_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/me", get(auth::me_get))
        .route("/api/auth/profile", put(auth::profile_put))
        .route("/api/auth/change-password", post(auth::change_password_post))
        .route("/api/auth/change-email", post(auth::change_email_post))
        .route("/api/auth/account", delete(auth::account_delete))
        .route("/api/auth/reset-all-data", post(auth::reset_all_data_post))
        .route("/api/password/set", post(auth::set_password_post))
}

fn job_routes() -> Router<AppState> {
    use protected::jobs;

    let owner = owner_only(
        Router::new()
            .route("/", post(jobs::job_create))
            .route("/:id", put(jobs::job_update).delete(jobs::job_delete))
            .route("/:id/assign-worker", post(jobs::assign_worker_post))
            .route("/:id/unassign-worker/:worker_id", delete(jobs::unassign_worker_delete)),
    );

    Router::new()
        .route("/", get(jobs::jobs_list))
        .route("/:id", get(jobs::job_get))
        .merge(owner)
}

fn receipt_routes() -> Router<AppState> {
    use protected::receipts;

    Router::new()
        .route("/", get(receipts::receipts_list).post(receipts::receipt_create))
        .route("/job/:job_id", get(receipts::job_receipts_list))
        .route("/:id", put(receipts::receipt_update).delete(receipts::receipt_delete))
}

fn timesheet_routes() -> Router<AppState> {
    use protected::timesheets;

    let owner = owner_only(Router::new().route("/:id", delete(timesheets::timesheet_delete)));

    Router::new()
        .route("/", get(timesheets::timesheets_list).post(timesheets::timesheet_create))
        .route("/active", get(timesheets::active_get))
        .route("/clock-in", post(timesheets::clock_in_post))
        .route("/clock-out", post(timesheets::clock_out_post))
        .route("/job/:job_id", get(timesheets::job_timesheets_list))
        .route("/:id", put(timesheets::timesheet_update))
        .merge(owner)
}

fn document_routes() -> Router<AppState> {
    use protected::documents;

    Router::new()
        .route("/", get(documents::documents_list).post(documents::document_create))
        .route("/:id", delete(documents::document_delete))
}

fn worker_routes() -> Router<AppState> {
    use protected::workers;

    owner_only(
        Router::new()
            .route("/", get(workers::workers_list).post(workers::worker_create))
            .route("/:id", put(workers::worker_update).delete(workers::worker_delete))
            .route("/:id/assigned-jobs", get(workers::assigned_jobs_get))
            .route("/:id/reset-password", post(workers::worker_reset_password_post))
            .route("/:id/send-invite", post(workers::send_invite_post)),
    )
}

fn worker_payment_routes() -> Router<AppState> {
    use protected::worker_payments as payments;

    Router::new()
        .route("/", get(payments::payments_list).post(payments::payment_create))
        .route("/worker/:worker_id", get(payments::worker_payments_list))
        .route("/summary/:worker_id", get(payments::payroll_summary_get))
        .route(
            "/:id",
            get(payments::payment_get)
                .put(payments::payment_update)
                .delete(payments::payment_delete),
        )
}

/// `/api/payments` predates `/api/worker-payments` and exposes a subset.
fn legacy_payment_routes() -> Router<AppState> {
    use protected::worker_payments as payments;

    Router::new()
        .route("/", get(payments::payments_list).post(payments::payment_create))
        .route("/worker/:worker_id", get(payments::worker_payments_list))
        .route("/:id", delete(payments::payment_delete))
}

fn client_payment_routes() -> Router<AppState> {
    use protected::client_payments;

    owner_only(
        Router::new()
            .route("/", post(client_payments::client_payment_create))
            .route("/job/:job_id", get(client_payments::job_client_payments_list))
            .route("/:id", delete(client_payments::client_payment_delete)),
    )
}

fn alert_routes() -> Router<AppState> {
    use protected::alerts;

    Router::new()
        .route("/", get(alerts::alerts_list))
        .route("/unread-count", get(alerts::unread_count_get))
        .route("/read-all", put(alerts::read_all_put))
        .route("/:id/read", put(alerts::alert_read_put))
        .route("/:id", delete(alerts::alert_delete))
}

fn insight_routes() -> Router<AppState> {
    use protected::ai_insights as insights;

    let owner = owner_only(
        Router::new()
            .route("/", post(insights::insight_create))
            .route("/:id", delete(insights::insight_delete)),
    );

    Router::new()
        .route("/", get(insights::insights_list))
        .route("/:id", get(insights::insight_get))
        .merge(owner)
}

fn notification_routes() -> Router<AppState> {
    use protected::notifications;

    Router::new()
        .route("/", get(notifications::notifications_list))
        .route("/mark-all-read", put(notifications::mark_all_read_put))
        .route("/:id/read", put(notifications::notification_read_put))
        .route("/:id", delete(notifications::notification_delete))
}

fn preference_routes() -> Router<AppState> {
    use protected::preferences;

    Router::new()
        .route(
            "/ai-automation",
            get(preferences::ai_automation_get).put(preferences::ai_automation_put),
        )
        .route(
            "/notifications",
            get(preferences::notifications_get).put(preferences::notifications_put),
        )
        .route("/theme", get(preferences::theme_get).put(preferences::theme_put))
        .route(
            "/data-retention",
            get(preferences::data_retention_get).put(preferences::data_retention_put),
        )
        .route("/all", get(preferences::all_get))
}

fn settings_routes() -> Router<AppState> {
    use protected::settings;

    let owner = owner_only(
        Router::new()
            .route("/permissions", put(settings::permissions_put))
            .route("/ai", get(settings::ai_get).put(settings::ai_put)),
    );

    Router::new()
        .route("/permissions", get(settings::permissions_get))
        .merge(owner)
}

fn permission_routes() -> Router<AppState> {
    use protected::permissions;

    let owner = owner_only(
        Router::new()
            .route(
                "/worker/:worker_id",
                get(permissions::worker_permissions_get).put(permissions::worker_permissions_put),
            )
            .route("/workers", get(permissions::workers_permissions_list)),
    );

    Router::new()
        .route("/my-permissions", get(permissions::my_permissions_get))
        .merge(owner)
}

fn support_routes() -> Router<AppState> {
    Router::new().route("/contact", post(protected::support::contact_post))
}

fn export_routes() -> Router<AppState> {
    use protected::export;

    Router::new()
        .route("/jobs", get(export::jobs_csv_get))
        .route("/receipts", get(export::receipts_csv_get))
        .route("/timesheets", get(export::timesheets_csv_get))
        .route("/all", get(export::all_get))
        .route("/summary", get(export::summary_get))
}

fn config_routes() -> Router<AppState> {
    Router::new().route("/keys", get(protected::config::keys_get))
}
