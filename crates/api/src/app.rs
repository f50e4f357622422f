use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{MeetingIntegration, PaymentGateway};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{
    events, health, payment_webhooks, promo_codes, reconciliation_alerts, registrations,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub meeting: Arc<dyn MeetingIntegration>,
}

pub fn create_app(
    config: Config,
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
    meeting: Arc<dyn MeetingIntegration>,
) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
        gateway,
        meeting,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api_routes = Router::new()
        // Event routes
        .route("/api/v1/events", post(events::create_event))
        .route("/api/v1/events", get(events::list_events))
        .route("/api/v1/events/:event_id", get(events::get_event))
        .route(
            "/api/v1/events/:event_id/publish",
            post(events::publish_event),
        )
        // Promo code routes
        .route(
            "/api/v1/events/:event_id/promo-codes",
            post(promo_codes::create_promo_code),
        )
        .route(
            "/api/v1/events/:event_id/promo-codes",
            get(promo_codes::list_promo_codes),
        )
        // Registration routes
        .route(
            "/api/v1/events/:event_id/registrations",
            post(registrations::admit),
        )
        .route(
            "/api/v1/registrations/:registration_id",
            get(registrations::get_registration),
        )
        .route(
            "/api/v1/registrations/:registration_id",
            delete(registrations::cancel_registration),
        )
        .route(
            "/api/v1/registrations/:registration_id/confirm-payment",
            post(registrations::confirm_payment),
        )
        // Webhook endpoint (authenticated by signature, not session)
        .route(
            "/api/v1/webhooks/payment",
            post(payment_webhooks::handle_payment_webhook),
        )
        // Operator routes
        .route(
            "/api/v1/admin/reconciliation-alerts",
            get(reconciliation_alerts::list_alerts),
        )
        .route(
            "/api/v1/admin/reconciliation-alerts/:alert_id/resolve",
            post(reconciliation_alerts::resolve_alert),
        );

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
