use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use domain::services::{MeetingIntegration, PaymentGateway};
use eventra_api::services::{HttpMeetingClient, HttpPaymentGateway, NoopMeetingClient};
use eventra_api::{app, config, jobs, middleware};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::metrics::init_metrics();

    info!("Starting Eventra API v{}", env!("CARGO_PKG_VERSION"));

    let db_config = persistence::db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout_secs: config.database.connect_timeout_secs,
        idle_timeout_secs: config.database.idle_timeout_secs,
    };
    let pool = persistence::db::create_pool(&db_config).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let gateway: Arc<dyn PaymentGateway> = Arc::new(
        HttpPaymentGateway::new(config.gateway.clone())
            .map_err(|e| anyhow::anyhow!("Gateway client init failed: {}", e))?,
    );
    let meeting: Arc<dyn MeetingIntegration> = if config.meeting.enabled {
        Arc::new(
            HttpMeetingClient::new(config.meeting.clone())
                .map_err(|e| anyhow::anyhow!("Meeting client init failed: {}", e))?,
        )
    } else {
        Arc::new(NoopMeetingClient)
    };

    // Background jobs
    let mut scheduler = jobs::JobScheduler::new();
    scheduler.register(jobs::CounterRefreshJob::new(
        pool.clone(),
        config.jobs.counter_refresh_minutes,
    ));
    scheduler.register(jobs::MeetingSyncJob::new(
        pool.clone(),
        meeting.clone(),
        config.jobs.meeting_sync_batch_size,
        config.jobs.meeting_sync_max_attempts,
    ));
    scheduler.register(jobs::AlertMonitorJob::new(pool.clone()));
    scheduler.register(jobs::PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    let addr = config.socket_addr()?;
    let app = app::create_app(config, pool, gateway, meeting);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
