//! Questline API server entry point.

use std::sync::Arc;

use questline_api::config::Config;
use questline_api::error::AppError;
use questline_api::routes;
use questline_api::state::AppState;
use questline_api::telemetry;
use questline_core::clock::SystemClock;
use questline_store::pg::PgStore;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    info!(
        otlp = telemetry.exports_spans(),
        max_concurrent_units = config.max_concurrent_units.get(),
        "starting Questline API server"
    );

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    let store = PgStore::new(pool, config.store_config());
    store.migrate().await?;

    let shutdown = CancellationToken::new();
    let app_state = AppState::new(
        Arc::new(store),
        Arc::new(SystemClock),
        config.operation_timeout,
    )
    .with_shutdown(shutdown.clone());

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.socket_addr()?;
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            info!("HTTP server received shutdown signal");
        })
        .await?;

    telemetry.shutdown();
    Ok(())
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not listen for ctrl-c");
        return;
    }
    shutdown.cancel();
}
