//! guild-eventlog server entry point.
//!
//! Starts the Axum HTTP server, the dispatcher workers and the periodic
//! backfill reconciler.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use guild_eventlog::api::with_middleware;
use guild_eventlog::config::EventlogConfig;
use guild_eventlog::persistence::{EventStore, InMemoryEventStore, PostgresEventStore};
use guild_eventlog::runtime::EventlogRuntime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = EventlogConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, "starting guild-eventlog");

    // Build persistence layer
    let store: Arc<dyn EventStore> = if config.persistence_enabled {
        Arc::new(PostgresEventStore::connect(&config).await?)
    } else {
        tracing::warn!("persistence disabled, records are kept in memory");
        Arc::new(InMemoryEventStore::new())
    };

    // Build service layer
    let runtime = EventlogRuntime::build(&config, store);
    let reconciler = runtime.spawn_reconciler();
    let failures = runtime.spawn_failure_watch();

    // Build router
    let app = with_middleware(
        runtime.router(),
        Duration::from_secs(config.http_timeout_secs),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    runtime.shutdown().await;
    if let Err(e) = reconciler.await {
        tracing::error!(error = %e, "backfill reconciler aborted");
    }
    match failures.await {
        Ok(tally) => tracing::info!(failed = tally.total(), "eventlog stopped"),
        Err(e) => tracing::error!(error = %e, "failure watch aborted"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
