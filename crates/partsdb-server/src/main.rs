mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use partsdb_store::{BrowserRefresher, JsonFileSnapshotStore, ServingCache, SystemClock};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = partsdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let shutdown = CancellationToken::new();
    let refresher = BrowserRefresher::new(
        config.scraper.clone(),
        config.chromium_path.clone(),
        shutdown.clone(),
    );
    let snapshots = JsonFileSnapshotStore::new(config.snapshot_path.clone());
    let cache = Arc::new(ServingCache::new(
        Arc::new(refresher),
        Arc::new(snapshots),
        Arc::new(SystemClock),
        config.cache_ttl(),
    ));
    cache.warm_from_disk().await;

    let _scheduler =
        scheduler::build_scheduler(config.refresh_cron.as_deref(), Arc::clone(&cache)).await?;

    let app = build_app(AppState { cache });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "partsdb-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM and cancels any scrape still in flight.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
    shutdown.cancel();
}
