//! GeoSync Server — job orchestration core for collaborative geospatial
//! project storage and synchronization.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use geosync_core::config::AppConfig;
use geosync_core::error::AppError;
use geosync_core::traits::cache::CacheProvider;
use geosync_core::traits::queue::QueueBackend;
use geosync_core::traits::storage::StorageProvider;
use geosync_database::store::{DeltaStore, JobStore};

#[tokio::main]
async fn main() {
    let env = std::env::var("GEOSYNC_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting GeoSync v{}", env!("CARGO_PKG_VERSION"));

    // ── Database ─────────────────────────────────────────────────
    let db = geosync_database::connection::DatabasePool::connect(&config.database).await?;
    let jobs: Arc<dyn JobStore> = Arc::new(
        geosync_database::repositories::PgJobStore::new(db.pool().clone()),
    );
    let deltas: Arc<dyn DeltaStore> = Arc::new(
        geosync_database::repositories::PgDeltaStore::new(db.pool().clone()),
    );

    // ── Queue backend ────────────────────────────────────────────
    let queue: Arc<dyn QueueBackend> = Arc::new(geosync_queue::backend::PgQueueBackend::new(
        db.pool().clone(),
    ));

    // ── Object storage ───────────────────────────────────────────
    let storage = build_storage(&config).await?;
    tracing::info!(provider = storage.provider_type(), "Storage initialized");

    // ── Cache ────────────────────────────────────────────────────
    let cache: Arc<dyn CacheProvider> =
        Arc::new(geosync_cache::MemoryCacheProvider::new(&config.cache));

    // ── Dispatcher & services ────────────────────────────────────
    let dispatcher = Arc::new(geosync_queue::Dispatcher::new(
        Arc::clone(&jobs),
        Arc::clone(&queue),
    ));
    let coordinator = Arc::new(geosync_service::DeltaApplyCoordinator::new(
        Arc::clone(&jobs),
        Arc::clone(&deltas),
        Arc::clone(&dispatcher),
    ));
    let status = Arc::new(geosync_service::StatusAggregator::new(
        Arc::clone(&dispatcher),
        Arc::clone(&jobs),
        Arc::clone(&queue),
        Arc::clone(&storage),
        Arc::clone(&cache),
        config.status.clone(),
    ));

    // ── Shutdown channel ─────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Background worker ────────────────────────────────────────
    let worker_handle = if config.worker.enabled {
        let worker_id = format!("worker-{}", &uuid::Uuid::new_v4().to_string()[..8]);

        let mut table = geosync_worker::CapabilityTable::new();
        table.register(Arc::new(
            geosync_worker::capabilities::ExportCapability::new(
                Arc::clone(&storage),
                config.worker.capability_attempts,
            ),
        ));
        table.register(Arc::new(
            geosync_worker::capabilities::DeltaApplyCapability::new(
                Arc::clone(&deltas),
                Arc::clone(&storage),
                config.worker.capability_attempts,
            ),
        ));
        table.register(Arc::new(
            geosync_worker::capabilities::ProcessProjectFileCapability::new(
                Arc::clone(&storage),
                config.worker.capability_attempts,
            ),
        ));
        table.register(Arc::new(
            geosync_worker::capabilities::PingCapability::new(),
        ));

        let runner = Arc::new(geosync_worker::WorkerRunner::new(
            Arc::clone(&queue),
            Arc::clone(&jobs),
            Arc::new(table),
            config.worker.clone(),
            worker_id,
        ));

        let worker_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            runner.run(worker_cancel).await;
        });
        tracing::info!("Background worker started");
        Some(handle)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── HTTP server ──────────────────────────────────────────────
    let app_state = geosync_api::AppState {
        config: Arc::new(config.clone()),
        jobs,
        deltas,
        dispatcher,
        coordinator,
        status,
    };
    let app = geosync_api::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("GeoSync server listening on {addr}");

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Drain background tasks ───────────────────────────────────
    if let Some(handle) = worker_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(30), handle).await;
    }
    db.close().await;

    tracing::info!("GeoSync server shut down gracefully");
    Ok(())
}

/// Build the configured storage provider.
async fn build_storage(config: &AppConfig) -> Result<Arc<dyn StorageProvider>, AppError> {
    match config.storage.provider.as_str() {
        "local" => Ok(Arc::new(
            geosync_storage::LocalStorageProvider::new(config.storage.root.clone()).await?,
        )),
        #[cfg(feature = "s3")]
        "s3" => Ok(Arc::new(
            geosync_storage::S3StorageProvider::new(&config.storage).await?,
        )),
        other => Err(AppError::configuration(format!(
            "Unknown storage provider '{other}'"
        ))),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
