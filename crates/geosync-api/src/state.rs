//! Application state shared across all handlers.

use std::sync::Arc;

use geosync_core::config::AppConfig;
use geosync_database::store::{DeltaStore, JobStore};
use geosync_queue::Dispatcher;
use geosync_service::{DeltaApplyCoordinator, StatusAggregator};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Job record store.
    pub jobs: Arc<dyn JobStore>,
    /// Delta record store.
    pub deltas: Arc<dyn DeltaStore>,
    /// Job dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// Delta apply coordinator.
    pub coordinator: Arc<DeltaApplyCoordinator>,
    /// Status aggregator.
    pub status: Arc<StatusAggregator>,
}
