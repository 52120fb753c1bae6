//! Cached liveness probes over the orchestration core's collaborators.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing;

use geosync_core::config::status::StatusConfig;
use geosync_core::result::AppResult;
use geosync_core::traits::cache::CacheProvider;
use geosync_core::traits::queue::QueueBackend;
use geosync_core::traits::storage::StorageProvider;
use geosync_database::store::JobStore;
use geosync_entity::job::{CreateJob, JobStatus, JobType};
use geosync_queue::Dispatcher;

use super::snapshot::{ProbeResult, StatusSnapshot};

/// Cache key for the computed snapshot.
const STATUS_CACHE_KEY: &str = "status:snapshot";

/// Computes and caches a [`StatusSnapshot`].
///
/// On a cache miss this is a blocking, synchronous check by design: the
/// synthetic probe submits a real ping job through the dispatcher and
/// polls its status for up to `poll_interval_ms * max_polls`. The cache
/// TTL rate-limits the expense to at most one probe run per interval.
#[derive(Debug)]
pub struct StatusAggregator {
    dispatcher: Arc<Dispatcher>,
    jobs: Arc<dyn JobStore>,
    queue: Arc<dyn QueueBackend>,
    storage: Arc<dyn StorageProvider>,
    cache: Arc<dyn CacheProvider>,
    config: StatusConfig,
}

impl StatusAggregator {
    /// Create an aggregator over the given collaborators.
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        jobs: Arc<dyn JobStore>,
        queue: Arc<dyn QueueBackend>,
        storage: Arc<dyn StorageProvider>,
        cache: Arc<dyn CacheProvider>,
        config: StatusConfig,
    ) -> Self {
        Self {
            dispatcher,
            jobs,
            queue,
            storage,
            cache,
            config,
        }
    }

    /// Return the current snapshot, probing only on cache miss or expiry.
    pub async fn get_status(&self) -> AppResult<StatusSnapshot> {
        if let Some(raw) = self.cache.get(STATUS_CACHE_KEY).await? {
            match serde_json::from_str::<StatusSnapshot>(&raw) {
                Ok(snapshot) => {
                    tracing::debug!("Status snapshot served from cache");
                    return Ok(snapshot);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding corrupt cached snapshot");
                }
            }
        }

        let snapshot = self.probe_all().await;
        let raw = serde_json::to_string(&snapshot)?;
        self.cache
            .set(
                STATUS_CACHE_KEY,
                &raw,
                Duration::from_secs(self.config.cache_ttl_seconds),
            )
            .await?;
        Ok(snapshot)
    }

    async fn probe_all(&self) -> StatusSnapshot {
        let queue_backend = self.probe_queue().await;
        let object_storage = self.probe_storage().await;
        let synthetic_job = self.probe_synthetic().await;

        tracing::info!(
            ?queue_backend,
            ?object_storage,
            ?synthetic_job,
            "Status probes computed"
        );

        StatusSnapshot {
            queue_backend,
            object_storage,
            synthetic_job,
            computed_at: Utc::now(),
        }
    }

    async fn probe_queue(&self) -> ProbeResult {
        match self.queue.health_check().await {
            Ok(true) => ProbeResult::Ok,
            Ok(false) => ProbeResult::Error,
            Err(e) => {
                tracing::warn!(error = %e, "Queue backend probe failed");
                ProbeResult::Error
            }
        }
    }

    async fn probe_storage(&self) -> ProbeResult {
        match self.storage.health_check().await {
            Ok(true) => ProbeResult::Ok,
            Ok(false) => ProbeResult::Error,
            Err(e) => {
                tracing::warn!(error = %e, "Object storage probe failed");
                ProbeResult::Error
            }
        }
    }

    /// Submit a ping job through the production dispatcher/worker path
    /// and classify by how fast it comes back: finished within the first
    /// third of the poll budget is `Ok`, within the rest of the budget
    /// `Slow`, otherwise `Error`.
    async fn probe_synthetic(&self) -> ProbeResult {
        let job = match self
            .dispatcher
            .submit(CreateJob::new(JobType::Ping, None))
            .await
        {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to submit synthetic job");
                return ProbeResult::Error;
            }
        };

        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let ok_budget = self.config.max_polls / 3;

        for poll in 1..=self.config.max_polls {
            tokio::time::sleep(interval).await;
            match self.jobs.find_by_id(job.id).await {
                Ok(Some(current)) => match current.status {
                    JobStatus::Finished => {
                        return if poll <= ok_budget {
                            ProbeResult::Ok
                        } else {
                            ProbeResult::Slow
                        };
                    }
                    JobStatus::Failed | JobStatus::Stopped => {
                        tracing::warn!(job_id = %job.id, status = %current.status, "Synthetic job did not finish");
                        return ProbeResult::Error;
                    }
                    _ => {}
                },
                Ok(None) => {
                    tracing::warn!(job_id = %job.id, "Synthetic job record disappeared");
                    return ProbeResult::Error;
                }
                Err(e) => {
                    tracing::warn!(job_id = %job.id, error = %e, "Failed to poll synthetic job");
                    return ProbeResult::Error;
                }
            }
        }

        tracing::warn!(job_id = %job.id, "Synthetic job did not finish within the poll budget");
        ProbeResult::Error
    }
}
