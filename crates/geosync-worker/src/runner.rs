//! Worker runner — claims queue entries and executes capabilities.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{Semaphore, watch};
use tokio::time;
use tracing;

use geosync_core::config::worker::WorkerConfig;
use geosync_core::traits::queue::{QueueBackend, QueueEntry};
use geosync_database::store::JobStore;

use crate::executor::CapabilityTable;
use crate::recovery::RecoveryHandler;

/// Main worker loop: polls the configured queues in priority order and
/// executes claimed jobs with semaphore-bounded concurrency.
///
/// Multiple runner processes may share the same queues (competing
/// consumers); the queue backend's claim semantics prevent double
/// delivery, and the store's guarded transitions prevent double
/// execution of the same record.
#[derive(Debug)]
pub struct WorkerRunner {
    queue: Arc<dyn QueueBackend>,
    jobs: Arc<dyn JobStore>,
    executor: Arc<CapabilityTable>,
    recovery: RecoveryHandler,
    config: WorkerConfig,
    worker_id: String,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(
        queue: Arc<dyn QueueBackend>,
        jobs: Arc<dyn JobStore>,
        executor: Arc<CapabilityTable>,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        let recovery = RecoveryHandler::new(Arc::clone(&jobs));
        Self {
            queue,
            jobs,
            executor,
            recovery,
            config,
            worker_id,
        }
    }

    /// Run until the cancel signal flips to `true`, then drain in-flight
    /// jobs with a bounded wait.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            worker = %self.worker_id,
            concurrency = self.config.concurrency,
            poll_interval_ms = self.config.poll_interval_ms,
            queues = ?self.config.queues,
            "Worker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            if *cancel.borrow() {
                break;
            }

            // Keep draining while entries are available; sleep only when idle.
            if self.poll_and_execute(&semaphore).await {
                continue;
            }

            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!(worker = %self.worker_id, "Worker received shutdown signal");
                        break;
                    }
                }
                _ = time::sleep(poll_interval) => {}
            }
        }

        tracing::info!(worker = %self.worker_id, "Waiting for in-flight jobs to complete");
        let max_permits = self.config.concurrency as u32;
        let _ = time::timeout(Duration::from_secs(30), semaphore.acquire_many(max_permits)).await;
        tracing::info!(worker = %self.worker_id, "Worker shut down");
    }

    /// Claim and execute one entry. Returns `true` when an entry was claimed.
    async fn poll_and_execute(&self, semaphore: &Arc<Semaphore>) -> bool {
        let permit = match Arc::clone(semaphore).try_acquire_owned() {
            Ok(p) => p,
            Err(_) => {
                tracing::trace!("All worker slots occupied");
                return false;
            }
        };

        let queues: Vec<&str> = self.config.queues.iter().map(String::as_str).collect();
        match self.queue.dequeue(&queues).await {
            Ok(Some(entry)) => {
                let jobs = Arc::clone(&self.jobs);
                let executor = Arc::clone(&self.executor);
                let recovery = self.recovery.clone();
                let worker_id = self.worker_id.clone();

                tokio::spawn(async move {
                    let _permit = permit;
                    execute_entry(entry, jobs, executor, recovery, &worker_id).await;
                });
                true
            }
            Ok(None) => {
                drop(permit);
                false
            }
            Err(e) => {
                drop(permit);
                tracing::error!(error = %e, "Failed to dequeue entry");
                false
            }
        }
    }
}

/// Execute one claimed entry: load the record, mark it started, run the
/// capability, and persist the terminal status.
async fn execute_entry(
    entry: QueueEntry,
    jobs: Arc<dyn JobStore>,
    executor: Arc<CapabilityTable>,
    recovery: RecoveryHandler,
    worker_id: &str,
) {
    let job = match jobs.find_by_id(entry.job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            tracing::warn!(job_id = %entry.job_id, "Queue entry references a missing job record");
            return;
        }
        Err(e) => {
            tracing::error!(job_id = %entry.job_id, error = %e, "Failed to load job record");
            return;
        }
    };

    match jobs.mark_started(job.id).await {
        Ok(true) => {}
        Ok(false) => {
            // Stopped by an operator or already claimed elsewhere.
            tracing::debug!(job_id = %job.id, status = %job.status, "Job not claimable, skipping");
            return;
        }
        Err(e) => {
            tracing::error!(job_id = %job.id, error = %e, "Failed to mark job started");
            return;
        }
    }

    tracing::info!(
        job_id = %job.id,
        job_type = %job.job_type,
        worker = worker_id,
        "Processing job"
    );

    match AssertUnwindSafe(executor.execute(&job)).catch_unwind().await {
        Ok(Ok(output)) => {
            // The finished write is the durability point. If it fails the
            // record stays `started`; the recovery handler only runs on
            // execution failure, so the stall is surfaced via logs.
            if let Err(e) = jobs.mark_finished(job.id, output).await {
                tracing::error!(job_id = %job.id, error = %e, "Failed to persist finished status");
            } else {
                tracing::info!(job_id = %job.id, "Job finished");
            }
        }
        Ok(Err(err)) => {
            recovery.reconcile(job.id, &err.to_string()).await;
        }
        Err(panic) => {
            let msg = panic_message(panic.as_ref());
            recovery
                .reconcile(job.id, &format!("capability panicked: {msg}"))
                .await;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
