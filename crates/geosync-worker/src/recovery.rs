//! Recovery handler — reconciles crashed executions into a terminal status.

use std::sync::Arc;

use tracing;
use uuid::Uuid;

use geosync_database::store::JobStore;
use geosync_entity::job::JobStatus;

/// Best-effort reconciliation after an uncaught capability failure.
///
/// The handler re-reads the record through the store (a fresh
/// connection, independent of whatever state the crashed execution left
/// behind) and forces it to `Failed` unless it already reached
/// `Finished`. Finished is only ever written after side effects are
/// durable, so a finished record is left untouched.
///
/// Known sharp edge: a job whose side effects completed but whose
/// `Finished` write was lost will be reconciled to `Failed`. Such jobs
/// must be idempotently re-runnable or manually reconciled; the handler
/// cannot distinguish this case and only logs it.
#[derive(Debug, Clone)]
pub struct RecoveryHandler {
    jobs: Arc<dyn JobStore>,
}

impl RecoveryHandler {
    /// Create a recovery handler over the given store.
    pub fn new(jobs: Arc<dyn JobStore>) -> Self {
        Self { jobs }
    }

    /// Force the job to `Failed` unless it is already `Finished`.
    pub async fn reconcile(&self, job_id: Uuid, reason: &str) {
        match self.jobs.fail_unless_finished(job_id, reason).await {
            Ok(JobStatus::Finished) => {
                tracing::warn!(
                    %job_id,
                    reason,
                    "Execution crashed after the job reached finished; record left as-is"
                );
            }
            Ok(status) => {
                tracing::error!(%job_id, %status, reason, "Job execution failed");
            }
            Err(e) => {
                tracing::error!(%job_id, error = %e, "Failed to reconcile crashed job");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geosync_database::memory::MemoryJobStore;
    use geosync_entity::job::{CreateJob, JobType};

    async fn started_job(store: &Arc<MemoryJobStore>) -> Uuid {
        let job = store
            .create(&CreateJob::new(JobType::Export, Some(Uuid::new_v4())))
            .await
            .unwrap();
        store.mark_queued(job.id).await.unwrap();
        store.mark_started(job.id).await.unwrap();
        job.id
    }

    #[tokio::test]
    async fn test_crash_before_finished_forces_failed() {
        let store = Arc::new(MemoryJobStore::new());
        let job_id = started_job(&store).await;

        let recovery = RecoveryHandler::new(store.clone());
        recovery.reconcile(job_id, "worker killed").await;

        let job = store.find_by_id(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("worker killed"));
    }

    #[tokio::test]
    async fn test_crash_after_finished_is_noop() {
        let store = Arc::new(MemoryJobStore::new());
        let job_id = started_job(&store).await;
        store
            .mark_finished(job_id, Some(serde_json::json!({"done": true})))
            .await
            .unwrap();

        let recovery = RecoveryHandler::new(store.clone());
        recovery.reconcile(job_id, "worker killed").await;

        let job = store.find_by_id(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Finished);
        assert!(job.error_message.is_none());
        assert!(job.output.is_some());
    }
}
