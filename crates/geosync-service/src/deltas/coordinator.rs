//! Admission control and deduplication for delta apply jobs.

use std::sync::Arc;

use tracing;
use uuid::Uuid;

use geosync_core::result::AppResult;
use geosync_database::store::{DeltaStore, JobStore};
use geosync_entity::job::{ApplyParams, CreateJob, Job, JobType};
use geosync_queue::Dispatcher;

/// Coordinates delta apply submissions per project.
///
/// The coordinator is pure admission control: at most one apply job per
/// project may be in flight (`Pending` or `Queued`), and a request with
/// nothing to apply creates no job. How deltas are reconciled against
/// the current state is entirely the worker capability's concern.
///
/// The in-flight check is check-then-act, not transactional: two
/// concurrent submissions can race through it. The window is a single
/// store read plus a cheap enqueue, and a duplicate apply job is
/// harmless (the second execution finds no pending deltas), so the race
/// is tolerated rather than locked away.
#[derive(Debug)]
pub struct DeltaApplyCoordinator {
    jobs: Arc<dyn JobStore>,
    deltas: Arc<dyn DeltaStore>,
    dispatcher: Arc<Dispatcher>,
}

impl DeltaApplyCoordinator {
    /// Create a coordinator over the given stores and dispatcher.
    pub fn new(
        jobs: Arc<dyn JobStore>,
        deltas: Arc<dyn DeltaStore>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            jobs,
            deltas,
            dispatcher,
        }
    }

    /// Submit an apply job for a project's pending deltas.
    ///
    /// Returns the existing in-flight job when one exists, `None` when
    /// there is nothing to apply (callers must treat this as "no work",
    /// not an error), and a freshly queued job otherwise.
    pub async fn apply_deltas(
        &self,
        project_id: Uuid,
        requested_by: Option<Uuid>,
        overwrite_conflicts: bool,
        delta_ids: Option<Vec<Uuid>>,
    ) -> AppResult<Option<Job>> {
        if let Some(existing) = self.jobs.find_active_apply_job(project_id).await? {
            tracing::debug!(
                job_id = %existing.id,
                %project_id,
                "Apply job already in flight, returning it"
            );
            return Ok(Some(existing));
        }

        let pending = self.deltas.find_pending_by_project(project_id).await?;
        let eligible = match &delta_ids {
            Some(ids) => pending.iter().filter(|d| ids.contains(&d.id)).count(),
            None => pending.len(),
        };
        if eligible == 0 {
            tracing::debug!(%project_id, "No pending deltas, nothing to apply");
            return Ok(None);
        }

        let params = ApplyParams {
            overwrite_conflicts,
            delta_ids,
        };
        let job = self
            .dispatcher
            .submit(CreateJob {
                job_type: JobType::DeltaApply,
                project_id: Some(project_id),
                payload: serde_json::to_value(&params)?,
                created_by: requested_by,
            })
            .await?;

        tracing::info!(job_id = %job.id, %project_id, eligible, "Apply job submitted");
        Ok(Some(job))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use geosync_database::memory::{MemoryDeltaStore, MemoryJobStore};
    use geosync_entity::delta::CreateDelta;
    use geosync_entity::job::JobStatus;
    use geosync_queue::backend::MemoryQueueBackend;

    struct Fixture {
        jobs: Arc<MemoryJobStore>,
        deltas: Arc<MemoryDeltaStore>,
        coordinator: DeltaApplyCoordinator,
    }

    fn fixture() -> Fixture {
        let jobs = Arc::new(MemoryJobStore::new());
        let deltas = Arc::new(MemoryDeltaStore::new());
        let queue = Arc::new(MemoryQueueBackend::new());
        let dispatcher = Arc::new(Dispatcher::new(jobs.clone(), queue));
        let coordinator = DeltaApplyCoordinator::new(jobs.clone(), deltas.clone(), dispatcher);
        Fixture {
            jobs,
            deltas,
            coordinator,
        }
    }

    async fn seed_delta(fx: &Fixture, project_id: Uuid) {
        fx.deltas
            .create(&CreateDelta {
                project_id,
                content: json!([{"feature_id": "road-1", "base_version": 1, "attributes": {}}]),
                created_by: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_pending_deltas_is_a_noop() {
        let fx = fixture();
        let project_id = Uuid::new_v4();
        let result = fx
            .coordinator
            .apply_deltas(project_id, None, false, None)
            .await
            .unwrap();
        assert!(result.is_none());
        // No record was created either.
        assert!(fx.jobs.find_active_apply_job(project_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_creates_queued_apply_job() {
        let fx = fixture();
        let project_id = Uuid::new_v4();
        seed_delta(&fx, project_id).await;

        let job = fx
            .coordinator
            .apply_deltas(project_id, None, true, None)
            .await
            .unwrap()
            .expect("job should be created");
        assert_eq!(job.job_type, JobType::DeltaApply);
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.payload["overwrite_conflicts"], true);
    }

    #[tokio::test]
    async fn test_second_request_returns_same_job() {
        let fx = fixture();
        let project_id = Uuid::new_v4();
        seed_delta(&fx, project_id).await;

        let first = fx
            .coordinator
            .apply_deltas(project_id, None, false, None)
            .await
            .unwrap()
            .unwrap();
        let second = fx
            .coordinator
            .apply_deltas(project_id, None, false, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_empty_explicit_subset_is_a_noop() {
        let fx = fixture();
        let project_id = Uuid::new_v4();
        seed_delta(&fx, project_id).await;

        // The explicit subset does not intersect the pending set.
        let result = fx
            .coordinator
            .apply_deltas(project_id, None, false, Some(vec![Uuid::new_v4()]))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_other_projects_do_not_dedup() {
        let fx = fixture();
        let project_a = Uuid::new_v4();
        let project_b = Uuid::new_v4();
        seed_delta(&fx, project_a).await;
        seed_delta(&fx, project_b).await;

        let job_a = fx
            .coordinator
            .apply_deltas(project_a, None, false, None)
            .await
            .unwrap()
            .unwrap();
        let job_b = fx
            .coordinator
            .apply_deltas(project_b, None, false, None)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(job_a.id, job_b.id);
    }
}
