//! Store contracts for job and delta records.
//!
//! Every state transition goes through these traits. Implementations
//! guard each transition (SQL `WHERE status = …` / in-memory checks) so
//! that job status only moves forward and a `Finished` record is never
//! regressed.

use async_trait::async_trait;
use uuid::Uuid;

use geosync_core::result::AppResult;
use geosync_core::types::pagination::{PageRequest, PageResponse};
use geosync_entity::delta::{CreateDelta, Delta, DeltaStatus};
use geosync_entity::job::{CreateJob, Job, JobStatus};

/// Persistence contract for job records.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a new job in `Pending` status and return it.
    async fn create(&self, data: &CreateJob) -> AppResult<Job>;

    /// Find a job by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>>;

    /// List a project's jobs, newest first.
    async fn list_by_project(
        &self,
        project_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Job>>;

    /// Transition `Pending → Queued`. A no-op for any other status.
    async fn mark_queued(&self, id: Uuid) -> AppResult<()>;

    /// Transition `Queued → Started`. Returns `false` when the job was
    /// not claimable (already terminal or stopped by an operator).
    async fn mark_started(&self, id: Uuid) -> AppResult<bool>;

    /// Transition `Started → Finished`, attaching the output payload.
    /// Only ever applied once: a job that is not `Started` is left as-is.
    async fn mark_finished(&self, id: Uuid, output: Option<serde_json::Value>) -> AppResult<()>;

    /// Operator-initiated stop. Only `Pending` or `Queued` jobs can be
    /// stopped; returns `false` otherwise.
    async fn mark_stopped(&self, id: Uuid) -> AppResult<bool>;

    /// Compensating transition used by the recovery handler: force the
    /// job to `Failed` unless it already reached `Finished`, and return
    /// the resulting status.
    ///
    /// Finished is only ever written after side effects are durable, so
    /// an already-finished record is left untouched.
    async fn fail_unless_finished(&self, id: Uuid, reason: &str) -> AppResult<JobStatus>;

    /// Find the in-flight (`Pending` or `Queued`) delta-apply job for a
    /// project, if one exists.
    async fn find_active_apply_job(&self, project_id: Uuid) -> AppResult<Option<Job>>;
}

/// Persistence contract for delta records.
#[async_trait]
pub trait DeltaStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a new delta in `Pending` status and return it.
    async fn create(&self, data: &CreateDelta) -> AppResult<Delta>;

    /// Find a delta by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Delta>>;

    /// List a project's deltas, newest first.
    async fn list_by_project(
        &self,
        project_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Delta>>;

    /// Return a project's `Pending` deltas in submission order.
    async fn find_pending_by_project(&self, project_id: Uuid) -> AppResult<Vec<Delta>>;

    /// Record the outcome of an apply attempt.
    async fn set_status(
        &self,
        id: Uuid,
        status: DeltaStatus,
        feedback: Option<serde_json::Value>,
    ) -> AppResult<()>;
}
