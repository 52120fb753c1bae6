//! In-memory job store.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use geosync_core::error::AppError;
use geosync_core::result::AppResult;
use geosync_core::types::pagination::{PageRequest, PageResponse};
use geosync_entity::job::{CreateJob, Job, JobStatus, JobType};

use crate::store::JobStore;

/// Job store backed by a mutexed map.
///
/// Transition guards are the same as the PostgreSQL implementation's
/// `WHERE` clauses; the lock is never held across an await point.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
}

impl MemoryJobStore {
    /// Create an empty job store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, data: &CreateJob) -> AppResult<Job> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            job_type: data.job_type,
            project_id: data.project_id,
            status: JobStatus::Pending,
            payload: data.payload.clone(),
            output: None,
            error_message: None,
            created_by: data.created_by,
            started_at: None,
            finished_at: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs
            .lock()
            .expect("job store lock poisoned")
            .insert(job.id, job.clone());
        Ok(job)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>> {
        Ok(self
            .jobs
            .lock()
            .expect("job store lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn list_by_project(
        &self,
        project_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Job>> {
        let jobs = self.jobs.lock().expect("job store lock poisoned");
        let mut matching: Vec<Job> = jobs
            .values()
            .filter(|j| j.project_id == Some(project_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page, total))
    }

    async fn mark_queued(&self, id: Uuid) -> AppResult<()> {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))?;
        if job.status == JobStatus::Pending {
            job.status = JobStatus::Queued;
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_started(&self, id: Uuid) -> AppResult<bool> {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))?;
        if job.status != JobStatus::Queued {
            return Ok(false);
        }
        let now = Utc::now();
        job.status = JobStatus::Started;
        job.started_at = Some(now);
        job.updated_at = now;
        Ok(true)
    }

    async fn mark_finished(&self, id: Uuid, output: Option<serde_json::Value>) -> AppResult<()> {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))?;
        if job.status == JobStatus::Started {
            let now = Utc::now();
            job.status = JobStatus::Finished;
            job.output = output;
            job.finished_at = Some(now);
            job.updated_at = now;
        }
        Ok(())
    }

    async fn mark_stopped(&self, id: Uuid) -> AppResult<bool> {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))?;
        if !matches!(job.status, JobStatus::Pending | JobStatus::Queued) {
            return Ok(false);
        }
        let now = Utc::now();
        job.status = JobStatus::Stopped;
        job.finished_at = Some(now);
        job.updated_at = now;
        Ok(true)
    }

    async fn fail_unless_finished(&self, id: Uuid, reason: &str) -> AppResult<JobStatus> {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))?;
        if job.status == JobStatus::Finished {
            return Ok(JobStatus::Finished);
        }
        let now = Utc::now();
        job.status = JobStatus::Failed;
        job.error_message = Some(reason.to_string());
        job.finished_at = Some(now);
        job.updated_at = now;
        Ok(JobStatus::Failed)
    }

    async fn find_active_apply_job(&self, project_id: Uuid) -> AppResult<Option<Job>> {
        let jobs = self.jobs.lock().expect("job store lock poisoned");
        let mut candidates: Vec<&Job> = jobs
            .values()
            .filter(|j| {
                j.project_id == Some(project_id)
                    && j.job_type == JobType::DeltaApply
                    && matches!(j.status, JobStatus::Pending | JobStatus::Queued)
            })
            .collect();
        candidates.sort_by_key(|j| j.created_at);
        Ok(candidates.first().map(|j| (*j).clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export_job() -> CreateJob {
        CreateJob::new(JobType::Export, Some(Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_lifecycle_forward() {
        let store = MemoryJobStore::new();
        let job = store.create(&export_job()).await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        store.mark_queued(job.id).await.unwrap();
        assert!(store.mark_started(job.id).await.unwrap());
        store
            .mark_finished(job.id, Some(serde_json::json!({"ok": true})))
            .await
            .unwrap();

        let stored = store.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Finished);
        assert!(stored.output.is_some());
        assert!(stored.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_started_requires_queued() {
        let store = MemoryJobStore::new();
        let job = store.create(&export_job()).await.unwrap();
        // Still pending, not claimable.
        assert!(!store.mark_started(job.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_finished_never_regressed() {
        let store = MemoryJobStore::new();
        let job = store.create(&export_job()).await.unwrap();
        store.mark_queued(job.id).await.unwrap();
        store.mark_started(job.id).await.unwrap();
        store.mark_finished(job.id, None).await.unwrap();

        let status = store
            .fail_unless_finished(job.id, "worker crashed")
            .await
            .unwrap();
        assert_eq!(status, JobStatus::Finished);
        let stored = store.find_by_id(job.id).await.unwrap().unwrap();
        assert!(stored.error_message.is_none());
    }

    #[tokio::test]
    async fn test_stop_only_before_start() {
        let store = MemoryJobStore::new();
        let job = store.create(&export_job()).await.unwrap();
        store.mark_queued(job.id).await.unwrap();
        store.mark_started(job.id).await.unwrap();
        assert!(!store.mark_stopped(job.id).await.unwrap());

        let other = store.create(&export_job()).await.unwrap();
        assert!(store.mark_stopped(other.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_active_apply_job_ignores_terminal() {
        let store = MemoryJobStore::new();
        let project = Uuid::new_v4();
        let job = store
            .create(&CreateJob::new(JobType::DeltaApply, Some(project)))
            .await
            .unwrap();
        assert!(store.find_active_apply_job(project).await.unwrap().is_some());

        store.mark_queued(job.id).await.unwrap();
        store.mark_started(job.id).await.unwrap();
        store.mark_finished(job.id, None).await.unwrap();
        assert!(store.find_active_apply_job(project).await.unwrap().is_none());
    }
}
