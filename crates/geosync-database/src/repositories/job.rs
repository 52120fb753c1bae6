//! PostgreSQL job store implementation.
//!
//! All transitions are guarded in the `UPDATE` statements themselves
//! (`WHERE status = …`), so concurrent writers cannot move a job
//! backwards regardless of interleaving.

use sqlx::PgPool;
use uuid::Uuid;

use geosync_core::error::{AppError, ErrorKind};
use geosync_core::result::AppResult;
use geosync_core::types::pagination::{PageRequest, PageResponse};
use geosync_entity::job::{CreateJob, Job, JobStatus, JobType};

use crate::store::JobStore;

/// Job store backed by the `jobs` table.
#[derive(Debug, Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    /// Create a new job store on the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, data: &CreateJob) -> AppResult<Job> {
        sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (id, job_type, project_id, status, payload, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.job_type)
        .bind(data.project_id)
        .bind(JobStatus::Pending)
        .bind(&data.payload)
        .bind(data.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create job", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))
    }

    async fn list_by_project(
        &self,
        project_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Job>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count jobs", e))?;

        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE project_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(project_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list jobs", e))?;

        Ok(PageResponse::new(jobs, page, total as u64))
    }

    async fn mark_queued(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE jobs SET status = $2, updated_at = NOW() WHERE id = $1 AND status = $3")
            .bind(id)
            .bind(JobStatus::Queued)
            .bind(JobStatus::Pending)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to mark job queued", e)
            })?;
        Ok(())
    }

    async fn mark_started(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET status = $2, started_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(JobStatus::Started)
        .bind(JobStatus::Queued)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark job started", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_finished(&self, id: Uuid, output: Option<serde_json::Value>) -> AppResult<()> {
        sqlx::query(
            "UPDATE jobs SET status = $2, output = $3, finished_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(JobStatus::Finished)
        .bind(output)
        .bind(JobStatus::Started)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark job finished", e)
        })?;
        Ok(())
    }

    async fn mark_stopped(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET status = $2, finished_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status IN ($3, $4)",
        )
        .bind(id)
        .bind(JobStatus::Stopped)
        .bind(JobStatus::Pending)
        .bind(JobStatus::Queued)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to stop job", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn fail_unless_finished(&self, id: Uuid, reason: &str) -> AppResult<JobStatus> {
        // Best-effort reconciliation: a single guarded write on a fresh
        // connection, independent of whatever state the crashed worker's
        // connection was in.
        sqlx::query(
            "UPDATE jobs SET status = $2, error_message = $3, finished_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status <> $4",
        )
        .bind(id)
        .bind(JobStatus::Failed)
        .bind(reason)
        .bind(JobStatus::Finished)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reconcile job", e))?;

        let status: Option<JobStatus> = sqlx::query_scalar("SELECT status FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to re-read job status", e)
            })?;

        status.ok_or_else(|| AppError::not_found(format!("Job {id} not found")))
    }

    async fn find_active_apply_job(&self, project_id: Uuid) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE project_id = $1 AND job_type = $2 AND status IN ($3, $4) \
             ORDER BY created_at ASC LIMIT 1",
        )
        .bind(project_id)
        .bind(JobType::DeltaApply)
        .bind(JobStatus::Pending)
        .bind(JobStatus::Queued)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find active apply job", e)
        })
    }
}
