//! PostgreSQL delta store implementation.

use sqlx::PgPool;
use uuid::Uuid;

use geosync_core::error::{AppError, ErrorKind};
use geosync_core::result::AppResult;
use geosync_core::types::pagination::{PageRequest, PageResponse};
use geosync_entity::delta::{CreateDelta, Delta, DeltaStatus};

use crate::store::DeltaStore;

/// Delta store backed by the `deltas` table.
#[derive(Debug, Clone)]
pub struct PgDeltaStore {
    pool: PgPool,
}

impl PgDeltaStore {
    /// Create a new delta store on the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DeltaStore for PgDeltaStore {
    async fn create(&self, data: &CreateDelta) -> AppResult<Delta> {
        sqlx::query_as::<_, Delta>(
            "INSERT INTO deltas (id, project_id, content, last_status, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.project_id)
        .bind(&data.content)
        .bind(DeltaStatus::Pending)
        .bind(data.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create delta", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Delta>> {
        sqlx::query_as::<_, Delta>("SELECT * FROM deltas WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find delta", e))
    }

    async fn list_by_project(
        &self,
        project_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Delta>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deltas WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count deltas", e))?;

        let deltas = sqlx::query_as::<_, Delta>(
            "SELECT * FROM deltas WHERE project_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(project_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list deltas", e))?;

        Ok(PageResponse::new(deltas, page, total as u64))
    }

    async fn find_pending_by_project(&self, project_id: Uuid) -> AppResult<Vec<Delta>> {
        sqlx::query_as::<_, Delta>(
            "SELECT * FROM deltas WHERE project_id = $1 AND last_status = $2 ORDER BY created_at ASC",
        )
        .bind(project_id)
        .bind(DeltaStatus::Pending)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find pending deltas", e)
        })
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: DeltaStatus,
        feedback: Option<serde_json::Value>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE deltas SET last_status = $2, feedback = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(feedback)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update delta status", e)
        })?;
        Ok(())
    }
}
