//! PostgreSQL-backed queue.
//!
//! Entries live in the `queue_entries` table. `ON CONFLICT` on the dedup
//! key gives per-key idempotent enqueue; `FOR UPDATE SKIP LOCKED` claims
//! keep multiple worker processes from double-delivering an entry.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use geosync_core::error::{AppError, ErrorKind};
use geosync_core::result::AppResult;
use geosync_core::traits::queue::{QueueBackend, QueueEntry};

/// Queue backend on the shared PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgQueueBackend {
    pool: PgPool,
}

impl PgQueueBackend {
    /// Create a queue backend on the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl QueueBackend for PgQueueBackend {
    async fn enqueue(&self, entry: QueueEntry) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO queue_entries (queue, job_id, entry_point, dedup_key, enqueued_at) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (dedup_key) DO NOTHING",
        )
        .bind(&entry.queue)
        .bind(entry.job_id)
        .bind(&entry.entry_point)
        .bind(&entry.dedup_key)
        .bind(entry.enqueued_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Queue, "Failed to enqueue entry", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn dequeue(&self, queues: &[&str]) -> AppResult<Option<QueueEntry>> {
        // Queues are tried in priority order; FIFO within a queue only.
        for queue in queues {
            let row: Option<(String, Uuid, String, String, DateTime<Utc>)> = sqlx::query_as(
                "DELETE FROM queue_entries WHERE id = ( \
                    SELECT id FROM queue_entries WHERE queue = $1 \
                    ORDER BY id ASC \
                    FOR UPDATE SKIP LOCKED \
                    LIMIT 1 \
                 ) RETURNING queue, job_id, entry_point, dedup_key, enqueued_at",
            )
            .bind(queue)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Queue, "Failed to dequeue entry", e))?;

            if let Some((queue, job_id, entry_point, dedup_key, enqueued_at)) = row {
                return Ok(Some(QueueEntry {
                    queue,
                    job_id,
                    entry_point,
                    dedup_key,
                    enqueued_at,
                }));
            }
        }

        Ok(None)
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Queue, "Queue health check failed", e))
    }
}
