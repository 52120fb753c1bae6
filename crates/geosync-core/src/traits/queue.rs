//! Queue backend trait for routing job references to workers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::result::AppResult;

/// A reference to a persisted job, placed on a named queue.
///
/// The entry carries only the job id (the record itself lives in the job
/// store) plus the entry point resolved by the queue registry. The dedup
/// key guarantees at most one live entry per submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Queue this entry belongs to.
    pub queue: String,
    /// Identifier of the persisted job record.
    pub job_id: Uuid,
    /// Entry point identifier resolved by the registry.
    pub entry_point: String,
    /// Idempotency key for the queue backend (the job id).
    pub dedup_key: String,
    /// When the entry was enqueued.
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    /// Create an entry for a job, using the job id as the dedup key.
    pub fn new(queue: impl Into<String>, job_id: Uuid, entry_point: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            job_id,
            entry_point: entry_point.into(),
            dedup_key: job_id.to_string(),
            enqueued_at: Utc::now(),
        }
    }
}

/// Trait for queue backends (PostgreSQL-backed or in-memory).
///
/// Any at-least-once delivery queue with per-key dedup satisfies the
/// contract; FIFO ordering is guaranteed within a single queue only.
#[async_trait]
pub trait QueueBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Push an entry onto its queue.
    ///
    /// Returns `false` when an entry with the same dedup key is already
    /// queued (the push is silently dropped).
    async fn enqueue(&self, entry: QueueEntry) -> AppResult<bool>;

    /// Claim the next entry from the first non-empty queue in `queues`.
    ///
    /// Queues are tried in the given order, so callers encode priority by
    /// listing higher-priority queues first. A claimed entry is removed
    /// from the queue and will not be delivered to another consumer.
    async fn dequeue(&self, queues: &[&str]) -> AppResult<Option<QueueEntry>>;

    /// Check that the queue backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
