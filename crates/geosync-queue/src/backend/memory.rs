//! In-memory queue backend.
//!
//! FIFO per queue with the same dedup semantics as the PostgreSQL
//! backend. Used by the test suites and single-node development.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use geosync_core::result::AppResult;
use geosync_core::traits::queue::{QueueBackend, QueueEntry};

#[derive(Debug, Default)]
struct QueueState {
    queues: HashMap<String, VecDeque<QueueEntry>>,
    live_keys: HashSet<String>,
}

/// Queue backend backed by mutexed per-queue deques.
#[derive(Debug, Default)]
pub struct MemoryQueueBackend {
    state: Mutex<QueueState>,
}

impl MemoryQueueBackend {
    /// Create an empty queue backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl QueueBackend for MemoryQueueBackend {
    async fn enqueue(&self, entry: QueueEntry) -> AppResult<bool> {
        let mut state = self.state.lock().expect("queue lock poisoned");
        if !state.live_keys.insert(entry.dedup_key.clone()) {
            return Ok(false);
        }
        state
            .queues
            .entry(entry.queue.clone())
            .or_default()
            .push_back(entry);
        Ok(true)
    }

    async fn dequeue(&self, queues: &[&str]) -> AppResult<Option<QueueEntry>> {
        let mut state = self.state.lock().expect("queue lock poisoned");
        for queue in queues {
            if let Some(entry) = state.queues.get_mut(*queue).and_then(VecDeque::pop_front) {
                state.live_keys.remove(&entry.dedup_key);
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(queue: &str) -> QueueEntry {
        QueueEntry::new(queue, Uuid::new_v4(), "capability.export")
    }

    #[tokio::test]
    async fn test_fifo_within_queue() {
        let backend = MemoryQueueBackend::new();
        let first = entry("export");
        let second = entry("export");
        backend.enqueue(first.clone()).await.unwrap();
        backend.enqueue(second.clone()).await.unwrap();

        assert_eq!(
            backend.dequeue(&["export"]).await.unwrap().unwrap().job_id,
            first.job_id
        );
        assert_eq!(
            backend.dequeue(&["export"]).await.unwrap().unwrap().job_id,
            second.job_id
        );
    }

    #[tokio::test]
    async fn test_priority_order_across_queues() {
        let backend = MemoryQueueBackend::new();
        let low = entry("process");
        let high = entry("deltas");
        backend.enqueue(low.clone()).await.unwrap();
        backend.enqueue(high.clone()).await.unwrap();

        let claimed = backend
            .dequeue(&["deltas", "process"])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.job_id, high.job_id);
    }

    #[tokio::test]
    async fn test_dedup_key_drops_duplicate() {
        let backend = MemoryQueueBackend::new();
        let first = entry("export");
        assert!(backend.enqueue(first.clone()).await.unwrap());
        assert!(!backend.enqueue(first.clone()).await.unwrap());

        assert!(backend.dequeue(&["export"]).await.unwrap().is_some());
        assert!(backend.dequeue(&["export"]).await.unwrap().is_none());

        // Once claimed, the key can be reused.
        assert!(backend.enqueue(first).await.unwrap());
    }
}
