//! Dispatcher — turns a domain request into a persisted, queued job.

use std::sync::Arc;

use tracing;

use geosync_core::result::AppResult;
use geosync_core::traits::queue::{QueueBackend, QueueEntry};
use geosync_database::store::JobStore;
use geosync_entity::job::{CreateJob, Job, JobStatus};

use crate::registry::QueueRegistry;

/// Translates a domain request into a job record plus one queue entry.
///
/// Persistence strictly precedes the enqueue: by the time a worker can
/// see the queue entry, the record already exists and is visible as
/// `Queued`. If persistence fails, nothing is enqueued. If the enqueue
/// itself fails, the error is surfaced to the caller and the queued
/// record is left in place for resubmission.
#[derive(Debug)]
pub struct Dispatcher {
    registry: QueueRegistry,
    jobs: Arc<dyn JobStore>,
    queue: Arc<dyn QueueBackend>,
}

impl Dispatcher {
    /// Create a dispatcher over the given store and queue backend.
    pub fn new(jobs: Arc<dyn JobStore>, queue: Arc<dyn QueueBackend>) -> Self {
        Self {
            registry: QueueRegistry::new(),
            jobs,
            queue,
        }
    }

    /// Persist and enqueue a job, returning the queued record.
    pub async fn submit(&self, data: CreateJob) -> AppResult<Job> {
        let route = self.registry.resolve(data.job_type);

        let mut job = self.jobs.create(&data).await?;
        self.jobs.mark_queued(job.id).await?;
        job.status = JobStatus::Queued;

        let entry = QueueEntry::new(route.queue, job.id, route.entry_point);
        self.queue.enqueue(entry).await?;

        tracing::debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            queue = route.queue,
            "Job submitted"
        );

        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geosync_database::memory::MemoryJobStore;
    use geosync_entity::job::JobType;
    use uuid::Uuid;

    use crate::backend::memory::MemoryQueueBackend;

    fn make_dispatcher() -> (Arc<MemoryJobStore>, Arc<MemoryQueueBackend>, Dispatcher) {
        let jobs = Arc::new(MemoryJobStore::new());
        let queue = Arc::new(MemoryQueueBackend::new());
        let dispatcher = Dispatcher::new(jobs.clone(), queue.clone());
        (jobs, queue, dispatcher)
    }

    #[tokio::test]
    async fn test_record_visible_before_queue_entry() {
        let (jobs, queue, dispatcher) = make_dispatcher();
        let job = dispatcher
            .submit(CreateJob::new(JobType::Export, Some(Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Queued);

        // The consumer-visible entry must resolve to a queued record.
        let entry = queue.dequeue(&["export"]).await.unwrap().unwrap();
        assert_eq!(entry.job_id, job.id);
        let stored = jobs.find_by_id(entry.job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_one_entry_per_job() {
        let (_jobs, queue, dispatcher) = make_dispatcher();
        dispatcher
            .submit(CreateJob::new(JobType::Ping, None))
            .await
            .unwrap();

        assert!(queue.dequeue(&["status"]).await.unwrap().is_some());
        assert!(queue.dequeue(&["status"]).await.unwrap().is_none());
    }
}
