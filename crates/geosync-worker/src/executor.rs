//! Capability table — statically binds job types to their processing logic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use geosync_core::error::AppError;
use geosync_entity::job::{Job, JobType};

/// Trait for job capability implementations.
///
/// A capability is the actual processing logic invoked by a worker for a
/// given job type. Side effects must be durable before `execute`
/// returns: the runner only persists `Finished` after a normal return.
#[async_trait]
pub trait Capability: Send + Sync + std::fmt::Debug {
    /// The job type this capability processes.
    fn job_type(&self) -> JobType;

    /// Execute the capability for the given job.
    async fn execute(&self, job: &Job) -> Result<Option<Value>, CapabilityError>;
}

/// Error from capability execution.
///
/// Contained entirely within the worker: the runner converts any variant
/// into a terminal `Failed` job status via the recovery handler. The
/// transient/permanent split exists for logging and for the bounded
/// retry helper inside capabilities; the core never auto-retries a job.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// Permanent failure (bad input, missing data). Retrying cannot help.
    #[error("Permanent capability failure: {0}")]
    Permanent(String),

    /// Transient failure (e.g., storage briefly unavailable) that
    /// exhausted its bounded in-capability retries.
    #[error("Transient capability failure: {0}")]
    Transient(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Dispatches jobs to the capability registered for their type.
///
/// The mapping is built explicitly at startup; there is no dynamic
/// discovery. A job type without a registered capability is a permanent
/// failure.
#[derive(Debug, Default)]
pub struct CapabilityTable {
    capabilities: HashMap<JobType, Arc<dyn Capability>>,
}

impl CapabilityTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability for its job type.
    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        let job_type = capability.job_type();
        tracing::info!(%job_type, "Registered capability");
        self.capabilities.insert(job_type, capability);
    }

    /// Execute a job by dispatching to its capability.
    pub async fn execute(&self, job: &Job) -> Result<Option<Value>, CapabilityError> {
        let capability = self.capabilities.get(&job.job_type).ok_or_else(|| {
            CapabilityError::Permanent(format!(
                "No capability registered for job type '{}'",
                job.job_type
            ))
        })?;

        capability.execute(job).await
    }

    /// Check whether a capability is registered for a job type.
    pub fn has(&self, job_type: JobType) -> bool {
        self.capabilities.contains_key(&job_type)
    }

    /// Return the registered job types.
    pub fn registered_types(&self) -> Vec<JobType> {
        self.capabilities.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use geosync_entity::job::JobStatus;

    #[derive(Debug)]
    struct EchoCapability;

    #[async_trait]
    impl Capability for EchoCapability {
        fn job_type(&self) -> JobType {
            JobType::Ping
        }

        async fn execute(&self, job: &Job) -> Result<Option<Value>, CapabilityError> {
            Ok(Some(json!({"echo": job.payload})))
        }
    }

    fn ping_job() -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            job_type: JobType::Ping,
            project_id: None,
            status: JobStatus::Started,
            payload: json!({"n": 1}),
            output: None,
            error_message: None,
            created_by: None,
            started_at: Some(now),
            finished_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_dispatch_to_registered_capability() {
        let mut table = CapabilityTable::new();
        table.register(Arc::new(EchoCapability));
        assert!(table.has(JobType::Ping));

        let output = table.execute(&ping_job()).await.unwrap().unwrap();
        assert_eq!(output["echo"]["n"], 1);
    }

    #[tokio::test]
    async fn test_unregistered_type_is_permanent_failure() {
        let table = CapabilityTable::new();
        let err = table.execute(&ping_job()).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Permanent(_)));
    }
}
