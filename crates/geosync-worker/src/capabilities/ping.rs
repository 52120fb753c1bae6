//! Synthetic round-trip capability used by the status aggregator.

use async_trait::async_trait;
use serde_json::{Value, json};

use geosync_entity::job::{Job, JobType};

use crate::executor::{Capability, CapabilityError};

/// No-op capability; its only purpose is to measure queue/worker
/// round-trip health through the same path real jobs take.
#[derive(Debug, Default)]
pub struct PingCapability;

impl PingCapability {
    /// Create a ping capability.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Capability for PingCapability {
    fn job_type(&self) -> JobType {
        JobType::Ping
    }

    async fn execute(&self, _job: &Job) -> Result<Option<Value>, CapabilityError> {
        Ok(Some(json!({"pong": true})))
    }
}
