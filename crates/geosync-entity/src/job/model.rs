//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{JobStatus, JobType};

/// A unit of asynchronous work tracked by the orchestration core.
///
/// Records are created by the dispatcher, mutated by workers during
/// execution, and reconciled by the recovery handler on abnormal
/// termination. The core never deletes them; retention is an external
/// concern.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier.
    pub id: Uuid,
    /// Job type.
    pub job_type: JobType,
    /// Project this job operates on. `None` for synthetic ping jobs.
    pub project_id: Option<Uuid>,
    /// Current job status.
    pub status: JobStatus,
    /// Job-specific parameters (JSON).
    pub payload: serde_json::Value,
    /// Result payload on completion (e.g., an export manifest).
    pub output: Option<serde_json::Value>,
    /// Error message on failure.
    pub error_message: Option<String>,
    /// User who requested the job.
    pub created_by: Option<Uuid>,
    /// When a worker began executing the job.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    /// Job type.
    pub job_type: JobType,
    /// Project the job operates on, if any.
    pub project_id: Option<Uuid>,
    /// Job-specific parameters.
    pub payload: serde_json::Value,
    /// User who requested the job.
    pub created_by: Option<Uuid>,
}

impl CreateJob {
    /// Create parameters for a job with an empty payload.
    pub fn new(job_type: JobType, project_id: Option<Uuid>) -> Self {
        Self {
            job_type,
            project_id,
            payload: serde_json::Value::Null,
            created_by: None,
        }
    }
}
