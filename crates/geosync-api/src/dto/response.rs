//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use geosync_entity::delta::Delta;
use geosync_entity::job::Job;
use geosync_service::StatusSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Job summary for responses. Clients poll this until the status is
/// terminal; a failed job carries no retry token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    /// Job ID.
    pub id: Uuid,
    /// Job type.
    pub job_type: String,
    /// Project ID.
    pub project_id: Option<Uuid>,
    /// Status.
    pub status: String,
    /// Output payload, present once finished.
    pub output: Option<serde_json::Value>,
    /// Error message, present once failed.
    pub error_message: Option<String>,
    /// When execution began.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Updated at.
    pub updated_at: DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            job_type: job.job_type.to_string(),
            project_id: job.project_id,
            status: job.status.to_string(),
            output: job.output,
            error_message: job.error_message,
            started_at: job.started_at,
            finished_at: job.finished_at,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Delta summary for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaResponse {
    /// Delta ID.
    pub id: Uuid,
    /// Project ID.
    pub project_id: Uuid,
    /// Last application status.
    pub last_status: String,
    /// Feedback from the last apply attempt.
    pub feedback: Option<serde_json::Value>,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Updated at.
    pub updated_at: DateTime<Utc>,
}

impl From<Delta> for DeltaResponse {
    fn from(delta: Delta) -> Self {
        Self {
            id: delta.id,
            project_id: delta.project_id,
            last_status: delta.last_status.to_string(),
            feedback: delta.feedback,
            created_at: delta.created_at,
            updated_at: delta.updated_at,
        }
    }
}

/// Body of `GET /api/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Combined queue health (backend connectivity + synthetic round trip).
    pub queue: String,
    /// Object storage health.
    pub storage: String,
    /// Synthetic round-trip classification.
    pub synthetic: String,
    /// When the probes ran.
    pub computed_at: DateTime<Utc>,
}

impl From<StatusSnapshot> for StatusResponse {
    fn from(snapshot: StatusSnapshot) -> Self {
        let as_str = |p: geosync_service::ProbeResult| match p {
            geosync_service::ProbeResult::Ok => "ok".to_string(),
            geosync_service::ProbeResult::Slow => "slow".to_string(),
            geosync_service::ProbeResult::Error => "error".to_string(),
        };
        Self {
            queue: as_str(snapshot.queue_summary()),
            storage: as_str(snapshot.object_storage),
            synthetic: as_str(snapshot.synthetic_job),
            computed_at: snapshot.computed_at,
        }
    }
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process is serving requests.
    pub status: String,
    /// Server version.
    pub version: String,
}
