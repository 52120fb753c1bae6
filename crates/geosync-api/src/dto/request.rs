//! Request DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /api/jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitJobRequest {
    /// Job type as a wire string (e.g., `"export"`).
    pub job_type: String,
    /// Project the job operates on.
    pub project_id: Uuid,
    /// Optional job-specific parameters.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    /// Requesting user, as resolved by the external auth layer.
    #[serde(default)]
    pub requested_by: Option<Uuid>,
}

/// Body of `POST /api/projects/{id}/deltas`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitDeltaRequest {
    /// Ordered change list.
    pub changes: serde_json::Value,
    /// Submitting user.
    #[serde(default)]
    pub submitted_by: Option<Uuid>,
}

/// Body of `POST /api/projects/{id}/deltas/apply`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyDeltasRequest {
    /// Apply changes even when the base feature version no longer matches.
    #[serde(default)]
    pub overwrite_conflicts: bool,
    /// Optional explicit delta subset.
    #[serde(default)]
    pub delta_ids: Option<Vec<Uuid>>,
    /// Requesting user.
    #[serde(default)]
    pub requested_by: Option<Uuid>,
}
