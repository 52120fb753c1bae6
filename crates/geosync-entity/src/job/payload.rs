//! Typed job payload definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Parameters carried by a delta-apply job.
///
/// The job owns its deltas implicitly by project scope: the worker
/// re-gathers the project's pending deltas at execution time and, when
/// `delta_ids` is set, restricts itself to that explicit subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyParams {
    /// Apply changes even when the base feature version no longer matches.
    #[serde(default)]
    pub overwrite_conflicts: bool,
    /// Optional explicit delta subset requested by the client.
    #[serde(default)]
    pub delta_ids: Option<Vec<Uuid>>,
}
