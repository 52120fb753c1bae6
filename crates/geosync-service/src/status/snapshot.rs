//! Status snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a single liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeResult {
    /// Healthy.
    Ok,
    /// Working, but slower than expected. Informational, non-failing.
    Slow,
    /// Unavailable or failing.
    Error,
}

impl ProbeResult {
    fn rank(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Slow => 1,
            Self::Error => 2,
        }
    }

    /// Return the more severe of two results.
    pub fn worse(self, other: Self) -> Self {
        if other.rank() > self.rank() { other } else { self }
    }
}

/// Aggregated liveness of the orchestration core's collaborators.
///
/// Recomputed on cache miss or expiry; never persisted beyond the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Queue backend connectivity.
    pub queue_backend: ProbeResult,
    /// Object storage reachability.
    pub object_storage: ProbeResult,
    /// Synthetic job round trip through the dispatcher/worker path.
    pub synthetic_job: ProbeResult,
    /// When the probes ran.
    pub computed_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// Overall health: `false` iff any probe errored. `Slow` does not fail.
    pub fn overall_ok(&self) -> bool {
        self.queue_backend != ProbeResult::Error
            && self.object_storage != ProbeResult::Error
            && self.synthetic_job != ProbeResult::Error
    }

    /// Combined queue health: backend connectivity and the synthetic
    /// round trip folded into one client-facing value.
    pub fn queue_summary(&self) -> ProbeResult {
        self.queue_backend.worse(self.synthetic_job)
    }
}
