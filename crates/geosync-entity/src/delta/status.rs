//! Delta status enumeration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Last known application status of a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delta_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeltaStatus {
    /// Submitted, waiting to be applied.
    Pending,
    /// Applied to the project's canonical data.
    Applied,
    /// Rejected because the base feature version no longer matched.
    Conflict,
    /// Could not be processed (e.g., malformed change list).
    Error,
}

impl DeltaStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Applied => "applied",
            Self::Conflict => "conflict",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for DeltaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
