//! Job status and type enumerations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use geosync_core::error::AppError;

/// Status of a background job.
///
/// Transitions are monotonic forward:
/// `Pending → Queued → Started → {Finished | Failed | Stopped}`.
/// A job that reached `Finished` is never regressed; the store
/// implementations enforce this with guarded updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created but not yet placed on a queue.
    Pending,
    /// Placed on a queue, waiting for a worker.
    Queued,
    /// Currently being processed by a worker.
    Started,
    /// Successfully completed; side effects are durable.
    Finished,
    /// Terminated with an error. Resubmission is a fresh job.
    Failed,
    /// Stopped by an operator before execution began.
    Stopped,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Stopped)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The closed enumeration of job types the orchestration core executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Package a project for field use.
    Export,
    /// Apply pending edit deltas to a project.
    DeltaApply,
    /// Extract metadata from a pushed project file.
    ProcessProjectFile,
    /// Synthetic no-op used by the status aggregator to measure
    /// queue/worker round-trip health.
    Ping,
}

impl JobType {
    /// Return the type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Export => "export",
            Self::DeltaApply => "delta_apply",
            Self::ProcessProjectFile => "process_project_file",
            Self::Ping => "ping",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "export" => Ok(Self::Export),
            "delta_apply" => Ok(Self::DeltaApply),
            "process_project_file" => Ok(Self::ProcessProjectFile),
            "ping" => Ok(Self::Ping),
            other => Err(AppError::unsupported_job_type(format!(
                "Unknown job type '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geosync_core::error::ErrorKind;

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Finished.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Stopped.is_terminal());
        assert!(!JobStatus::Started.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }

    #[test]
    fn test_job_type_roundtrip() {
        for ty in [
            JobType::Export,
            JobType::DeltaApply,
            JobType::ProcessProjectFile,
            JobType::Ping,
        ] {
            assert_eq!(ty.as_str().parse::<JobType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_unknown_job_type_rejected() {
        let err = "reticulate_splines".parse::<JobType>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedJobType);
    }
}
