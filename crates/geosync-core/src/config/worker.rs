//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background job worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of concurrent job processing tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in milliseconds between job queue polls when idle.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Queues to poll, highest priority first.
    #[serde(default = "default_queues")]
    pub queues: Vec<String>,
    /// Bounded attempt count for transient storage operations inside
    /// capability execution. Job-level retry is always client-initiated.
    #[serde(default = "default_capability_attempts")]
    pub capability_attempts: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            concurrency: default_concurrency(),
            poll_interval_ms: default_poll_interval(),
            queues: default_queues(),
            capability_attempts: default_capability_attempts(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

fn default_poll_interval() -> u64 {
    5000
}

fn default_queues() -> Vec<String> {
    vec![
        "deltas".to_string(),
        "export".to_string(),
        "process".to_string(),
        "status".to_string(),
    ]
}

fn default_capability_attempts() -> u32 {
    3
}
