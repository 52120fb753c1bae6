//! Status aggregator configuration.

use serde::{Deserialize, Serialize};

/// Status aggregator configuration.
///
/// The synthetic round-trip probe polls the job store every
/// `poll_interval_ms` for up to `max_polls` iterations, so the worst-case
/// blocking time on a cache miss is `poll_interval_ms * max_polls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    /// How long a computed snapshot stays valid, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    /// Interval between synthetic job status polls, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Maximum number of synthetic job status polls.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: default_cache_ttl(),
            poll_interval_ms: default_poll_interval(),
            max_polls: default_max_polls(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    600
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_max_polls() -> u32 {
    30
}
