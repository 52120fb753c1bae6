//! Cached health status aggregation.

pub mod aggregator;
pub mod snapshot;

pub use aggregator::StatusAggregator;
pub use snapshot::{ProbeResult, StatusSnapshot};
