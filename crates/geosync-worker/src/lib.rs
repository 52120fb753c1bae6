//! # geosync-worker
//!
//! The execution side of the orchestration core:
//! - A capability table that statically binds job types to their
//!   processing logic
//! - A worker runner that claims queue entries and executes capabilities
//!   with bounded concurrency
//! - A recovery handler that reconciles crashed executions into a
//!   terminal job status
//! - Built-in capabilities: export packaging, delta application,
//!   project file processing, and the synthetic ping

pub mod capabilities;
pub mod executor;
pub mod recovery;
pub mod retry;
pub mod runner;

pub use executor::{Capability, CapabilityError, CapabilityTable};
pub use recovery::RecoveryHandler;
pub use runner::WorkerRunner;
