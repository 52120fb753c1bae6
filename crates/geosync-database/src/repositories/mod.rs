//! PostgreSQL store implementations.

pub mod delta;
pub mod job;

pub use delta::PgDeltaStore;
pub use job::PgJobStore;
