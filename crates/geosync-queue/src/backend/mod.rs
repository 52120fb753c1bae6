//! Queue backend implementations.

pub mod memory;
pub mod pg;

pub use memory::MemoryQueueBackend;
pub use pg::PgQueueBackend;
