//! # geosync-api
//!
//! The thin HTTP surface over the orchestration core: job submission and
//! polling, delta submission and apply, and the cached status endpoint.
//! Authentication is provided by an external gateway and is not part of
//! this crate.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
