//! Delta entity: model and status enumeration.

pub mod model;
pub mod status;

pub use model::{CreateDelta, Delta, DeltaChange};
pub use status::DeltaStatus;
