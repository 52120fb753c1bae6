//! Job entity: model, status/type enumerations, and typed payloads.

pub mod model;
pub mod payload;
pub mod status;

pub use model::{CreateJob, Job};
pub use payload::ApplyParams;
pub use status::{JobStatus, JobType};
