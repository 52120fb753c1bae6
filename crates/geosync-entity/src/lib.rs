//! # geosync-entity
//!
//! Domain entity models for GeoSync: jobs and deltas, with their status
//! and type enumerations and typed payloads.

pub mod delta;
pub mod job;
