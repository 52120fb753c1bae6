//! # geosync-core
//!
//! Core crate for GeoSync. Contains the trait seams (queue backend, cache
//! provider, storage provider), configuration schemas, shared types, and
//! the unified error system.
//!
//! This crate has **no** internal dependencies on other GeoSync crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
