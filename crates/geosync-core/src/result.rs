//! Convenience result type alias for GeoSync.

use crate::error::AppError;

/// A specialized `Result` type used throughout the GeoSync crates.
pub type AppResult<T> = Result<T, AppError>;
