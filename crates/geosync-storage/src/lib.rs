//! # geosync-storage
//!
//! Object storage providers for GeoSync. The local filesystem provider
//! is the default; the S3 provider is enabled with the `s3` cargo
//! feature. The [`StorageProvider`] trait seam lives in `geosync-core`.
//!
//! [`StorageProvider`]: geosync_core::traits::storage::StorageProvider

pub mod providers;

#[cfg(feature = "local")]
pub use providers::local::LocalStorageProvider;
#[cfg(feature = "s3")]
pub use providers::s3::S3StorageProvider;
