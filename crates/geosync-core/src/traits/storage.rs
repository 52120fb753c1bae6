//! Storage provider trait for pluggable object storage backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Trait for object storage backends.
///
/// Implementations exist for the local filesystem and S3. The trait is
/// defined here in `geosync-core` and implemented in `geosync-storage`.
/// Capabilities require writes to be durable before returning.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    ///
    /// For S3 this is a `HeadBucket` call against the configured bucket;
    /// for the local provider it verifies the root directory.
    async fn health_check(&self) -> AppResult<bool>;

    /// Read an object into memory as a complete byte vector.
    async fn read_bytes(&self, path: &str) -> AppResult<Bytes>;

    /// Write bytes to an object at the given path.
    async fn write(&self, path: &str, data: Bytes) -> AppResult<()>;

    /// Check whether an object exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Delete the object at the given path.
    async fn delete(&self, path: &str) -> AppResult<()>;
}
