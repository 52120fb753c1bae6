//! S3-compatible object storage provider (requires the `s3` feature).

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

use geosync_core::config::storage::StorageConfig;
use geosync_core::error::AppError;
use geosync_core::result::AppResult;
use geosync_core::traits::storage::StorageProvider;

/// S3-compatible storage provider.
#[derive(Debug, Clone)]
pub struct S3StorageProvider {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3StorageProvider {
    /// Create a provider from configuration.
    ///
    /// Credentials come from the standard AWS provider chain. A custom
    /// `endpoint` supports S3-compatible stores such as MinIO.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let bucket = config
            .bucket
            .clone()
            .ok_or_else(|| AppError::configuration("S3 storage requires 'storage.bucket'"))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region.clone() {
            loader = loader.region(Region::new(region));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        let client = aws_sdk_s3::Client::new(&sdk_config);

        tracing::info!(bucket, "Initialized S3 storage provider");
        Ok(Self { client, bucket })
    }
}

#[async_trait]
impl StorageProvider for S3StorageProvider {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                AppError::storage(format!("HeadBucket failed for '{}': {e}", self.bucket))
            })?;
        Ok(true)
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    AppError::not_found(format!("Object '{path}' not found"))
                } else {
                    AppError::storage(format!("Failed to read '{path}': {service_err}"))
                }
            })?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| AppError::storage(format!("Failed to stream '{path}': {e}")))?;
        Ok(data.into_bytes())
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| AppError::storage(format!("Failed to write '{path}': {e}")))?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(AppError::storage(format!(
                        "Failed to stat '{path}': {service_err}"
                    )))
                }
            }
        }
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| AppError::storage(format!("Failed to delete '{path}': {e}")))?;
        Ok(())
    }
}
