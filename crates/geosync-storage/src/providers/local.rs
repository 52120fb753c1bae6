//! Local filesystem storage provider.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use geosync_core::error::AppError;
use geosync_core::result::AppResult;
use geosync_core::traits::storage::StorageProvider;

/// Storage provider rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    root: PathBuf,
}

impl LocalStorageProvider {
    /// Create a provider rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            AppError::storage(format!(
                "Failed to create storage root '{}': {e}",
                root.display()
            ))
        })?;
        tracing::info!(root = %root.display(), "Initialized local storage provider");
        Ok(Self { root })
    }

    /// Resolve an object path under the root, rejecting traversal.
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(path);
        let traversal = relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if traversal || path.is_empty() {
            return Err(AppError::validation(format!(
                "Invalid storage path '{path}'"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        let meta = tokio::fs::metadata(&self.root)
            .await
            .map_err(|e| AppError::storage(format!("Storage root unavailable: {e}")))?;
        Ok(meta.is_dir())
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let full = self.resolve(path)?;
        let data = tokio::fs::read(&full)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    AppError::not_found(format!("Object '{path}' not found"))
                }
                _ => AppError::storage(format!("Failed to read '{path}': {e}")),
            })?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::storage(format!("Failed to create parent dirs: {e}")))?;
        }
        tokio::fs::write(&full, &data)
            .await
            .map_err(|e| AppError::storage(format!("Failed to write '{path}': {e}")))?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let full = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&full)
            .await
            .map_err(|e| AppError::storage(format!("Failed to stat '{path}': {e}")))?)
    }

    async fn delete(&self, path: &str) -> AppResult<()> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::storage(format!("Failed to delete '{path}': {e}"))),
        }
    }
}
