//! Object storage configuration.

use serde::{Deserialize, Serialize};

/// Object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage provider: `"local"` or `"s3"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Root directory for the local provider.
    #[serde(default = "default_root")]
    pub root: String,
    /// Bucket name for the S3 provider.
    #[serde(default)]
    pub bucket: Option<String>,
    /// AWS region for the S3 provider.
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint URL for S3-compatible storage (e.g. MinIO).
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            root: default_root(),
            bucket: None,
            region: None,
            endpoint: None,
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_root() -> String {
    "data/storage".to_string()
}
