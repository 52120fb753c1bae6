//! Export capability — packages a project's layer data for field use.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde_json::{Value, json};

use geosync_core::error::{AppError, ErrorKind};
use geosync_core::traits::storage::StorageProvider;
use geosync_entity::job::{Job, JobType};

use super::{FeatureRecord, layers_path};
use crate::executor::{Capability, CapabilityError};
use crate::retry;

/// Packages the project's canonical layer data into an export bundle and
/// returns the package manifest as the job output.
#[derive(Debug)]
pub struct ExportCapability {
    storage: Arc<dyn StorageProvider>,
    attempts: u32,
}

impl ExportCapability {
    /// Create an export capability with the given storage attempt bound.
    pub fn new(storage: Arc<dyn StorageProvider>, attempts: u32) -> Self {
        Self { storage, attempts }
    }
}

#[async_trait]
impl Capability for ExportCapability {
    fn job_type(&self) -> JobType {
        JobType::Export
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, CapabilityError> {
        let project_id = job
            .project_id
            .ok_or_else(|| CapabilityError::Permanent("Export job has no project".to_string()))?;

        let source = layers_path(project_id);
        let data = match self.storage.read_bytes(&source).await {
            Ok(data) => data,
            Err(e) if e.kind == ErrorKind::NotFound => {
                return Err(CapabilityError::Permanent(format!(
                    "Project {project_id} has no layer data to export"
                )));
            }
            Err(e) => return Err(CapabilityError::Transient(e.to_string())),
        };

        let layers: BTreeMap<String, FeatureRecord> = serde_json::from_slice(&data)
            .map_err(|e| CapabilityError::Permanent(format!("Malformed layer data: {e}")))?;

        let package_path = format!("exports/{project_id}/{}/layers.json", job.id);
        retry::with_attempts(self.attempts, || {
            self.storage.write(&package_path, data.clone())
        })
        .await
        .map_err(|e| CapabilityError::Transient(format!("Failed to write package: {e}")))?;

        let manifest = json!({
            "files": [{"name": "layers.json", "size": data.len()}],
            "layer_count": layers.len(),
            "packaged_at": Utc::now(),
        });

        let manifest_path = format!("exports/{project_id}/{}/manifest.json", job.id);
        let manifest_bytes = Bytes::from(serde_json::to_vec(&manifest).map_err(AppError::from)?);
        retry::with_attempts(self.attempts, || {
            self.storage.write(&manifest_path, manifest_bytes.clone())
        })
        .await
        .map_err(|e| CapabilityError::Transient(format!("Failed to write manifest: {e}")))?;

        Ok(Some(manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Utc;
    use geosync_entity::job::JobStatus;
    use geosync_storage::LocalStorageProvider;
    use uuid::Uuid;

    fn export_job(project_id: Uuid) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            job_type: JobType::Export,
            project_id: Some(project_id),
            status: JobStatus::Started,
            payload: Value::Null,
            output: None,
            error_message: None,
            created_by: None,
            started_at: Some(now),
            finished_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_export_writes_package_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageProvider> =
            Arc::new(LocalStorageProvider::new(dir.path()).await.unwrap());

        let project_id = Uuid::new_v4();
        let layers = json!({
            "road-1": {"version": 3, "attributes": {"surface": "gravel"}},
            "well-7": {"version": 1, "attributes": {}},
        });
        storage
            .write(
                &layers_path(project_id),
                Bytes::from(serde_json::to_vec(&layers).unwrap()),
            )
            .await
            .unwrap();

        let job = export_job(project_id);
        let capability = ExportCapability::new(storage.clone(), 3);
        let manifest = capability.execute(&job).await.unwrap().unwrap();

        assert_eq!(manifest["layer_count"], 2);
        let package = format!("exports/{project_id}/{}/layers.json", job.id);
        assert!(storage.exists(&package).await.unwrap());
        let manifest_obj = format!("exports/{project_id}/{}/manifest.json", job.id);
        assert!(storage.exists(&manifest_obj).await.unwrap());
    }

    #[tokio::test]
    async fn test_export_without_layer_data_is_permanent() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageProvider> =
            Arc::new(LocalStorageProvider::new(dir.path()).await.unwrap());

        let capability = ExportCapability::new(storage, 3);
        let err = capability
            .execute(&export_job(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Permanent(_)));
    }
}
