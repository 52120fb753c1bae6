//! Project file processing capability — extracts metadata from a pushed
//! project file.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde_json::{Value, json};

use geosync_core::error::{AppError, ErrorKind};
use geosync_core::traits::storage::StorageProvider;
use geosync_entity::job::{Job, JobType};

use super::{project_file_path, project_meta_path};
use crate::executor::{Capability, CapabilityError};
use crate::retry;

/// Parses the pushed project file, extracts its metadata (name, CRS,
/// layer list), persists it alongside the project, and returns it as the
/// job output. A missing or malformed project file is a permanent
/// failure; the client must push a valid file and resubmit.
#[derive(Debug)]
pub struct ProcessProjectFileCapability {
    storage: Arc<dyn StorageProvider>,
    attempts: u32,
}

impl ProcessProjectFileCapability {
    /// Create a processing capability with the given storage attempt bound.
    pub fn new(storage: Arc<dyn StorageProvider>, attempts: u32) -> Self {
        Self { storage, attempts }
    }
}

#[async_trait]
impl Capability for ProcessProjectFileCapability {
    fn job_type(&self) -> JobType {
        JobType::ProcessProjectFile
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, CapabilityError> {
        let project_id = job.project_id.ok_or_else(|| {
            CapabilityError::Permanent("Process job has no project".to_string())
        })?;

        let source = project_file_path(project_id);
        let data = match self.storage.read_bytes(&source).await {
            Ok(data) => data,
            Err(e) if e.kind == ErrorKind::NotFound => {
                return Err(CapabilityError::Permanent(format!(
                    "Project {project_id} has no project file"
                )));
            }
            Err(e) => return Err(CapabilityError::Transient(e.to_string())),
        };

        let doc: Value = serde_json::from_slice(&data)
            .map_err(|e| CapabilityError::Permanent(format!("Malformed project file: {e}")))?;

        let name = doc
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("untitled");
        let crs = doc
            .get("crs")
            .and_then(Value::as_str)
            .unwrap_or("EPSG:4326");
        let layers: Vec<String> = doc
            .get("layers")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|l| l.get("name").and_then(Value::as_str).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let meta = json!({
            "name": name,
            "crs": crs,
            "layer_count": layers.len(),
            "layers": layers,
            "processed_at": Utc::now(),
        });

        let meta_bytes = Bytes::from(serde_json::to_vec(&meta).map_err(AppError::from)?);
        let meta_path = project_meta_path(project_id);
        retry::with_attempts(self.attempts, || {
            self.storage.write(&meta_path, meta_bytes.clone())
        })
        .await
        .map_err(|e| CapabilityError::Transient(format!("Failed to write metadata: {e}")))?;

        Ok(Some(meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use geosync_entity::job::JobStatus;
    use geosync_storage::LocalStorageProvider;
    use uuid::Uuid;

    fn process_job(project_id: Uuid) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            job_type: JobType::ProcessProjectFile,
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
    async fn test_extracts_metadata_and_persists_it() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageProvider> =
            Arc::new(LocalStorageProvider::new(dir.path()).await.unwrap());

        let project_id = Uuid::new_v4();
        let project_file = json!({
            "name": "Field Survey North",
            "crs": "EPSG:25832",
            "layers": [{"name": "roads"}, {"name": "wells"}],
        });
        storage
            .write(
                &project_file_path(project_id),
                Bytes::from(serde_json::to_vec(&project_file).unwrap()),
            )
            .await
            .unwrap();

        let capability = ProcessProjectFileCapability::new(storage.clone(), 3);
        let meta = capability
            .execute(&process_job(project_id))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(meta["name"], "Field Survey North");
        assert_eq!(meta["crs"], "EPSG:25832");
        assert_eq!(meta["layer_count"], 2);
        assert!(storage.exists(&project_meta_path(project_id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_project_file_is_permanent() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageProvider> =
            Arc::new(LocalStorageProvider::new(dir.path()).await.unwrap());

        let project_id = Uuid::new_v4();
        storage
            .write(
                &project_file_path(project_id),
                Bytes::from_static(b"<qgs version=\"3\">"),
            )
            .await
            .unwrap();

        let capability = ProcessProjectFileCapability::new(storage, 3);
        let err = capability
            .execute(&process_job(project_id))
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Permanent(_)));
    }

    #[tokio::test]
    async fn test_missing_project_file_is_permanent() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn StorageProvider> =
            Arc::new(LocalStorageProvider::new(dir.path()).await.unwrap());

        let capability = ProcessProjectFileCapability::new(storage, 3);
        let err = capability
            .execute(&process_job(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Permanent(_)));
    }
}
