//! Built-in capability implementations.
//!
//! These are thin stand-ins for the geospatial processing a production
//! deployment plugs in; they operate on the project's canonical layer
//! data, stored as JSON objects in the storage provider.

pub mod delta_apply;
pub mod export;
pub mod ping;
pub mod process_file;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use delta_apply::DeltaApplyCapability;
pub use export::ExportCapability;
pub use ping::PingCapability;
pub use process_file::ProcessProjectFileCapability;

/// A feature in the project's canonical layer data: a version counter
/// plus the current attribute values. Deltas are merged against this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Version, bumped on every applied change.
    pub version: i64,
    /// Current attribute values.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Storage path of a project's canonical layer data.
pub fn layers_path(project_id: Uuid) -> String {
    format!("projects/{project_id}/layers.json")
}

/// Storage path of a project's pushed project file.
pub fn project_file_path(project_id: Uuid) -> String {
    format!("projects/{project_id}/project.json")
}

/// Storage path of a project's extracted metadata.
pub fn project_meta_path(project_id: Uuid) -> String {
    format!("projects/{project_id}/meta.json")
}
