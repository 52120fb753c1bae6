//! Delta apply capability — merges pending edit deltas into a project's
//! canonical layer data.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Value, json};
use uuid::Uuid;

use geosync_core::error::AppError;
use geosync_core::traits::storage::StorageProvider;
use geosync_database::store::DeltaStore;
use geosync_entity::delta::{Delta, DeltaChange, DeltaStatus};
use geosync_entity::job::{ApplyParams, Job, JobType};

use super::{FeatureRecord, layers_path};
use crate::executor::{Capability, CapabilityError};
use crate::retry;

/// Applies a project's pending deltas in submission order.
///
/// The job owns its deltas by project scope: the capability re-gathers
/// the pending set at execution time and, when the payload names an
/// explicit subset, restricts itself to it. A change whose base version
/// matches the feature's current version is applied and bumps the
/// version; a mismatch is a conflict unless the job was submitted with
/// `overwrite_conflicts`. The updated layer data is written back before
/// any delta status is recorded, so a crash mid-way leaves deltas
/// pending rather than falsely applied.
#[derive(Debug)]
pub struct DeltaApplyCapability {
    deltas: Arc<dyn DeltaStore>,
    storage: Arc<dyn StorageProvider>,
    attempts: u32,
}

/// Outcome of merging one delta, recorded after the write-back.
#[derive(Debug)]
enum DeltaOutcome {
    Applied,
    Conflict(Vec<String>),
    Error(String),
}

impl DeltaApplyCapability {
    /// Create a delta apply capability with the given storage attempt bound.
    pub fn new(deltas: Arc<dyn DeltaStore>, storage: Arc<dyn StorageProvider>, attempts: u32) -> Self {
        Self {
            deltas,
            storage,
            attempts,
        }
    }

    /// Merge one delta's changes into the layer map.
    fn merge_delta(
        layers: &mut BTreeMap<String, FeatureRecord>,
        changes: &[DeltaChange],
        overwrite_conflicts: bool,
    ) -> DeltaOutcome {
        let mut conflicts = Vec::new();
        for change in changes {
            match layers.entry(change.feature_id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(FeatureRecord {
                        version: 1,
                        attributes: change.attributes.clone(),
                    });
                }
                Entry::Occupied(mut slot) => {
                    let record = slot.get_mut();
                    if record.version == change.base_version || overwrite_conflicts {
                        apply_attributes(record, change);
                    } else {
                        conflicts.push(change.feature_id.clone());
                    }
                }
            }
        }
        if conflicts.is_empty() {
            DeltaOutcome::Applied
        } else {
            DeltaOutcome::Conflict(conflicts)
        }
    }
}

fn apply_attributes(record: &mut FeatureRecord, change: &DeltaChange) {
    for (key, value) in &change.attributes {
        record.attributes.insert(key.clone(), value.clone());
    }
    record.version += 1;
}

#[async_trait]
impl Capability for DeltaApplyCapability {
    fn job_type(&self) -> JobType {
        JobType::DeltaApply
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, CapabilityError> {
        let project_id = job.project_id.ok_or_else(|| {
            CapabilityError::Permanent("Delta apply job has no project".to_string())
        })?;
        let params: ApplyParams = serde_json::from_value(job.payload.clone())
            .map_err(|e| CapabilityError::Permanent(format!("Malformed apply payload: {e}")))?;

        let pending = self.deltas.find_pending_by_project(project_id).await?;
        let selected: Vec<Delta> = match &params.delta_ids {
            Some(ids) => pending.into_iter().filter(|d| ids.contains(&d.id)).collect(),
            None => pending,
        };
        if selected.is_empty() {
            return Ok(Some(json!({
                "applied": 0, "conflicted": 0, "errored": 0,
            })));
        }

        let path = layers_path(project_id);
        let mut layers: BTreeMap<String, FeatureRecord> =
            if self.storage.exists(&path).await? {
                let data = self.storage.read_bytes(&path).await?;
                serde_json::from_slice(&data).map_err(|e| {
                    CapabilityError::Permanent(format!("Corrupt layer data: {e}"))
                })?
            } else {
                BTreeMap::new()
            };

        let mut outcomes: Vec<(Uuid, DeltaOutcome)> = Vec::with_capacity(selected.len());
        for delta in &selected {
            let outcome = match delta.changes() {
                Ok(changes) => {
                    Self::merge_delta(&mut layers, &changes, params.overwrite_conflicts)
                }
                Err(e) => DeltaOutcome::Error(format!("Malformed change list: {e}")),
            };
            outcomes.push((delta.id, outcome));
        }

        // Canonical data first; delta statuses only flip once the merged
        // state is durable.
        let bytes = Bytes::from(serde_json::to_vec(&layers).map_err(AppError::from)?);
        retry::with_attempts(self.attempts, || self.storage.write(&path, bytes.clone()))
            .await
            .map_err(|e| {
                CapabilityError::Transient(format!("Failed to persist layer data: {e}"))
            })?;

        let (mut applied, mut conflicted, mut errored) = (0u64, 0u64, 0u64);
        for (delta_id, outcome) in outcomes {
            match outcome {
                DeltaOutcome::Applied => {
                    self.deltas
                        .set_status(delta_id, DeltaStatus::Applied, None)
                        .await?;
                    applied += 1;
                }
                DeltaOutcome::Conflict(features) => {
                    self.deltas
                        .set_status(
                            delta_id,
                            DeltaStatus::Conflict,
                            Some(json!({"conflicts": features})),
                        )
                        .await?;
                    conflicted += 1;
                }
                DeltaOutcome::Error(reason) => {
                    self.deltas
                        .set_status(delta_id, DeltaStatus::Error, Some(json!({"reason": reason})))
                        .await?;
                    errored += 1;
                }
            }
        }

        Ok(Some(json!({
            "applied": applied,
            "conflicted": conflicted,
            "errored": errored,
            "features": layers.len(),
        })))
    }
}
