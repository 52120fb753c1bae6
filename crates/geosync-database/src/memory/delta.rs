//! In-memory delta store.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use geosync_core::error::AppError;
use geosync_core::result::AppResult;
use geosync_core::types::pagination::{PageRequest, PageResponse};
use geosync_entity::delta::{CreateDelta, Delta, DeltaStatus};

use crate::store::DeltaStore;

/// Delta store backed by a mutexed map.
#[derive(Debug, Default)]
pub struct MemoryDeltaStore {
    deltas: Mutex<HashMap<Uuid, Delta>>,
}

impl MemoryDeltaStore {
    /// Create an empty delta store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DeltaStore for MemoryDeltaStore {
    async fn create(&self, data: &CreateDelta) -> AppResult<Delta> {
        let now = Utc::now();
        let delta = Delta {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            content: data.content.clone(),
            last_status: DeltaStatus::Pending,
            feedback: None,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };
        self.deltas
            .lock()
            .expect("delta store lock poisoned")
            .insert(delta.id, delta.clone());
        Ok(delta)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Delta>> {
        Ok(self
            .deltas
            .lock()
            .expect("delta store lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn list_by_project(
        &self,
        project_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Delta>> {
        let deltas = self.deltas.lock().expect("delta store lock poisoned");
        let mut matching: Vec<Delta> = deltas
            .values()
            .filter(|d| d.project_id == project_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page, total))
    }

    async fn find_pending_by_project(&self, project_id: Uuid) -> AppResult<Vec<Delta>> {
        let deltas = self.deltas.lock().expect("delta store lock poisoned");
        let mut pending: Vec<Delta> = deltas
            .values()
            .filter(|d| d.project_id == project_id && d.last_status == DeltaStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|d| d.created_at);
        Ok(pending)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: DeltaStatus,
        feedback: Option<serde_json::Value>,
    ) -> AppResult<()> {
        let mut deltas = self.deltas.lock().expect("delta store lock poisoned");
        let delta = deltas
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Delta {id} not found")))?;
        delta.last_status = status;
        delta.feedback = feedback;
        delta.updated_at = Utc::now();
        Ok(())
    }
}
