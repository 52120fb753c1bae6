//! Delta entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::DeltaStatus;

/// A client-submitted set of feature edits pending application to a
/// project's canonical data.
///
/// A delta with `last_status = Pending` is eligible for exactly one
/// in-flight apply job per project at a time; the coordinator enforces
/// this at admission.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Delta {
    /// Unique delta identifier.
    pub id: Uuid,
    /// Project the delta belongs to.
    pub project_id: Uuid,
    /// Ordered list of [`DeltaChange`] values (JSON).
    pub content: serde_json::Value,
    /// Last known application status.
    pub last_status: DeltaStatus,
    /// Feedback from the last apply attempt (e.g., conflicting features).
    pub feedback: Option<serde_json::Value>,
    /// User who submitted the delta.
    pub created_by: Option<Uuid>,
    /// When the delta was submitted.
    pub created_at: DateTime<Utc>,
    /// When the delta was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Delta {
    /// Parse the content into a typed change list.
    pub fn changes(&self) -> Result<Vec<DeltaChange>, serde_json::Error> {
        serde_json::from_value(self.content.clone())
    }
}

/// A single attribute-level change against a base feature version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaChange {
    /// Feature the change applies to.
    pub feature_id: String,
    /// Feature version the client based its edit on.
    pub base_version: i64,
    /// New attribute values.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Data required to create a new delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDelta {
    /// Project the delta belongs to.
    pub project_id: Uuid,
    /// Ordered change list (JSON).
    pub content: serde_json::Value,
    /// User who submitted the delta.
    pub created_by: Option<Uuid>,
}
