//! Change history row model.

use mrp_core::change::{ChangeOperation, ChangeSet};
use mrp_core::error::CoreError;
use mrp_core::snapshot::EntitySnapshot;
use mrp_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `change_history` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChangeRecord {
    pub id: DbId,
    pub entity_collection: String,
    pub entity_id: String,
    pub operation: String,
    pub before_payload: Option<serde_json::Value>,
    pub after_payload: Option<serde_json::Value>,
    pub actor: String,
    pub created_at: Timestamp,
    pub undone: bool,
}

impl ChangeRecord {
    /// Parse the stored operation code.
    pub fn operation(&self) -> Result<ChangeOperation, CoreError> {
        self.operation.parse()
    }

    /// Decode both payloads into a typed change set.
    pub fn change_set(&self) -> Result<ChangeSet, CoreError> {
        let before = decode(self.before_payload.as_ref())?;
        let after = decode(self.after_payload.as_ref())?;
        ChangeSet::from_parts(self.operation()?, before, after)
    }
}

fn decode(payload: Option<&serde_json::Value>) -> Result<Option<EntitySnapshot>, CoreError> {
    payload
        .cloned()
        .map(EntitySnapshot::from_value)
        .transpose()
}

/// DTO for appending a change record.
#[derive(Debug, Clone)]
pub struct CreateChangeRecord {
    pub actor: String,
    pub entity_collection: String,
    pub entity_id: String,
    pub change: ChangeSet,
}
