//! Undo log row model.

use mrp_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `undo_log` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UndoEntry {
    pub id: DbId,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub snapshot_payload: serde_json::Value,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// DTO for inserting an undo entry. Timestamps are supplied by the caller
/// so the retention window is computed in one place.
#[derive(Debug, Clone)]
pub struct CreateUndoEntry {
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub snapshot_payload: serde_json::Value,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}
