//! Ephemeral per-actor snapshots for "undo my last destructive action".
//!
//! Entries are single-shot: a successful [`UndoLog::perform`] deletes the
//! entry in the same transaction as the restore. Entries past their expiry
//! are treated as absent on every read, whether or not the sweep has
//! removed them yet.

use std::sync::Arc;

use chrono::Utc;
use mrp_core::audit::verbs;
use mrp_core::retention::{clamp_limit, undo_expiry};
use mrp_core::snapshot::EntitySnapshot;
use mrp_core::types::DbId;
use mrp_db::codec::CodecRegistry;
use mrp_db::models::undo_entry::{CreateUndoEntry, UndoEntry};
use mrp_db::repositories::UndoLogRepo;
use mrp_db::DbPool;
use serde::Serialize;

use crate::capture::SnapshotCapture;
use crate::config::HistoryConfig;
use crate::error::{HistoryError, HistoryResult};
use crate::notifier::Notifier;

/// Outcome of a successful [`UndoLog::perform`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreSummary {
    pub entry_id: DbId,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
}

/// Creates, lists, and performs undo entries.
#[derive(Debug, Clone)]
pub struct UndoLog {
    pool: DbPool,
    registry: Arc<CodecRegistry>,
    capture: SnapshotCapture,
    notifier: Notifier,
    ttl: chrono::Duration,
    default_limit: i64,
    max_limit: i64,
}

impl UndoLog {
    pub fn new(
        pool: DbPool,
        registry: Arc<CodecRegistry>,
        notifier: Notifier,
        config: &HistoryConfig,
    ) -> Self {
        Self {
            capture: SnapshotCapture::new(pool.clone(), Arc::clone(&registry)),
            pool,
            registry,
            notifier,
            ttl: config.undo_ttl,
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }

    /// Snapshot the entity as it is now and store it for the actor.
    ///
    /// Call before a delete, or in place of recording a create/update.
    pub async fn create(
        &self,
        actor: &str,
        action: &str,
        entity_type: &str,
        entity_id: &str,
    ) -> HistoryResult<DbId> {
        let snapshot = self.capture.capture(entity_type, entity_id).await?;
        let created_at = Utc::now();
        let input = CreateUndoEntry {
            actor: actor.to_string(),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            snapshot_payload: snapshot.to_value(),
            created_at,
            expires_at: undo_expiry(created_at, self.ttl),
        };
        let entry = UndoLogRepo::insert(&self.pool, &input).await?;

        tracing::info!(
            actor,
            action,
            entity_type,
            entity_id,
            entry_id = entry.id,
            expires_at = %entry.expires_at,
            "Undo entry created"
        );
        Ok(entry.id)
    }

    /// The actor's unexpired entries, most recent first.
    pub async fn list(&self, actor: &str, limit: Option<i64>) -> HistoryResult<Vec<UndoEntry>> {
        let limit = clamp_limit(limit, self.default_limit, self.max_limit);
        Ok(UndoLogRepo::list_active_for_actor(&self.pool, actor, Utc::now(), limit).await?)
    }

    /// Restore the entry's snapshot and consume the entry.
    ///
    /// Of two concurrent calls for the same entry, exactly one restores;
    /// the other gets [`HistoryError::NotFound`]. A failed restore leaves
    /// the entry in place.
    pub async fn perform(&self, actor: &str, id: DbId) -> HistoryResult<RestoreSummary> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let Some(entry) = UndoLogRepo::take_active(&mut *tx, actor, id, now).await? else {
            return match UndoLogRepo::find_for_actor(&mut *tx, actor, id).await? {
                Some(_) => Err(HistoryError::Expired(id)),
                None => Err(HistoryError::not_found("Undo entry", id)),
            };
        };

        let entity_type = entry.entity_type.as_str();
        let entity_id = entry.entity_id.as_str();
        let codec = self
            .registry
            .resolve(entity_type)
            .map_err(HistoryError::from_codec)?;
        let snapshot = EntitySnapshot::from_value(entry.snapshot_payload.clone())
            .map_err(|e| HistoryError::from_stored(e, entity_type, entity_id))?;
        codec
            .restore(&mut *tx, entity_id, &snapshot)
            .await
            .map_err(|e| HistoryError::from_restore(e, entity_type, entity_id))?;
        tx.commit().await?;

        tracing::info!(
            actor,
            entity_type,
            entity_id,
            entry_id = id,
            "Undo entry performed"
        );
        self.notifier
            .notify(actor, verbs::RESTORE, codec.collection(), entity_id)
            .await;

        Ok(RestoreSummary {
            entry_id: id,
            action: entry.action.clone(),
            entity_type: entry.entity_type.clone(),
            entity_id: entry.entity_id.clone(),
        })
    }
}
