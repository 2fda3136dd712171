//! Durable, append-only change log with exactly-once undo.
//!
//! Every reversal appends the inverse of the record it reverses, so
//! undoing that inverse is a redo. History is never rewritten: the only
//! update a record ever sees is `undone` going from `false` to `true`.

use std::sync::Arc;

use mrp_core::audit::verbs;
use mrp_core::change::{ChangeOperation, ChangeSet};
use mrp_core::retention::clamp_limit;
use mrp_core::types::DbId;
use mrp_db::codec::CodecRegistry;
use mrp_db::models::audit::AuditLog;
use mrp_db::models::change_record::{ChangeRecord, CreateChangeRecord};
use mrp_db::repositories::{AuditLogRepo, ChangeHistoryRepo};
use mrp_db::DbPool;
use serde::Serialize;

use crate::config::HistoryConfig;
use crate::error::{HistoryError, HistoryResult};
use crate::notifier::Notifier;

/// Outcome of a successful [`ChangeLog::undo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReversalResult {
    pub collection: String,
    pub entity_id: String,
    /// Operation of the appended inverse record.
    pub operation: ChangeOperation,
    pub undone_record_id: DbId,
    /// Undo this id to redo the original change.
    pub new_record_id: DbId,
}

/// Records mutations and reverses them.
#[derive(Debug, Clone)]
pub struct ChangeLog {
    pool: DbPool,
    registry: Arc<CodecRegistry>,
    notifier: Notifier,
    default_limit: i64,
    max_limit: i64,
}

impl ChangeLog {
    pub fn new(
        pool: DbPool,
        registry: Arc<CodecRegistry>,
        notifier: Notifier,
        config: &HistoryConfig,
    ) -> Self {
        Self {
            pool,
            registry,
            notifier,
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }

    /// Append one change record. Fails only if the store is unavailable.
    pub async fn record(
        &self,
        actor: &str,
        collection: &str,
        entity_id: &str,
        change: ChangeSet,
    ) -> HistoryResult<DbId> {
        let operation = change.operation();
        let input = CreateChangeRecord {
            actor: actor.to_string(),
            entity_collection: collection.to_string(),
            entity_id: entity_id.to_string(),
            change,
        };
        let record = ChangeHistoryRepo::insert(&self.pool, &input).await?;

        tracing::info!(
            actor,
            collection,
            entity_id,
            record_id = record.id,
            operation = %operation,
            "Change recorded"
        );
        self.notifier
            .notify(actor, operation.as_str(), &self.canonical(collection), entity_id)
            .await;
        Ok(record.id)
    }

    /// The actor's own records, most recent first.
    pub async fn list_recent(
        &self,
        actor: &str,
        limit: Option<i64>,
    ) -> HistoryResult<Vec<ChangeRecord>> {
        let limit = clamp_limit(limit, self.default_limit, self.max_limit);
        Ok(ChangeHistoryRepo::list_recent_for_actor(&self.pool, actor, limit).await?)
    }

    /// One of the actor's records.
    pub async fn get(&self, actor: &str, id: DbId) -> HistoryResult<ChangeRecord> {
        ChangeHistoryRepo::find_for_actor(&self.pool, actor, id)
            .await?
            .ok_or_else(|| HistoryError::not_found("Change record", id))
    }

    /// Every actor's records for one entity, most recent first.
    pub async fn history_for_entity(
        &self,
        collection: &str,
        entity_id: &str,
        limit: Option<i64>,
    ) -> HistoryResult<Vec<ChangeRecord>> {
        let limit = clamp_limit(limit, self.default_limit, self.max_limit);
        Ok(ChangeHistoryRepo::list_for_entity(&self.pool, collection, entity_id, limit).await?)
    }

    /// Audit trail for one entity, most recent first.
    pub async fn audit_trail(
        &self,
        collection: &str,
        entity_id: &str,
        limit: Option<i64>,
    ) -> HistoryResult<Vec<AuditLog>> {
        let limit = clamp_limit(limit, self.default_limit, self.max_limit);
        let collection = self.canonical(collection);
        Ok(AuditLogRepo::list_for_entity(&self.pool, &collection, entity_id, limit).await?)
    }

    /// Reverse one of the actor's records.
    ///
    /// The undone flag, the entity write, and the inverse record commit
    /// together. Any failure rolls all three back, leaving the record
    /// undoable.
    pub async fn undo(&self, actor: &str, id: DbId) -> HistoryResult<ReversalResult> {
        let mut tx = self.pool.begin().await?;

        let Some(record) = ChangeHistoryRepo::mark_undone(&mut *tx, actor, id).await? else {
            return match ChangeHistoryRepo::find_for_actor(&mut *tx, actor, id).await? {
                Some(_) => Err(HistoryError::AlreadyUndone(id)),
                None => Err(HistoryError::not_found("Change record", id)),
            };
        };

        let collection = record.entity_collection.as_str();
        let entity_id = record.entity_id.as_str();
        let change = record
            .change_set()
            .map_err(|e| HistoryError::from_stored(e, collection, entity_id))?;
        let codec = self
            .registry
            .resolve(collection)
            .map_err(HistoryError::from_codec)?;

        match &change {
            ChangeSet::Create { .. } => {
                let removed = codec
                    .delete(&mut *tx, entity_id)
                    .await
                    .map_err(|e| HistoryError::from_restore(e, collection, entity_id))?;
                if !removed {
                    tracing::debug!(collection, entity_id, "Entity already absent on undo of create");
                }
            }
            ChangeSet::Update { before, .. } | ChangeSet::Delete { before } => {
                codec
                    .restore(&mut *tx, entity_id, before)
                    .await
                    .map_err(|e| HistoryError::from_restore(e, collection, entity_id))?;
            }
        }

        let inverse = CreateChangeRecord {
            actor: actor.to_string(),
            entity_collection: record.entity_collection.clone(),
            entity_id: record.entity_id.clone(),
            change: change.inverse(),
        };
        let operation = inverse.change.operation();
        let inverse = ChangeHistoryRepo::insert(&mut *tx, &inverse).await?;
        tx.commit().await?;

        tracing::info!(
            actor,
            collection,
            entity_id,
            record_id = id,
            new_record_id = inverse.id,
            "Change undone"
        );
        self.notifier
            .notify(actor, verbs::UNDO, codec.collection(), entity_id)
            .await;

        Ok(ReversalResult {
            collection: record.entity_collection.clone(),
            entity_id: record.entity_id.clone(),
            operation,
            undone_record_id: id,
            new_record_id: inverse.id,
        })
    }

    /// Canonical collection for notifications. Unresolvable keys are
    /// reported as given.
    fn canonical(&self, collection: &str) -> String {
        self.registry
            .resolve(collection)
            .map(|codec| codec.collection().to_string())
            .unwrap_or_else(|_| collection.to_string())
    }
}
