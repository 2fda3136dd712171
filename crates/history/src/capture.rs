//! Snapshot capture: read one logical entity's current persisted state.

use std::sync::Arc;

use mrp_core::snapshot::EntitySnapshot;
use mrp_db::codec::CodecRegistry;
use mrp_db::DbPool;

use crate::error::{HistoryError, HistoryResult};

/// Reads entities through the codec registry. Read-only.
#[derive(Debug, Clone)]
pub struct SnapshotCapture {
    pool: DbPool,
    registry: Arc<CodecRegistry>,
}

impl SnapshotCapture {
    pub fn new(pool: DbPool, registry: Arc<CodecRegistry>) -> Self {
        Self { pool, registry }
    }

    /// Capture the entity and its child rows as one payload.
    ///
    /// The parent and children are read in a single REPEATABLE READ
    /// transaction, so a concurrent writer cannot produce a mixed snapshot.
    pub async fn capture(&self, entity_type: &str, entity_id: &str) -> HistoryResult<EntitySnapshot> {
        let codec = self
            .registry
            .resolve(entity_type)
            .map_err(HistoryError::from_codec)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        let snapshot = codec
            .capture(&mut *tx, entity_id)
            .await
            .map_err(HistoryError::from_codec)?;
        tx.commit().await?;

        snapshot.ok_or_else(|| HistoryError::not_found("Entity", format!("{entity_type}/{entity_id}")))
    }
}
