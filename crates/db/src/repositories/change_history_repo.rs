//! Repository for the append-only `change_history` table.

use mrp_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::change_record::{ChangeRecord, CreateChangeRecord};

/// Column list for `change_history` queries.
const COLUMNS: &str = "id, entity_collection, entity_id, operation, before_payload, \
    after_payload, actor, created_at, undone";

/// Provides append, lookup, and the undone compare-and-set for change records.
pub struct ChangeHistoryRepo;

impl ChangeHistoryRepo {
    /// Append one record. `undone` always starts as `false`.
    pub async fn insert<'e, E>(
        executor: E,
        input: &CreateChangeRecord,
    ) -> Result<ChangeRecord, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let operation = input.change.operation();
        let (before, after) = input.change.clone().into_payloads();

        let sql = format!(
            "INSERT INTO change_history \
                (entity_collection, entity_id, operation, before_payload, after_payload, actor) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChangeRecord>(&sql)
            .bind(&input.entity_collection)
            .bind(&input.entity_id)
            .bind(operation.as_str())
            .bind(before.map(|s| s.to_value()))
            .bind(after.map(|s| s.to_value()))
            .bind(&input.actor)
            .fetch_one(executor)
            .await
    }

    /// Find a record by id, scoped to the actor that created it.
    pub async fn find_for_actor<'e, E>(
        executor: E,
        actor: &str,
        id: DbId,
    ) -> Result<Option<ChangeRecord>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT {COLUMNS} FROM change_history WHERE id = $1 AND actor = $2");
        sqlx::query_as::<_, ChangeRecord>(&sql)
            .bind(id)
            .bind(actor)
            .fetch_optional(executor)
            .await
    }

    /// The actor's own records, most recent first.
    pub async fn list_recent_for_actor(
        pool: &PgPool,
        actor: &str,
        limit: i64,
    ) -> Result<Vec<ChangeRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM change_history \
             WHERE actor = $1 ORDER BY id DESC LIMIT $2"
        );
        sqlx::query_as::<_, ChangeRecord>(&sql)
            .bind(actor)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Every actor's records for one entity, most recent first.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_collection: &str,
        entity_id: &str,
        limit: i64,
    ) -> Result<Vec<ChangeRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM change_history \
             WHERE entity_collection = $1 AND entity_id = $2 \
             ORDER BY id DESC LIMIT $3"
        );
        sqlx::query_as::<_, ChangeRecord>(&sql)
            .bind(entity_collection)
            .bind(entity_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Flip `undone` to `true` if and only if it is currently `false`.
    ///
    /// This is the single conditional write that makes reversal
    /// exactly-once: of two concurrent callers, only one gets `Some`.
    pub async fn mark_undone<'e, E>(
        executor: E,
        actor: &str,
        id: DbId,
    ) -> Result<Option<ChangeRecord>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "UPDATE change_history SET undone = true \
             WHERE id = $1 AND actor = $2 AND undone = false \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChangeRecord>(&sql)
            .bind(id)
            .bind(actor)
            .fetch_optional(executor)
            .await
    }

    /// Delete records created before `cutoff`. Returns the number removed.
    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM change_history WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
