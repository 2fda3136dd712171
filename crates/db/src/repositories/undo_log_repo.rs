//! Repository for the ephemeral `undo_log` table.
//!
//! Every read takes the caller's `now` and excludes rows at or past
//! `expires_at`, so correctness never depends on the expiry sweep.

use mrp_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::undo_entry::{CreateUndoEntry, UndoEntry};

/// Column list for `undo_log` queries.
const COLUMNS: &str =
    "id, actor, action, entity_type, entity_id, snapshot_payload, created_at, expires_at";

/// Provides insert, listing, single-shot take, and sweep for undo entries.
pub struct UndoLogRepo;

impl UndoLogRepo {
    /// Insert a new undo entry.
    pub async fn insert(pool: &PgPool, input: &CreateUndoEntry) -> Result<UndoEntry, sqlx::Error> {
        let sql = format!(
            "INSERT INTO undo_log \
                (actor, action, entity_type, entity_id, snapshot_payload, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UndoEntry>(&sql)
            .bind(&input.actor)
            .bind(&input.action)
            .bind(&input.entity_type)
            .bind(&input.entity_id)
            .bind(&input.snapshot_payload)
            .bind(input.created_at)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// The actor's unexpired entries, most recent first.
    pub async fn list_active_for_actor(
        pool: &PgPool,
        actor: &str,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<UndoEntry>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM undo_log \
             WHERE actor = $1 AND expires_at > $2 \
             ORDER BY id DESC LIMIT $3"
        );
        sqlx::query_as::<_, UndoEntry>(&sql)
            .bind(actor)
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Atomically remove and return the actor's unexpired entry.
    ///
    /// A concurrent second caller (or a sweep that got there first) sees
    /// `None`. Run inside the restore transaction so a failed restore puts
    /// the row back on rollback.
    pub async fn take_active<'e, E>(
        executor: E,
        actor: &str,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<UndoEntry>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "DELETE FROM undo_log \
             WHERE id = $1 AND actor = $2 AND expires_at > $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UndoEntry>(&sql)
            .bind(id)
            .bind(actor)
            .bind(now)
            .fetch_optional(executor)
            .await
    }

    /// Find the actor's entry regardless of expiry.
    ///
    /// Only used to tell an expired entry apart from a missing one.
    pub async fn find_for_actor<'e, E>(
        executor: E,
        actor: &str,
        id: DbId,
    ) -> Result<Option<UndoEntry>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT {COLUMNS} FROM undo_log WHERE id = $1 AND actor = $2");
        sqlx::query_as::<_, UndoEntry>(&sql)
            .bind(id)
            .bind(actor)
            .fetch_optional(executor)
            .await
    }

    /// Delete every entry at or past its expiry. Returns the number removed.
    pub async fn delete_expired(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM undo_log WHERE expires_at <= $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
