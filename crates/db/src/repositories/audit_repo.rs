//! Repository for the `audit_logs` table.

use sqlx::PgPool;

use crate::models::audit::{AuditLog, CreateAuditLog};

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str =
    "id, actor, action_type, entity_type, entity_id, summary, details_json, created_at";

/// Provides insert and query operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Insert a single audit log entry.
    pub async fn insert(pool: &PgPool, entry: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let sql = format!(
            "INSERT INTO audit_logs \
                (actor, action_type, entity_type, entity_id, summary, details_json) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&sql)
            .bind(&entry.actor)
            .bind(&entry.action_type)
            .bind(&entry.entity_type)
            .bind(&entry.entity_id)
            .bind(&entry.summary)
            .bind(&entry.details_json)
            .fetch_one(pool)
            .await
    }

    /// Audit entries for one entity, most recent first. Callers clamp `limit`.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: &str,
        limit: i64,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM audit_logs \
             WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY id DESC LIMIT $3"
        );
        sqlx::query_as::<_, AuditLog>(&sql)
            .bind(entity_type)
            .bind(entity_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
