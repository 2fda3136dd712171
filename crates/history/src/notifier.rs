//! Audit and broadcast notification after committed history operations.
//!
//! [`Notifier`] calls both collaborators best-effort: failures are logged
//! and never reach the caller, since the mutation has already committed.

use std::sync::Arc;

use async_trait::async_trait;
use mrp_core::audit;
use mrp_db::models::audit::CreateAuditLog;
use mrp_db::repositories::AuditLogRepo;
use mrp_db::DbPool;
use mrp_events::{EventBus, PlatformEvent};

/// Failure reported by an audit writer or broadcaster.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// Writes one human-readable audit entry.
#[async_trait]
pub trait AuditWriter: Send + Sync {
    async fn log_audit(
        &self,
        actor: &str,
        verb: &str,
        collection: &str,
        entity_id: &str,
        summary: &str,
    ) -> Result<(), NotifyError>;
}

/// Publishes one structured real-time event on behalf of `actor`.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn publish(
        &self,
        event_type: &str,
        entity_id: &str,
        verb: &str,
        actor: &str,
    ) -> Result<(), NotifyError>;
}

/// [`AuditWriter`] backed by the `audit_logs` table.
#[derive(Debug, Clone)]
pub struct DbAuditWriter {
    pool: DbPool,
}

impl DbAuditWriter {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditWriter for DbAuditWriter {
    async fn log_audit(
        &self,
        actor: &str,
        verb: &str,
        collection: &str,
        entity_id: &str,
        summary: &str,
    ) -> Result<(), NotifyError> {
        let entry = CreateAuditLog {
            actor: actor.to_string(),
            action_type: verb.to_string(),
            entity_type: Some(collection.to_string()),
            entity_id: Some(entity_id.to_string()),
            summary: summary.to_string(),
            details_json: None,
        };
        AuditLogRepo::insert(&self.pool, &entry).await?;
        Ok(())
    }
}

#[async_trait]
impl Broadcaster for EventBus {
    async fn publish(
        &self,
        event_type: &str,
        entity_id: &str,
        verb: &str,
        actor: &str,
    ) -> Result<(), NotifyError> {
        EventBus::publish(
            self,
            PlatformEvent::new(event_type, entity_id, verb).with_actor(actor),
        );
        Ok(())
    }
}

/// Discards everything. Used when a collaborator is not wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl AuditWriter for NoopNotifier {
    async fn log_audit(&self, _: &str, _: &str, _: &str, _: &str, _: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[async_trait]
impl Broadcaster for NoopNotifier {
    async fn publish(&self, _: &str, _: &str, _: &str, _: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Fans one committed operation out to the audit writer and broadcaster.
#[derive(Clone)]
pub struct Notifier {
    audit: Arc<dyn AuditWriter>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl Notifier {
    pub fn new(audit: Arc<dyn AuditWriter>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self { audit, broadcaster }
    }

    /// A notifier that drops every notification.
    pub fn noop() -> Self {
        Self::new(Arc::new(NoopNotifier), Arc::new(NoopNotifier))
    }

    /// Audit to `audit_logs` and broadcast on `bus`.
    pub fn with_database(pool: DbPool, bus: Arc<EventBus>) -> Self {
        Self::new(Arc::new(DbAuditWriter::new(pool)), bus)
    }

    /// Report `verb` on one entity. Never fails.
    pub async fn notify(&self, actor: &str, verb: &str, collection: &str, entity_id: &str) {
        let summary = audit::summary(actor, verb, collection, entity_id);
        if let Err(e) = self
            .audit
            .log_audit(actor, verb, collection, entity_id, &summary)
            .await
        {
            tracing::warn!(
                error = %e,
                actor,
                verb,
                collection,
                entity_id,
                "Failed to write audit entry"
            );
        }

        let event_type = audit::event_type(collection, verb);
        if let Err(e) = self
            .broadcaster
            .publish(&event_type, entity_id, verb, actor)
            .await
        {
            tracing::warn!(
                error = %e,
                event_type = %event_type,
                entity_id,
                "Failed to broadcast event"
            );
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
