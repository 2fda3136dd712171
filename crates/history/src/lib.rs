//! Reversible change tracking.
//!
//! - [`change_log::ChangeLog`]: durable mutation ledger with exactly-once
//!   undo and redo through inverse records.
//! - [`undo_log::UndoLog`]: single-shot, per-actor snapshots bounded by a
//!   TTL.
//! - [`capture::SnapshotCapture`]: point-in-time reads of one entity.
//! - [`notifier::Notifier`]: best-effort audit and broadcast after commit.
//! - [`sweep`]: background cleanup of expired entries.
//!
//! [`History`] wires all of them over one pool and codec registry.

use std::sync::Arc;

use mrp_db::codec::CodecRegistry;
use mrp_db::DbPool;

pub mod capture;
pub mod change_log;
pub mod config;
pub mod error;
pub mod notifier;
pub mod sweep;
pub mod undo_log;

pub use capture::SnapshotCapture;
pub use change_log::{ChangeLog, ReversalResult};
pub use config::HistoryConfig;
pub use error::{HistoryError, HistoryResult};
pub use notifier::{AuditWriter, Broadcaster, DbAuditWriter, Notifier, NotifyError};
pub use undo_log::{RestoreSummary, UndoLog};

/// The history services sharing one pool, registry, and notifier.
#[derive(Debug, Clone)]
pub struct History {
    pub capture: SnapshotCapture,
    pub changes: ChangeLog,
    pub undo: UndoLog,
}

impl History {
    pub fn new(pool: DbPool, registry: CodecRegistry, notifier: Notifier, config: &HistoryConfig) -> Self {
        let registry = Arc::new(registry);
        Self {
            capture: SnapshotCapture::new(pool.clone(), Arc::clone(&registry)),
            changes: ChangeLog::new(pool.clone(), Arc::clone(&registry), notifier.clone(), config),
            undo: UndoLog::new(pool, registry, notifier, config),
        }
    }
}
