//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods that take part in a reversal accept any [`sqlx::PgExecutor`] so
//! callers can run them inside a transaction; the rest take `&PgPool`.

pub mod audit_repo;
pub mod change_history_repo;
pub mod undo_log_repo;

pub use audit_repo::AuditLogRepo;
pub use change_history_repo::ChangeHistoryRepo;
pub use undo_log_repo::UndoLogRepo;
