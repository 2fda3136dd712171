//! Entity codecs: capture, restore, and delete for one entity type.
//!
//! [`TableCodec`] is driven by a static [`TableSpec`] from the [`catalog`]
//! and handles both flat entities and parent/child aggregates.
//! [`GenericCodec`] is the fallback for collections without a table entry; it
//! treats the payload as an arbitrary column map and validates every
//! identifier through [`mrp_core::identifier`] before building SQL.
//! [`CodecRegistry`] maps entity-type and collection keys to codecs.
//!
//! Codecs never open their own top-level transaction. Each write method
//! nests a transaction (a savepoint when the caller already holds one),
//! so a parent row and its children are written all-or-nothing.

use async_trait::async_trait;
use mrp_core::error::CoreError;
use mrp_core::snapshot::EntitySnapshot;
use sqlx::PgConnection;

pub mod catalog;
pub mod generic;
pub mod registry;
mod sql;
pub mod table;

pub use generic::GenericCodec;
pub use registry::CodecRegistry;
pub use table::{ChildSpec, TableCodec, TableSpec};

/// Failure while capturing, restoring, or deleting an entity.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Unsupported entity: {0}")]
    UnsupportedEntity(String),

    #[error("Invalid snapshot payload: {0}")]
    InvalidPayload(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<CoreError> for CodecError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidIdentifier(name) => Self::InvalidIdentifier(name),
            CoreError::InvalidPayload(msg) => Self::InvalidPayload(msg),
            CoreError::UnsupportedOperation(op) => {
                Self::InvalidPayload(format!("unsupported operation '{op}'"))
            }
            CoreError::Validation(msg) => Self::UnsupportedEntity(msg),
        }
    }
}

/// Per-entity-type persistence strategy used by both history logs.
#[async_trait]
pub trait EntityCodec: Send + Sync + std::fmt::Debug {
    /// Canonical collection (table) name, used for audit and events.
    fn collection(&self) -> &str;

    /// Read the entity and any child rows. `None` if the entity is absent.
    ///
    /// Run inside a REPEATABLE READ transaction to capture an aggregate
    /// from a single point in time.
    async fn capture(
        &self,
        conn: &mut PgConnection,
        entity_id: &str,
    ) -> Result<Option<EntitySnapshot>, CodecError>;

    /// Upsert the entity from `snapshot`, keyed by `entity_id`.
    ///
    /// Child rows, when the snapshot carries them, replace the current set.
    /// Applying the same snapshot twice leaves the same final state.
    async fn restore(
        &self,
        conn: &mut PgConnection,
        entity_id: &str,
        snapshot: &EntitySnapshot,
    ) -> Result<(), CodecError>;

    /// Remove the entity and its child rows. Returns `false` if it was
    /// already gone.
    async fn delete(&self, conn: &mut PgConnection, entity_id: &str) -> Result<bool, CodecError>;
}
