use mrp_core::error::CoreError;
use mrp_core::types::DbId;
use mrp_db::codec::CodecError;

/// Typed failures surfaced by the change log, undo log, and capture.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Record/entry/entity absent, or not owned by the actor.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Change record {0} has already been undone")]
    AlreadyUndone(DbId),

    #[error("Undo entry {0} has expired")]
    Expired(DbId),

    #[error("Unsupported operation '{0}'. Must be one of: create, update, delete")]
    UnsupportedOperation(String),

    #[error("Unsupported entity: {0}")]
    UnsupportedEntity(String),

    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// The store rejected the restore/delete, or the stored payload could
    /// not be decoded. The reversal was rolled back.
    #[error("Restore of {collection} {entity_id} failed: {source}")]
    Restore {
        collection: String,
        entity_id: String,
        #[source]
        source: CodecError,
    },

    /// The store was unavailable outside of a restore.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for history operation results.
pub type HistoryResult<T> = Result<T, HistoryError>;

impl HistoryError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Classify a codec failure raised while writing entity state.
    pub(crate) fn from_restore(err: CodecError, collection: &str, entity_id: &str) -> Self {
        match err {
            CodecError::InvalidIdentifier(name) => Self::InvalidIdentifier(name),
            CodecError::UnsupportedEntity(msg) => Self::UnsupportedEntity(msg),
            source @ (CodecError::InvalidPayload(_) | CodecError::Database(_)) => Self::Restore {
                collection: collection.to_string(),
                entity_id: entity_id.to_string(),
                source,
            },
        }
    }

    /// Classify a codec failure raised while resolving or reading state.
    pub(crate) fn from_codec(err: CodecError) -> Self {
        match err {
            CodecError::InvalidIdentifier(name) => Self::InvalidIdentifier(name),
            CodecError::UnsupportedEntity(msg) | CodecError::InvalidPayload(msg) => {
                Self::UnsupportedEntity(msg)
            }
            CodecError::Database(e) => Self::Database(e),
        }
    }

    /// Classify a failure decoding a stored change record.
    pub(crate) fn from_stored(err: CoreError, collection: &str, entity_id: &str) -> Self {
        match err {
            CoreError::UnsupportedOperation(op) => Self::UnsupportedOperation(op),
            other => Self::from_restore(CodecError::from(other), collection, entity_id),
        }
    }
}
