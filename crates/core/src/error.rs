#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Unsupported operation '{0}'. Must be one of: create, update, delete")]
    UnsupportedOperation(String),

    #[error("Invalid snapshot payload: {0}")]
    InvalidPayload(String),
}
