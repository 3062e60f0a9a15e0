use confsplit_types::TypeError;

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A document or collection name failed validation.
    #[error("invalid name: {0}")]
    InvalidName(#[from] TypeError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be decoded.
    #[error("cannot decode document {document}: {reason}")]
    Decode { document: String, reason: String },

    /// A document could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
