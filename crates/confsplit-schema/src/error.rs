//! Error types for schema loading.

use thiserror::Error;

/// Errors raised while building a schema registry.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema document could not be parsed.
    #[error("malformed schema document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A registered pattern is not a valid document name pattern.
    #[error("invalid schema pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Result alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
