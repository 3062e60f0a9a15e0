use thiserror::Error;

/// Errors produced by value and name operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("number {0} cannot be represented as a configuration scalar")]
    UnrepresentableNumber(String),
}
