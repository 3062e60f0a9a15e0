//! Error types for the diff engine.
//!
//! Diffing, applying, and inverting are total over well-typed value trees,
//! so the only fallible operation here is decoding a persisted patch
//! document.

use thiserror::Error;

/// Errors raised while decoding a persisted patch document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// The document root is not a mapping.
    #[error("patch document must be a mapping, got {kind}")]
    NotAMapping { kind: &'static str },

    /// One of the two patch trees is missing.
    #[error("patch document is missing its {field:?} tree")]
    MissingTree { field: &'static str },

    /// The document carries a key besides the two patch trees.
    #[error("patch document holds an unexpected key {key:?}")]
    UnexpectedKey { key: String },

    /// A patch tree is present but not a mapping.
    #[error("patch tree {field:?} must be a mapping, got {kind}")]
    TreeNotAMapping {
        field: &'static str,
        kind: &'static str,
    },
}

/// Result alias for patch decoding.
pub type PatchResult<T> = Result<T, PatchError>;
