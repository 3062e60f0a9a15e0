//! Structural diffing for configuration documents.
//!
//! This crate turns two versions of a document into an invertible [`Patch`]
//! and applies patches onto documents that may have drifted in the meantime.
//! Schemas from `confsplit-schema` drive a canonicalization pass, so that
//! key order and unordered sequence order never register as changes, and
//! give sequences of mappings stable per-item identities so edits inside
//! one item stay local to that item.
//!
//! # Key Types
//!
//! - [`PatchEngine`] -- schema-aware `diff` and merge-tolerant `apply`.
//! - [`Patch`] -- paired `added`/`removed` trees; inverts by swapping them.
//! - [`Canonicalizer`] -- rewrites documents into their canonical form.
//! - [`SequenceMatcher`] / [`IdentityMatcher`] -- pair sequence items across
//!   versions by identity rather than position.
//! - [`PatchError`] -- failures when decoding a persisted patch document.

pub mod canonical;
pub mod engine;
pub mod error;
pub mod patch;
pub mod sequence;

pub use canonical::Canonicalizer;
pub use engine::PatchEngine;
pub use error::{PatchError, PatchResult};
pub use patch::{patch_document_name, Patch, ADDED_KEY, PATCH_DOCUMENT_PREFIX, REMOVED_KEY};
pub use sequence::{IdentityMatcher, MatchedPair, SequenceMatcher};
