//! Foundation types for confsplit.
//!
//! This crate provides the value model shared by the diff engine and the
//! storage layer: scalar leaves, insertion-ordered mappings, and recursive
//! configuration trees, plus the name rules that keep documents addressable
//! across storage backends. Every other confsplit crate depends on
//! `confsplit-types`.
//!
//! # Key Types
//!
//! - [`ConfigValue`] -- A node in a configuration tree (scalar, mapping, or sequence)
//! - [`Scalar`] -- Leaf values: null, bool, int, float, string
//! - [`Mapping`] -- String-keyed map that preserves insertion order
//! - [`TypeError`] -- Conversion and validation failures

pub mod error;
pub mod mapping;
pub mod name;
pub mod value;

pub use error::TypeError;
pub use mapping::Mapping;
pub use name::{validate_collection_name, validate_document_name, MAX_NAME_LENGTH};
pub use value::{ConfigValue, Scalar};
