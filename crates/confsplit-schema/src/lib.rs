//! Schema descriptions for confsplit documents.
//!
//! Schemas tell the diff engine what it cannot learn from a document alone:
//! the canonical key order of its mappings, which sequences are semantically
//! unordered sets, and how many leading leaf values identify an item of a
//! composite sequence. Schemas are advisory. Every consumer degrades to
//! schema-free behavior when lookup fails, so an empty registry is always a
//! valid starting point.
//!
//! # Key Types
//!
//! - [`DocumentSchema`] -- Structural facts about one document type, keyed by dotted paths
//! - [`SchemaRegistry`] -- Lookup of the schema governing a named document
//! - [`StaticSchemaRegistry`] -- In-memory registry with exact and trailing-wildcard patterns
//! - [`SchemaError`] -- Registry construction failures

pub mod error;
pub mod path;
pub mod registry;
pub mod schema;

pub use error::{SchemaError, SchemaResult};
pub use registry::{SchemaRegistry, StaticSchemaRegistry};
pub use schema::{DocumentSchema, DEFAULT_IDENTITY_WIDTH};
