//! Document storage for confsplit.
//!
//! Documents are `ConfigValue` trees addressed by validated dotted names
//! and partitioned into named collections. The [`Storage`] trait is the
//! boundary the diff engine's callers persist through; two backends
//! implement it directly, and [`CollectionStorage`] grafts a whole virtual
//! storage onto a prefixed region of another one, which is how a split's
//! documents share a backing store without colliding with the active set.
//!
//! # Key Types
//!
//! - [`Storage`] -- the storage contract; collections materialize on first
//!   write.
//! - [`InMemoryStorage`] -- `HashMap` backend for tests and embedding.
//! - [`DirectoryStorage`] -- one JSON file per document on disk.
//! - [`CollectionStorage`] -- deterministic `(prefix, split id)` grafting
//!   decorator.
//! - [`copy_storage`] / [`copy_collection`] / [`copy_filtered`] -- bulk
//!   replacement between storages.
//! - [`StoreError`] -- I/O, decode, and name validation failures.

pub mod collection;
pub mod copy;
pub mod directory;
pub mod error;
pub mod memory;
pub mod traits;

pub use collection::{CollectionStorage, GRAFT_PREFIX};
pub use copy::{copy_collection, copy_filtered, copy_storage};
pub use directory::DirectoryStorage;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStorage;
pub use traits::{Storage, DEFAULT_COLLECTION};
