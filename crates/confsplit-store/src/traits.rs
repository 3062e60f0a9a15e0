use std::sync::Arc;

use confsplit_types::ConfigValue;

use crate::error::StoreResult;

/// Name of the default collection every storage starts in.
pub const DEFAULT_COLLECTION: &str = "";

/// Keyed document storage partitioned into named collections.
///
/// All implementations must satisfy these invariants:
/// - A storage handle is bound to exactly one collection; documents in
///   other collections are invisible to `read`/`write`/`list_all`.
/// - `create_collection` is a pure binding: it returns a handle without
///   creating physical state. Collections materialize on first write.
/// - Writes are atomic per document, last write wins. Nothing is assumed
///   atomic across documents.
/// - Document and collection names are validated before any backend state
///   is touched.
/// - All I/O errors are propagated, never silently ignored.
pub trait Storage: Send + Sync {
    /// Check whether a document exists in the bound collection.
    ///
    /// Default implementation reads the document and discards it. Backends
    /// may override to avoid decoding.
    fn exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.read(name)?.is_some())
    }

    /// Read a document by name.
    ///
    /// Returns `Ok(None)` if the document does not exist.
    /// Returns `Err` on I/O failure or an undecodable document.
    fn read(&self, name: &str) -> StoreResult<Option<ConfigValue>>;

    /// Read multiple documents in a batch, in input order.
    ///
    /// Default implementation calls `read()` for each name. Backends may
    /// override for better performance.
    fn read_multiple(&self, names: &[&str]) -> StoreResult<Vec<Option<ConfigValue>>> {
        names.iter().map(|name| self.read(name)).collect()
    }

    /// Write a document, replacing any previous value under `name`.
    fn write(&self, name: &str, value: &ConfigValue) -> StoreResult<()>;

    /// Delete a document by name. Returns `true` if the document existed.
    fn delete(&self, name: &str) -> StoreResult<bool>;

    /// Move a document to a new name. Returns `false` when the source
    /// document does not exist.
    ///
    /// Default implementation is read, write, delete; not atomic.
    fn rename(&self, name: &str, new_name: &str) -> StoreResult<bool> {
        match self.read(name)? {
            Some(value) => {
                self.write(new_name, &value)?;
                self.delete(name)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sorted names of all documents in the bound collection whose name
    /// starts with `prefix`. An empty prefix lists everything.
    fn list_all(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Delete every document whose name starts with `prefix`. Returns the
    /// number of documents deleted.
    fn delete_all(&self, prefix: &str) -> StoreResult<usize> {
        let mut deleted = 0;
        for name in self.list_all(prefix)? {
            if self.delete(&name)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Name of the collection this handle is bound to.
    /// [`DEFAULT_COLLECTION`] for the default.
    fn collection_name(&self) -> &str;

    /// Bind a handle to the named collection of the same storage.
    ///
    /// Passing [`DEFAULT_COLLECTION`] binds the default collection. The
    /// binding itself creates nothing; the collection appears in
    /// `collection_names` once a document is written through it.
    fn create_collection(&self, name: &str) -> StoreResult<Arc<dyn Storage>>;

    /// Sorted names of every non-default collection that currently holds
    /// at least one document, regardless of which collection this handle
    /// is bound to.
    fn collection_names(&self) -> StoreResult<Vec<String>>;
}
