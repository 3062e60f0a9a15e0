use std::sync::Arc;

use confsplit_types::ConfigValue;

use crate::error::StoreResult;
use crate::traits::{Storage, DEFAULT_COLLECTION};

/// Collection-name prefix of the default grafting family.
pub const GRAFT_PREFIX: &str = "split.";

/// Grafts a virtual storage onto a named region of another storage.
///
/// A `CollectionStorage` is a full [`Storage`] whose collections are
/// physically collections of the inner storage, renamed by a pure function
/// of `(prefix, split_id)`:
///
/// ```text
/// default collection      -> <prefix><split_id>
/// virtual collection "c"  -> <prefix><split_id>.c
/// ```
///
/// Because the mapping is deterministic, binding the same split twice
/// always lands on the same physical collections, and decorators nest:
/// wrapping a `CollectionStorage` around another one composes the physical
/// names verbatim. Two splits with the same prefix stay isolated as long
/// as no split id equals another id followed by a dotted suffix; that id
/// shape is the caller's responsibility and is not checked here.
pub struct CollectionStorage {
    source: Arc<dyn Storage>,
    delegate: Arc<dyn Storage>,
    prefix: String,
    split_id: String,
    collection: String,
}

impl CollectionStorage {
    /// Graft `split_id` onto `source` under the default [`GRAFT_PREFIX`],
    /// bound to the split's default collection.
    pub fn new(source: Arc<dyn Storage>, split_id: &str) -> StoreResult<Self> {
        Self::with_prefix(source, GRAFT_PREFIX, split_id)
    }

    /// Graft under a different prefix, for a logically distinct family of
    /// grafts over the same inner storage.
    pub fn with_prefix(source: Arc<dyn Storage>, prefix: &str, split_id: &str) -> StoreResult<Self> {
        let delegate = source.create_collection(&format!("{prefix}{split_id}"))?;
        Ok(Self {
            source,
            delegate,
            prefix: prefix.to_string(),
            split_id: split_id.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        })
    }

    /// The split id this decorator grafts.
    pub fn split_id(&self) -> &str {
        &self.split_id
    }

    /// Physical name of this handle's collection in the inner storage.
    pub fn physical_collection(&self) -> &str {
        self.delegate.collection_name()
    }

    fn physical_name(&self, collection: &str) -> String {
        let base = format!("{}{}", self.prefix, self.split_id);
        if collection == DEFAULT_COLLECTION {
            base
        } else {
            format!("{base}.{collection}")
        }
    }
}

impl Storage for CollectionStorage {
    fn read(&self, name: &str) -> StoreResult<Option<ConfigValue>> {
        self.delegate.read(name)
    }

    fn write(&self, name: &str, value: &ConfigValue) -> StoreResult<()> {
        self.delegate.write(name, value)
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        self.delegate.delete(name)
    }

    fn list_all(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.delegate.list_all(prefix)
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn create_collection(&self, name: &str) -> StoreResult<Arc<dyn Storage>> {
        let delegate = self.source.create_collection(&self.physical_name(name))?;
        Ok(Arc::new(Self {
            source: Arc::clone(&self.source),
            delegate,
            prefix: self.prefix.clone(),
            split_id: self.split_id.clone(),
            collection: name.to_string(),
        }))
    }

    fn collection_names(&self) -> StoreResult<Vec<String>> {
        let marker = format!("{}{}.", self.prefix, self.split_id);
        let names = self.source.collection_names()?;
        Ok(names
            .into_iter()
            .filter_map(|name| name.strip_prefix(&marker).map(str::to_string))
            .collect())
    }
}

impl std::fmt::Debug for CollectionStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionStorage")
            .field("prefix", &self.prefix)
            .field("split_id", &self.split_id)
            .field("collection", &self.collection)
            .finish()
    }
}
