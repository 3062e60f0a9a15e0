use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use confsplit_types::{validate_collection_name, validate_document_name, ConfigValue};

use crate::error::StoreResult;
use crate::traits::{Storage, DEFAULT_COLLECTION};

type Collections = HashMap<String, HashMap<String, ConfigValue>>;

/// In-memory, HashMap-based document storage.
///
/// Intended for tests and embedding. All collections live in one map behind
/// a `RwLock`; handles produced by `create_collection` share it through an
/// `Arc`, so a write through one handle is visible through every other.
/// Documents are cloned on read/write.
pub struct InMemoryStorage {
    collections: Arc<RwLock<Collections>>,
    collection: String,
}

impl InMemoryStorage {
    /// Create a new empty storage bound to the default collection.
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    /// Number of documents in the bound collection.
    pub fn len(&self) -> usize {
        self.collections
            .read()
            .expect("lock poisoned")
            .get(&self.collection)
            .map_or(0, HashMap::len)
    }

    /// Returns `true` if the bound collection holds no documents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all documents from the bound collection.
    pub fn clear(&self) {
        let mut map = self.collections.write().expect("lock poisoned");
        if let Some(collection) = map.get_mut(&self.collection) {
            collection.clear();
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for InMemoryStorage {
    fn read(&self, name: &str) -> StoreResult<Option<ConfigValue>> {
        validate_document_name(name)?;
        let map = self.collections.read().expect("lock poisoned");
        Ok(map
            .get(&self.collection)
            .and_then(|collection| collection.get(name))
            .cloned())
    }

    fn write(&self, name: &str, value: &ConfigValue) -> StoreResult<()> {
        validate_document_name(name)?;
        let mut map = self.collections.write().expect("lock poisoned");
        map.entry(self.collection.clone())
            .or_default()
            .insert(name.to_string(), value.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        validate_document_name(name)?;
        let mut map = self.collections.write().expect("lock poisoned");
        match map.get_mut(&self.collection) {
            Some(collection) => Ok(collection.remove(name).is_some()),
            None => Ok(false),
        }
    }

    fn list_all(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let map = self.collections.read().expect("lock poisoned");
        let mut names: Vec<String> = map
            .get(&self.collection)
            .map(|collection| {
                collection
                    .keys()
                    .filter(|name| name.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn create_collection(&self, name: &str) -> StoreResult<Arc<dyn Storage>> {
        if name != DEFAULT_COLLECTION {
            validate_collection_name(name)?;
        }
        Ok(Arc::new(Self {
            collections: Arc::clone(&self.collections),
            collection: name.to_string(),
        }))
    }

    fn collection_names(&self) -> StoreResult<Vec<String>> {
        let map = self.collections.read().expect("lock poisoned");
        let mut names: Vec<String> = map
            .iter()
            .filter(|(name, collection)| {
                name.as_str() != DEFAULT_COLLECTION && !collection.is_empty()
            })
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStorage")
            .field("collection", &self.collection)
            .field("document_count", &self.len())
            .finish()
    }
}
