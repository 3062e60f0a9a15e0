//! Insertion-ordered mapping of unique string keys to configuration values.
//!
//! Configuration documents care about key order: serialization formats keep
//! it, schemas declare it, and the canonicalizer rewrites it. A sorted map
//! would destroy the order a writer chose, so [`Mapping`] preserves insertion
//! order and replaces values in place when a key is written again.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::ConfigValue;

/// Insertion-ordered map of unique string keys to [`ConfigValue`]s.
///
/// Lookups scan linearly; configuration mappings are small (tens of keys),
/// so ordering semantics win over asymptotics here. Equality is
/// order-sensitive: two mappings with the same entries in a different
/// order are *not* equal. Order-insensitive comparison is what
/// canonicalization is for.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, ConfigValue)>,
}

impl Mapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mapping with space reserved for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Build a mapping from key/value pairs. Later duplicates replace
    /// earlier ones in place, like repeated [`insert`](Self::insert) calls.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, ConfigValue)>,
        K: Into<String>,
    {
        let mut mapping = Self::new();
        for (key, value) in pairs {
            mapping.insert(key, value);
        }
        mapping
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Look up a value by key, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert a key/value pair.
    ///
    /// If `key` is already present its value is replaced *in place* (the
    /// entry keeps its position) and the previous value is returned.
    /// Otherwise the entry is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: ConfigValue) -> Option<ConfigValue> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Remove an entry by key, returning its value. The relative order of
    /// the remaining entries is preserved.
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &ConfigValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, ConfigValue)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, ConfigValue)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl IntoIterator for Mapping {
    type Item = (String, ConfigValue);
    type IntoIter = std::vec::IntoIter<(String, ConfigValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Mapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct MappingVisitor;

impl<'de> Visitor<'de> for MappingVisitor {
    type Value = Mapping;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of string keys to configuration values")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut mapping = Mapping::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, ConfigValue>()? {
            // Duplicate keys in the input: last one wins, position kept.
            mapping.insert(key, value);
        }
        Ok(mapping)
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MappingVisitor)
    }
}
