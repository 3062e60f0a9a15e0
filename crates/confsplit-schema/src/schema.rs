//! Per-document schema descriptions.
//!
//! A [`DocumentSchema`] records the structural facts the diff engine needs
//! about one document type, all keyed by dotted paths (see [`crate::path`]):
//! the declared key order of its mappings, which sequences are semantically
//! unordered sets, and how many leading leaf values identify an item of a
//! composite sequence.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Identity width assumed for composite sequences the schema says nothing
/// about.
pub const DEFAULT_IDENTITY_WIDTH: usize = 1;

/// Structural description of one document type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentSchema {
    /// Declared key order per mapping path. The root mapping is path `""`.
    key_order: BTreeMap<String, Vec<String>>,
    /// Paths of sequences whose element order carries no meaning.
    unordered_sequences: BTreeSet<String>,
    /// Identity widths per composite sequence path.
    identity_widths: BTreeMap<String, usize>,
}

impl DocumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the key order of the mapping at `path`.
    pub fn with_key_order<I, S>(mut self, path: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_order
            .insert(path.to_owned(), keys.into_iter().map(Into::into).collect());
        self
    }

    /// Marks the sequence at `path` as a semantically unordered set.
    pub fn with_unordered_sequence(mut self, path: &str) -> Self {
        self.unordered_sequences.insert(path.to_owned());
        self
    }

    /// Declares how many leading leaf values identify an item of the
    /// composite sequence at `path`.
    pub fn with_identity_width(mut self, path: &str, width: usize) -> Self {
        self.identity_widths.insert(path.to_owned(), width);
        self
    }

    /// Declared key order of the mapping at `path`, if any.
    pub fn key_order_at(&self, path: &str) -> Option<&[String]> {
        self.key_order.get(path).map(Vec::as_slice)
    }

    /// Whether the sequence at `path` is an unordered set.
    pub fn is_unordered_sequence(&self, path: &str) -> bool {
        self.unordered_sequences.contains(path)
    }

    /// Identity width of the composite sequence at `path`.
    ///
    /// Undeclared paths and declared widths of zero fall back to
    /// [`DEFAULT_IDENTITY_WIDTH`].
    pub fn identity_width(&self, path: &str) -> usize {
        self.identity_widths
            .get(path)
            .copied()
            .filter(|width| *width > 0)
            .unwrap_or(DEFAULT_IDENTITY_WIDTH)
    }
}
