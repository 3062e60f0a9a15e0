//! The invertible delta between two versions of a document.

use confsplit_types::{ConfigValue, Mapping};

use crate::error::{PatchError, PatchResult};

/// Key of the added tree in a persisted patch document.
pub const ADDED_KEY: &str = "added";

/// Key of the removed tree in a persisted patch document.
pub const REMOVED_KEY: &str = "removed";

/// Name prefix under which patch documents are persisted.
pub const PATCH_DOCUMENT_PREFIX: &str = "confsplit.patch.";

/// Storage name of the patch document tracking `target`.
///
/// # Examples
///
/// ```
/// use confsplit_diff::patch_document_name;
///
/// assert_eq!(
///     patch_document_name("demo.settings"),
///     "confsplit.patch.demo.settings"
/// );
/// ```
pub fn patch_document_name(target: &str) -> String {
    format!("{PATCH_DOCUMENT_PREFIX}{target}")
}

/// A structural delta between two versions of a document.
///
/// Both trees mirror the document's shape. A key present in only one tree is
/// a wholesale addition or removal of that value. A key present in *both*
/// trees with mapping values on both sides is a nested sub-patch: either a
/// patch over a child mapping, or a patch over a composite sequence keyed by
/// item identity tokens. Absence is the missing-value sentinel, so an empty
/// mapping on one side of a sub-patch is meaningful and kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    /// Values the new version carries that the old one does not.
    pub added: Mapping,
    /// Values the old version carries that the new one does not.
    pub removed: Mapping,
}

impl Patch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// The patch that undoes this one.
    ///
    /// Sub-patches are stored as parallel subtrees of `added` and `removed`,
    /// so swapping the two roots inverts every nesting level at once.
    pub fn invert(self) -> Self {
        Self {
            added: self.removed,
            removed: self.added,
        }
    }

    /// Renders the patch as an ordinary document for persistence.
    ///
    /// The document is a mapping holding exactly [`ADDED_KEY`] then
    /// [`REMOVED_KEY`].
    pub fn to_document(&self) -> ConfigValue {
        let mut document = Mapping::with_capacity(2);
        document.insert(ADDED_KEY, ConfigValue::Mapping(self.added.clone()));
        document.insert(REMOVED_KEY, ConfigValue::Mapping(self.removed.clone()));
        ConfigValue::Mapping(document)
    }

    /// Decodes a patch persisted by [`to_document`](Self::to_document).
    pub fn from_document(document: &ConfigValue) -> PatchResult<Self> {
        let mapping = document.as_mapping().ok_or(PatchError::NotAMapping {
            kind: document.kind(),
        })?;

        for (key, _) in mapping.iter() {
            if key != ADDED_KEY && key != REMOVED_KEY {
                return Err(PatchError::UnexpectedKey {
                    key: key.to_owned(),
                });
            }
        }

        Ok(Self {
            added: tree(mapping, ADDED_KEY)?,
            removed: tree(mapping, REMOVED_KEY)?,
        })
    }
}

fn tree(mapping: &Mapping, field: &'static str) -> PatchResult<Mapping> {
    let value = mapping.get(field).ok_or(PatchError::MissingTree { field })?;
    value
        .as_mapping()
        .cloned()
        .ok_or(PatchError::TreeNotAMapping {
            field,
            kind: value.kind(),
        })
}
