//! Dotted paths addressing positions inside a document.
//!
//! The empty path addresses the document root. Mapping keys extend a path
//! with `.key`, and the elements of a sequence are addressed collectively by
//! the [`ITEM_SEGMENT`] wildcard, so `servers.*.port` names the `port` field
//! of every item in the `servers` sequence.

/// Path segment standing for every element of a sequence.
pub const ITEM_SEGMENT: &str = "*";

/// Extends `base` with a mapping key.
pub fn child(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_owned()
    } else {
        format!("{base}.{key}")
    }
}

/// Extends `base` to address the elements of the sequence at `base`.
pub fn item(base: &str) -> String {
    child(base, ITEM_SEGMENT)
}
