//! Document and collection name validation.
//!
//! Valid names:
//! - Must be non-empty and at most [`MAX_NAME_LENGTH`] bytes
//! - Must not contain whitespace, `:`, `?`, `*`, `<`, `>`, `"`, `'`, `/`, `\`
//! - Must not contain `..` (double dot)
//! - Must not start or end with `.`
//!
//! Dots are otherwise allowed and act as namespace separators in collection
//! names, so components between dots must be non-empty.

use crate::error::TypeError;

/// Maximum length of a document or collection name, in bytes.
///
/// Names become file names under directory-backed storage, so the limit stays
/// below common filesystem caps with room for an extension.
pub const MAX_NAME_LENGTH: usize = 250;

/// Characters that are forbidden anywhere in a name.
const FORBIDDEN_CHARS: &[char] = &[
    ' ', '\t', '\n', '\r', ':', '?', '*', '<', '>', '"', '\'', '/', '\\',
];

fn validate_name(name: &str, what: &'static str) -> Result<(), TypeError> {
    if name.is_empty() {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: format!("{what} must not be empty"),
        });
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: format!("{what} must be at most {MAX_NAME_LENGTH} bytes"),
        });
    }

    // Check for forbidden characters.
    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(TypeError::InvalidName {
                name: name.to_string(),
                reason: format!("contains forbidden character: {ch:?}"),
            });
        }
    }

    // Must not contain `..` (empty namespace component).
    if name.contains("..") {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: "must not contain '..'".into(),
        });
    }

    // Must not start or end with `.`.
    if name.starts_with('.') || name.ends_with('.') {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: "must not start or end with '.'".into(),
        });
    }

    Ok(())
}

/// Validate a document name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use confsplit_types::name::validate_document_name;
///
/// assert!(validate_document_name("server").is_ok());
/// assert!(validate_document_name("server.v2").is_ok());
/// assert!(validate_document_name("").is_err());
/// assert!(validate_document_name("bad..name").is_err());
/// ```
pub fn validate_document_name(name: &str) -> Result<(), TypeError> {
    validate_name(name, "document name")
}

/// Validate a collection name, returning `Ok(())` if valid.
///
/// Collection names follow the same rules as document names. Dotted names
/// (`queue.high`) are allowed and compose verbatim into physical namespaces.
pub fn validate_collection_name(name: &str) -> Result<(), TypeError> {
    validate_name(name, "collection name")
}
