//! Schema-driven canonical form of documents.
//!
//! Two documents with the same semantic content can differ in mapping key
//! order and in the element order of unordered sequences, typically after a
//! round trip through a serialization format. Canonicalization rewrites both
//! into a deterministic form so that the diff engine only sees real changes.

use confsplit_schema::{path, DocumentSchema, SchemaRegistry};
use confsplit_types::{ConfigValue, Mapping};

/// Rewrites documents into their schema-defined canonical form.
///
/// Keys a schema declares come first, in declared order; keys it does not
/// declare follow in lexicographic order, so the result is independent of
/// the input's key order either way. Sequences marked unordered are sorted
/// by a total order over their canonicalized elements; all other sequences
/// keep their element order.
pub struct Canonicalizer<'a> {
    schemas: &'a dyn SchemaRegistry,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(schemas: &'a dyn SchemaRegistry) -> Self {
        Self { schemas }
    }

    /// Canonical form of `document` under the schema registered for
    /// `schema_name`.
    ///
    /// An unknown schema name returns the input unchanged: canonicalization
    /// stabilizes diffs, it does not gate validity.
    pub fn canonicalize(&self, document: &ConfigValue, schema_name: &str) -> ConfigValue {
        match self.schemas.lookup(schema_name) {
            Some(schema) => canonical_value(document, schema, ""),
            None => document.clone(),
        }
    }

    /// Canonical form of a root mapping. Same contract as
    /// [`canonicalize`](Self::canonicalize).
    pub fn canonicalize_root(&self, document: &Mapping, schema_name: &str) -> Mapping {
        match self.schemas.lookup(schema_name) {
            Some(schema) => canonical_mapping(document, schema, ""),
            None => document.clone(),
        }
    }
}

fn canonical_value(value: &ConfigValue, schema: &DocumentSchema, at: &str) -> ConfigValue {
    match value {
        ConfigValue::Scalar(_) => value.clone(),
        ConfigValue::Mapping(mapping) => {
            ConfigValue::Mapping(canonical_mapping(mapping, schema, at))
        }
        ConfigValue::Sequence(items) => {
            let item_path = path::item(at);
            let mut out: Vec<ConfigValue> = items
                .iter()
                .map(|item| canonical_value(item, schema, &item_path))
                .collect();
            if schema.is_unordered_sequence(at) {
                out.sort_by_cached_key(sort_key);
            }
            ConfigValue::Sequence(out)
        }
    }
}

fn canonical_mapping(mapping: &Mapping, schema: &DocumentSchema, at: &str) -> Mapping {
    let declared = schema.key_order_at(at).unwrap_or(&[]);
    let mut out = Mapping::with_capacity(mapping.len());

    for key in declared {
        if let Some(value) = mapping.get(key) {
            out.insert(
                key.clone(),
                canonical_value(value, schema, &path::child(at, key)),
            );
        }
    }

    let mut rest: Vec<(&str, &ConfigValue)> = mapping
        .iter()
        .filter(|(key, _)| !declared.iter().any(|d| d.as_str() == *key))
        .collect();
    rest.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in rest {
        out.insert(key, canonical_value(value, schema, &path::child(at, key)));
    }

    out
}

// Value trees always serialize; non-finite floats render as null.
fn sort_key(value: &ConfigValue) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
