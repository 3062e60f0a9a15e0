//! Schema lookup by document name.

use std::collections::BTreeMap;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::DocumentSchema;

/// Resolves the schema that governs a named document.
///
/// Lookup failure is not an error anywhere in confsplit: consumers degrade to
/// schema-free behavior when `lookup` returns `None`.
pub trait SchemaRegistry: Send + Sync {
    /// The schema for `document`, if one is registered.
    fn lookup(&self, document: &str) -> Option<&DocumentSchema>;
}

/// An in-memory registry of schemas keyed by document name patterns.
///
/// Patterns are either exact document names (`demo.settings`) or a name
/// prefix followed by a trailing wildcard segment (`demo.role.*`), matching
/// every document nested at least one segment below the prefix. Exact
/// matches win over wildcards; among wildcards the longest prefix wins.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaRegistry {
    exact: BTreeMap<String, DocumentSchema>,
    // Keyed by the pattern prefix including its trailing dot.
    wildcards: BTreeMap<String, DocumentSchema>,
}

impl StaticSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `schema` under `pattern`, replacing any earlier schema
    /// registered under the same pattern.
    pub fn register(&mut self, pattern: &str, schema: DocumentSchema) -> SchemaResult<()> {
        if pattern.is_empty() {
            return Err(SchemaError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: "pattern must not be empty".into(),
            });
        }

        if let Some(prefix) = pattern.strip_suffix(".*") {
            if prefix.is_empty() || prefix.contains('*') {
                return Err(SchemaError::InvalidPattern {
                    pattern: pattern.to_owned(),
                    reason: "wildcard is only allowed as a trailing '.*' segment".into(),
                });
            }
            self.wildcards.insert(format!("{prefix}."), schema);
            return Ok(());
        }

        if pattern.contains('*') {
            return Err(SchemaError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: "wildcard is only allowed as a trailing '.*' segment".into(),
            });
        }

        self.exact.insert(pattern.to_owned(), schema);
        Ok(())
    }

    /// Builds a registry from a JSON object mapping patterns to schemas.
    ///
    /// # Examples
    ///
    /// ```
    /// use confsplit_schema::StaticSchemaRegistry;
    ///
    /// let registry = StaticSchemaRegistry::from_json(
    ///     r#"{"demo.role.*": {"key_order": {"": ["id", "label"]}}}"#,
    /// )
    /// .unwrap();
    /// ```
    pub fn from_json(text: &str) -> SchemaResult<Self> {
        let schemas: BTreeMap<String, DocumentSchema> = serde_json::from_str(text)?;
        let mut registry = Self::new();
        for (pattern, schema) in schemas {
            registry.register(&pattern, schema)?;
        }
        Ok(registry)
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.wildcards.is_empty()
    }
}

impl SchemaRegistry for StaticSchemaRegistry {
    fn lookup(&self, document: &str) -> Option<&DocumentSchema> {
        if let Some(schema) = self.exact.get(document) {
            return Some(schema);
        }

        // Longest wildcard prefix wins.
        self.wildcards
            .iter()
            .filter(|(prefix, _)| {
                document.starts_with(prefix.as_str()) && document.len() > prefix.len()
            })
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, schema)| schema)
    }
}
