//! Schema-aware diffing and merge-tolerant patching.
//!
//! `diff` canonicalizes both documents, then walks them in lock-step. Child
//! mappings recurse, composite sequences go through the [`SequenceMatcher`]
//! when a schema is known, and everything else is replaced wholesale: the
//! old value lands in `removed`, the new one in `added`, and a key missing
//! from one side is recorded on the present side only.
//!
//! `apply` walks a patch against a third document and is deliberately
//! tolerant: removals only clear values that still match, sub-patches whose
//! target vanished are dropped, and additions win over whatever is there.

use std::collections::HashSet;

use confsplit_schema::{path, DocumentSchema, SchemaRegistry, DEFAULT_IDENTITY_WIDTH};
use confsplit_types::{ConfigValue, Mapping};

use crate::canonical::Canonicalizer;
use crate::patch::Patch;
use crate::sequence::{IdentityMatcher, SequenceMatcher};

static DEFAULT_MATCHER: IdentityMatcher = IdentityMatcher;

/// Computes and applies structural deltas between document versions.
///
/// The engine owns no state besides its collaborators, so one instance can
/// serve any number of concurrent `diff` and `apply` calls.
pub struct PatchEngine<'a> {
    schemas: &'a dyn SchemaRegistry,
    matcher: &'a dyn SequenceMatcher,
}

impl<'a> PatchEngine<'a> {
    /// Engine using the default [`IdentityMatcher`] for sequences.
    pub fn new(schemas: &'a dyn SchemaRegistry) -> Self {
        Self {
            schemas,
            matcher: &DEFAULT_MATCHER,
        }
    }

    /// Engine with a custom sequence matching strategy.
    pub fn with_matcher(schemas: &'a dyn SchemaRegistry, matcher: &'a dyn SequenceMatcher) -> Self {
        Self { schemas, matcher }
    }

    /// The delta that turns `old` into `new`.
    ///
    /// Both documents are canonicalized first, so key order and unordered
    /// sequence element order never show up as changes. With no schema
    /// registered for `schema_name` the walk still runs, but composite
    /// sequences degrade to whole-value replacement.
    pub fn diff(&self, old: &Mapping, new: &Mapping, schema_name: &str) -> Patch {
        let canonicalizer = Canonicalizer::new(self.schemas);
        let old = canonicalizer.canonicalize_root(old, schema_name);
        let new = canonicalizer.canonicalize_root(new, schema_name);
        self.diff_mappings(&old, &new, self.schemas.lookup(schema_name), "")
    }

    /// Applies `patch` to `current` and returns the canonicalized result.
    ///
    /// The patch need not have been produced from `current`: removals clear
    /// a value only when it still equals the recorded one, and additions
    /// overwrite unconditionally, so patches merge onto documents that have
    /// drifted since the diff was taken.
    pub fn apply(&self, current: &Mapping, patch: &Patch, schema_name: &str) -> Mapping {
        let canonicalizer = Canonicalizer::new(self.schemas);
        let current = canonicalizer.canonicalize_root(current, schema_name);
        let schema = self.schemas.lookup(schema_name);
        let patched = self.apply_to_mapping(&current, &patch.removed, &patch.added, schema, "");
        canonicalizer.canonicalize_root(&patched, schema_name)
    }

    fn diff_mappings(
        &self,
        old: &Mapping,
        new: &Mapping,
        schema: Option<&DocumentSchema>,
        at: &str,
    ) -> Patch {
        let mut patch = Patch::new();

        for (key, old_value) in old.iter() {
            let Some(new_value) = new.get(key) else {
                patch.removed.insert(key, old_value.clone());
                continue;
            };
            if old_value == new_value {
                continue;
            }

            let child_path = path::child(at, key);
            match (old_value, new_value, schema) {
                (ConfigValue::Mapping(old_child), ConfigValue::Mapping(new_child), _) => {
                    let child = self.diff_mappings(old_child, new_child, schema, &child_path);
                    if !child.is_empty() {
                        // Splice both sides, even an empty one: the paired
                        // mappings tell apply to recurse here.
                        patch.removed.insert(key, ConfigValue::Mapping(child.removed));
                        patch.added.insert(key, ConfigValue::Mapping(child.added));
                    }
                }
                (
                    ConfigValue::Sequence(old_items),
                    ConfigValue::Sequence(new_items),
                    Some(schema),
                ) if all_mappings(old_items) && all_mappings(new_items) => {
                    let (removed_tree, added_tree) =
                        self.diff_sequences(key, old_items, new_items, schema, &child_path);
                    if !(removed_tree.is_empty() && added_tree.is_empty()) {
                        patch.removed.insert(key, ConfigValue::Mapping(removed_tree));
                        patch.added.insert(key, ConfigValue::Mapping(added_tree));
                    }
                }
                _ => {
                    patch.removed.insert(key, old_value.clone());
                    patch.added.insert(key, new_value.clone());
                }
            }
        }

        for (key, new_value) in new.iter() {
            if !old.contains_key(key) {
                patch.added.insert(key, new_value.clone());
            }
        }

        patch
    }

    fn diff_sequences(
        &self,
        tag: &str,
        old_items: &[ConfigValue],
        new_items: &[ConfigValue],
        schema: &DocumentSchema,
        seq_path: &str,
    ) -> (Mapping, Mapping) {
        let width = schema.identity_width(seq_path);
        let item_path = path::item(seq_path);
        let mut removed_tree = Mapping::new();
        let mut added_tree = Mapping::new();

        for pair in self.matcher.match_items(tag, old_items, new_items, width) {
            match (pair.old, pair.new) {
                (Some(ConfigValue::Mapping(old_item)), Some(ConfigValue::Mapping(new_item))) => {
                    let child = self.diff_mappings(old_item, new_item, Some(schema), &item_path);
                    if !child.is_empty() {
                        removed_tree.insert(pair.token.clone(), ConfigValue::Mapping(child.removed));
                        added_tree.insert(pair.token, ConfigValue::Mapping(child.added));
                    }
                }
                (Some(old_item), Some(new_item)) => {
                    removed_tree.insert(pair.token.clone(), old_item.clone());
                    added_tree.insert(pair.token, new_item.clone());
                }
                (Some(old_item), None) => {
                    removed_tree.insert(pair.token, old_item.clone());
                }
                (None, Some(new_item)) => {
                    added_tree.insert(pair.token, new_item.clone());
                }
                (None, None) => {}
            }
        }

        (removed_tree, added_tree)
    }

    fn apply_to_mapping(
        &self,
        current: &Mapping,
        removed: &Mapping,
        added: &Mapping,
        schema: Option<&DocumentSchema>,
        at: &str,
    ) -> Mapping {
        let mut out = current.clone();

        let mut keys: Vec<&str> = removed.keys().collect();
        for key in added.keys() {
            if !removed.contains_key(key) {
                keys.push(key);
            }
        }

        for key in keys {
            let removal = removed.get(key);
            let addition = added.get(key);
            let current_child = out.get(key).cloned();
            let child_path = path::child(at, key);

            match (removal, addition) {
                (
                    Some(ConfigValue::Mapping(removed_child)),
                    Some(ConfigValue::Mapping(added_child)),
                ) => match current_child {
                    Some(ConfigValue::Mapping(child)) => {
                        let patched = self.apply_to_mapping(
                            &child,
                            removed_child,
                            added_child,
                            schema,
                            &child_path,
                        );
                        out.insert(key, ConfigValue::Mapping(patched));
                    }
                    Some(ConfigValue::Sequence(items)) => {
                        let patched = self.apply_to_sequence(
                            key,
                            &items,
                            removed_child,
                            added_child,
                            schema,
                            &child_path,
                        );
                        out.insert(key, ConfigValue::Sequence(patched));
                    }
                    _ => {
                        // The sub-patch's target is gone. Replay it against
                        // an empty mapping and keep whatever materializes.
                        let patched = self.apply_to_mapping(
                            &Mapping::new(),
                            removed_child,
                            added_child,
                            schema,
                            &child_path,
                        );
                        if !patched.is_empty() {
                            out.insert(key, ConfigValue::Mapping(patched));
                        }
                    }
                },
                (Some(removed_value), None) => {
                    if current_child.as_ref() == Some(removed_value) {
                        out.remove(key);
                    }
                }
                (_, Some(added_value)) => {
                    out.insert(key, added_value.clone());
                }
                (None, None) => {}
            }
        }

        out
    }

    fn apply_to_sequence(
        &self,
        tag: &str,
        current_items: &[ConfigValue],
        removed_tree: &Mapping,
        added_tree: &Mapping,
        schema: Option<&DocumentSchema>,
        seq_path: &str,
    ) -> Vec<ConfigValue> {
        let width = schema
            .map(|s| s.identity_width(seq_path))
            .unwrap_or(DEFAULT_IDENTITY_WIDTH);
        let item_path = path::item(seq_path);
        let tokens = self.matcher.item_tokens(tag, current_items, width);

        let mut out = Vec::with_capacity(current_items.len() + added_tree.len());
        for (item, token) in current_items.iter().zip(&tokens) {
            let removal = removed_tree.get(token);
            let addition = added_tree.get(token);

            match (removal, addition) {
                (
                    Some(ConfigValue::Mapping(removed_sub)),
                    Some(ConfigValue::Mapping(added_sub)),
                ) => {
                    if let ConfigValue::Mapping(fields) = item {
                        let patched = self.apply_to_mapping(
                            fields,
                            removed_sub,
                            added_sub,
                            schema,
                            &item_path,
                        );
                        out.push(ConfigValue::Mapping(patched));
                    } else {
                        out.push(item.clone());
                    }
                }
                (Some(removed_item), None) => {
                    // Drop only if the item still matches what the patch
                    // expected to remove.
                    if item != removed_item {
                        out.push(item.clone());
                    }
                }
                (_, Some(added_item)) => {
                    out.push(added_item.clone());
                }
                (None, None) => out.push(item.clone()),
            }
        }

        // Additions that matched no current item append in patch order. A
        // leftover pair sub-patch means its item vanished; it is dropped
        // rather than resurrected.
        let consumed: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        for (token, added_item) in added_tree.iter() {
            if consumed.contains(token) || removed_tree.contains_key(token) {
                continue;
            }
            out.push(added_item.clone());
        }

        out
    }
}

fn all_mappings(items: &[ConfigValue]) -> bool {
    items.iter().all(ConfigValue::is_mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confsplit_schema::{DocumentSchema, StaticSchemaRegistry};

    const DOC: &str = "demo.doc";

    fn parse(json: &str) -> ConfigValue {
        serde_json::from_str(json).unwrap()
    }

    fn parse_root(json: &str) -> Mapping {
        serde_json::from_str(json).unwrap()
    }

    fn registry_with(schema: DocumentSchema) -> StaticSchemaRegistry {
        let mut registry = StaticSchemaRegistry::new();
        registry.register(DOC, schema).unwrap();
        registry
    }

    // ---- diff ----

    #[test]
    fn identical_documents_diff_empty() {
        let registry = StaticSchemaRegistry::new();
        let engine = PatchEngine::new(&registry);

        let doc = parse_root(r#"{"a": 1, "b": {"c": [1, 2]}}"#);
        assert!(engine.diff(&doc, &doc, DOC).is_empty());
    }

    #[test]
    fn scalar_changes_record_both_sides() {
        let registry = StaticSchemaRegistry::new();
        let engine = PatchEngine::new(&registry);

        let patch = engine.diff(
            &parse_root(r#"{"a": 1, "same": true}"#),
            &parse_root(r#"{"a": 2, "same": true}"#),
            DOC,
        );
        assert_eq!(patch.removed, parse_root(r#"{"a": 1}"#));
        assert_eq!(patch.added, parse_root(r#"{"a": 2}"#));
    }

    #[test]
    fn missing_keys_are_recorded_one_sided() {
        let registry = StaticSchemaRegistry::new();
        let engine = PatchEngine::new(&registry);

        let patch = engine.diff(
            &parse_root(r#"{"gone": 1, "kept": 2}"#),
            &parse_root(r#"{"kept": 2, "fresh": 3}"#),
            DOC,
        );
        assert_eq!(patch.removed, parse_root(r#"{"gone": 1}"#));
        assert_eq!(patch.added, parse_root(r#"{"fresh": 3}"#));
    }

    #[test]
    fn nested_mapping_changes_stay_local() {
        let registry = StaticSchemaRegistry::new();
        let engine = PatchEngine::new(&registry);

        let patch = engine.diff(
            &parse_root(r#"{"keep": 1, "nest": {"x": 1, "y": 2}}"#),
            &parse_root(r#"{"keep": 1, "nest": {"x": 1, "y": 3}}"#),
            DOC,
        );
        assert_eq!(patch.removed, parse_root(r#"{"nest": {"y": 2}}"#));
        assert_eq!(patch.added, parse_root(r#"{"nest": {"y": 3}}"#));
    }

    #[test]
    fn scalar_sequences_replace_wholesale() {
        let registry = StaticSchemaRegistry::new();
        let engine = PatchEngine::new(&registry);

        let patch = engine.diff(
            &parse_root(r#"{"ports": [1, 2, 3]}"#),
            &parse_root(r#"{"ports": [1, 2, 4]}"#),
            DOC,
        );
        assert_eq!(patch.removed, parse_root(r#"{"ports": [1, 2, 3]}"#));
        assert_eq!(patch.added, parse_root(r#"{"ports": [1, 2, 4]}"#));
    }

    #[test]
    fn type_changes_replace_wholesale() {
        let registry = StaticSchemaRegistry::new();
        let engine = PatchEngine::new(&registry);

        let patch = engine.diff(
            &parse_root(r#"{"a": 1}"#),
            &parse_root(r#"{"a": {"m": true}}"#),
            DOC,
        );
        assert_eq!(patch.removed, parse_root(r#"{"a": 1}"#));
        assert_eq!(patch.added, parse_root(r#"{"a": {"m": true}}"#));
    }

    #[test]
    fn composite_sequence_changes_stay_local() {
        let registry = registry_with(DocumentSchema::new());
        let engine = PatchEngine::new(&registry);

        let old = parse_root(r#"{"a": 1, "b": [{"id": 1, "v": "x"}, {"id": 2, "v": "y"}]}"#);
        let new = parse_root(r#"{"a": 1, "b": [{"id": 1, "v": "x2"}, {"id": 2, "v": "y"}]}"#);
        let patch = engine.diff(&old, &new, DOC);

        assert!(!patch.added.contains_key("a"));
        let added_b = patch.added.get("b").unwrap().as_mapping().unwrap();
        let removed_b = patch.removed.get("b").unwrap().as_mapping().unwrap();
        assert_eq!(added_b.len(), 1);
        assert_eq!(removed_b.len(), 1);

        let (token, sub_added) = added_b.iter().next().unwrap();
        assert!(token.starts_with("b_0_"));
        assert_eq!(sub_added, &parse(r#"{"v": "x2"}"#));
        assert_eq!(removed_b.get(token), Some(&parse(r#"{"v": "x"}"#)));
    }

    #[test]
    fn sequence_insertions_are_whole_item_additions() {
        let registry = registry_with(DocumentSchema::new());
        let engine = PatchEngine::new(&registry);

        let old = parse_root(r#"{"b": [{"id": 1, "v": "x"}]}"#);
        let new = parse_root(r#"{"b": [{"id": 1, "v": "x"}, {"id": 2, "v": "y"}]}"#);
        let patch = engine.diff(&old, &new, DOC);

        let added_b = patch.added.get("b").unwrap().as_mapping().unwrap();
        assert_eq!(added_b.len(), 1);
        let (token, item) = added_b.iter().next().unwrap();
        assert!(token.starts_with("b_0_"));
        assert_eq!(item, &parse(r#"{"id": 2, "v": "y"}"#));

        // The removed side keeps an empty marker so apply recurses here.
        let removed_b = patch.removed.get("b").unwrap().as_mapping().unwrap();
        assert!(removed_b.is_empty());
    }

    #[test]
    fn unknown_schemas_replace_composite_sequences_wholesale() {
        let registry = StaticSchemaRegistry::new();
        let engine = PatchEngine::new(&registry);

        let old = parse_root(r#"{"b": [{"id": 1, "v": "x"}, {"id": 2, "v": "y"}]}"#);
        let new = parse_root(r#"{"b": [{"id": 1, "v": "x2"}, {"id": 2, "v": "y"}]}"#);
        let patch = engine.diff(&old, &new, DOC);

        assert_eq!(patch.removed.get("b"), old.get("b"));
        assert_eq!(patch.added.get("b"), new.get("b"));
    }

    #[test]
    fn reordered_documents_diff_empty_under_a_schema() {
        let registry = registry_with(DocumentSchema::new());
        let engine = PatchEngine::new(&registry);

        let a = parse_root(r#"{"x": 1, "y": {"p": 1, "q": 2}}"#);
        let b = parse_root(r#"{"y": {"q": 2, "p": 1}, "x": 1}"#);
        assert!(engine.diff(&a, &b, DOC).is_empty());
    }

    #[test]
    fn unordered_sequences_compare_as_sets() {
        let registry = registry_with(DocumentSchema::new().with_unordered_sequence("tags"));
        let engine = PatchEngine::new(&registry);

        let a = parse_root(r#"{"tags": ["x", "y", "z"]}"#);
        let b = parse_root(r#"{"tags": ["z", "x", "y"]}"#);
        assert!(engine.diff(&a, &b, DOC).is_empty());
    }

    // ---- apply ----

    #[test]
    fn apply_round_trips_a_composite_edit() {
        let registry = registry_with(DocumentSchema::new());
        let engine = PatchEngine::new(&registry);
        let canonicalizer = Canonicalizer::new(&registry);

        let old = parse_root(
            r#"{"b": [{"id": 1, "v": "x"}, {"id": 2, "v": "y"}, {"id": 3, "v": "z"}]}"#,
        );
        let new = parse_root(
            r#"{"b": [{"id": 1, "v": "x2"}, {"id": 3, "v": "z"}, {"id": 4, "v": "w"}]}"#,
        );

        let patch = engine.diff(&old, &new, DOC);
        assert_eq!(
            engine.apply(&old, &patch, DOC),
            canonicalizer.canonicalize_root(&new, DOC)
        );
    }

    #[test]
    fn removals_only_clear_matching_values() {
        let registry = StaticSchemaRegistry::new();
        let engine = PatchEngine::new(&registry);

        let patch = Patch {
            added: Mapping::new(),
            removed: parse_root(r#"{"stale": 1, "gone": 2}"#),
        };
        let current = parse_root(r#"{"stale": 99, "gone": 2, "keep": 3}"#);
        assert_eq!(
            engine.apply(&current, &patch, DOC),
            parse_root(r#"{"stale": 99, "keep": 3}"#)
        );
    }

    #[test]
    fn sequence_removals_keep_changed_items() {
        let registry = registry_with(DocumentSchema::new());
        let engine = PatchEngine::new(&registry);
        let canonicalizer = Canonicalizer::new(&registry);

        let old = parse_root(r#"{"b": [{"id": 1, "v": "x"}, {"id": 2, "v": "y"}]}"#);
        let new = parse_root(r#"{"b": [{"id": 2, "v": "y"}]}"#);
        let patch = engine.diff(&old, &new, DOC);

        // id:1 was edited since the diff; the removal no longer matches.
        let drifted = parse_root(r#"{"b": [{"id": 1, "v": "edited"}, {"id": 2, "v": "y"}]}"#);
        assert_eq!(
            engine.apply(&drifted, &patch, DOC),
            canonicalizer.canonicalize_root(&drifted, DOC)
        );

        // Applied to the original, the removal goes through.
        assert_eq!(
            engine.apply(&old, &patch, DOC),
            canonicalizer.canonicalize_root(&new, DOC)
        );
    }

    #[test]
    fn pair_sub_patches_skip_vanished_items() {
        let registry = registry_with(DocumentSchema::new());
        let engine = PatchEngine::new(&registry);
        let canonicalizer = Canonicalizer::new(&registry);

        let old = parse_root(r#"{"b": [{"id": 1, "v": "x"}, {"id": 2, "v": "y"}]}"#);
        let new = parse_root(r#"{"b": [{"id": 1, "v": "x2"}, {"id": 2, "v": "y"}]}"#);
        let patch = engine.diff(&old, &new, DOC);

        // id:1 is gone from this document; its sub-patch has nowhere to go.
        let current = parse_root(r#"{"b": [{"id": 2, "v": "y"}]}"#);
        assert_eq!(
            engine.apply(&current, &patch, DOC),
            canonicalizer.canonicalize_root(&current, DOC)
        );
    }

    #[test]
    fn nested_additions_materialize_missing_mappings() {
        let registry = StaticSchemaRegistry::new();
        let engine = PatchEngine::new(&registry);

        let old = parse_root(r#"{"nest": {"a": 1}}"#);
        let new = parse_root(r#"{"nest": {"a": 1, "b": 2}}"#);
        let patch = engine.diff(&old, &new, DOC);

        let result = engine.apply(&parse_root(r#"{"other": 1}"#), &patch, DOC);
        assert_eq!(result, parse_root(r#"{"other": 1, "nest": {"b": 2}}"#));
    }

    #[test]
    fn nested_removals_do_not_materialize_mappings() {
        let registry = StaticSchemaRegistry::new();
        let engine = PatchEngine::new(&registry);

        let old = parse_root(r#"{"nest": {"a": 1, "b": 2}}"#);
        let new = parse_root(r#"{"nest": {"a": 1}}"#);
        let patch = engine.diff(&old, &new, DOC);

        let untouched = parse_root(r#"{"other": 1}"#);
        assert_eq!(engine.apply(&untouched, &patch, DOC), untouched);
    }

    #[test]
    fn reapplying_this_patch_is_a_no_op() {
        let registry = registry_with(DocumentSchema::new());
        let engine = PatchEngine::new(&registry);

        let old = parse_root(r#"{"a": 1, "b": [{"id": 1, "v": "x"}, {"id": 2, "v": "y"}]}"#);
        let new = parse_root(r#"{"a": 1, "b": [{"id": 1, "v": "x2"}, {"id": 2, "v": "y"}]}"#);
        let patch = engine.diff(&old, &new, DOC);

        let once = engine.apply(&old, &patch, DOC);
        let twice = engine.apply(&once, &patch, DOC);
        assert_eq!(twice, once);
    }

    // ---- invert ----

    #[test]
    fn inverted_patches_restore_the_old_document() {
        let registry = registry_with(DocumentSchema::new());
        let engine = PatchEngine::new(&registry);
        let canonicalizer = Canonicalizer::new(&registry);

        let old = parse_root(r#"{"a": 1, "b": [{"id": 1, "v": "x"}, {"id": 2, "v": "y"}]}"#);
        let new = parse_root(r#"{"a": 2, "b": [{"id": 1, "v": "x2"}]}"#);

        let inverted = engine.diff(&old, &new, DOC).invert();
        assert_eq!(
            engine.apply(&new, &inverted, DOC),
            canonicalizer.canonicalize_root(&old, DOC)
        );
    }

    #[test]
    fn inverting_matches_diffing_backwards() {
        let registry = registry_with(DocumentSchema::new());
        let engine = PatchEngine::new(&registry);

        let old = parse_root(r#"{"a": 1, "b": [{"id": 1, "v": "x"}], "gone": true}"#);
        let new = parse_root(r#"{"a": 2, "b": [{"id": 1, "v": "x2"}], "fresh": false}"#);

        let inverted = engine.diff(&old, &new, DOC).invert();
        let reverse = engine.diff(&new, &old, DOC);
        assert_eq!(
            inverted.to_document().to_json(),
            reverse.to_document().to_json()
        );
    }
}
