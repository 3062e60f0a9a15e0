//! Identity-keyed matching of composite sequence items.
//!
//! Sequences of mappings are not diffed positionally. Each item is
//! recognized by its identity, the leading scalar leaves of the item in
//! depth-first order, so a change inside one item stays local no matter
//! where the item sits in the list. Items whose identity appears on only
//! one side are treated as whole additions or removals; the matcher never
//! guesses that a reordered item with a different identity is "the same"
//! item.

use std::collections::{HashMap, HashSet};

use confsplit_types::{ConfigValue, Scalar};

// Domain tag mixed into every identity digest.
const IDENTITY_DOMAIN: &str = "confsplit-identity-v1";

/// Hex digits of the identity digest kept in a token.
const TOKEN_DIGEST_LEN: usize = 16;

/// One unit of work produced by matching two sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair<'a> {
    /// Token naming the matched item slot on both sides.
    pub token: String,
    /// The old item; absent for additions.
    pub old: Option<&'a ConfigValue>,
    /// The new item; absent for removals.
    pub new: Option<&'a ConfigValue>,
}

/// Strategy that turns a composite-sequence comparison into identity-keyed
/// work items.
///
/// Implementations must keep [`match_items`](Self::match_items) and
/// [`item_tokens`](Self::item_tokens) consistent: the token an item carries
/// in a one-sided sequence equals the token `match_items` would assign it,
/// which is what lets a patch produced from one pair of documents find its
/// items in a third.
pub trait SequenceMatcher: Send + Sync {
    /// Matches `old` against `new` item by item.
    ///
    /// Pairs whose two sides are equal produce no entry. The remaining
    /// entries carry both sides for changed pairs, only `old` for removals,
    /// and only `new` for additions.
    fn match_items<'a>(
        &self,
        tag: &str,
        old: &'a [ConfigValue],
        new: &'a [ConfigValue],
        identity_width: usize,
    ) -> Vec<MatchedPair<'a>>;

    /// The token of each item of `items`, in item order.
    fn item_tokens(&self, tag: &str, items: &[ConfigValue], identity_width: usize) -> Vec<String>;
}

/// The default matcher.
///
/// An item's identity is the tuple of its first `identity_width` scalar
/// leaves in depth-first order. Items sharing an identity are paired
/// strictly by order of appearance, with the occurrence index baked into the
/// token so that duplicates never collide. Tokens have the shape
/// `<tag>_<occurrence>_<digest>` and depend only on content, never on array
/// position.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMatcher;

impl SequenceMatcher for IdentityMatcher {
    fn match_items<'a>(
        &self,
        tag: &str,
        old: &'a [ConfigValue],
        new: &'a [ConfigValue],
        identity_width: usize,
    ) -> Vec<MatchedPair<'a>> {
        let old_ids: Vec<String> = old
            .iter()
            .map(|item| rendered_identity(item, identity_width))
            .collect();
        let new_ids: Vec<String> = new
            .iter()
            .map(|item| rendered_identity(item, identity_width))
            .collect();

        // Identities in order of first appearance across old-then-new.
        let mut order: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for id in old_ids.iter().chain(new_ids.iter()) {
            if seen.insert(id.as_str()) {
                order.push(id.as_str());
            }
        }

        let mut old_slots: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, id) in old_ids.iter().enumerate() {
            old_slots.entry(id.as_str()).or_default().push(index);
        }
        let mut new_slots: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, id) in new_ids.iter().enumerate() {
            new_slots.entry(id.as_str()).or_default().push(index);
        }

        let mut pairs = Vec::new();
        for id in order {
            let olds = old_slots.get(id).map(Vec::as_slice).unwrap_or(&[]);
            let news = new_slots.get(id).map(Vec::as_slice).unwrap_or(&[]);
            let digest = identity_digest(id);

            for occurrence in 0..olds.len().max(news.len()) {
                let old_item = olds.get(occurrence).map(|&index| &old[index]);
                let new_item = news.get(occurrence).map(|&index| &new[index]);
                if let (Some(o), Some(n)) = (old_item, new_item) {
                    if o == n {
                        continue;
                    }
                }
                pairs.push(MatchedPair {
                    token: format!("{tag}_{occurrence}_{digest}"),
                    old: old_item,
                    new: new_item,
                });
            }
        }
        pairs
    }

    fn item_tokens(&self, tag: &str, items: &[ConfigValue], identity_width: usize) -> Vec<String> {
        let ids: Vec<String> = items
            .iter()
            .map(|item| rendered_identity(item, identity_width))
            .collect();

        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        ids.iter()
            .map(|id| {
                let slot = occurrences.entry(id.as_str()).or_insert(0);
                let token = format!("{tag}_{}_{}", *slot, identity_digest(id));
                *slot += 1;
                token
            })
            .collect()
    }
}

/// Collects the leading scalar leaves of `value` in depth-first order,
/// stopping at `width` of them.
fn leading_scalars(value: &ConfigValue, width: usize, out: &mut Vec<Scalar>) {
    if out.len() >= width {
        return;
    }
    match value {
        ConfigValue::Scalar(scalar) => out.push(scalar.clone()),
        ConfigValue::Mapping(mapping) => {
            for (_, child) in mapping.iter() {
                leading_scalars(child, width, out);
                if out.len() >= width {
                    return;
                }
            }
        }
        ConfigValue::Sequence(items) => {
            for child in items {
                leading_scalars(child, width, out);
                if out.len() >= width {
                    return;
                }
            }
        }
    }
}

fn rendered_identity(item: &ConfigValue, width: usize) -> String {
    let mut scalars = Vec::with_capacity(width);
    leading_scalars(item, width, &mut scalars);
    let identity = ConfigValue::Sequence(scalars.into_iter().map(ConfigValue::Scalar).collect());
    // Identity tuples are scalar sequences; serialization cannot fail.
    serde_json::to_string(&identity).unwrap_or_default()
}

fn identity_digest(rendered: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(IDENTITY_DOMAIN.as_bytes());
    hasher.update(b":");
    hasher.update(rendered.as_bytes());
    let mut digest = hex::encode(hasher.finalize().as_bytes());
    digest.truncate(TOKEN_DIGEST_LEN);
    digest
}
