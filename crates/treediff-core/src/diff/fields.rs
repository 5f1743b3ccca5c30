use std::collections::{BTreeMap, BTreeSet};

use super::FieldChange;
use crate::Node;

/// Reports every field of two mappings whose values are not deep-equal.
///
/// Fields in `excluded` are skipped here and ignored inside nested values
/// too. A field present on one side only is reported with [`Node::Void`] on
/// the other. Non-mapping inputs have no fields, so the result is empty.
///
/// ```
/// # use std::collections::BTreeSet;
/// # use treediff_core::{diff::compare_fields, Node};
/// let old = Node::from_json_str("{\"id\":1,\"name\":\"A\",\"size\":3}")?;
/// let new = Node::from_json_str("{\"id\":1,\"name\":\"B\"}")?;
/// let excluded = BTreeSet::from(["id".to_string()]);
/// let changes = compare_fields(&old, &new, &excluded);
/// assert_eq!(changes.keys().collect::<Vec<_>>(), ["name", "size"]);
/// assert!(changes["size"].new.is_void());
/// # Ok::<(), treediff_core::CanonicalizeError>(())
/// ```
#[must_use]
pub fn compare_fields(
    old: &Node,
    new: &Node,
    excluded: &BTreeSet<String>,
) -> BTreeMap<String, FieldChange> {
    let (Node::Object(lhs), Node::Object(rhs)) = (old, new) else {
        return BTreeMap::new();
    };

    let mut changes = BTreeMap::new();
    for key in lhs.keys().chain(rhs.keys()) {
        if excluded.contains(key) || changes.contains_key(key) {
            continue;
        }
        let before = lhs.get(key).unwrap_or(&Node::Void);
        let after = rhs.get(key).unwrap_or(&Node::Void);
        if !before.eq_ignoring(after, excluded) {
            changes.insert(key.clone(), FieldChange { old: before.clone(), new: after.clone() });
        }
    }
    changes
}
