use std::collections::{BTreeMap, BTreeSet};

use super::{diff_entry, DiffNode, Identity, PathState, Walker};
use crate::{IdSource, Node};

/// Walks the sorted union of both key sets, skipping ignored fields.
pub(super) fn diff_objects<S>(
    lhs: &BTreeMap<String, Node>,
    rhs: &BTreeMap<String, Node>,
    state: &PathState,
    walker: &mut Walker<'_, S>,
) -> Vec<DiffNode>
where
    S: IdSource + ?Sized,
{
    let ignored = walker.options.ignored_fields();
    let keys: BTreeSet<&String> =
        lhs.keys().chain(rhs.keys()).filter(|key| !ignored.contains(*key)).collect();

    let mut nodes = Vec::new();
    for key in keys {
        let old = lhs.get(key).unwrap_or(&Node::Void);
        let new = rhs.get(key).unwrap_or(&Node::Void);
        let labelled = if new.is_void() { old } else { new };
        let sub_state = state.key(key, labelled, walker.options);
        nodes.extend(diff_entry(old, new, Identity::key(key.as_str()), &sub_state, walker));
    }
    nodes
}
