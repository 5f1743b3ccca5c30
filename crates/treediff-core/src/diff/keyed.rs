use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{
    compare_fields, identify, sequence_of, ChangeKind, DiffNode, Identity, IdentityKey, PathState,
    Position,
};
use crate::{DiffOptions, Node};

/// One correlated element of a sibling group.
struct Entry<'a> {
    node: &'a Node,
    index: usize,
    identity: Identity,
}

/// Identity → element map plus the order in which identities first appear.
struct Correlated<'a> {
    entries: BTreeMap<IdentityKey, Entry<'a>>,
    order: Vec<IdentityKey>,
}

impl<'a> Correlated<'a> {
    fn build(sequence: &'a [Node], options: &DiffOptions, state: &PathState) -> Self {
        let mut entries = BTreeMap::new();
        let mut order = Vec::with_capacity(sequence.len());
        for (index, node) in sequence.iter().enumerate() {
            let (key, identity) = identify(node, index, options.correlation());
            if let Some(previous) = entries.get(&key).map(|entry: &Entry<'_>| entry.index) {
                debug!(
                    identity = %identity,
                    previous,
                    index,
                    path = %state.new_path(),
                    "duplicate identity, later element wins"
                );
            } else {
                order.push(key.clone());
            }
            entries.insert(key, Entry { node, index, identity });
        }
        Self { entries, order }
    }
}

/// Correlates two sibling sequences and classifies every element.
///
/// Results are ordered by their index in `new_seq`; deletions come last in
/// old order.
pub(super) fn diff_sequence(
    old_seq: &[Node],
    new_seq: &[Node],
    state: &PathState,
    options: &DiffOptions,
    excluded: &BTreeSet<String>,
) -> Vec<DiffNode> {
    let old = Correlated::build(old_seq, options, state);
    let new = Correlated::build(new_seq, options, state);

    let union = old.order.iter().chain(new.order.iter().filter(|key| !old.entries.contains_key(*key)));

    let mut ranked = Vec::new();
    for key in union {
        let ranked_node = match (old.entries.get(key), new.entries.get(key)) {
            (Some(before), None) => {
                let sub_state = state.element(
                    Some(before.index),
                    None,
                    before.node,
                    before.identity.to_string(),
                    options,
                );
                let node = DiffNode::at(before.identity.clone(), ChangeKind::Deleted, &sub_state)
                    .with_old_value(before.node.clone());
                Some((usize::MAX, node))
            }
            (None, Some(after)) => {
                let sub_state = state.element(
                    None,
                    Some(after.index),
                    after.node,
                    after.identity.to_string(),
                    options,
                );
                let node = DiffNode::at(after.identity.clone(), ChangeKind::Added, &sub_state)
                    .with_new_value(after.node.clone());
                Some((after.index, node))
            }
            (Some(before), Some(after)) => {
                diff_pair(before, after, state, options, excluded).map(|node| (after.index, node))
            }
            (None, None) => None,
        };
        ranked.extend(ranked_node);
    }

    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, node)| node).collect()
}

/// Classifies an element present on both sides. Returns `None` when neither
/// the element nor anything beneath it changed.
fn diff_pair(
    before: &Entry<'_>,
    after: &Entry<'_>,
    state: &PathState,
    options: &DiffOptions,
    excluded: &BTreeSet<String>,
) -> Option<DiffNode> {
    let sub_state = state.element(
        Some(before.index),
        Some(after.index),
        after.node,
        after.identity.to_string(),
        options,
    );

    let mut node = DiffNode::at(after.identity.clone(), ChangeKind::Unchanged, &sub_state);
    let mut changed = false;
    match (before.node, after.node) {
        (Node::Object(_), Node::Object(_)) => {
            let field_changes = compare_fields(before.node, after.node, excluded);
            changed = !field_changes.is_empty();
            node = node.with_field_changes(field_changes);
            if let Some(field) = options.children_field() {
                node = node.with_children(diff_sequence(
                    sequence_of(before.node.get(field)),
                    sequence_of(after.node.get(field)),
                    &sub_state.children(field),
                    options,
                    excluded,
                ));
            }
        }
        (lhs, rhs) if !lhs.eq_ignoring(rhs, excluded) => {
            changed = true;
            node = node.with_old_value(lhs.clone()).with_new_value(rhs.clone());
        }
        _ => {}
    }

    let moved = before.index != after.index;
    node.kind = if changed {
        ChangeKind::Modified
    } else if moved {
        ChangeKind::Moved
    } else if !node.children.is_empty() {
        ChangeKind::Unchanged
    } else {
        return None;
    };
    if moved {
        node = node.with_position(Some(Position {
            old_index: before.index,
            new_index: after.index,
        }));
    }
    Some(node)
}
