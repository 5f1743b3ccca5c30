use super::{ChangeKind, DiffNode, Identity, PathState, Walker};
use crate::{IdSource, Node};

/// Compares two values as leaves. `Void` on either side marks an addition or
/// a deletion; anything else unequal is an update carrying both values.
pub(super) fn diff_primitives<S>(
    lhs: &Node,
    rhs: &Node,
    identity: Identity,
    state: &PathState,
    walker: &mut Walker<'_, S>,
) -> Option<DiffNode>
where
    S: IdSource + ?Sized,
{
    let node = match (lhs, rhs) {
        (Node::Void, Node::Void) => return None,
        (Node::Void, added) => {
            walker.emit(identity, ChangeKind::Added, state).with_new_value(added.clone())
        }
        (deleted, Node::Void) => {
            walker.emit(identity, ChangeKind::Deleted, state).with_old_value(deleted.clone())
        }
        (old, new) if old.eq_ignoring(new, walker.options.ignored_fields()) => return None,
        (old, new) => walker
            .emit(identity, ChangeKind::Modified, state)
            .with_old_value(old.clone())
            .with_new_value(new.clone()),
    };
    Some(node)
}
