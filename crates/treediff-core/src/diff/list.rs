use super::{diff_entry, DiffNode, Identity, PathState, Walker};
use crate::{IdSource, Node};

/// Compares arrays index by index over the overlap, then reports the longer
/// side's tail as deletions or additions. Arrays have no move concept here.
pub(super) fn diff_lists<S>(
    lhs: &[Node],
    rhs: &[Node],
    state: &PathState,
    walker: &mut Walker<'_, S>,
) -> Vec<DiffNode>
where
    S: IdSource + ?Sized,
{
    let mut nodes = Vec::new();
    for index in 0..lhs.len().max(rhs.len()) {
        let old = lhs.get(index).unwrap_or(&Node::Void);
        let new = rhs.get(index).unwrap_or(&Node::Void);
        let labelled = if new.is_void() { old } else { new };
        let sub_state = state.index(index, labelled, walker.options);
        nodes.extend(diff_entry(old, new, Identity::Index(index), &sub_state, walker));
    }
    nodes
}

#[cfg(test)]
mod tests {
    use crate::diff::ChangeKind;
    use crate::{compare_values, DiffOptions, Node};

    fn node(json: &str) -> Node {
        Node::from_json_str(json).unwrap()
    }

    #[test]
    fn shorter_new_side_deletes_tail() {
        let diff = compare_values(&node("[1,2,3]"), &node("[1,5]"), &DiffOptions::default());
        let kinds: Vec<_> = diff.iter().map(|n| (n.path.to_string(), n.kind)).collect();
        assert_eq!(
            kinds,
            vec![("[1]".to_string(), ChangeKind::Modified), ("[2]".to_string(), ChangeKind::Deleted)]
        );
    }

    #[test]
    fn reordering_is_reported_positionally() {
        let diff = compare_values(&node("[1,2]"), &node("[2,1]"), &DiffOptions::default());
        assert_eq!(diff.len(), 2);
        assert!(diff.iter().all(|n| n.kind == ChangeKind::Modified));
    }

    #[test]
    fn nested_array_elements_recurse() {
        let diff = compare_values(
            &node("{\"rows\":[{\"v\":1},{\"v\":2}]}"),
            &node("{\"rows\":[{\"v\":1},{\"v\":3},{\"v\":4}]}"),
            &DiffOptions::default(),
        );
        let rows = &diff.nodes()[0];
        assert_eq!(rows.path.to_string(), "rows");
        let paths: Vec<_> = diff.walk().map(|n| n.readable_path.clone()).collect();
        assert_eq!(paths, vec!["rows", "rows > [1]", "rows > [1] > v", "rows > [2]"]);
    }
}
