use std::collections::BTreeSet;

use crate::{
    diff::{identify, sequence_of, Path, PathSegment},
    Correlation, DiffOptions, Node, ValidationError,
};

/// Checks that no sibling group of a keyed tree repeats an identity.
///
/// Positional correlation can never produce duplicates, so it always passes.
///
/// ```
/// # use treediff_core::{validate_identities, DiffOptions, Node};
/// let tree = Node::from_json_str("[{\"id\":1,\"children\":[{\"id\":2},{\"id\":2}]}]")?;
/// let err = validate_identities(&tree, &DiffOptions::default()).unwrap_err();
/// assert_eq!(err.to_string(), "duplicate identity 2 at [0].children[1]");
/// # Ok::<(), treediff_core::CanonicalizeError>(())
/// ```
pub fn validate_identities(tree: &Node, options: &DiffOptions) -> Result<(), ValidationError> {
    if *options.correlation() == Correlation::ByPosition {
        return Ok(());
    }
    check_siblings(sequence_of(Some(tree)), &Path::new(), options)
}

fn check_siblings(
    siblings: &[Node],
    parent: &Path,
    options: &DiffOptions,
) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for (index, node) in siblings.iter().enumerate() {
        let path = parent.clone().with_segment(PathSegment::Index(index));
        let (key, identity) = identify(node, index, options.correlation());
        if !seen.insert(key) {
            return Err(ValidationError::DuplicateIdentity { identity: identity.to_string(), path });
        }
        if let Some(field) = options.children_field() {
            let children = sequence_of(node.get(field));
            check_siblings(children, &path.with_segment(PathSegment::key(field)), options)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::try_compare_keyed_trees;

    fn node(json: &str) -> Node {
        Node::from_json_str(json).unwrap()
    }

    #[test]
    fn unique_identities_pass() {
        let tree = node("[{\"id\":1,\"children\":[{\"id\":1}]},{\"id\":2}]");
        assert!(validate_identities(&tree, &DiffOptions::default()).is_ok());
    }

    #[test]
    fn top_level_duplicate_is_reported() {
        let tree = node("[{\"id\":\"a\"},{\"id\":\"b\"},{\"id\":\"a\"}]");
        let err = validate_identities(&tree, &DiffOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateIdentity { identity: "a".into(), path: "[2]".parse().unwrap() }
        );
    }

    #[test]
    fn missing_identities_count_as_duplicates() {
        let tree = node("[{\"v\":1},{\"v\":2}]");
        assert!(validate_identities(&tree, &DiffOptions::default()).is_err());
        let positional = DiffOptions::default().with_correlation(Correlation::ByPosition).unwrap();
        assert!(validate_identities(&tree, &positional).is_ok());
    }

    #[test]
    fn strict_comparison_checks_both_sides() {
        let clean = node("[{\"id\":1}]");
        let dirty = node("[{\"id\":1},{\"id\":1}]");
        let options = DiffOptions::default();
        assert!(try_compare_keyed_trees(&clean, &dirty, &options).is_err());
        assert!(try_compare_keyed_trees(&dirty, &clean, &options).is_err());
        assert!(try_compare_keyed_trees(&clean, &clean, &options).unwrap().is_empty());
    }
}
