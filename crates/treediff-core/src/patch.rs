//! Applies generic-mode diffs.
//!
//! Each leaf node of the diff tree is interpreted by its absolute path:
//! updates replace the value found there, additions insert a field or array
//! element, deletions remove one. Every replaced or removed value must match
//! the payload recorded in the diff, so a diff only applies to the document
//! it was computed from. Deletions of one sibling group run after everything
//! else in that group, highest index first, so array tails shrink correctly.

use thiserror::Error;

use crate::{
    diff::{ChangeKind, DiffMode, DiffNode, Path, PathSegment},
    Diff, Node,
};

/// Errors that can occur while applying a diff.
///
/// ```
/// # use treediff_core::{DiffOptions, Node};
/// let base = Node::from_json_str("[1,2,3]")?;
/// let target = Node::from_json_str("[1,4,3]")?;
/// let diff = base.diff(&target, &DiffOptions::default());
/// let err = Node::from_json_str("[0,5,3]")?.apply_diff(&diff).unwrap_err();
/// assert_eq!(err.to_string(), "invalid patch at [1]: expected 2, got 5");
/// # Ok::<(), treediff_core::CanonicalizeError>(())
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PatchError {
    /// Keyed-tree diffs describe correlation, not edits.
    #[error("cannot apply a {mode:?} diff, only generic diffs can be applied")]
    UnsupportedMode {
        /// Mode of the rejected diff.
        mode: DiffMode,
    },
    /// The diff contains a node kind that has no edit semantics.
    #[error("cannot apply a {kind} node at {path}")]
    UnsupportedKind {
        /// Kind of the offending node.
        kind: ChangeKind,
        /// Location of the offending node.
        path: Path,
    },
    /// A path segment does not exist in the document.
    #[error("path {path} does not exist")]
    MissingPath {
        /// Path that failed to resolve.
        path: Path,
    },
    /// An addition targets a field that is already present.
    #[error("cannot add {path}, it already exists")]
    AlreadyExists {
        /// Path of the existing value.
        path: Path,
    },
    /// An array addition lies beyond the end of the array.
    #[error("index out of bounds at {path}, array has {len} elements")]
    IndexOutOfBounds {
        /// Path of the addition.
        path: Path,
        /// Current length of the array.
        len: usize,
    },
    /// The document holds a different value than the diff expects.
    #[error("invalid patch at {path}: expected {expected}, got {found}")]
    Mismatch {
        /// Location of the value.
        path: Path,
        /// JSON text of the value recorded in the diff.
        expected: String,
        /// JSON text of the value found in the document.
        found: String,
    },
}

pub(crate) fn apply_diff(node: &Node, diff: &Diff) -> Result<Node, PatchError> {
    if diff.mode() != DiffMode::GenericJson {
        return Err(PatchError::UnsupportedMode { mode: diff.mode() });
    }
    let mut current = node.clone();
    apply_group(&mut current, diff.nodes())?;
    Ok(current)
}

fn apply_group(root: &mut Node, group: &[DiffNode]) -> Result<(), PatchError> {
    for node in group.iter().filter(|node| node.kind != ChangeKind::Deleted) {
        apply_node(root, node)?;
    }
    for node in group.iter().rev().filter(|node| node.kind == ChangeKind::Deleted) {
        apply_node(root, node)?;
    }
    Ok(())
}

fn apply_node(root: &mut Node, node: &DiffNode) -> Result<(), PatchError> {
    if !node.children.is_empty() {
        return apply_group(root, &node.children);
    }
    match node.kind {
        ChangeKind::Modified => {
            let slot = resolve_mut(root, node.path.segments(), &node.path)?;
            expect_value(slot, &node.old_value, &node.path)?;
            *slot = node.new_value.clone();
            Ok(())
        }
        ChangeKind::Added => insert(root, &node.path, node.new_value.clone()),
        ChangeKind::Deleted => remove(root, &node.path, &node.old_value),
        kind @ (ChangeKind::Moved | ChangeKind::Unchanged) => {
            Err(PatchError::UnsupportedKind { kind, path: node.path.clone() })
        }
    }
}

fn insert(root: &mut Node, path: &Path, value: Node) -> Result<(), PatchError> {
    let Some((last, parents)) = path.segments().split_last() else {
        expect_value(root, &Node::Void, path)?;
        *root = value;
        return Ok(());
    };
    match (resolve_mut(root, parents, path)?, last) {
        (Node::Object(map), PathSegment::Key(key)) => {
            if map.contains_key(key) {
                return Err(PatchError::AlreadyExists { path: path.clone() });
            }
            map.insert(key.clone(), value);
            Ok(())
        }
        (Node::Array(items), PathSegment::Index(index)) => {
            if *index > items.len() {
                return Err(PatchError::IndexOutOfBounds { path: path.clone(), len: items.len() });
            }
            items.insert(*index, value);
            Ok(())
        }
        _ => Err(PatchError::MissingPath { path: path.clone() }),
    }
}

fn remove(root: &mut Node, path: &Path, expected: &Node) -> Result<(), PatchError> {
    let Some((last, parents)) = path.segments().split_last() else {
        expect_value(root, expected, path)?;
        *root = Node::Void;
        return Ok(());
    };
    let parent = resolve_mut(root, parents, path)?;
    let existing = resolve_mut(parent, std::slice::from_ref(last), path)?;
    expect_value(existing, expected, path)?;
    match (parent, last) {
        (Node::Object(map), PathSegment::Key(key)) => {
            map.remove(key);
        }
        (Node::Array(items), PathSegment::Index(index)) => {
            items.remove(*index);
        }
        _ => return Err(PatchError::MissingPath { path: path.clone() }),
    }
    Ok(())
}

fn resolve_mut<'a>(
    root: &'a mut Node,
    segments: &[PathSegment],
    path: &Path,
) -> Result<&'a mut Node, PatchError> {
    let mut current = root;
    for segment in segments {
        current = match (current, segment) {
            (Node::Object(map), PathSegment::Key(key)) => map.get_mut(key),
            (Node::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
            _ => None,
        }
        .ok_or_else(|| PatchError::MissingPath { path: path.clone() })?;
    }
    Ok(current)
}

fn expect_value(found: &Node, expected: &Node, path: &Path) -> Result<(), PatchError> {
    if found == expected {
        return Ok(());
    }
    Err(PatchError::Mismatch {
        path: path.clone(),
        expected: json_text(expected),
        found: json_text(found),
    })
}

fn json_text(node: &Node) -> String {
    match node {
        Node::Void => "nothing".to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compare_keyed_trees, compare_values, DiffOptions};

    fn node(json: &str) -> Node {
        Node::from_json_str(json).unwrap()
    }

    fn round_trip(old: &str, new: &str) {
        let old = node(old);
        let new = node(new);
        let diff = compare_values(&old, &new, &DiffOptions::default());
        assert_eq!(old.apply_diff(&diff).unwrap(), new);
    }

    #[test]
    fn applies_nested_object_changes() {
        round_trip("{\"a\":{\"b\":1,\"c\":2},\"d\":true}", "{\"a\":{\"b\":3,\"e\":4},\"f\":null}");
    }

    #[test]
    fn applies_array_growth_and_shrinkage() {
        round_trip("[1,2,3,4]", "[1]");
        round_trip("[1]", "[5,6,7]");
        round_trip("{\"rows\":[[1,2],[3]]}", "{\"rows\":[[1],[3,4,5]]}");
    }

    #[test]
    fn applies_root_replacements() {
        round_trip("1", "\"one\"");
        round_trip("{\"a\":1}", "[1]");
        let diff = compare_values(&Node::Void, &node("3"), &DiffOptions::default());
        assert_eq!(Node::Void.apply_diff(&diff).unwrap(), node("3"));
    }

    #[test]
    fn rejects_keyed_diffs() {
        let old = node("[{\"id\":1}]");
        let new = node("[]");
        let diff = compare_keyed_trees(&old, &new, &DiffOptions::default());
        assert_eq!(
            old.apply_diff(&diff).unwrap_err(),
            PatchError::UnsupportedMode { mode: DiffMode::KeyedTree }
        );
    }

    #[test]
    fn rejects_diff_for_another_document() {
        let diff = compare_values(&node("{\"a\":1}"), &node("{}"), &DiffOptions::default());
        let err = node("{\"a\":2}").apply_diff(&diff).unwrap_err();
        assert_eq!(err.to_string(), "invalid patch at a: expected 1, got 2");

        let err = node("{}").apply_diff(&diff).unwrap_err();
        assert_eq!(err, PatchError::MissingPath { path: "a".parse().unwrap() });
    }

    #[test]
    fn rejects_addition_over_existing_field() {
        let diff = compare_values(&node("{}"), &node("{\"a\":1}"), &DiffOptions::default());
        let err = node("{\"a\":0}").apply_diff(&diff).unwrap_err();
        assert_eq!(err, PatchError::AlreadyExists { path: "a".parse().unwrap() });
    }
}
