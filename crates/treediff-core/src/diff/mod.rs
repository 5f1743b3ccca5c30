//! Diff data structures and algorithms.
//!
//! Two comparison modes share one result model:
//!
//! * keyed-tree mode ([`compare_keyed_trees`]) correlates the elements of a
//!   sequence by an identity field (or by position), reports field-level
//!   changes and moves, and recurses through a children field;
//! * generic mode ([`compare_values`]) walks arbitrary objects and arrays
//!   structurally and reports additions, deletions and updates by path.
//!
//! Both return a pruned [`Diff`]: only changed nodes and the ancestors of
//! changed nodes appear.

mod fields;
mod identity;
mod keyed;
mod list;
mod object;
mod path;
mod primitives;

pub use fields::compare_fields;
pub use identity::Identity;
pub use path::{Path, PathSegment};

pub(crate) use identity::{identify, sequence_of, IdentityKey};
pub(crate) use path::PathState;

use std::collections::BTreeMap;
use std::fmt;

use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::{validate, DiffOptions, IdSource, Node, NodeId, NodeIds, ValidationError};

/// Classification of a diff node.
///
/// Generic mode only produces `Added`, `Deleted` and `Modified`, which a
/// serialized [`Diff`] spells `add`, `delete` and `update`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Present only in the new tree.
    Added,
    /// Present only in the old tree.
    Deleted,
    /// Present in both with different content.
    Modified,
    /// Same content at a different index (keyed mode only).
    Moved,
    /// Same content and index; kept only as the ancestor of changed children.
    Unchanged,
}

impl ChangeKind {
    /// Returns the name of the kind in the vocabulary of `mode`.
    ///
    /// ```
    /// # use treediff_core::diff::{ChangeKind, DiffMode};
    /// assert_eq!(ChangeKind::Modified.name(DiffMode::KeyedTree), "modified");
    /// assert_eq!(ChangeKind::Modified.name(DiffMode::GenericJson), "update");
    /// ```
    #[must_use]
    pub fn name(self, mode: DiffMode) -> &'static str {
        match (mode, self) {
            (DiffMode::GenericJson, Self::Added) => "add",
            (DiffMode::GenericJson, Self::Deleted) => "delete",
            (DiffMode::GenericJson, Self::Modified) => "update",
            (_, Self::Added) => "added",
            (_, Self::Deleted) => "deleted",
            (_, Self::Modified) => "modified",
            (_, Self::Moved) => "moved",
            (_, Self::Unchanged) => "unchanged",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name(DiffMode::KeyedTree))
    }
}

/// Which comparison produced a [`Diff`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    /// [`compare_keyed_trees`].
    KeyedTree,
    /// [`compare_values`].
    GenericJson,
}

/// Old and new value of one changed field. A side where the field is absent
/// holds [`Node::Void`] and is omitted when serialized.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldChange {
    /// Value in the old tree.
    #[serde(skip_serializing_if = "Node::is_void")]
    pub old: Node,
    /// Value in the new tree.
    #[serde(skip_serializing_if = "Node::is_void")]
    pub new: Node,
}

/// Old and new index of a keyed element whose position changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Index in the old sequence.
    pub old_index: usize,
    /// Index in the new sequence.
    pub new_index: usize,
}

/// One entry of the diff tree.
///
/// `path` points into the new tree, except for `Deleted` nodes whose path
/// points into the old tree. Nodes are serialized through their [`Diff`], so
/// that `kind` uses the vocabulary of the comparison mode.
#[derive(Clone, Debug, PartialEq)]
pub struct DiffNode {
    /// Unique identifier (generic mode only).
    pub id: Option<NodeId>,
    /// Correlating key of the node.
    pub identity: Identity,
    /// Classification.
    pub kind: ChangeKind,
    /// Changed fields of a correlated keyed element.
    pub field_changes: BTreeMap<String, FieldChange>,
    /// Payload on the old side.
    pub old_value: Node,
    /// Payload on the new side.
    pub new_value: Node,
    /// Index change of a keyed element.
    pub position: Option<Position>,
    /// Machine path such as `a.b[2].c`.
    pub path: Path,
    /// Display path such as `a > b > [2] > c`.
    pub readable_path: String,
    /// Label-derived path.
    pub business_path: String,
    /// Changed descendants.
    pub children: Vec<DiffNode>,
}

impl DiffNode {
    /// Creates a node at `path` with empty payloads.
    ///
    /// ```
    /// # use treediff_core::diff::{ChangeKind, DiffNode, Identity, Path};
    /// let node = DiffNode::new(Identity::key("a"), ChangeKind::Added, "a".parse()?);
    /// assert_eq!(node.readable_path, "a");
    /// assert!(node.children.is_empty());
    /// # Ok::<(), treediff_core::PathError>(())
    /// ```
    #[must_use]
    pub fn new(identity: Identity, kind: ChangeKind, path: Path) -> Self {
        Self {
            id: None,
            identity,
            kind,
            field_changes: BTreeMap::new(),
            old_value: Node::Void,
            new_value: Node::Void,
            position: None,
            readable_path: path.readable(),
            business_path: String::new(),
            path,
            children: Vec::new(),
        }
    }

    pub(crate) fn at(identity: Identity, kind: ChangeKind, state: &PathState) -> Self {
        let path = match kind {
            ChangeKind::Deleted => state.old_path(),
            _ => state.new_path(),
        };
        Self::new(identity, kind, path.clone()).with_business_path(state.business_path())
    }

    /// Sets the identifier.
    #[must_use]
    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the changed fields.
    #[must_use]
    pub fn with_field_changes(mut self, changes: BTreeMap<String, FieldChange>) -> Self {
        self.field_changes = changes;
        self
    }

    /// Sets the old-side payload.
    #[must_use]
    pub fn with_old_value(mut self, value: Node) -> Self {
        self.old_value = value;
        self
    }

    /// Sets the new-side payload.
    #[must_use]
    pub fn with_new_value(mut self, value: Node) -> Self {
        self.new_value = value;
        self
    }

    /// Sets the index change.
    #[must_use]
    pub fn with_position(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    /// Sets the business path.
    #[must_use]
    pub fn with_business_path(mut self, business_path: impl Into<String>) -> Self {
        self.business_path = business_path.into();
        self
    }

    /// Sets the children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<DiffNode>) -> Self {
        self.children = children;
        self
    }
}

/// Ordered sequence of top-level diff nodes. Serializes as a JSON array.
///
/// ```
/// # use treediff_core::{DiffOptions, Node};
/// let lhs = Node::from_json_str("{\"a\":{\"b\":1}}")?;
/// let rhs = Node::from_json_str("{\"a\":{\"b\":1,\"c\":2}}")?;
/// let diff = lhs.diff(&rhs, &DiffOptions::default());
/// assert_eq!(diff.len(), 1);
/// assert_eq!(diff.walk().count(), 2);
/// # Ok::<(), treediff_core::CanonicalizeError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Diff {
    mode: DiffMode,
    nodes: Vec<DiffNode>,
}

impl Diff {
    /// Builds a diff from top-level nodes.
    #[must_use]
    pub fn from_nodes(mode: DiffMode, nodes: Vec<DiffNode>) -> Self {
        Self { mode, nodes }
    }

    /// Returns the mode that produced the diff.
    #[must_use]
    pub fn mode(&self) -> DiffMode {
        self.mode
    }

    /// Returns the number of top-level nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Indicates whether the two inputs were equal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the top-level nodes.
    #[must_use]
    pub fn nodes(&self) -> &[DiffNode] {
        &self.nodes
    }

    /// Returns an iterator over the top-level nodes.
    pub fn iter(&self) -> std::slice::Iter<'_, DiffNode> {
        self.nodes.iter()
    }

    /// Consumes the diff and returns the top-level nodes.
    #[must_use]
    pub fn into_nodes(self) -> Vec<DiffNode> {
        self.nodes
    }

    /// Visits every node of the tree, parents before children.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: self.nodes.iter().rev().collect() }
    }

    /// Counts the nodes of the tree per kind.
    #[must_use]
    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for node in self.walk() {
            match node.kind {
                ChangeKind::Added => summary.added += 1,
                ChangeKind::Deleted => summary.deleted += 1,
                ChangeKind::Modified => summary.modified += 1,
                ChangeKind::Moved => summary.moved += 1,
                ChangeKind::Unchanged => summary.unchanged += 1,
            }
        }
        summary
    }
}

impl Serialize for Diff {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Siblings { mode: self.mode, nodes: &self.nodes }.serialize(serializer)
    }
}

struct Siblings<'a> {
    mode: DiffMode,
    nodes: &'a [DiffNode],
}

impl Serialize for Siblings<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.nodes.iter().map(|node| Entry { mode: self.mode, node }))
    }
}

/// A node written with the kind names of `mode`. Empty parts are omitted.
struct Entry<'a> {
    mode: DiffMode,
    node: &'a DiffNode,
}

impl Serialize for Entry<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let node = self.node;
        let mut entry = serializer.serialize_struct("DiffNode", 11)?;
        match node.id {
            Some(id) => entry.serialize_field("id", &id)?,
            None => entry.skip_field("id")?,
        }
        if node.identity.is_absent() {
            entry.skip_field("identity")?;
        } else {
            entry.serialize_field("identity", &node.identity)?;
        }
        entry.serialize_field("kind", node.kind.name(self.mode))?;
        if node.field_changes.is_empty() {
            entry.skip_field("field_changes")?;
        } else {
            entry.serialize_field("field_changes", &node.field_changes)?;
        }
        if node.old_value.is_void() {
            entry.skip_field("old_value")?;
        } else {
            entry.serialize_field("old_value", &node.old_value)?;
        }
        if node.new_value.is_void() {
            entry.skip_field("new_value")?;
        } else {
            entry.serialize_field("new_value", &node.new_value)?;
        }
        match &node.position {
            Some(position) => entry.serialize_field("position", position)?,
            None => entry.skip_field("position")?,
        }
        entry.serialize_field("path", &node.path)?;
        entry.serialize_field("readable_path", &node.readable_path)?;
        entry.serialize_field("business_path", &node.business_path)?;
        if node.children.is_empty() {
            entry.skip_field("children")?;
        } else {
            entry.serialize_field(
                "children",
                &Siblings { mode: self.mode, nodes: &node.children },
            )?;
        }
        entry.end()
    }
}

impl IntoIterator for Diff {
    type Item = DiffNode;
    type IntoIter = std::vec::IntoIter<DiffNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a DiffNode;
    type IntoIter = std::slice::Iter<'a, DiffNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Pre-order iterator returned by [`Diff::walk`].
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<&'a DiffNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a DiffNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Node counts per [`ChangeKind`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Added nodes.
    pub added: usize,
    /// Deleted nodes.
    pub deleted: usize,
    /// Modified nodes, including update wrappers in generic mode.
    pub modified: usize,
    /// Moved nodes.
    pub moved: usize,
    /// Unchanged ancestors of changed nodes.
    pub unchanged: usize,
}

impl DiffSummary {
    /// Number of nodes that represent a change of their own.
    #[must_use]
    pub fn changes(&self) -> usize {
        self.added + self.deleted + self.modified + self.moved
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} deleted, {} modified, {} moved",
            self.added, self.deleted, self.modified, self.moved
        )
    }
}

/// Compares two keyed trees.
///
/// Siblings are correlated per [`DiffOptions::correlation`]; the children
/// field is recursed into. Duplicate identities within one sibling group are
/// not an error: the later element wins. Use [`try_compare_keyed_trees`] to
/// reject them instead.
///
/// ```
/// # use treediff_core::{compare_keyed_trees, diff::ChangeKind, DiffOptions, Node};
/// let old = Node::from_json_str("[{\"id\":1},{\"id\":2}]")?;
/// let new = Node::from_json_str("[{\"id\":2},{\"id\":1}]")?;
/// let diff = compare_keyed_trees(&old, &new, &DiffOptions::default());
/// assert!(diff.iter().all(|node| node.kind == ChangeKind::Moved));
/// # Ok::<(), treediff_core::CanonicalizeError>(())
/// ```
#[must_use]
pub fn compare_keyed_trees(old: &Node, new: &Node, options: &DiffOptions) -> Diff {
    let excluded = options.structural_exclusions();
    let nodes = keyed::diff_sequence(
        sequence_of(Some(old)),
        sequence_of(Some(new)),
        &PathState::root(),
        options,
        &excluded,
    );
    debug!(
        correlation = %options.correlation(),
        top_level = nodes.len(),
        "compared keyed trees"
    );
    Diff::from_nodes(DiffMode::KeyedTree, nodes)
}

/// Like [`compare_keyed_trees`], but first rejects duplicate identities in
/// either tree.
///
/// ```
/// # use treediff_core::{try_compare_keyed_trees, DiffOptions, Node};
/// let old = Node::from_json_str("[{\"id\":1},{\"id\":1}]")?;
/// let new = Node::from_json_str("[]")?;
/// assert!(try_compare_keyed_trees(&old, &new, &DiffOptions::default()).is_err());
/// # Ok::<(), treediff_core::CanonicalizeError>(())
/// ```
pub fn try_compare_keyed_trees(
    old: &Node,
    new: &Node,
    options: &DiffOptions,
) -> Result<Diff, ValidationError> {
    validate::validate_identities(old, options)?;
    validate::validate_identities(new, options)?;
    Ok(compare_keyed_trees(old, new, options))
}

/// Compares two generic documents with a fresh id counter, so repeated calls
/// on the same inputs produce identical results.
///
/// ```
/// # use treediff_core::{compare_values, diff::ChangeKind, DiffOptions, Node};
/// let old = Node::from_json_str("{\"a\":{\"b\":1}}")?;
/// let new = Node::from_json_str("{\"a\":{\"b\":1,\"c\":2}}")?;
/// let diff = compare_values(&old, &new, &DiffOptions::default());
/// let update = &diff.nodes()[0];
/// assert_eq!(update.kind, ChangeKind::Modified);
/// assert_eq!(update.children[0].path.to_string(), "a.c");
/// # Ok::<(), treediff_core::CanonicalizeError>(())
/// ```
#[must_use]
pub fn compare_values(old: &Node, new: &Node, options: &DiffOptions) -> Diff {
    compare_values_with(old, new, options, &mut NodeIds::new())
}

/// Compares two generic documents, drawing node ids from `ids`.
pub fn compare_values_with<S>(old: &Node, new: &Node, options: &DiffOptions, ids: &mut S) -> Diff
where
    S: IdSource + ?Sized,
{
    let mut walker = Walker { options, ids };
    let root = PathState::root();
    let nodes = match (old, new) {
        (Node::Object(lhs), Node::Object(rhs)) => object::diff_objects(lhs, rhs, &root, &mut walker),
        (Node::Array(lhs), Node::Array(rhs)) => list::diff_lists(lhs, rhs, &root, &mut walker),
        _ => primitives::diff_primitives(old, new, Identity::Root, &root, &mut walker)
            .into_iter()
            .collect(),
    };
    debug!(top_level = nodes.len(), "compared values");
    Diff::from_nodes(DiffMode::GenericJson, nodes)
}

/// Shared state of one generic-mode comparison.
pub(crate) struct Walker<'a, S: ?Sized> {
    options: &'a DiffOptions,
    ids: &'a mut S,
}

impl<S: IdSource + ?Sized> Walker<'_, S> {
    fn emit(&mut self, identity: Identity, kind: ChangeKind, state: &PathState) -> DiffNode {
        DiffNode::at(identity, kind, state).with_id(self.ids.next_id())
    }
}

/// Compares two values found at the same location. Containers of the same
/// kind are walked and wrapped in a `Modified` node when anything beneath
/// them changed; everything else is compared as a leaf.
fn diff_entry<S>(
    old: &Node,
    new: &Node,
    identity: Identity,
    state: &PathState,
    walker: &mut Walker<'_, S>,
) -> Option<DiffNode>
where
    S: IdSource + ?Sized,
{
    let children = match (old, new) {
        (Node::Object(lhs), Node::Object(rhs)) => object::diff_objects(lhs, rhs, state, walker),
        (Node::Array(lhs), Node::Array(rhs)) => list::diff_lists(lhs, rhs, state, walker),
        _ => return primitives::diff_primitives(old, new, identity, state, walker),
    };
    if children.is_empty() {
        return None;
    }
    Some(walker.emit(identity, ChangeKind::Modified, state).with_children(children))
}
