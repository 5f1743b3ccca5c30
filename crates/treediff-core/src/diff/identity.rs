use std::fmt;

use serde::Serialize;

use crate::{Correlation, Node};

/// What a diff node is correlated by.
///
/// Serializes untagged: the root as `null`, keys as strings, indices as
/// numbers and identity values as their JSON form. A diff node whose element
/// lacks the identity field omits `identity` altogether.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Identity {
    /// The document root (generic mode, scalar or mismatched roots).
    Root,
    /// Index of an array element, or of a keyed element under positional correlation.
    Index(usize),
    /// Object field name.
    Key(String),
    /// Value of the identity field of a keyed element.
    Value(Node),
}

impl Identity {
    /// Creates a key identity.
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    /// Indicates a keyed element that lacks the identity field.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Value(Node::Void))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => Ok(()),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Key(key) => f.write_str(key),
            Self::Value(value) => match value.scalar_text() {
                Some(text) => f.write_str(&text),
                None => match value.to_json_value() {
                    Some(json) => write!(f, "{json}"),
                    None => f.write_str("<absent>"),
                },
            },
        }
    }
}

/// Exact, ordered map key derived from an identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum IdentityKey {
    Position(usize),
    Absent,
    Null,
    Bool(bool),
    Number(u64),
    Text(String),
    Composite(String),
}

impl IdentityKey {
    fn of(value: &Node) -> Self {
        match value {
            Node::Void => Self::Absent,
            Node::Null => Self::Null,
            Node::Bool(v) => Self::Bool(*v),
            Node::Number(n) => Self::Number(n.identity_bits()),
            Node::String(s) => Self::Text(s.clone()),
            composite => Self::Composite(format!("{composite:?}")),
        }
    }
}

/// Resolves the identity of the element at `index` under `correlation`.
///
/// Elements without the identity field correlate as the absent value.
pub(crate) fn identify(
    node: &Node,
    index: usize,
    correlation: &Correlation,
) -> (IdentityKey, Identity) {
    match correlation {
        Correlation::ByPosition => (IdentityKey::Position(index), Identity::Index(index)),
        Correlation::ByIdentity(field) => {
            let value = node.get(field).cloned().unwrap_or_default();
            (IdentityKey::of(&value), Identity::Value(value))
        }
    }
}

/// Views a value as a keyed sequence: arrays as-is, `Void` and `null` as
/// empty, any other single value as a one-element sequence.
pub(crate) fn sequence_of(node: Option<&Node>) -> &[Node] {
    match node {
        Some(Node::Array(items)) => items.as_slice(),
        None | Some(Node::Void | Node::Null) => &[],
        Some(other) => std::slice::from_ref(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_numbers_share_a_key() {
        let lhs = Node::from_json_str("{\"id\":1}").unwrap();
        let rhs = Node::from_json_str("{\"id\":1.0}").unwrap();
        let by_id = Correlation::default();
        assert_eq!(identify(&lhs, 0, &by_id).0, identify(&rhs, 5, &by_id).0);
    }

    #[test]
    fn string_and_number_identities_differ() {
        let lhs = Node::from_json_str("{\"id\":1}").unwrap();
        let rhs = Node::from_json_str("{\"id\":\"1\"}").unwrap();
        let by_id = Correlation::default();
        assert_ne!(identify(&lhs, 0, &by_id).0, identify(&rhs, 0, &by_id).0);
    }

    #[test]
    fn missing_identity_is_absent() {
        let node = Node::from_json_str("{\"name\":\"x\"}").unwrap();
        let (key, identity) = identify(&node, 3, &Correlation::default());
        assert_eq!(key, IdentityKey::Absent);
        assert_eq!(identity, Identity::Value(Node::Void));
    }

    #[test]
    fn positional_identity_is_the_index() {
        let node = Node::from_json_str("{\"id\":9}").unwrap();
        let (key, identity) = identify(&node, 3, &Correlation::ByPosition);
        assert_eq!(key, IdentityKey::Position(3));
        assert_eq!(identity, Identity::Index(3));
    }

    #[test]
    fn sequences_tolerate_odd_shapes() {
        let single = Node::from_json_str("{\"id\":1}").unwrap();
        assert_eq!(sequence_of(None).len(), 0);
        assert_eq!(sequence_of(Some(&Node::Null)).len(), 0);
        assert_eq!(sequence_of(Some(&single)).len(), 1);
    }

    #[test]
    fn identities_display_compactly() {
        assert_eq!(Identity::Index(2).to_string(), "[2]");
        assert_eq!(Identity::Value(Node::from_json_str("\"a\"").unwrap()).to_string(), "a");
        assert_eq!(Identity::Value(Node::from_json_str("[1]").unwrap()).to_string(), "[1]");
        assert_eq!(Identity::Value(Node::Void).to_string(), "<absent>");
    }
}
