use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::{
    diff::{Path, PathSegment},
    CanonicalizeError, Diff, DiffOptions, Number, PatchError,
};

/// Tagged tree value compared by the diff engine.
///
/// The variant is decided once at ingestion, so every comparison dispatches on
/// a closed set of shapes. `Object` keeps keys in sorted order, which makes
/// every traversal of a mapping deterministic.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(try_from = "JsonValue")]
pub enum Node {
    /// Sentinel representing the absence of a value.
    #[default]
    Void,
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number represented as IEEE-754 double precision.
    Number(Number),
    /// JSON string.
    String(String),
    /// Ordered sequence.
    Array(Vec<Node>),
    /// Mapping with deterministic key ordering.
    Object(BTreeMap<String, Node>),
}

impl Node {
    /// Parses a JSON string into a tree value. Blank input yields [`Node::Void`].
    ///
    /// ```
    /// # use treediff_core::Node;
    /// let node = Node::from_json_str("{\"hello\":\"world\"}")?;
    /// assert!(matches!(node, Node::Object(_)));
    /// # Ok::<(), treediff_core::CanonicalizeError>(())
    /// ```
    pub fn from_json_str(input: &str) -> Result<Self, CanonicalizeError> {
        if input.trim().is_empty() {
            return Ok(Self::Void);
        }
        let value: JsonValue = serde_json::from_str(input)?;
        Self::from_json_value(value)
    }

    /// Parses a YAML string into a tree value. Blank input yields [`Node::Void`].
    ///
    /// ```
    /// # use treediff_core::Node;
    /// let node = Node::from_yaml_str("- id: 1\n  name: root\n")?;
    /// assert!(matches!(node, Node::Array(_)));
    /// # Ok::<(), treediff_core::CanonicalizeError>(())
    /// ```
    pub fn from_yaml_str(input: &str) -> Result<Self, CanonicalizeError> {
        if input.trim().is_empty() {
            return Ok(Self::Void);
        }
        let value: YamlValue = serde_yaml::from_str(input)?;
        Self::from_yaml_value(value)
    }

    /// Converts a serde JSON value into a [`Node`].
    pub fn from_json_value(value: JsonValue) -> Result<Self, CanonicalizeError> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(v) => Ok(Self::Bool(v)),
            JsonValue::Number(num) => {
                let Some(as_f64) = num.as_f64() else {
                    return Err(CanonicalizeError::NumberOutOfRange { value: num.to_string() });
                };
                Ok(Self::Number(Number::new(as_f64)?))
            }
            JsonValue::String(s) => Ok(Self::String(s)),
            JsonValue::Array(values) => {
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    items.push(Self::from_json_value(value)?);
                }
                Ok(Self::Array(items))
            }
            JsonValue::Object(map) => {
                let mut object = BTreeMap::new();
                for (key, value) in map {
                    object.insert(key, Self::from_json_value(value)?);
                }
                Ok(Self::Object(object))
            }
        }
    }

    fn from_yaml_value(value: YamlValue) -> Result<Self, CanonicalizeError> {
        match value {
            YamlValue::Null => Ok(Self::Null),
            YamlValue::Bool(v) => Ok(Self::Bool(v)),
            YamlValue::Number(num) => {
                if let Some(f) = num.as_f64() {
                    return Ok(Self::Number(Number::new(f)?));
                }
                if let Some(i) = num.as_i64() {
                    return Ok(Self::Number(Number::new(i as f64)?));
                }
                if let Some(u) = num.as_u64() {
                    return Ok(Self::Number(Number::new(u as f64)?));
                }
                Err(CanonicalizeError::NumberOutOfRange { value: num.to_string() })
            }
            YamlValue::String(s) => Ok(Self::String(s)),
            YamlValue::Sequence(seq) => {
                let mut items = Vec::with_capacity(seq.len());
                for value in seq {
                    items.push(Self::from_yaml_value(value)?);
                }
                Ok(Self::Array(items))
            }
            YamlValue::Mapping(map) => {
                let mut object = BTreeMap::new();
                for (key, value) in map {
                    let key = match key {
                        YamlValue::String(s) => s,
                        other => {
                            return Err(CanonicalizeError::NonStringYamlKey {
                                found: format!("{other:?}"),
                            });
                        }
                    };
                    object.insert(key, Self::from_yaml_value(value)?);
                }
                Ok(Self::Object(object))
            }
            YamlValue::Tagged(tagged) => {
                Err(CanonicalizeError::UnsupportedYamlTag { tag: tagged.tag.to_string() })
            }
        }
    }

    /// Converts the node into a serde JSON value when representable.
    ///
    /// Returns `None` when the node contains the `Void` sentinel anywhere,
    /// because `serde_json::Value` cannot represent the absence of a value.
    #[must_use]
    pub fn to_json_value(&self) -> Option<JsonValue> {
        match self {
            Self::Void => None,
            Self::Null => Some(JsonValue::Null),
            Self::Bool(v) => Some(JsonValue::Bool(*v)),
            Self::Number(n) => Some(JsonValue::Number(n.to_json_number())),
            Self::String(s) => Some(JsonValue::String(s.clone())),
            Self::Array(values) => {
                let mut result = Vec::with_capacity(values.len());
                for value in values {
                    result.push(value.to_json_value()?);
                }
                Some(JsonValue::Array(result))
            }
            Self::Object(map) => {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json_value()?);
                }
                Some(JsonValue::Object(object))
            }
        }
    }

    /// Indicates whether this is the absent-value sentinel.
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Looks up a field of an object. Non-objects have no fields.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Node> {
        match self {
            Self::Object(map) => map.get(field),
            _ => None,
        }
    }

    /// Resolves a path against this value.
    ///
    /// ```
    /// # use treediff_core::Node;
    /// let node = Node::from_json_str("{\"a\":{\"b\":[10,20]}}")?;
    /// let path = "a.b[1]".parse()?;
    /// assert_eq!(node.get_path(&path), Some(&Node::from_json_str("20")?));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn get_path(&self, path: &Path) -> Option<&Node> {
        let mut current = self;
        for segment in path {
            current = match (current, segment) {
                (Self::Object(map), PathSegment::Key(key)) => map.get(key)?,
                (Self::Array(items), PathSegment::Index(index)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Text of a scalar value, as it would appear in a label. Containers and
    /// `Void` have no scalar text.
    #[must_use]
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Null => Some("null".to_string()),
            Self::Bool(v) => Some(v.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Void | Self::Array(_) | Self::Object(_) => None,
        }
    }

    /// Reads `field` of an object as a display label.
    #[must_use]
    pub fn label(&self, field: &str) -> Option<String> {
        self.get(field).and_then(Node::scalar_text)
    }

    /// Deep equality that skips the `ignored` fields of every object, at any depth.
    ///
    /// Arrays compare positionally; objects compare by key set regardless of
    /// key order; values of different kinds are never equal.
    ///
    /// ```
    /// # use std::collections::BTreeSet;
    /// # use treediff_core::Node;
    /// let lhs = Node::from_json_str("{\"name\":\"a\",\"updated\":1}")?;
    /// let rhs = Node::from_json_str("{\"name\":\"a\",\"updated\":2}")?;
    /// let ignored = BTreeSet::from(["updated".to_string()]);
    /// assert!(lhs.eq_ignoring(&rhs, &ignored));
    /// assert!(!lhs.eq_ignoring(&rhs, &BTreeSet::new()));
    /// # Ok::<(), treediff_core::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn eq_ignoring(&self, other: &Self, ignored: &BTreeSet<String>) -> bool {
        match (self, other) {
            (Self::Void, Self::Void) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x.eq_ignoring(y, ignored))
            }
            (Self::Object(a), Self::Object(b)) => {
                let retained = |map: &BTreeMap<String, Node>| {
                    map.keys().filter(|key| !ignored.contains(*key)).count()
                };
                if retained(a) != retained(b) {
                    return false;
                }
                a.iter().filter(|(key, _)| !ignored.contains(*key)).all(|(key, value)| {
                    b.get(key).is_some_and(|other| value.eq_ignoring(other, ignored))
                })
            }
            _ => false,
        }
    }

    /// Compares two generic documents structurally.
    ///
    /// ```
    /// # use treediff_core::{DiffOptions, Node};
    /// let lhs = Node::from_json_str("{\"a\":1}")?;
    /// let rhs = Node::from_json_str("{\"a\":2}")?;
    /// let diff = lhs.diff(&rhs, &DiffOptions::default());
    /// assert_eq!(diff.len(), 1);
    /// # Ok::<(), treediff_core::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn diff(&self, other: &Self, options: &DiffOptions) -> Diff {
        crate::diff::compare_values(self, other, options)
    }

    /// Compares two keyed trees, correlating siblings by the configured identity.
    #[must_use]
    pub fn diff_keyed(&self, other: &Self, options: &DiffOptions) -> Diff {
        crate::diff::compare_keyed_trees(self, other, options)
    }

    /// Applies a generic-mode diff to this value, returning the patched value.
    ///
    /// ```
    /// # use treediff_core::{DiffOptions, Node};
    /// let base = Node::from_json_str("{\"a\":[1,2,3]}")?;
    /// let target = Node::from_json_str("{\"a\":[1,4],\"b\":true}")?;
    /// let diff = base.diff(&target, &DiffOptions::default());
    /// assert_eq!(base.apply_diff(&diff)?, target);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn apply_diff(&self, diff: &Diff) -> Result<Self, PatchError> {
        crate::patch::apply_diff(self, diff)
    }
}

impl TryFrom<JsonValue> for Node {
    type Error = CanonicalizeError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Self::from_json_value(value)
    }
}

/// Serializes as plain JSON. `Void` has no JSON form and is written as `null`.
impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Void | Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Number(n) => n.to_json_number().serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => serializer.collect_seq(items),
            Self::Object(map) => serializer.collect_map(map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::{
        collection::{btree_map, vec},
        prelude::*,
        string::string_regex,
    };

    fn arb_json_value() -> impl Strategy<Value = JsonValue> {
        let leaf = prop_oneof![
            Just(JsonValue::Null),
            any::<bool>().prop_map(JsonValue::Bool),
            proptest::num::f64::ANY.prop_filter_map("finite", |f| {
                if f.is_finite() {
                    serde_json::Number::from_f64(f).map(JsonValue::Number)
                } else {
                    None
                }
            }),
            string_regex("[a-zA-Z0-9]{0,8}").unwrap().prop_map(JsonValue::String),
        ];
        leaf.prop_recursive(4, 8, 4, move |inner| {
            prop_oneof![
                vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
                btree_map(string_regex("[a-zA-Z0-9]{1,8}").unwrap(), inner, 0..4).prop_map(|map| {
                    let mut object = serde_json::Map::new();
                    for (k, v) in map {
                        object.insert(k, v);
                    }
                    JsonValue::Object(object)
                }),
            ]
        })
    }

    fn set(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|key| key.to_string()).collect()
    }

    #[test]
    fn json_whitespace_is_void() {
        let node = Node::from_json_str("   \n\t").expect("whitespace should canonicalize to void");
        assert!(node.is_void());
    }

    #[test]
    fn json_number_out_of_range_yields_error() {
        let err = Node::from_json_str("1e400").unwrap_err();
        match err {
            CanonicalizeError::NumberOutOfRange { .. } | CanonicalizeError::Json(_) => {}
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn yaml_non_string_key_errors() {
        let err = Node::from_yaml_str("? [1, 2]: 3").unwrap_err();
        let CanonicalizeError::NonStringYamlKey { .. } = err else {
            panic!("expected NonStringYamlKey error");
        };
    }

    #[test]
    fn serializes_as_plain_json() {
        let node = Node::from_json_str("{\"a\":[1,2.5,null],\"b\":\"x\"}").unwrap();
        assert_eq!(serde_json::to_string(&node).unwrap(), "{\"a\":[1,2.5,null],\"b\":\"x\"}");
    }

    #[test]
    fn deserializes_from_plain_json() {
        let node: Node = serde_json::from_str("[true,{\"k\":1}]").unwrap();
        assert_eq!(node, Node::from_json_str("[true,{\"k\":1}]").unwrap());
    }

    #[test]
    fn object_equality_ignores_key_order() {
        let lhs = Node::from_json_str("{\"a\":1,\"b\":2}").unwrap();
        let rhs = Node::from_json_str("{\"b\":2,\"a\":1}").unwrap();
        assert!(lhs.eq_ignoring(&rhs, &BTreeSet::new()));
    }

    #[test]
    fn array_equality_respects_order() {
        let lhs = Node::from_json_str("[1,2]").unwrap();
        let rhs = Node::from_json_str("[2,1]").unwrap();
        assert!(!lhs.eq_ignoring(&rhs, &BTreeSet::new()));
    }

    #[test]
    fn mixed_kinds_are_never_equal() {
        let object = Node::from_json_str("{}").unwrap();
        let array = Node::from_json_str("[]").unwrap();
        let string = Node::from_json_str("\"1\"").unwrap();
        let number = Node::from_json_str("1").unwrap();
        assert!(!object.eq_ignoring(&array, &BTreeSet::new()));
        assert!(!string.eq_ignoring(&number, &BTreeSet::new()));
        assert!(!Node::Null.eq_ignoring(&Node::Void, &BTreeSet::new()));
    }

    #[test]
    fn ignored_fields_apply_at_every_depth() {
        let lhs = Node::from_json_str("{\"a\":{\"ts\":1,\"v\":1},\"ts\":5}").unwrap();
        let rhs = Node::from_json_str("{\"a\":{\"v\":1}}").unwrap();
        assert!(lhs.eq_ignoring(&rhs, &set(&["ts"])));
        assert!(!lhs.eq_ignoring(&rhs, &BTreeSet::new()));
    }

    #[test]
    fn object_key_sets_must_match_after_ignoring() {
        let lhs = Node::from_json_str("{\"a\":1,\"b\":null}").unwrap();
        let rhs = Node::from_json_str("{\"a\":1,\"c\":null}").unwrap();
        assert!(!lhs.eq_ignoring(&rhs, &BTreeSet::new()));
        assert!(lhs.eq_ignoring(&rhs, &set(&["b", "c"])));
    }

    #[test]
    fn get_path_walks_keys_and_indices() {
        let node = Node::from_json_str("[{\"children\":[{\"id\":7}]}]").unwrap();
        let path: Path = "[0].children[0].id".parse().unwrap();
        assert_eq!(node.get_path(&path), Some(&Node::from_json_str("7").unwrap()));
        let missing: Path = "[0].children[3]".parse().unwrap();
        assert_eq!(node.get_path(&missing), None);
        assert_eq!(node.get_path(&Path::new()), Some(&node));
    }

    #[test]
    fn labels_read_scalar_fields_only() {
        let node = Node::from_json_str("{\"title\":\"Home\",\"rank\":2,\"meta\":{}}").unwrap();
        assert_eq!(node.label("title").as_deref(), Some("Home"));
        assert_eq!(node.label("rank").as_deref(), Some("2"));
        assert_eq!(node.label("meta"), None);
        assert_eq!(node.label("missing"), None);
    }

    proptest! {
        #[test]
        fn json_roundtrips_through_node(value in arb_json_value()) {
            let node = Node::from_json_value(value.clone()).unwrap();
            let reconstructed = node.to_json_value().unwrap();
            let node_again = Node::from_json_value(reconstructed).unwrap();
            prop_assert_eq!(node_again, node);
        }

        #[test]
        fn equality_is_reflexive(value in arb_json_value()) {
            let node = Node::from_json_value(value).unwrap();
            prop_assert!(node.eq_ignoring(&node, &BTreeSet::new()));
        }
    }
}
