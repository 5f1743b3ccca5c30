//! Fuzzing harnesses for `treediff-core`.
//!
//! Each public function accepts raw bytes so it can be driven both from
//! `cargo fuzz` targets and from ordinary tests. Recoverable errors are
//! swallowed; the comparison invariants are asserted, so a violation shows up
//! as a crash.
//!
//! # Examples
//!
//! ```
//! treediff_fuzz::fuzz_canonicalization(b"{\"a\":1}");
//! treediff_fuzz::fuzz_diff(&[1, 2, 3, 4]);
//! treediff_fuzz::fuzz_keyed(b"keyed");
//! treediff_fuzz::fuzz_path(b"a.b[2]");
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use arbitrary::Unstructured;
use serde_json::{json, Map as JsonMap, Number as JsonNumber, Value as JsonValue};
use treediff_core::{
    compare_keyed_trees, compare_values, diff::ChangeKind, try_compare_keyed_trees, DiffOptions,
    Node, Path,
};

const MAX_DEPTH: usize = 4;
const MAX_ARRAY_LEN: u8 = 6;
const MAX_OBJECT_LEN: u8 = 6;
const MAX_STRING_LEN: u8 = 12;
const MAX_SIBLINGS: u8 = 6;
const IDENTITY_POOL: u8 = 8;

/// Feeds arbitrary bytes through the JSON and YAML canonicalization routines.
///
/// ```
/// treediff_fuzz::fuzz_canonicalization(b"{\"key\":\"value\"}");
/// ```
pub fn fuzz_canonicalization(data: &[u8]) {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = Node::from_json_str(text);
        let _ = Node::from_yaml_str(text);
    }
}

/// Compares random generic documents, then checks that an identical pair has
/// no diff and that applying the diff reproduces the new document.
///
/// ```
/// treediff_fuzz::fuzz_diff(b"seed");
/// ```
pub fn fuzz_diff(data: &[u8]) {
    let mut unstructured = Unstructured::new(data);
    let Some(lhs) = random_node(&mut unstructured) else {
        return;
    };
    let Some(rhs) = random_node(&mut unstructured) else {
        return;
    };
    let options = DiffOptions::default();
    assert!(compare_values(&lhs, &lhs, &options).is_empty());

    let diff = compare_values(&lhs, &rhs, &options);
    let patched = lhs.apply_diff(&diff).expect("diff applies to its own base");
    assert_eq!(patched, rhs);
    let _ = serde_json::to_string(&diff);
}

/// Compares random keyed forests and checks that deleted and added payloads
/// resolve at their reported paths.
///
/// ```
/// treediff_fuzz::fuzz_keyed(b"forest");
/// ```
pub fn fuzz_keyed(data: &[u8]) {
    let mut unstructured = Unstructured::new(data);
    let Some(lhs) = random_forest(&mut unstructured) else {
        return;
    };
    let Some(rhs) = random_forest(&mut unstructured) else {
        return;
    };
    let options = DiffOptions::default();
    assert!(compare_keyed_trees(&lhs, &lhs, &options).is_empty());

    let diff = compare_keyed_trees(&lhs, &rhs, &options);
    for node in diff.walk() {
        match node.kind {
            ChangeKind::Deleted => assert_eq!(lhs.get_path(&node.path), Some(&node.old_value)),
            ChangeKind::Added => assert_eq!(rhs.get_path(&node.path), Some(&node.new_value)),
            ChangeKind::Unchanged => assert!(!node.children.is_empty()),
            ChangeKind::Modified | ChangeKind::Moved => {}
        }
    }
    let _ = try_compare_keyed_trees(&lhs, &rhs, &options);
}

/// Parses arbitrary text as a path and checks that rendering parses back.
///
/// ```
/// treediff_fuzz::fuzz_path(b"[\"x.y\"][3]");
/// ```
pub fn fuzz_path(data: &[u8]) {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(path) = text.parse::<Path>() {
        let rendered = path.to_string();
        assert_eq!(rendered.parse::<Path>().ok(), Some(path));
    }
}

fn random_node(unstructured: &mut Unstructured<'_>) -> Option<Node> {
    let value = json_value_from_unstructured(unstructured, 0).ok()?;
    Node::from_json_value(value).ok()
}

fn random_forest(unstructured: &mut Unstructured<'_>) -> Option<Node> {
    let value = keyed_siblings(unstructured, 0).ok()?;
    Node::from_json_value(value).ok()
}

fn keyed_siblings(
    unstructured: &mut Unstructured<'_>,
    depth: usize,
) -> Result<JsonValue, arbitrary::Error> {
    let len = if depth >= MAX_DEPTH {
        0
    } else {
        usize::from(unstructured.int_in_range::<u8>(0..=MAX_SIBLINGS)?)
    };
    let mut siblings = Vec::with_capacity(len);
    for _ in 0..len {
        let id = unstructured.int_in_range::<u8>(0..=IDENTITY_POOL)?;
        let mut element = json!({ "id": id, "name": random_string(unstructured)? });
        if unstructured.arbitrary()? {
            element["children"] = keyed_siblings(unstructured, depth + 1)?;
        }
        siblings.push(element);
    }
    Ok(JsonValue::Array(siblings))
}

fn json_value_from_unstructured(
    unstructured: &mut Unstructured<'_>,
    depth: usize,
) -> Result<JsonValue, arbitrary::Error> {
    if depth >= MAX_DEPTH {
        return json_leaf(unstructured);
    }

    let choice = unstructured.int_in_range::<u8>(0..=5)?;
    match choice {
        0 => Ok(JsonValue::Null),
        1 => Ok(JsonValue::Bool(unstructured.arbitrary()?)),
        2 => Ok(JsonValue::Number(random_number(unstructured)?)),
        3 => Ok(JsonValue::String(random_string(unstructured)?)),
        4 => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_ARRAY_LEN)?);
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(json_value_from_unstructured(unstructured, depth + 1)?);
            }
            Ok(JsonValue::Array(items))
        }
        _ => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_OBJECT_LEN)?);
            let mut map = JsonMap::new();
            for _ in 0..len {
                let key = random_string(unstructured)?;
                let value = json_value_from_unstructured(unstructured, depth + 1)?;
                map.insert(key, value);
            }
            Ok(JsonValue::Object(map))
        }
    }
}

fn json_leaf(unstructured: &mut Unstructured<'_>) -> Result<JsonValue, arbitrary::Error> {
    let choice = unstructured.int_in_range::<u8>(0..=3)?;
    match choice {
        0 => Ok(JsonValue::Null),
        1 => Ok(JsonValue::Bool(unstructured.arbitrary()?)),
        2 => Ok(JsonValue::Number(random_number(unstructured)?)),
        _ => Ok(JsonValue::String(random_string(unstructured)?)),
    }
}

fn random_number(unstructured: &mut Unstructured<'_>) -> Result<JsonNumber, arbitrary::Error> {
    if unstructured.arbitrary()? {
        let int = unstructured.arbitrary::<i32>()?;
        Ok(JsonNumber::from(int))
    } else {
        let numerator = f64::from(unstructured.arbitrary::<i32>()?);
        let denominator = f64::from(unstructured.int_in_range::<u16>(1..=1024)?);
        JsonNumber::from_f64(numerator / denominator).ok_or(arbitrary::Error::IncorrectFormat)
    }
}

fn random_string(unstructured: &mut Unstructured<'_>) -> Result<String, arbitrary::Error> {
    let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_STRING_LEN)?);
    let mut string = String::with_capacity(len);
    for _ in 0..len {
        let byte = unstructured.int_in_range::<u8>(0x20..=0x7e)?;
        string.push(char::from(byte));
    }
    Ok(string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalization_handles_utf8() {
        fuzz_canonicalization(br"{}");
        fuzz_canonicalization(b"- a\n- b\n");
    }

    #[test]
    fn diff_harness_runs() {
        fuzz_diff(b"diff");
        fuzz_diff(&[5, 3, 5, 1, 4, 0, 9, 2, 5, 2, 200, 17, 3, 3, 3, 3]);
    }

    #[test]
    fn diff_harness_round_trips_every_seed() {
        for seed in 0u8..64 {
            let data: Vec<u8> = (0..96u8).map(|i| i.wrapping_mul(seed).wrapping_add(seed)).collect();
            fuzz_diff(&data);
        }
    }

    #[test]
    fn keyed_harness_runs() {
        fuzz_keyed(b"keyed forest seed with enough bytes to build siblings");
    }

    #[test]
    fn path_harness_runs() {
        fuzz_path(b"a.b[2][\"c.d\"]");
        fuzz_path(b"[[[");
    }
}
