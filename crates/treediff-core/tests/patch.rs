use treediff_core::{
    diff::{ChangeKind, DiffMode, DiffNode, Identity, Path},
    Diff, DiffOptions, Node, PatchError,
};

fn node(json: &str) -> Node {
    Node::from_json_str(json).unwrap()
}

#[test]
fn apply_diff_replaces_scalar() {
    let base = node("1");
    let target = node("2");
    let diff = base.diff(&target, &DiffOptions::default());
    assert_eq!(base.apply_diff(&diff).unwrap(), target);
}

#[test]
fn apply_diff_handles_object_insertion() {
    let base = node("{\"a\":1}");
    let target = node("{\"a\":1,\"b\":2}");
    let diff = base.diff(&target, &DiffOptions::default());
    assert_eq!(base.apply_diff(&diff).unwrap(), target);
}

#[test]
fn apply_diff_appends_at_array_end() {
    let add = DiffNode::new(Identity::Index(2), ChangeKind::Added, "items[2]".parse().unwrap())
        .with_new_value(node("\"c\""));
    let diff = Diff::from_nodes(DiffMode::GenericJson, vec![add]);
    let patched = node("{\"items\":[\"a\",\"b\"]}").apply_diff(&diff).unwrap();
    assert_eq!(patched, node("{\"items\":[\"a\",\"b\",\"c\"]}"));
}

#[test]
fn apply_diff_rejects_gaps_in_arrays() {
    let add = DiffNode::new(Identity::Index(5), ChangeKind::Added, "[5]".parse().unwrap())
        .with_new_value(node("1"));
    let diff = Diff::from_nodes(DiffMode::GenericJson, vec![add]);
    let err = node("[0]").apply_diff(&diff).unwrap_err();
    assert_eq!(err, PatchError::IndexOutOfBounds { path: "[5]".parse().unwrap(), len: 1 });
}

#[test]
fn apply_diff_rejects_moves() {
    let moved = DiffNode::new(Identity::Index(0), ChangeKind::Moved, Path::new());
    let diff = Diff::from_nodes(DiffMode::GenericJson, vec![moved]);
    let err = node("[]").apply_diff(&diff).unwrap_err();
    assert_eq!(err.to_string(), "cannot apply a moved node at ");
}

#[test]
fn apply_diff_honours_ignored_fields_only_in_detection() {
    let options = DiffOptions::default().with_ignored_fields(["ts"]).unwrap();
    let base = node("{\"ts\":1,\"v\":1}");
    let target = node("{\"ts\":2,\"v\":2}");
    let diff = base.diff(&target, &options);
    assert_eq!(base.apply_diff(&diff).unwrap(), node("{\"ts\":1,\"v\":2}"));
}
