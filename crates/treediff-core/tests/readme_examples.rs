use treediff_core::{diff::ChangeKind, DiffOptions, Node};

#[test]
fn treediff_core_readme_keyed_example() -> Result<(), Box<dyn std::error::Error>> {
    let old = Node::from_json_str(
        r#"[{"id":1,"name":"Docs","children":[{"id":2,"name":"Intro"},{"id":3,"name":"Setup"}]}]"#,
    )?;
    let new = Node::from_json_str(
        r#"[{"id":1,"name":"Docs","children":[{"id":3,"name":"Install"},{"id":2,"name":"Intro"}]}]"#,
    )?;
    let options = DiffOptions::default().with_label_field("name")?;

    let diff = old.diff_keyed(&new, &options);
    println!("{}", serde_json::to_string_pretty(&diff)?);

    let docs = &diff.nodes()[0];
    assert_eq!(docs.kind, ChangeKind::Unchanged);
    let setup = &docs.children[0];
    assert_eq!(setup.kind, ChangeKind::Modified);
    assert_eq!(setup.business_path, "Docs > Install");
    assert_eq!(docs.children[1].kind, ChangeKind::Moved);
    Ok(())
}

#[test]
fn treediff_core_readme_json_example() -> Result<(), Box<dyn std::error::Error>> {
    let base = Node::from_yaml_str("name: treediff\nversion: 1\n")?;
    let target = Node::from_json_str(r#"{"name":"treediff","version":2}"#)?;

    let diff = base.diff(&target, &DiffOptions::default());
    assert_eq!(diff.len(), 1);
    assert_eq!(diff.summary().to_string(), "0 added, 0 deleted, 1 modified, 0 moved");

    let patched = base.apply_diff(&diff)?;
    assert_eq!(patched, target);
    Ok(())
}
