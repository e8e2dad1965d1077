// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::path::Path;

use anyhow::Result;
use serial_test::serial;
use tfevar::{lookup_tfvars_files, Error, Layer, RawValue, SourceKind, SourceStack};

#[test]
fn assignments_become_cli_candidates() -> Result<()> {
    let layer = Layer::from_assignments(["image_id=abc123", "region=us-west-1"])?;
    assert_eq!(layer.kind(), SourceKind::CliFlag);

    let mut stack = SourceStack::new();
    stack.push(layer);
    let merged = stack.merge();

    let candidate = &merged["image_id"];
    assert_eq!(candidate.kind, SourceKind::CliFlag);
    assert!(matches!(&candidate.raw, RawValue::String(s) if s == "abc123"));

    // everything right of the first separator is kept verbatim
    let layer = Layer::from_assignments(["query=a=b=c"])?;
    let mut stack = SourceStack::new();
    stack.push(layer);
    let merged = stack.merge();
    assert!(matches!(&merged["query"].raw, RawValue::String(s) if s == "a=b=c"));

    Ok(())
}

#[test]
fn assignment_without_separator_is_rejected() {
    let err = Layer::from_assignments(["unknown"]).unwrap_err();
    assert!(matches!(err, Error::BadVarString(_)));
    assert_eq!(err.to_string(), "bad var string 'unknown'");
}

#[test]
fn file_candidates_keep_expression_text() -> Result<()> {
    let layer = Layer::from_file(Path::new("tests/testdata/my.tfvars"), SourceKind::File)?;

    let mut stack = SourceStack::new();
    stack.push(layer);
    let merged = stack.merge();

    let candidate = &merged["image_id"];
    assert_eq!(candidate.kind, SourceKind::File);
    assert_eq!(candidate.label.as_ref(), "tests/testdata/my.tfvars");
    assert!(matches!(&candidate.raw, RawValue::Expression(s) if s == "\"xyz789\""));

    Ok(())
}

#[test]
fn json_file_candidates_are_expressions() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("values.tfvars.json");
    std::fs::write(&path, r#"{"image_id": "abc", "ports": [80, 443]}"#)?;

    let layer = Layer::from_file(&path, SourceKind::AutoFile)?;
    let mut stack = SourceStack::new();
    stack.push(layer);
    let merged = stack.merge();

    assert!(matches!(&merged["image_id"].raw, RawValue::Expression(s) if s == "\"abc\""));
    assert!(matches!(&merged["ports"].raw, RawValue::Expression(s) if s == "[80,443]"));

    Ok(())
}

#[test]
fn unparsable_file_is_rejected() {
    let err = Layer::from_file(Path::new("tests/testdata/bad.tfvars"), SourceKind::File)
        .unwrap_err();
    assert!(matches!(err, Error::ParseFile { .. }));
    assert!(err
        .to_string()
        .contains("failed to parse tests/testdata/bad.tfvars"));
}

#[test]
fn missing_file_is_rejected() {
    let err =
        Layer::from_file(Path::new("tests/testdata/none.tfvars"), SourceKind::File).unwrap_err();
    assert!(matches!(err, Error::ParseFile { .. }));
}

#[test]
#[serial]
fn environment_snapshot_is_collected() {
    std::env::set_var("TF_VAR_image_id", "abc123");
    std::env::set_var("TFVAR_not_ours", "nope");

    let layer = Layer::from_env();
    let names: Vec<&str> = layer.names().collect();
    assert!(names.contains(&"image_id"));
    assert!(!names.contains(&"not_ours"));

    let mut stack = SourceStack::new();
    stack.push(layer);
    let merged = stack.merge();
    let candidate = &merged["image_id"];
    assert_eq!(candidate.kind, SourceKind::Env);
    assert_eq!(candidate.label.as_ref(), "TF_VAR_image_id");
    assert!(matches!(&candidate.raw, RawValue::String(s) if s == "abc123"));

    std::env::remove_var("TF_VAR_image_id");
    std::env::remove_var("TFVAR_not_ours");
}

#[test]
fn later_layers_take_precedence() -> Result<()> {
    let mut stack = SourceStack::new();
    stack.push(Layer::from_assignments(["x=first", "y=only"])?);
    stack.push(Layer::from_assignments(["x=second"])?);

    let merged = stack.merge();
    assert!(matches!(&merged["x"].raw, RawValue::String(s) if s == "second"));
    assert!(matches!(&merged["y"].raw, RawValue::String(s) if s == "only"));

    // within one layer, the last repeat wins
    let mut stack = SourceStack::new();
    stack.push(Layer::from_assignments(["x=a", "x=b"])?);
    assert!(matches!(&stack.merge()["x"].raw, RawValue::String(s) if s == "b"));

    Ok(())
}

#[test]
fn auto_files_follow_the_naming_convention() -> Result<()> {
    let dir = tempfile::tempdir()?;
    for name in [
        "z.auto.tfvars",
        "a.auto.tfvars",
        "b.auto.tfvars.json",
        "terraform.tfvars",
        "terraform.tfvars.json",
        "ignored.tfvars",
        "notes.txt",
    ] {
        std::fs::write(dir.path().join(name), "")?;
    }
    std::fs::create_dir(dir.path().join("sub"))?;
    std::fs::write(dir.path().join("sub").join("c.auto.tfvars"), "")?;

    let files = lookup_tfvars_files(dir.path());
    let names: Vec<&str> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap())
        .collect();

    assert_eq!(
        names,
        vec![
            "terraform.tfvars",
            "terraform.tfvars.json",
            "a.auto.tfvars",
            "b.auto.tfvars.json",
            "z.auto.tfvars",
        ]
    );

    Ok(())
}

#[test]
fn empty_directory_has_no_auto_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    assert!(lookup_tfvars_files(dir.path()).is_empty());
    // a missing directory is not an error either
    assert!(lookup_tfvars_files(Path::new("tests/testdata/nope")).is_empty());
    Ok(())
}
