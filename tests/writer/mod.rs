// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use pretty_assertions::assert_eq;
use tfevar::unstable::{Parser, Source};
use tfevar::{
    write_env_vars, write_tfvars, write_workspace_code, ParsingMode, Value, Variable,
};

fn var(name: &str, value: Value) -> Variable {
    Variable {
        name: name.to_string(),
        value,
        parsing_mode: ParsingMode::Literal,
    }
}

fn render<F>(f: F) -> Result<String>
where
    F: Fn(&mut Vec<u8>) -> Result<()>,
{
    let mut out = Vec::new();
    f(&mut out)?;
    Ok(String::from_utf8(out)?)
}

fn object(entries: &[(&str, Value)]) -> Value {
    let mut obj = Value::new_object();
    for (k, v) in entries {
        obj.as_object_mut().unwrap().insert((*k).into(), v.clone());
    }
    obj
}

#[test]
fn env_vars_scalars() -> Result<()> {
    let vars = vec![
        var("region", Value::from("ap-northeast-1")),
        var("count", Value::from(2i64)),
        var("enabled", Value::Bool(true)),
        var("missing", Value::Undefined),
        var("empty", Value::Null),
    ];

    let out = render(|w| write_env_vars(w, &vars))?;
    assert_eq!(
        out,
        "export TF_VAR_region='ap-northeast-1'\n\
         export TF_VAR_count='2'\n\
         export TF_VAR_enabled='true'\n\
         export TF_VAR_missing=''\n\
         export TF_VAR_empty=''\n"
    );

    Ok(())
}

#[test]
fn env_vars_collapse_structured_values() -> Result<()> {
    let ports = object(&[
        ("external", Value::from(8300i64)),
        ("internal", Value::from(8300i64)),
        ("protocol", Value::from("tcp")),
    ]);
    let vars = vec![
        var("docker_ports", Value::from(vec![ports])),
        var("tags", object(&[("team", Value::from("sre"))])),
        var("empty_map", Value::new_object()),
    ];

    let out = render(|w| write_env_vars(w, &vars))?;
    assert_eq!(
        out,
        "export TF_VAR_docker_ports='[{ external = 8300, internal = 8300, protocol = \"tcp\" }]'\n\
         export TF_VAR_tags='{ team = \"sre\" }'\n\
         export TF_VAR_empty_map='{}'\n"
    );

    Ok(())
}

#[test]
fn env_vars_strip_one_quote_layer_only() -> Result<()> {
    // a string value whose content is itself quoted keeps the inner quotes
    let vars = vec![var("q", Value::from("\"quoted\""))];
    let out = render(|w| write_env_vars(w, &vars))?;
    assert_eq!(out, "export TF_VAR_q='\"quoted\"'\n");
    Ok(())
}

#[test]
fn tfvars_formatting() -> Result<()> {
    let vars = vec![
        var("image_id", Value::Undefined),
        var("name", Value::from("web \"prod\"")),
        var("count", Value::from(2i64)),
        var("zones", Value::from(vec![Value::from("a"), Value::from("b")])),
        var(
            "tags",
            object(&[
                ("team", Value::from("sre")),
                ("cost.center", Value::from("42")),
            ]),
        ),
    ];

    let out = render(|w| write_tfvars(w, &vars))?;
    assert_eq!(
        out,
        r#"image_id = null
name = "web \"prod\""
count = 2
zones = ["a", "b"]
tags = {
  "cost.center" = "42"
  team = "sre"
}
"#
    );

    Ok(())
}

#[test]
fn tfvars_nested_objects_indent() -> Result<()> {
    let inner = object(&[("protocol", Value::from("tcp"))]);
    let vars = vec![var(
        "nested",
        object(&[("ports", Value::from(vec![inner]))]),
    )];

    let out = render(|w| write_tfvars(w, &vars))?;
    assert_eq!(
        out,
        "nested = {\n  ports = [{\n    protocol = \"tcp\"\n  }]\n}\n"
    );

    Ok(())
}

#[test]
fn tfvars_escape_template_sequences() -> Result<()> {
    let vars = vec![var("tpl", Value::from("${interp} %{dir}"))];
    let out = render(|w| write_tfvars(w, &vars))?;
    assert_eq!(out, "tpl = \"$${interp} %%{dir}\"\n");
    Ok(())
}

#[test]
fn tfvars_round_trip() -> Result<()> {
    let original = vec![
        var("a", Value::from("text with \\ and \"")),
        var("b", Value::from(vec![Value::from(1i64), Value::from(-2.5)])),
        var(
            "c",
            object(&[
                ("x", Value::Null),
                ("y", Value::Bool(false)),
                ("nested", object(&[("k", Value::from("v"))])),
            ]),
        ),
    ];

    let out = render(|w| write_tfvars(w, &original))?;

    let source = Source::from_contents("roundtrip.tfvars".to_string(), out)?;
    let mut parser = Parser::new(&source)?;
    let mut reparsed = vec![];
    for (name, text) in parser.parse_tfvars_body()? {
        let source = Source::from_contents(name.clone(), text)?;
        let mut parser = Parser::new(&source)?;
        reparsed.push((name, parser.parse_value()?));
    }

    assert_eq!(reparsed.len(), original.len());
    for (i, (name, value)) in reparsed.iter().enumerate() {
        assert_eq!(name, &original[i].name);
        assert_eq!(value, &original[i].value);
    }

    Ok(())
}

#[test]
fn workspace_code_blocks() -> Result<()> {
    let vars = vec![
        var("image_id", Value::from("ami-123")),
        var("zones", Value::from(vec![Value::from("a")])),
    ];

    let out = render(|w| write_workspace_code(w, &vars, "my_org", "my_ws"))?;
    assert_eq!(
        out,
        r#"data "tfe_workspace" "my_ws" {
  name         = "my_ws"
  organization = "my_org"
}

resource "tfe_variable" "image_id" {
  key          = "image_id"
  value        = "ami-123"
  category     = "terraform"
  workspace_id = data.tfe_workspace.my_ws.id
  description  = ""
}

resource "tfe_variable" "zones" {
  key          = "zones"
  value        = <<EOT
zones = ["a"]
EOT
  category     = "terraform"
  hcl          = true
  workspace_id = data.tfe_workspace.my_ws.id
  description  = ""
}"#
    );

    Ok(())
}

#[test]
fn workspace_code_escapes_primitive_strings() -> Result<()> {
    let vars = vec![var("msg", Value::from("say \"hi\""))];
    let out = render(|w| write_workspace_code(w, &vars, "o", "w"))?;
    assert!(out.contains("value        = \"say \\\"hi\\\"\""));
    Ok(())
}

#[test]
fn workspace_code_without_variables() -> Result<()> {
    let out = render(|w| write_workspace_code(w, &[], "my_org", "my_ws"))?;
    assert_eq!(
        out,
        "data \"tfe_workspace\" \"my_ws\" {\n  name         = \"my_ws\"\n  organization = \"my_org\"\n}\n\n"
    );
    Ok(())
}

#[test]
fn rendering_is_idempotent() -> Result<()> {
    let vars = vec![
        var("a", Value::from("x")),
        var("b", object(&[("k", Value::from(1i64))])),
    ];

    for _ in 0..2 {
        let first = render(|w| write_workspace_code(w, &vars, "o", "w"))?;
        let second = render(|w| write_workspace_code(w, &vars, "o", "w"))?;
        assert_eq!(first, second);

        let first = render(|w| write_env_vars(w, &vars))?;
        let second = render(|w| write_env_vars(w, &vars))?;
        assert_eq!(first, second);

        let first = render(|w| write_tfvars(w, &vars))?;
        let second = render(|w| write_tfvars(w, &vars))?;
        assert_eq!(first, second);
    }

    Ok(())
}
