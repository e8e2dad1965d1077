// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::Write;

use anyhow::{Context, Result};

use crate::loader::Variable;
use crate::sources::VAR_ENV_PREFIX;
use crate::value::Value;

/// Outputs the given vars in environment variables format, e.g.
///    export TF_VAR_region='ap-northeast-1'
pub fn write_env_vars<W: Write>(mut w: W, vars: &[Variable]) -> Result<()> {
    for v in vars {
        let text = match &v.value {
            Value::Null | Value::Undefined => String::new(),
            // the surrounding quote layer is stripped
            Value::String(s) => s.to_string(),
            other => one_line(other),
        };
        writeln!(w, "export {}{}='{}'", VAR_ENV_PREFIX, v.name, text)
            .context("unexpected failure writing exports")?;
    }
    Ok(())
}

/// Outputs the given vars in variable definitions format, e.g.
///    region = "ap-northeast-1"
pub fn write_tfvars<W: Write>(mut w: W, vars: &[Variable]) -> Result<()> {
    for v in vars {
        writeln!(w, "{} = {}", v.name, hcl_text(&v.value, 0)).context("failed to write as tfvars")?;
    }
    Ok(())
}

/// Outputs the given vars as code for the TFE provider: a workspace lookup
/// block followed by one tfe_variable resource per variable. Structured
/// values are emitted as heredoc definitions with `hcl = true`.
pub fn write_workspace_code<W: Write>(
    mut w: W,
    vars: &[Variable],
    org: &str,
    workspace: &str,
) -> Result<()> {
    let fail = || "failed to write as tf code";

    writeln!(w, "data \"tfe_workspace\" \"{workspace}\" {{").with_context(fail)?;
    writeln!(w, "  name         = \"{workspace}\"").with_context(fail)?;
    writeln!(w, "  organization = \"{org}\"").with_context(fail)?;
    writeln!(w, "}}").with_context(fail)?;
    writeln!(w).with_context(fail)?;

    let mut blocks = Vec::with_capacity(vars.len());
    for v in vars {
        let block = if v.value.is_primitive() {
            let text = match &v.value {
                Value::Null | Value::Undefined => String::new(),
                Value::String(s) => escape_string(s),
                other => one_line(other),
            };
            format!(
                r#"resource "tfe_variable" "{name}" {{
  key          = "{name}"
  value        = "{text}"
  category     = "terraform"
  workspace_id = data.tfe_workspace.{workspace}.id
  description  = ""
}}"#,
                name = v.name,
                text = text,
                workspace = workspace,
            )
        } else {
            format!(
                r#"resource "tfe_variable" "{name}" {{
  key          = "{name}"
  value        = <<EOT
{name} = {value}
EOT
  category     = "terraform"
  hcl          = true
  workspace_id = data.tfe_workspace.{workspace}.id
  description  = ""
}}"#,
                name = v.name,
                value = hcl_text(&v.value, 0),
                workspace = workspace,
            )
        };
        blocks.push(block);
    }

    write!(w, "{}", blocks.join("\n\n")).with_context(fail)?;
    Ok(())
}

/// Canonical multi-line formatting: objects get one entry per line with
/// two-space indentation, everything else stays on one line.
fn hcl_text(value: &Value, indent: usize) -> String {
    match value {
        Value::Null | Value::Undefined => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("\"{}\"", escape_string(s)),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(|v| hcl_text(v, indent)).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(fields) => {
            if fields.is_empty() {
                return "{}".to_string();
            }
            let mut out = String::from("{\n");
            for (k, v) in fields.iter() {
                out.push_str(&" ".repeat(indent + 2));
                out.push_str(&attr_key(k));
                out.push_str(" = ");
                out.push_str(&hcl_text(v, indent + 2));
                out.push('\n');
            }
            out.push_str(&" ".repeat(indent));
            out.push('}');
            out
        }
    }
}

/// Single-line formatting for compound values. A line break is legitimate
/// only as whitespace inside an object, so object entries are joined by
/// commas instead.
fn one_line(value: &Value) -> String {
    match value {
        Value::Null | Value::Undefined => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("\"{}\"", escape_string(s)),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(one_line).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(fields) => {
            if fields.is_empty() {
                return "{}".to_string();
            }
            let parts: Vec<String> = fields
                .iter()
                .map(|(k, v)| format!("{} = {}", attr_key(k), one_line(v)))
                .collect();
            format!("{{ {} }}", parts.join(", "))
        }
    }
}

// Object keys are written bare when they are valid identifiers.
fn attr_key(key: &str) -> String {
    let mut chars = key.chars();
    let ident = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    };
    if ident {
        key.to_string()
    } else {
        format!("\"{}\"", escape_string(key))
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(ch);
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}
