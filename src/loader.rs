// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Error;
use crate::lexer::Source;
use crate::parser::Parser;
use crate::value::Value;

/// How a raw string override becomes a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsingMode {
    /// The raw text is the string value itself.
    Literal,
    /// The raw text is evaluated as a configuration-language expression.
    Hcl,
}

/// A simplified version of an input variable declaration, e.g.
///    variable "image_id" {
///      type = string
///    }
///
/// `value` holds the declared default after loading (undefined when the
/// declaration has none) and the final value after resolution.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub value: Value,
    pub parsing_mode: ParsingMode,
}

/// Extracts all input variables declared in the configuration files
/// located in `dir`: every `*.tf` file plus the `*.tf.json` variant, in
/// lexical order.
pub fn load_variables(dir: &Path) -> Result<Vec<Variable>, Error> {
    let display = dir.display().to_string();
    let fail = |detail: String| Error::LoadConfig {
        dir: display.clone(),
        detail,
    };

    let entries = std::fs::read_dir(dir).map_err(|e| fail(e.to_string()))?;
    let mut tf_files: Vec<PathBuf> = vec![];
    let mut json_files: Vec<PathBuf> = vec![];
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".tf.json") {
            json_files.push(path);
        } else if name.ends_with(".tf") {
            tf_files.push(path);
        }
    }
    tf_files.sort();
    json_files.sort();

    let mut vars = vec![];
    for path in &tf_files {
        let source = Source::from_file(path).map_err(|e| fail(e.to_string()))?;
        let mut parser = Parser::new(&source).map_err(|e| fail(e.to_string()))?;
        vars.extend(parser.parse_config_body().map_err(|e| fail(e.to_string()))?);
    }
    for path in &json_files {
        vars.extend(load_json_variables(path).map_err(|e| fail(e.to_string()))?);
    }

    let mut seen = BTreeSet::new();
    for v in &vars {
        if !seen.insert(v.name.as_str()) {
            return Err(fail(format!("duplicate variable \"{}\"", v.name)));
        }
    }

    debug!(dir = %dir.display(), count = vars.len(), "loaded variable declarations");
    Ok(vars)
}

// JSON configuration variant: {"variable": {"name": {"default": ..., "type": ...}}}
fn load_json_variables(path: &Path) -> anyhow::Result<Vec<Variable>> {
    let contents = std::fs::read_to_string(path)?;
    let root = Value::from_json_str(&contents)
        .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;

    let mut vars = vec![];
    let blocks = &root["variable"];
    if blocks.is_undefined() {
        return Ok(vars);
    }
    let blocks = blocks
        .as_object()
        .map_err(|_| anyhow::anyhow!("{}: \"variable\" must be an object", path.display()))?;
    for (name, body) in blocks.iter() {
        let value = match &body["default"] {
            Value::Undefined => Value::Undefined,
            v => v.clone(),
        };
        let parsing_mode = match &body["type"] {
            Value::Undefined => ParsingMode::Literal,
            Value::String(t) if t.trim() == "string" => ParsingMode::Literal,
            _ => ParsingMode::Hcl,
        };
        vars.push(Variable {
            name: name.to_string(),
            value,
            parsing_mode,
        });
    }
    Ok(vars)
}
