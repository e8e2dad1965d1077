// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Error;
use crate::lexer::Source;
use crate::loader::{ParsingMode, Variable};
use crate::parser::Parser;
use crate::sources::{RawCandidate, RawValue};
use crate::value::Value;

/// Applies the merged raw values to the declared variables.
///
/// With `ignore_default`, every declared default is first replaced by an
/// explicit null, so a variable left untouched by the sources renders as an
/// empty value instead of its default. Raw values whose name matches no
/// declaration are dropped.
pub fn resolve_values(
    mut vars: Vec<Variable>,
    merged: &BTreeMap<String, RawCandidate>,
    ignore_default: bool,
) -> Result<Vec<Variable>, Error> {
    if ignore_default {
        debug!("replacing default values with null");
        for v in &mut vars {
            v.value = Value::Null;
        }
    }

    for (name, candidate) in merged {
        if !vars.iter().any(|v| &v.name == name) {
            debug!(name = %name, origin = %candidate.label, "ignoring value for undeclared variable");
        }
    }

    for v in &mut vars {
        let Some(candidate) = merged.get(&v.name) else {
            continue;
        };
        v.value = match (&candidate.raw, v.parsing_mode) {
            (RawValue::String(s), ParsingMode::Literal) => Value::from(s.as_str()),
            (RawValue::String(s), ParsingMode::Hcl) => parse_expression(s, candidate, &v.name)?,
            (RawValue::Expression(src), _) => parse_expression(src, candidate, &v.name)?,
        };
    }

    Ok(vars)
}

fn parse_expression(text: &str, candidate: &RawCandidate, name: &str) -> Result<Value, Error> {
    let fail = |e: anyhow::Error| Error::ParseValue {
        name: name.to_string(),
        origin: candidate.label.to_string(),
        detail: e.to_string(),
    };

    let source =
        Source::from_contents(candidate.label.to_string(), text.to_string()).map_err(fail)?;
    let mut parser = Parser::new(&source).map_err(fail)?;
    let value = parser.parse_value().map_err(fail)?;
    parser.expect_eof("after value").map_err(fail)?;
    Ok(value)
}
