// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::error::Error;
use crate::lexer::Source;
use crate::parser::Parser;
use crate::value::Value;

/// Prefix of the environment variables recognized as value overrides.
pub const VAR_ENV_PREFIX: &str = "TF_VAR_";

/// Where a raw candidate value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Env,
    AutoFile,
    CliFlag,
    File,
}

/// The payload of a raw candidate.
#[derive(Debug, Clone)]
pub enum RawValue {
    /// Verbatim text whose interpretation depends on the declared parsing
    /// mode: an opaque string, or expression source.
    String(String),
    /// Expression source text recorded from a definitions file; always
    /// evaluated as an expression.
    Expression(String),
}

/// An unparsed value for a named variable, collected from one source.
#[derive(Debug, Clone)]
pub struct RawCandidate {
    pub raw: RawValue,
    pub kind: SourceKind,
    /// Human-readable origin for diagnostics, e.g. a file path.
    pub label: Rc<str>,
}

/// One named source of raw values. Immutable once built; precedence between
/// layers is decided by their order in the [`SourceStack`].
#[derive(Debug)]
pub struct Layer {
    kind: SourceKind,
    entries: Vec<(String, RawCandidate)>,
}

impl Layer {
    /// Collects `TF_VAR_*` variables from the process environment.
    pub fn from_env() -> Layer {
        let mut entries = vec![];
        for (key, value) in std::env::vars_os() {
            let (Ok(key), Ok(value)) = (key.into_string(), value.into_string()) else {
                continue;
            };
            if let Some(name) = key.strip_prefix(VAR_ENV_PREFIX) {
                if name.is_empty() {
                    continue;
                }
                entries.push((
                    name.to_string(),
                    RawCandidate {
                        raw: RawValue::String(value),
                        kind: SourceKind::Env,
                        label: key.as_str().into(),
                    },
                ));
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        debug!(count = entries.len(), "collected environment variables");
        Layer {
            kind: SourceKind::Env,
            entries,
        }
    }

    /// Collects the top-level attributes of a variable definitions file.
    /// Each candidate holds the attribute expression's source text.
    pub fn from_file(path: &Path, kind: SourceKind) -> Result<Layer, Error> {
        let display = path.display().to_string();
        let fail = |detail: String| Error::ParseFile {
            path: display.clone(),
            detail,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
        let label: Rc<str> = display.as_str().into();
        let mut entries = vec![];

        if display.ends_with(".json") {
            let root = Value::from_json_str(&contents).map_err(|e| fail(e.to_string()))?;
            let fields = root
                .as_object()
                .map_err(|_| fail("expecting a JSON object of variable values".to_string()))?;
            for (name, value) in fields.iter() {
                let text = serde_json::to_string(value).map_err(|e| fail(e.to_string()))?;
                entries.push((
                    name.to_string(),
                    RawCandidate {
                        raw: RawValue::Expression(text),
                        kind,
                        label: label.clone(),
                    },
                ));
            }
        } else {
            let source =
                Source::from_contents(display.clone(), contents).map_err(|e| fail(e.to_string()))?;
            let mut parser = Parser::new(&source).map_err(|e| fail(e.to_string()))?;
            let attrs = parser.parse_tfvars_body().map_err(|e| fail(e.to_string()))?;
            for (name, text) in attrs {
                entries.push((
                    name,
                    RawCandidate {
                        raw: RawValue::Expression(text),
                        kind,
                        label: label.clone(),
                    },
                ));
            }
        }

        debug!(file = %path.display(), count = entries.len(), "collected values from file");
        Ok(Layer { kind, entries })
    }

    /// Collects `name=value` literals, e.g. from repeated `--var` flags.
    /// Later repeats of a name overwrite earlier ones.
    pub fn from_assignments<I, S>(specs: I) -> Result<Layer, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = vec![];
        for spec in specs {
            let spec = spec.as_ref();
            let Some((name, value)) = spec.split_once('=') else {
                return Err(Error::BadVarString(spec.to_string()));
            };
            entries.push((
                name.to_string(),
                RawCandidate {
                    raw: RawValue::String(value.to_string()),
                    kind: SourceKind::CliFlag,
                    label: format!("--var '{spec}'").into(),
                },
            ));
        }
        debug!(count = entries.len(), "collected --var assignments");
        Ok(Layer {
            kind: SourceKind::CliFlag,
            entries,
        })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

/// An ordered list of layers. Later layers take precedence; the mandated
/// order is environment, auto-discovered files, `--var` literals, then an
/// explicit variable file last.
#[derive(Debug, Default)]
pub struct SourceStack {
    layers: Vec<Layer>,
}

impl SourceStack {
    pub fn new() -> SourceStack {
        SourceStack::default()
    }

    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Folds the layers in order into one mapping; for a name supplied by
    /// several layers the last one wins.
    pub fn merge(&self) -> BTreeMap<String, RawCandidate> {
        let mut merged = BTreeMap::new();
        for layer in &self.layers {
            for (name, candidate) in &layer.entries {
                merged.insert(name.clone(), candidate.clone());
            }
        }
        merged
    }
}

/// Returns the variable definitions files that are loaded automatically
/// from `dir`: the two fixed names first, then the `.auto` convention in
/// lexical order. Subdirectories are never searched.
pub fn lookup_tfvars_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = vec![];
    for name in ["terraform.tfvars", "terraform.tfvars.json"] {
        let path = dir.join(name);
        if path.is_file() {
            files.push(path);
        }
    }

    let mut auto = vec![];
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(".auto.tfvars") || name.ends_with(".auto.tfvars.json") {
                auto.push(path);
            }
        }
    }
    auto.sort();
    files.extend(auto);
    files
}
