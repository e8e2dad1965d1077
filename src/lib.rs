// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub mod cli;
mod error;
mod lexer;
mod loader;
mod number;
mod parser;
mod resolver;
mod sources;
mod value;
mod writer;

pub use error::Error;
pub use loader::{load_variables, ParsingMode, Variable};
pub use number::Number;
pub use resolver::resolve_values;
pub use sources::{
    lookup_tfvars_files, Layer, RawCandidate, RawValue, SourceKind, SourceStack, VAR_ENV_PREFIX,
};
pub use value::Value;
pub use writer::{write_env_vars, write_tfvars, write_workspace_code};

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::lexer::*;
    pub use crate::parser::*;
}
