// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// Error type for variable loading, collection and resolution.
#[derive(Debug, Error)]
pub enum Error {
    /// Input variable declarations could not be loaded from the
    /// configuration directory.
    #[error("{dir}: loading config\n{detail}")]
    LoadConfig { dir: String, detail: String },

    /// A `--var` style literal without a `name=value` separator.
    #[error("bad var string '{0}'")]
    BadVarString(String),

    /// A variable definitions file that is not valid in the variable
    /// definitions grammar.
    #[error("failed to parse {path}\n{detail}")]
    ParseFile { path: String, detail: String },

    /// A collected raw value that cannot be evaluated under the declared
    /// parsing mode.
    #[error("failed to parse value for {name} from {origin}\n{detail}")]
    ParseValue {
        name: String,
        origin: String,
        detail: String,
    },
}
