// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use crate::loader;
use crate::resolver;
use crate::sources::{lookup_tfvars_files, Layer, SourceKind, SourceStack};
use crate::writer;

/// Export Terraform variable definitions to Terraform Enterprise/Cloud
/// workspace variables, environment variable exports, or tfvars.
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory containing the Terraform configuration.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Use values from environment variables TF_VAR_* and variable
    /// definitions files e.g. terraform.tfvars[.json] *.auto.tfvars[.json].
    #[arg(short = 'a', long)]
    pub auto_assign: bool,

    /// Print debug log on stderr.
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Do not use defined default values.
    #[arg(long)]
    pub ignore_default: bool,

    /// Set a variable in the generated definitions.
    /// This flag can be set multiple times.
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Set variables from a file.
    #[arg(long = "var-file", value_name = "FILE")]
    pub var_file: Option<PathBuf>,

    /// Print the variables as environment variable exports.
    #[arg(short = 'e', long = "env-var", conflicts_with = "tfvars")]
    pub env_var: bool,

    /// Print the variables in variable definitions (.tfvars) format.
    #[arg(long)]
    pub tfvars: bool,

    /// Set the organisation for the generated terraform code.
    #[arg(long, default_value = "example_organization")]
    pub org: String,

    /// Set the workspace for the generated terraform code.
    #[arg(long, default_value = "example_workspace")]
    pub workspace: String,
}

/// Runs one invocation against the given output sink. Nothing is written
/// until collection and resolution have fully succeeded.
pub fn run<W: Write>(cli: &Cli, out: W) -> Result<()> {
    let mut vars = loader::load_variables(&cli.dir)?;
    vars.sort_by(|a, b| a.name.cmp(&b.name));

    let mut stack = SourceStack::new();
    if cli.auto_assign {
        debug!("collecting values from environment variables");
        stack.push(Layer::from_env());

        for path in lookup_tfvars_files(&cli.dir) {
            stack.push(Layer::from_file(&path, SourceKind::AutoFile)?);
        }
    }
    stack.push(Layer::from_assignments(&cli.vars)?);
    if let Some(path) = &cli.var_file {
        stack.push(Layer::from_file(path, SourceKind::File)?);
    }

    let merged = stack.merge();
    let vars = resolver::resolve_values(vars, &merged, cli.ignore_default)?;

    if cli.env_var {
        writer::write_env_vars(out, &vars)
    } else if cli.tfvars {
        writer::write_tfvars(out, &vars)
    } else {
        writer::write_workspace_code(out, &vars, &cli.org, &cli.workspace)
    }
}
