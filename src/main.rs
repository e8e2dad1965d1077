// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;
use clap::Parser;

use tfevar::cli::{run, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let stdout = std::io::stdout();
    run(&cli, stdout.lock())
}

fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(format!("tfevar={level}"))
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
