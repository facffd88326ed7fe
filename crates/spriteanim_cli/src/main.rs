// SPDX-License-Identifier: MIT OR Apache-2.0
//! `spriteanim` - headless driver for sprite animation content
//!
//! Opens a content directory, evaluates clips and prints their draw lists.
//! Logging goes to stderr and is controlled with `RUST_LOG`.

mod cli;

use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["spriteanim=info", "spriteanim_core=info"] {
        match directive.parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("Invalid log directive {directive}: {e}"),
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Cli::parse();
    let stdout = std::io::stdout();
    match cli::run(args, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
