//! Snapcheck CLI application
//!
//! Inspects and validates snapshot files written by snapcheck test runs.
//!
//! # Commands
//!
//! - `snapcheck check <paths…>` parses and decodes every snapshot file found
//!   below the given paths and exits non-zero on format errors.
//! - `snapcheck show <file>` prints the recorded calls of one snapshot file.
//! - `snapcheck config` prints the resolved configuration.
//!
//! Set `RUST_LOG=debug` for verbose logging.

mod args;
mod commands;
mod console;
mod router;

use args::Cli;
use clap::Parser;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    router::route(cli)
}
