//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "snapcheck")]
#[command(about = "Inspect and validate snapcheck snapshot files")]
#[command(
    long_about = r#"Inspect and validate snapcheck snapshot files

USAGE:
  snapcheck check tests/             # Validate every snapshot file below tests/
  snapcheck show tests/test_math.rs  # Show the snapshots of a test file
  snapcheck config                   # Show the resolved configuration"#
)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and decode every snapshot file below the given paths
    Check {
        /// Files or directories to search
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,
    },

    /// Print the recorded calls of a snapshot file
    Show {
        /// Snapshot file, or the test source file it belongs to
        file: PathBuf,

        /// Only show this test id
        #[arg(long)]
        test: Option<String>,

        /// Print every snapshot as pretty JSON
        #[arg(long)]
        full: bool,
    },

    /// Print the resolved configuration
    Config {
        /// Configuration file to load instead of searching from the current directory
        #[arg(long)]
        file: Option<PathBuf>,
    },
}
