//! Command routing logic for CLI

use crate::args::{Cli, Commands};
use crate::commands;
use crate::console::CliConsole;

/// Route CLI commands to their respective handlers
pub fn route(cli: Cli) -> anyhow::Result<()> {
    let console = CliConsole::new(cli.verbose);
    match cli.command {
        Commands::Check { paths } => commands::check::execute(&console, &paths),
        Commands::Show { file, test, full } => {
            commands::show::execute(&console, &file, test.as_deref(), full)
        }
        Commands::Config { file } => commands::config::execute(&console, file.as_deref()),
    }
}
