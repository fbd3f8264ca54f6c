//! Configuration display command

use crate::console::CliConsole;
use anyhow::Context;
use snapcheck_core::SnapcheckConfig;
use snapcheck_core::config::{
    ConfigValidator, apply_env_overrides, find_config_file, load_config, load_from_file,
};
use std::path::Path;

/// Configuration from an explicit file, or the one found from the current directory
pub fn resolve(file: Option<&Path>) -> anyhow::Result<(SnapcheckConfig, Option<String>)> {
    match file {
        Some(path) => {
            let config = load_from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            let config = apply_env_overrides(config)?;
            ConfigValidator::validate(&config)?;
            Ok((config, Some(path.display().to_string())))
        }
        None => {
            let cwd = std::env::current_dir()?;
            let source = find_config_file(&cwd).map(|path| path.display().to_string());
            Ok((load_config(&cwd)?, source))
        }
    }
}

pub fn execute(console: &CliConsole, file: Option<&Path>) -> anyhow::Result<()> {
    let (config, source) = resolve(file)?;

    console.print_header("Configuration");
    match source {
        Some(source) => console.success(&format!("Loaded configuration from: {}", source)),
        None => console.warn("No configuration file found, using defaults"),
    }
    console.field("File format", &config.file_format.to_string());
    console.field(
        "Float absolute tolerance",
        &config.float_absolute_tolerance.to_string(),
    );
    console.field(
        "Float relative tolerance",
        &config.float_relative_tolerance.to_string(),
    );
    console.field("Full diff", &config.full_diff.to_string());
    console.field("JSON indentation", &config.json_indentation.to_string());
    console.field("Max mismatches", &config.max_mismatches.to_string());
    console.field("Force update", &config.force_update.to_string());
    console.info(&serde_json::to_string_pretty(&config)?);
    Ok(())
}
