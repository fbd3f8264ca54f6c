//! File-based configuration loading

use crate::config::model::SnapcheckConfig;
use crate::error::{SnapcheckError, SnapcheckResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Dedicated configuration file name
pub const CONFIG_FILE_NAME: &str = "snapcheck.toml";

/// Tables that may hold the configuration inside a larger TOML manifest
const EMBEDDED_TABLES: [&[&str]; 3] = [
    &["tool", "snapcheck"],
    &["package", "metadata", "snapcheck"],
    &["workspace", "metadata", "snapcheck"],
];

/// Load configuration from a file
///
/// Supports TOML and JSON based on file extension. TOML files may keep the
/// settings at the top level or in one of the `[tool.snapcheck]`,
/// `[package.metadata.snapcheck]` or `[workspace.metadata.snapcheck]` tables.
/// Returns the default config if the file doesn't exist.
pub fn load_from_file(path: &Path) -> SnapcheckResult<SnapcheckConfig> {
    if !path.exists() {
        debug!("Config file {} not found, using defaults", path.display());
        return Ok(SnapcheckConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        SnapcheckError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => parse_toml(&content).map_err(|e| {
            SnapcheckError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            SnapcheckError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn parse_toml(content: &str) -> Result<SnapcheckConfig, toml::de::Error> {
    let document: toml::Value = toml::from_str(content)?;
    match embedded_table(&document) {
        Some(table) => table.clone().try_into(),
        None => document.try_into(),
    }
}

fn embedded_table(document: &toml::Value) -> Option<&toml::Value> {
    EMBEDDED_TABLES.iter().find_map(|path| {
        path.iter()
            .try_fold(document, |table, key| table.get(*key))
            .filter(|table| table.is_table())
    })
}

/// Search `start` and its ancestors for a configuration file.
///
/// In each directory a `snapcheck.toml` wins over a `Cargo.toml` carrying a
/// snapcheck metadata table.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        let dedicated = dir.join(CONFIG_FILE_NAME);
        if dedicated.is_file() {
            return Some(dedicated);
        }

        let manifest = dir.join("Cargo.toml");
        if manifest.is_file() && has_embedded_config(&manifest) {
            return Some(manifest);
        }
    }
    None
}

fn has_embedded_config(manifest: &Path) -> bool {
    fs::read_to_string(manifest)
        .ok()
        .and_then(|content| toml::from_str::<toml::Value>(&content).ok())
        .is_some_and(|document| embedded_table(&document).is_some())
}
