//! Configuration management
//!
//! Settings come from a `snapcheck.toml` (or a snapcheck table in
//! `Cargo.toml`, or a JSON file), then `SNAPCHECK_*` environment variables,
//! and are validated before use.

pub mod env_loader;
pub mod file_loader;
pub mod model;
pub mod validation;

pub use env_loader::{apply_env_overrides, apply_env_overrides_from};
pub use file_loader::{find_config_file, load_from_file, CONFIG_FILE_NAME};
pub use model::{FileFormat, SnapcheckConfig, ToleranceConfig};
pub use validation::ConfigValidator;

use crate::error::SnapcheckResult;
use std::path::Path;
use tracing::debug;

/// Resolve the configuration for a project directory: nearest config file,
/// environment overrides, validation.
pub fn load_config(start: &Path) -> SnapcheckResult<SnapcheckConfig> {
    let config = match find_config_file(start) {
        Some(path) => load_from_file(&path)?,
        None => {
            debug!("No snapcheck configuration found above {}", start.display());
            SnapcheckConfig::default()
        }
    };
    let config = apply_env_overrides(config)?;
    ConfigValidator::validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "float_absolute_tolerance = -1.0\n",
        )
        .unwrap();
        assert!(load_config(temp_dir.path()).is_err());
    }
}
