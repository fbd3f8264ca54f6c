//! Configuration validation

use crate::config::model::{FileFormat, SnapcheckConfig, ToleranceConfig};
use crate::error::{SnapcheckError, SnapcheckResult};

/// Upper bound for snapshot file indentation
const MAX_INDENTATION: usize = 16;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration
    pub fn validate(config: &SnapcheckConfig) -> SnapcheckResult<()> {
        Self::validate_tolerances(config)?;
        Self::validate_format(config)?;
        Self::validate_limits(config)?;
        Ok(())
    }

    /// Tolerances must be finite and non-negative
    fn validate_tolerances(config: &SnapcheckConfig) -> SnapcheckResult<()> {
        ToleranceConfig::new(
            config.float_absolute_tolerance,
            config.float_relative_tolerance,
        )
        .map(|_| ())
    }

    /// Only JSON snapshot files are supported
    fn validate_format(config: &SnapcheckConfig) -> SnapcheckResult<()> {
        match config.file_format {
            FileFormat::Json => Ok(()),
        }
    }

    fn validate_limits(config: &SnapcheckConfig) -> SnapcheckResult<()> {
        if config.json_indentation > MAX_INDENTATION {
            return Err(SnapcheckError::config(format!(
                "json_indentation must be at most {}, got {}",
                MAX_INDENTATION, config.json_indentation
            )));
        }

        if config.max_mismatches == 0 {
            return Err(SnapcheckError::config(
                "max_mismatches must be greater than 0",
            ));
        }

        Ok(())
    }
}
