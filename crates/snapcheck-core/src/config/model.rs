//! Configuration data models

use crate::error::{SnapcheckError, SnapcheckResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// On-disk snapshot file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Json,
}

impl FileFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Snapcheck configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapcheckConfig {
    /// Snapshot file format
    pub file_format: FileFormat,
    /// Absolute float tolerance
    pub float_absolute_tolerance: f64,
    /// Relative float tolerance, scaled by the magnitude of the new value
    pub float_relative_tolerance: f64,
    /// Include both full records in mismatch summaries
    pub full_diff: bool,
    /// Indentation of written snapshot files
    pub json_indentation: usize,
    /// Mismatch entries collected before a comparison stops descending
    pub max_mismatches: usize,
    /// Re-record every snapshot instead of comparing
    pub force_update: bool,
}

impl Default for SnapcheckConfig {
    fn default() -> Self {
        Self {
            file_format: FileFormat::Json,
            float_absolute_tolerance: 1e-6,
            float_relative_tolerance: 0.001,
            full_diff: false,
            json_indentation: 4,
            max_mismatches: 100,
            force_update: false,
        }
    }
}

impl SnapcheckConfig {
    /// Tolerances for float comparison
    pub fn tolerance(&self) -> SnapcheckResult<ToleranceConfig> {
        ToleranceConfig::new(self.float_absolute_tolerance, self.float_relative_tolerance)
    }
}

/// Float comparison tolerances
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToleranceConfig {
    absolute: f64,
    relative: f64,
}

impl ToleranceConfig {
    /// Validated tolerances; both must be finite and non-negative
    pub fn new(absolute: f64, relative: f64) -> SnapcheckResult<Self> {
        for (name, value) in [("absolute", absolute), ("relative", relative)] {
            if !value.is_finite() || value < 0.0 {
                return Err(SnapcheckError::tolerance(format!(
                    "{} tolerance must be a finite, non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(Self { absolute, relative })
    }

    /// Zero tolerance
    pub fn exact() -> Self {
        Self {
            absolute: 0.0,
            relative: 0.0,
        }
    }

    pub fn absolute(&self) -> f64 {
        self.absolute
    }

    pub fn relative(&self) -> f64 {
        self.relative
    }

    /// `|expected - actual| <= absolute + relative * |actual|`.
    /// NaN matches only NaN; infinities match only themselves.
    pub fn within(&self, expected: f64, actual: f64) -> bool {
        if expected.is_nan() || actual.is_nan() {
            return expected.is_nan() && actual.is_nan();
        }
        if expected == actual {
            return true;
        }
        if expected.is_infinite() || actual.is_infinite() {
            return false;
        }
        (expected - actual).abs() <= self.absolute + self.relative * actual.abs()
    }
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        let config = SnapcheckConfig::default();
        Self {
            absolute: config.float_absolute_tolerance,
            relative: config.float_relative_tolerance,
        }
    }
}

impl fmt::Display for ToleranceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "absolute {}, relative {}", self.absolute, self.relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SnapcheckConfig::default();
        assert_eq!(config.file_format, FileFormat::Json);
        assert_eq!(config.float_absolute_tolerance, 1e-6);
        assert_eq!(config.float_relative_tolerance, 0.001);
        assert_eq!(config.json_indentation, 4);
        assert!(!config.full_diff);
        assert_eq!(config.tolerance().unwrap(), ToleranceConfig::default());
    }

    #[test]
    fn test_tolerance_formula() {
        let tolerance = ToleranceConfig::new(1e-6, 0.0).unwrap();
        assert!(tolerance.within(1.0, 1.0000005));
        assert!(!tolerance.within(1.0, 1.00001));

        let relative = ToleranceConfig::new(0.0, 0.01).unwrap();
        assert!(relative.within(100.0, 100.9));
        assert!(!relative.within(100.0, 102.0));
    }

    #[test]
    fn test_non_finite_values() {
        let tolerance = ToleranceConfig::default();
        assert!(tolerance.within(f64::NAN, f64::NAN));
        assert!(!tolerance.within(f64::NAN, 1.0));
        assert!(tolerance.within(f64::INFINITY, f64::INFINITY));
        assert!(!tolerance.within(f64::INFINITY, f64::NEG_INFINITY));
        assert!(!tolerance.within(1e308, f64::INFINITY));
    }

    #[test]
    fn test_invalid_tolerances_rejected() {
        assert!(matches!(
            ToleranceConfig::new(-1.0, 0.0),
            Err(SnapcheckError::ToleranceConfig(_))
        ));
        assert!(ToleranceConfig::new(0.0, f64::NAN).is_err());
        assert!(ToleranceConfig::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_exact_tolerance() {
        let exact = ToleranceConfig::exact();
        assert!(exact.within(0.1 + 0.2, 0.1 + 0.2));
        assert!(!exact.within(0.1 + 0.2, 0.3));
    }

    #[test]
    fn test_unknown_keys_ignored_and_defaults_filled() {
        let config: SnapcheckConfig =
            serde_json::from_str(r#"{"json_indentation": 2, "unknown": true}"#).unwrap();
        assert_eq!(config.json_indentation, 2);
        assert_eq!(config.max_mismatches, 100);
    }
}
