//! Environment variable-based configuration overrides

use crate::config::model::SnapcheckConfig;
use crate::error::{SnapcheckError, SnapcheckResult};
use std::env;
use std::str::FromStr;

pub const ENV_ABSOLUTE_TOLERANCE: &str = "SNAPCHECK_FLOAT_ABSOLUTE_TOLERANCE";
pub const ENV_RELATIVE_TOLERANCE: &str = "SNAPCHECK_FLOAT_RELATIVE_TOLERANCE";
pub const ENV_JSON_INDENTATION: &str = "SNAPCHECK_JSON_INDENTATION";
pub const ENV_UPDATE: &str = "SNAPCHECK_UPDATE";

/// Apply `SNAPCHECK_*` environment variables on top of a loaded config
pub fn apply_env_overrides(config: SnapcheckConfig) -> SnapcheckResult<SnapcheckConfig> {
    apply_env_overrides_from(config, |key| env::var(key).ok())
}

/// Apply overrides read through `lookup`
pub fn apply_env_overrides_from<F>(
    mut config: SnapcheckConfig,
    lookup: F,
) -> SnapcheckResult<SnapcheckConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_ABSOLUTE_TOLERANCE) {
        config.float_absolute_tolerance = parse_var(ENV_ABSOLUTE_TOLERANCE, &value)?;
    }

    if let Some(value) = lookup(ENV_RELATIVE_TOLERANCE) {
        config.float_relative_tolerance = parse_var(ENV_RELATIVE_TOLERANCE, &value)?;
    }

    if let Some(value) = lookup(ENV_JSON_INDENTATION) {
        config.json_indentation = parse_var(ENV_JSON_INDENTATION, &value)?;
    }

    if let Some(value) = lookup(ENV_UPDATE) {
        config.force_update = parse_flag(&value);
    }

    Ok(config)
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> SnapcheckResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SnapcheckError::config(format!("Invalid {} value: '{}'", key, value)))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_no_variables_keeps_config() {
        let config = apply_env_overrides_from(SnapcheckConfig::default(), lookup(&[])).unwrap();
        assert_eq!(config, SnapcheckConfig::default());
    }

    #[test]
    fn test_overrides_applied() {
        let config = apply_env_overrides_from(
            SnapcheckConfig::default(),
            lookup(&[
                (ENV_ABSOLUTE_TOLERANCE, "0.25"),
                (ENV_RELATIVE_TOLERANCE, " 0 "),
                (ENV_JSON_INDENTATION, "2"),
                (ENV_UPDATE, "True"),
            ]),
        )
        .unwrap();
        assert_eq!(config.float_absolute_tolerance, 0.25);
        assert_eq!(config.float_relative_tolerance, 0.0);
        assert_eq!(config.json_indentation, 2);
        assert!(config.force_update);
    }

    #[test]
    fn test_invalid_number_is_error() {
        let result = apply_env_overrides_from(
            SnapcheckConfig::default(),
            lookup(&[(ENV_JSON_INDENTATION, "four")]),
        );
        assert!(matches!(result, Err(SnapcheckError::Config { .. })));
    }

    #[test]
    fn test_update_flag_values() {
        assert!(parse_flag("1"));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
