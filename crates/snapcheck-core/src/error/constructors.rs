//! Constructor methods for SnapcheckError

use super::types::SnapcheckError;

impl SnapcheckError {
    /// Create a record format error at the given location
    pub fn record_format(location: impl ToString, message: impl Into<String>) -> Self {
        Self::RecordFormat {
            location: location.to_string(),
            message: message.into(),
        }
    }

    /// Create a tolerance configuration error
    pub fn tolerance(message: impl Into<String>) -> Self {
        Self::ToleranceConfig(message.into())
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
        }
    }

    /// Create an IO error for a specific path
    pub fn io_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json(message.into())
    }
}
