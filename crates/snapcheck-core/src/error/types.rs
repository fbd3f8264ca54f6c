//! Core error types for snapcheck

use thiserror::Error;

/// Result type alias for snapcheck operations
pub type SnapcheckResult<T> = Result<T, SnapcheckError>;

/// Stable error codes for programmatic handling.
pub trait ErrorCode: std::error::Error + Send + Sync {
    /// Get the error code
    fn error_code(&self) -> &'static str;

    /// Whether the error points at persisted data rather than the environment
    fn is_integrity_error(&self) -> bool {
        false
    }
}

/// Main error type for snapcheck
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapcheckError {
    /// A stored record is structurally invalid
    #[error("Record format error at {location}: {message}")]
    RecordFormat { location: String, message: String },

    /// A snapshot file uses a format version this build cannot read
    #[error("Unsupported snapshot format version {found} (supported: {minimum}..={current})")]
    UnsupportedVersion {
        found: u64,
        minimum: u64,
        current: u64,
    },

    /// Float tolerance values are invalid
    #[error("Tolerance configuration error: {0}")]
    ToleranceConfig(String),

    /// Any other configuration problem
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

impl ErrorCode for SnapcheckError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::RecordFormat { .. } => "SNAPCHECK_RECORD_FORMAT",
            Self::UnsupportedVersion { .. } => "SNAPCHECK_UNSUPPORTED_VERSION",
            Self::ToleranceConfig(_) => "SNAPCHECK_TOLERANCE_CONFIG",
            Self::Config { .. } => "SNAPCHECK_CONFIG",
            Self::Io { .. } => "SNAPCHECK_IO",
            Self::Json(_) => "SNAPCHECK_JSON",
        }
    }

    fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            Self::RecordFormat { .. } | Self::UnsupportedVersion { .. }
        )
    }
}
