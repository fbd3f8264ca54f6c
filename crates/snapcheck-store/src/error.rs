//! Store error types

use snapcheck_core::{ErrorCode, SnapcheckError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Snapshot persistence and assertion errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record, version or configuration error from the core
    #[error(transparent)]
    Core(#[from] SnapcheckError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid snapshot path {}: {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: String },

    /// A snapshot assertion failed; `summary` lists every difference
    #[error("Snapshot {index} of '{test_id}' does not match:\n{summary}")]
    Mismatch {
        test_id: String,
        index: usize,
        summary: String,
    },

    #[error("Unsupported snapshot file format: {0}")]
    UnsupportedFormat(String),

    /// Assertion on a session that was already finished
    #[error("Snapshot session for '{0}' is already finished")]
    OutsideContext(String),

    /// An error snapshot was requested but the call succeeded
    #[error("Expected '{test_id}' to return an error, found Ok({found})")]
    ExpectedError { test_id: String, found: String },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn invalid_path(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Whether this is a failed comparison rather than an operational error
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Core(error) => error.error_code(),
            Self::Io(_) => "STORE_IO",
            Self::Serialization(_) => "STORE_SERIALIZATION",
            Self::InvalidPath { .. } => "STORE_INVALID_PATH",
            Self::Mismatch { .. } => "STORE_MISMATCH",
            Self::UnsupportedFormat(_) => "STORE_UNSUPPORTED_FORMAT",
            Self::OutsideContext(_) => "STORE_OUTSIDE_CONTEXT",
            Self::ExpectedError { .. } => "STORE_EXPECTED_ERROR",
        }
    }

    fn is_integrity_error(&self) -> bool {
        match self {
            Self::Core(error) => error.is_integrity_error(),
            Self::Serialization(_) => true,
            _ => false,
        }
    }
}
