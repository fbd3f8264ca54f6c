//! Non-fatal conditions raised while encoding or decoding

use serde::Serialize;
use std::fmt;

/// A condition that degrades a snapshot without failing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotWarning {
    /// A value matched no type category and was stored as its debug string
    UnsupportedType { location: String, type_name: String },

    /// A class record names a class that is not registered
    DecodeClassNotFound { location: String, class: String },

    /// A registered class refused the stored state
    ClassStateRejected {
        location: String,
        class: String,
        reason: String,
    },

    /// A record carries a tag this build does not know
    UnknownTag { location: String, tag: String },
}

impl SnapshotWarning {
    /// Location of the node the warning refers to
    pub fn location(&self) -> &str {
        match self {
            Self::UnsupportedType { location, .. }
            | Self::DecodeClassNotFound { location, .. }
            | Self::ClassStateRejected { location, .. }
            | Self::UnknownTag { location, .. } => location,
        }
    }
}

impl fmt::Display for SnapshotWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedType {
                location,
                type_name,
            } => write!(
                f,
                "{}: unsupported type '{}' stored as its string representation",
                location, type_name
            ),
            Self::DecodeClassNotFound { location, class } => write!(
                f,
                "{}: class '{}' is not registered, decoded as a placeholder",
                location, class
            ),
            Self::ClassStateRejected {
                location,
                class,
                reason,
            } => write!(
                f,
                "{}: class '{}' rejected stored state ({}), decoded as a placeholder",
                location, class, reason
            ),
            Self::UnknownTag { location, tag } => {
                write!(f, "{}: unknown record tag '{}', kept opaque", location, tag)
            }
        }
    }
}
