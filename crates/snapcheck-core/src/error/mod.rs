//! Error types for snapcheck
//!
//! Fatal conditions (corrupt records, bad configuration, I/O) are
//! `SnapcheckError`s. Conditions that only degrade a snapshot, such as an
//! unsupported value type or a class that cannot be reconstructed, are
//! `SnapshotWarning`s: they are collected by the encoder/decoder and logged,
//! never raised.

mod constructors;
mod conversions;
mod types;
mod warning;

pub use types::{ErrorCode, SnapcheckError, SnapcheckResult};
pub use warning::SnapshotWarning;
