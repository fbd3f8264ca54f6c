//! Snapshot persistence and assertion sessions for snapcheck
//!
//! This crate provides:
//! - Snapshot documents, one per test source file
//! - Record stores on the local filesystem and in memory
//! - Assertion sessions that record, compare and write snapshots
//! - Run-wide status tracking of stored snapshots

pub mod document;
pub mod error;
pub mod session;
pub mod status;
pub mod store;
pub mod tracker;

pub use document::{CallEntry, FORMAT_VERSION, MIN_FORMAT_VERSION, SnapshotDocument, StoredMetadata};
pub use error::{StoreError, StoreResult};
pub use session::{AssertOptions, ErrorSnapshot, SessionOutcome, SnapshotSession};
pub use status::{SnapshotStatus, StatusCounts};
pub use store::{JsonFileStore, MemoryStore, RecordStore, SNAPSHOT_DIRECTORY};
pub use tracker::{SnapshotTracker, TrackedCall, UncheckedSnapshot, find_snapshot_files};
