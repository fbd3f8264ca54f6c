//! Snapcheck: snapshot testing with tolerant, type-aware comparison
//!
//! Re-exports the core engine and the snapshot store, and provides
//! [`open_session`] to start asserting snapshots from a test with the
//! configuration found next to the test file.
//!
//! ```no_run
//! use snapcheck::{SnapshotMetadata, Value, open_session};
//!
//! let mut session = open_session(
//!     "tests/test_math.rs",
//!     SnapshotMetadata::new("math::test_sum").with_argument("n", 3),
//! )?;
//! session.assert_match(Value::map([("total", 6)]))?;
//! session.finish()?;
//! # Ok::<(), snapcheck::StoreError>(())
//! ```

pub use snapcheck_core::*;
pub use snapcheck_store::{
    AssertOptions, CallEntry, ErrorSnapshot, JsonFileStore, MemoryStore, RecordStore,
    SNAPSHOT_DIRECTORY, SessionOutcome, SnapshotDocument, SnapshotSession, SnapshotStatus,
    SnapshotTracker, StatusCounts, StoreError, StoreResult, StoredMetadata, UncheckedSnapshot,
};

/// Store-level modules, for document and tracker internals
pub mod store {
    pub use snapcheck_store::*;
}

use snapcheck_core::config::load_config;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Open a session backed by JSON snapshot files with the default registry
pub fn open_session(
    test_file: impl Into<PathBuf>,
    metadata: SnapshotMetadata,
) -> StoreResult<SnapshotSession> {
    open_session_with(SnapshotEngine::default(), test_file, metadata)
}

/// Open a session backed by JSON snapshot files. The configuration is
/// resolved from the test file's directory upwards.
pub fn open_session_with(
    engine: SnapshotEngine,
    test_file: impl Into<PathBuf>,
    metadata: SnapshotMetadata,
) -> StoreResult<SnapshotSession> {
    let test_file = test_file.into();
    let start = match test_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let config = load_config(start)?;
    debug!(
        "Opening snapshot session for '{}' in {}",
        metadata.test_id,
        test_file.display()
    );
    let store: Arc<dyn RecordStore> = Arc::new(JsonFileStore::from_config(&config));
    SnapshotSession::open(engine, config, store, test_file, metadata)
}
