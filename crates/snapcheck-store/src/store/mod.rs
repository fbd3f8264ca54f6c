//! Record store abstraction and implementations
//!
//! A store maps a test source file to its snapshot document. The JSON file
//! store keeps documents in a `.snapshots/` directory next to the test file;
//! the memory store keeps them in a map, for tests and dry runs.

mod local;
mod memory;

pub use local::{JsonFileStore, SNAPSHOT_DIRECTORY};
pub use memory::MemoryStore;

use crate::document::{CallEntry, SnapshotDocument};
use crate::error::StoreResult;
use snapcheck_core::MetadataDigest;
use std::path::{Path, PathBuf};

/// Persistence of snapshot documents, keyed by test source file
pub trait RecordStore: Send + Sync {
    /// Where the document for a test file lives
    fn snapshot_path(&self, test_file: &Path) -> StoreResult<PathBuf>;

    /// Load the document for a test file, if one exists
    fn load(&self, test_file: &Path) -> StoreResult<Option<SnapshotDocument>>;

    /// Write the document for a test file
    fn save(&self, test_file: &Path, document: &SnapshotDocument) -> StoreResult<()>;

    /// Check if a document exists for a test file
    fn exists(&self, test_file: &Path) -> StoreResult<bool>;

    /// Load, modify and save a document. Implementations serialize
    /// concurrent updates of the same store.
    fn update(
        &self,
        test_file: &Path,
        apply: &mut dyn FnMut(&mut SnapshotDocument),
    ) -> StoreResult<()> {
        let mut document = self.load(test_file)?.unwrap_or_default();
        apply(&mut document);
        self.save(test_file, &document)
    }

    /// Stored call entry for a test id and metadata digest
    fn find(
        &self,
        test_file: &Path,
        test_id: &str,
        digest: &MetadataDigest,
    ) -> StoreResult<Option<CallEntry>> {
        Ok(self
            .load(test_file)?
            .and_then(|document| document.find(test_id, digest).cloned()))
    }
}
