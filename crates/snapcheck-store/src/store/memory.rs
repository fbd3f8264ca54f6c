//! In-memory record store

use super::RecordStore;
use crate::document::SnapshotDocument;
use crate::error::StoreResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Documents held in memory, keyed by test file
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<PathBuf, SnapshotDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.lock().is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn snapshot_path(&self, test_file: &Path) -> StoreResult<PathBuf> {
        Ok(test_file.to_path_buf())
    }

    fn load(&self, test_file: &Path) -> StoreResult<Option<SnapshotDocument>> {
        Ok(self.documents.lock().get(test_file).cloned())
    }

    fn save(&self, test_file: &Path, document: &SnapshotDocument) -> StoreResult<()> {
        self.documents
            .lock()
            .insert(test_file.to_path_buf(), document.clone());
        Ok(())
    }

    fn exists(&self, test_file: &Path) -> StoreResult<bool> {
        Ok(self.documents.lock().contains_key(test_file))
    }

    fn update(
        &self,
        test_file: &Path,
        apply: &mut dyn FnMut(&mut SnapshotDocument),
    ) -> StoreResult<()> {
        let mut documents = self.documents.lock();
        apply(documents.entry(test_file.to_path_buf()).or_default());
        Ok(())
    }
}
