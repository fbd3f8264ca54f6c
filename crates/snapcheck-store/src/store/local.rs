//! Local filesystem record store
//!
//! Documents are stored as `<test dir>/.snapshots/<test file stem>.json`.

use super::RecordStore;
use crate::document::SnapshotDocument;
use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use snapcheck_core::{FileFormat, SnapcheckConfig};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tempfile::NamedTempFile;
use tracing::debug;

/// Directory holding snapshot files, next to the test sources
pub const SNAPSHOT_DIRECTORY: &str = ".snapshots";

/// One lock per snapshot file, shared by every store in the process
static UPDATE_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Lock guarding read-modify-write cycles on a snapshot file
fn update_lock(path: &Path) -> Arc<Mutex<()>> {
    // resolve the directory so relative and absolute spellings share a lock
    let key = match (path.parent().map(fs::canonicalize), path.file_name()) {
        (Some(Ok(directory)), Some(name)) => directory.join(name),
        _ => path.to_path_buf(),
    };
    Arc::clone(UPDATE_LOCKS.lock().entry(key).or_default())
}

/// JSON snapshot files on the local filesystem
pub struct JsonFileStore {
    /// Indentation width of written files
    indentation: usize,
}

impl JsonFileStore {
    pub fn new(indentation: usize) -> Self {
        Self { indentation }
    }

    pub fn from_config(config: &SnapcheckConfig) -> Self {
        match config.file_format {
            FileFormat::Json => Self::new(config.json_indentation),
        }
    }

    pub fn indentation(&self) -> usize {
        self.indentation
    }

    /// Read and validate a snapshot file
    pub fn read_document(path: &Path) -> StoreResult<SnapshotDocument> {
        if path.extension().and_then(|ext| ext.to_str()) != Some(FileFormat::Json.extension()) {
            return Err(StoreError::UnsupportedFormat(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        let document = SnapshotDocument::from_json_str(&content)?;
        debug!("Loaded snapshot file {:?}", path);
        Ok(document)
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(SnapcheckConfig::default().json_indentation)
    }
}

impl RecordStore for JsonFileStore {
    fn snapshot_path(&self, test_file: &Path) -> StoreResult<PathBuf> {
        let parent = match test_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !parent.is_dir() {
            return Err(StoreError::invalid_path(
                test_file,
                "parent directory does not exist",
            ));
        }
        let stem = test_file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| StoreError::invalid_path(test_file, "no file name"))?;

        Ok(parent
            .join(SNAPSHOT_DIRECTORY)
            .join(format!("{}.{}", stem, FileFormat::Json.extension())))
    }

    fn load(&self, test_file: &Path) -> StoreResult<Option<SnapshotDocument>> {
        let path = self.snapshot_path(test_file)?;
        if !path.exists() {
            debug!("No snapshot file at {:?}", path);
            return Ok(None);
        }
        Self::read_document(&path).map(Some)
    }

    fn save(&self, test_file: &Path, document: &SnapshotDocument) -> StoreResult<()> {
        let path = self.snapshot_path(test_file)?;
        let directory = match path.parent() {
            Some(directory) => directory,
            None => return Err(StoreError::invalid_path(&path, "no parent directory")),
        };
        fs::create_dir_all(directory)?;

        let content = document.to_json_string(self.indentation)?;
        // each writer stages into its own file
        let mut staging = NamedTempFile::new_in(directory)?;
        staging.write_all(content.as_bytes())?;
        staging.persist(&path).map_err(|error| error.error)?;

        debug!(
            "Saved {} snapshot(s) to {:?}",
            document.snapshot_count(),
            path
        );
        Ok(())
    }

    fn exists(&self, test_file: &Path) -> StoreResult<bool> {
        Ok(self.snapshot_path(test_file)?.exists())
    }

    fn update(
        &self,
        test_file: &Path,
        apply: &mut dyn FnMut(&mut SnapshotDocument),
    ) -> StoreResult<()> {
        let path = self.snapshot_path(test_file)?;
        if let Some(directory) = path.parent() {
            fs::create_dir_all(directory)?;
        }
        let lock = update_lock(&path);
        let _guard = lock.lock();
        let mut document = self.load(test_file)?.unwrap_or_default();
        apply(&mut document);
        self.save(test_file, &document)
    }
}
