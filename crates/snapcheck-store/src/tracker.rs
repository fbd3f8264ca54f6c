//! Snapshot status tracking across a test run
//!
//! The tracker discovers every snapshot file under the test paths, marks all
//! stored snapshots unchecked, and takes the statuses of each finished
//! session. Whatever is still unchecked at the end of the run belongs to
//! tests that no longer assert it.

use crate::document::SnapshotDocument;
use crate::session::SessionOutcome;
use crate::status::{SnapshotStatus, StatusCounts};
use crate::store::{JsonFileStore, SNAPSHOT_DIRECTORY};
use parking_lot::Mutex;
use serde::Serialize;
use snapcheck_core::MetadataDigest;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directories never searched for snapshot files
const SKIPPED_DIRECTORIES: &[&str] = &["target", ".git"];

/// Statuses of one recorded call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedCall {
    pub digest: MetadataDigest,
    pub statuses: Vec<SnapshotStatus>,
}

/// A stored snapshot nothing asserted against
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UncheckedSnapshot {
    pub snapshot_file: PathBuf,
    pub test_id: String,
    pub digest: MetadataDigest,
    pub index: usize,
}

type FileStatuses = BTreeMap<String, Vec<TrackedCall>>;

/// Run-wide snapshot statuses, keyed by snapshot file then test id
#[derive(Debug, Default)]
pub struct SnapshotTracker {
    files: Mutex<BTreeMap<PathBuf, FileStatuses>>,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track every snapshot file found below the given paths
    pub fn discover<P: AsRef<Path>>(paths: &[P]) -> Self {
        let tracker = Self::new();
        for path in find_snapshot_files(paths) {
            match JsonFileStore::read_document(&path) {
                Ok(document) => tracker.track_document(&path, &document),
                Err(e) => warn!("Skipping unreadable snapshot file {:?}: {}", path, e),
            }
        }
        tracker
    }

    /// Mark every snapshot of a document unchecked
    pub fn track_document(&self, snapshot_file: &Path, document: &SnapshotDocument) {
        let mut statuses = FileStatuses::new();
        for (test_id, call) in document.entries() {
            statuses.entry(test_id.to_string()).or_default().push(TrackedCall {
                digest: call.digest.clone(),
                statuses: vec![SnapshotStatus::Unchecked; call.snapshots.len()],
            });
        }
        self.files.lock().insert(normalize(snapshot_file), statuses);
    }

    /// Take the statuses of a finished session
    pub fn record(&self, outcome: &SessionOutcome) {
        self.set_statuses(
            &outcome.snapshot_file,
            &outcome.test_id,
            &outcome.digest,
            outcome.statuses.clone(),
        );
    }

    pub fn set_statuses(
        &self,
        snapshot_file: &Path,
        test_id: &str,
        digest: &MetadataDigest,
        statuses: Vec<SnapshotStatus>,
    ) {
        let mut files = self.files.lock();
        let calls = files
            .entry(normalize(snapshot_file))
            .or_default()
            .entry(test_id.to_string())
            .or_default();
        match calls.iter_mut().find(|call| &call.digest == digest) {
            Some(call) => call.statuses = statuses,
            None => calls.push(TrackedCall {
                digest: digest.clone(),
                statuses,
            }),
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().len()
    }

    pub fn counts(&self) -> StatusCounts {
        let files = self.files.lock();
        files
            .values()
            .flat_map(|tests| tests.values().flatten())
            .flat_map(|call| call.statuses.iter())
            .collect()
    }

    /// Snapshots still unchecked, in file, test and index order
    pub fn unchecked(&self) -> Vec<UncheckedSnapshot> {
        let files = self.files.lock();
        let mut unchecked = Vec::new();
        for (snapshot_file, tests) in files.iter() {
            for (test_id, calls) in tests {
                for call in calls {
                    for (index, status) in call.statuses.iter().enumerate() {
                        if *status == SnapshotStatus::Unchecked {
                            unchecked.push(UncheckedSnapshot {
                                snapshot_file: snapshot_file.clone(),
                                test_id: test_id.clone(),
                                digest: call.digest.clone(),
                                index,
                            });
                        }
                    }
                }
            }
        }
        unchecked
    }

    /// End-of-run summary listing unchecked snapshots
    pub fn summary(&self) -> String {
        let counts = self.counts();
        let unchecked = self.unchecked();
        let mut summary = format!("Snapshots: {}\n", counts);
        if unchecked.is_empty() {
            return summary;
        }

        let _ = writeln!(summary, "Unchecked snapshots ({}):", unchecked.len());
        for snapshot in &unchecked {
            let _ = writeln!(
                summary,
                "  {} :: {} [{}] #{}",
                snapshot.snapshot_file.display(),
                snapshot.test_id,
                snapshot.digest.short(),
                snapshot.index
            );
        }
        summary
    }
}

/// Snapshot files below the given paths, sorted and deduplicated
pub fn find_snapshot_files<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for root in paths {
        let root = root.as_ref();
        if is_snapshot_file(root) {
            found.push(normalize(root));
            continue;
        }
        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !SKIPPED_DIRECTORIES.contains(&entry.file_name().to_string_lossy().as_ref())
        });
        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_snapshot_file(entry.path()) => {
                    found.push(normalize(entry.path()));
                }
                Ok(_) => {}
                Err(e) => debug!("Skipping unreadable path: {}", e),
            }
        }
    }
    found.sort();
    found.dedup();
    found
}

fn is_snapshot_file(path: &Path) -> bool {
    let in_snapshot_directory = path
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name == SNAPSHOT_DIRECTORY);
    in_snapshot_directory && path.extension().is_some_and(|ext| ext == "json")
}

fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SnapshotSession;
    use crate::store::RecordStore;
    use snapcheck_core::{SnapcheckConfig, SnapshotEngine, SnapshotMetadata};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn record_run(store: &Arc<JsonFileStore>, test_file: &Path, values: &[i64]) -> SessionOutcome {
        let store: Arc<dyn RecordStore> = store.clone();
        let mut session = SnapshotSession::open(
            SnapshotEngine::default(),
            SnapcheckConfig::default(),
            store,
            test_file,
            SnapshotMetadata::new("suite::test_values"),
        )
        .unwrap();
        for value in values {
            session.assert_match(*value).unwrap();
        }
        session.finish().unwrap()
    }

    #[test]
    fn test_discover_marks_stored_snapshots_unchecked() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(JsonFileStore::default());
        let test_file = temp.path().join("test_suite.rs");
        record_run(&store, &test_file, &[1, 2, 3]);

        let tracker = SnapshotTracker::discover(&[temp.path()]);
        assert_eq!(tracker.file_count(), 1);
        assert_eq!(tracker.counts().unchecked, 3);
        assert_eq!(tracker.unchecked().len(), 3);
    }

    #[test]
    fn test_session_outcomes_update_statuses() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(JsonFileStore::default());
        let test_file = temp.path().join("test_suite.rs");
        record_run(&store, &test_file, &[1, 2, 3]);

        let tracker = SnapshotTracker::discover(&[temp.path()]);
        // the test now asserts only its first two values
        let outcome = record_run(&store, &test_file, &[1, 2]);
        tracker.record(&outcome);

        let unchecked = tracker.unchecked();
        assert_eq!(unchecked.len(), 1);
        assert_eq!(unchecked[0].index, 2);
        assert_eq!(unchecked[0].test_id, "suite::test_values");
        assert_eq!(tracker.counts().passed, 2);

        let summary = tracker.summary();
        assert!(summary.contains("Unchecked snapshots (1):"));
        assert!(summary.contains("suite::test_values"));
    }

    #[test]
    fn test_find_skips_unrelated_files() {
        let temp = TempDir::new().unwrap();
        let snapshots = temp.path().join("tests").join(".snapshots");
        fs::create_dir_all(&snapshots).unwrap();
        fs::write(snapshots.join("a.json"), "{}").unwrap();
        fs::write(snapshots.join("notes.txt"), "").unwrap();
        fs::write(temp.path().join("tests").join("b.json"), "{}").unwrap();
        let ignored = temp.path().join("target").join(".snapshots");
        fs::create_dir_all(&ignored).unwrap();
        fs::write(ignored.join("c.json"), "{}").unwrap();

        let found = find_snapshot_files(&[temp.path()]);
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("tests/.snapshots/a.json"));
    }

    #[test]
    fn test_unreadable_files_are_skipped() {
        let temp = TempDir::new().unwrap();
        let snapshots = temp.path().join(".snapshots");
        fs::create_dir_all(&snapshots).unwrap();
        fs::write(snapshots.join("broken.json"), "not json").unwrap();

        let tracker = SnapshotTracker::discover(&[temp.path()]);
        assert_eq!(tracker.file_count(), 0);
        assert_eq!(tracker.summary(), "Snapshots: 0 passed, 0 failed, 0 written, 0 unchecked\n");
    }
}
