//! Snapshot assertion session
//!
//! A session covers one call of one test: it looks up the stored call entry
//! by metadata digest, checks each asserted value against the snapshot at
//! the same index, records new or forced snapshots, and writes the entry
//! back when finished.

use crate::document::{CallEntry, SnapshotDocument, StoredMetadata};
use crate::error::{StoreError, StoreResult};
use crate::status::SnapshotStatus;
use crate::store::RecordStore;
use snapcheck_core::{
    AttributeState, Attributes, CompareOptions, Comparator, MetadataDigest, SnapcheckConfig,
    SnapshotEngine, SnapshotMetadata, SnapshotObject, Value,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Options for a single assertion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssertOptions {
    /// Compare floats without tolerance
    pub exact: bool,
    /// Re-record the snapshot instead of comparing
    pub update: bool,
}

impl AssertOptions {
    pub fn exact() -> Self {
        Self {
            exact: true,
            update: false,
        }
    }

    pub fn update() -> Self {
        Self {
            exact: false,
            update: true,
        }
    }
}

/// Snapshot form of an error: its type name and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSnapshot {
    type_name: String,
    message: String,
    source: Option<String>,
}

impl ErrorSnapshot {
    pub fn of<E: std::error::Error>(error: &E) -> Self {
        Self {
            type_name: std::any::type_name::<E>().to_string(),
            message: error.to_string(),
            source: error.source().map(|source| source.to_string()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl AttributeState for ErrorSnapshot {
    fn attributes(&self) -> Attributes {
        let attributes = Attributes::new().with("message", self.message.clone());
        match &self.source {
            Some(source) => attributes.with("source", source.clone()),
            None => attributes,
        }
    }
}

impl SnapshotObject for ErrorSnapshot {
    fn qualified_name(&self) -> &str {
        &self.type_name
    }

    fn as_attribute_state(&self) -> Option<&dyn AttributeState> {
        Some(self)
    }
}

/// Statuses of one finished session, for run tracking
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub snapshot_file: PathBuf,
    pub test_id: String,
    pub digest: MetadataDigest,
    pub statuses: Vec<SnapshotStatus>,
}

/// Assertions of one test call against its stored snapshots
pub struct SnapshotSession {
    engine: SnapshotEngine,
    config: SnapcheckConfig,
    store: Arc<dyn RecordStore>,
    test_file: PathBuf,
    snapshot_file: PathBuf,
    test_id: String,
    entry: CallEntry,
    /// Every assertion of this call re-records
    update_all: bool,
    next_index: usize,
    statuses: Vec<SnapshotStatus>,
    changed: bool,
    finished: bool,
}

impl SnapshotSession {
    /// Open a session for a test call defined in `test_file`. Tolerances
    /// and the mismatch cap come from `config`.
    pub fn open(
        engine: SnapshotEngine,
        config: SnapcheckConfig,
        store: Arc<dyn RecordStore>,
        test_file: impl Into<PathBuf>,
        metadata: SnapshotMetadata,
    ) -> StoreResult<Self> {
        let options =
            CompareOptions::from_config(&config)?.with_recursion(engine.options().recursion);
        let engine = engine.with_options(options);
        let test_file = test_file.into();
        let snapshot_file = store.snapshot_path(&test_file)?;
        let stored = StoredMetadata::from_metadata(&metadata, engine.registry());
        let digest = stored.digest();

        let mut entry = store
            .find(&test_file, &metadata.test_id, &digest)?
            .unwrap_or_else(|| CallEntry::new(stored));

        // the stored flag applies to one run only
        let stored_update = entry.metadata.update_on_next_run;
        entry.metadata.update_on_next_run = false;

        debug!(
            "Opened snapshot session for '{}' [{}] with {} stored snapshot(s)",
            metadata.test_id,
            digest.short(),
            entry.snapshots.len()
        );

        Ok(Self {
            update_all: metadata.update_on_next_run || config.force_update || stored_update,
            statuses: vec![SnapshotStatus::Unchecked; entry.snapshots.len()],
            changed: stored_update,
            engine,
            config,
            store,
            test_file,
            snapshot_file,
            test_id: metadata.test_id,
            entry,
            next_index: 0,
            finished: false,
        })
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn digest(&self) -> &MetadataDigest {
        &self.entry.digest
    }

    pub fn snapshot_file(&self) -> &Path {
        &self.snapshot_file
    }

    /// Status of every snapshot of this call so far
    pub fn statuses(&self) -> &[SnapshotStatus] {
        &self.statuses
    }

    /// Assert the next value matches its snapshot
    pub fn assert_match(&mut self, value: impl Into<Value>) -> StoreResult<SnapshotStatus> {
        self.assert_match_with(value, AssertOptions::default())
    }

    pub fn assert_match_with(
        &mut self,
        value: impl Into<Value>,
        options: AssertOptions,
    ) -> StoreResult<SnapshotStatus> {
        if self.finished {
            return Err(StoreError::OutsideContext(self.test_id.clone()));
        }
        let index = self.next_index;
        self.next_index += 1;
        let record = self.engine.encode(&value.into());

        if self.update_all || options.update || index >= self.entry.snapshots.len() {
            if options.update || self.config.force_update {
                warn!(
                    "Snapshot {} of '{}' was forced to update. Forced updates must not be left on in CI",
                    index, self.test_id
                );
            }
            self.entry.record(index, record);
            self.changed = true;
            return Ok(self.mark(index, SnapshotStatus::Recorded));
        }

        let compare_options = if options.exact {
            self.engine.options().clone().exact()
        } else {
            self.engine.options().clone()
        };
        let result = Comparator::new(self.engine.registry(), compare_options)
            .compare_records(&self.entry.snapshots[index], &record);

        if result.is_match() {
            return Ok(self.mark(index, SnapshotStatus::Passed));
        }
        self.mark(index, SnapshotStatus::Failed);
        Err(StoreError::Mismatch {
            test_id: self.test_id.clone(),
            index,
            summary: result.summary(self.config.full_diff),
        })
    }

    /// Assert the call failed and its error matches the next snapshot
    pub fn assert_err<T, E>(&mut self, result: Result<T, E>) -> StoreResult<SnapshotStatus>
    where
        T: fmt::Debug,
        E: std::error::Error,
    {
        self.assert_err_with(result, AssertOptions::default())
    }

    pub fn assert_err_with<T, E>(
        &mut self,
        result: Result<T, E>,
        options: AssertOptions,
    ) -> StoreResult<SnapshotStatus>
    where
        T: fmt::Debug,
        E: std::error::Error,
    {
        match result {
            Ok(value) => Err(StoreError::ExpectedError {
                test_id: self.test_id.clone(),
                found: format!("{:?}", value),
            }),
            Err(error) => self.assert_match_with(Value::object(ErrorSnapshot::of(&error)), options),
        }
    }

    /// Write recorded snapshots and close the session
    pub fn finish(&mut self) -> StoreResult<SessionOutcome> {
        if !self.finished {
            self.finished = true;
            if self.changed {
                let entry = self.entry.clone();
                let test_id = self.test_id.clone();
                self.store
                    .update(&self.test_file, &mut |document: &mut SnapshotDocument| {
                        document.upsert(&test_id, entry.clone())
                    })?;
                self.changed = false;
                for status in &mut self.statuses {
                    if *status == SnapshotStatus::Recorded {
                        *status = SnapshotStatus::Written;
                    }
                }
            }
        }
        Ok(self.outcome())
    }

    pub fn outcome(&self) -> SessionOutcome {
        SessionOutcome {
            snapshot_file: self.snapshot_file.clone(),
            test_id: self.test_id.clone(),
            digest: self.entry.digest.clone(),
            statuses: self.statuses.clone(),
        }
    }

    fn mark(&mut self, index: usize, status: SnapshotStatus) -> SnapshotStatus {
        if index < self.statuses.len() {
            self.statuses[index] = status;
        } else {
            self.statuses.push(status);
        }
        status
    }
}

impl Drop for SnapshotSession {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            warn!("Failed to write snapshots for '{}': {}", self.test_id, e);
        }
    }
}
