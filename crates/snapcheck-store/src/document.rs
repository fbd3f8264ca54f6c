//! Snapshot file document
//!
//! One document per test source file. Test ids map to the recorded calls of
//! that test; each call is keyed by the digest of its metadata and holds the
//! snapshots asserted during the call, in assertion order.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use snapcheck_core::{MetadataDigest, Record, SnapcheckError, SnapshotMetadata, TypeRegistry};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Format version written by this build
pub const FORMAT_VERSION: u64 = 1;

/// Oldest format version this build reads
pub const MIN_FORMAT_VERSION: u64 = 1;

/// Metadata of a recorded call, as stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMetadata {
    /// Arguments encoded in metadata mode
    pub arguments: Record,
    pub user_provided_name: String,
    pub test_runner_provided_name: String,
    pub update_on_next_run: bool,
}

impl StoredMetadata {
    pub fn from_metadata(metadata: &SnapshotMetadata, registry: &TypeRegistry) -> Self {
        Self {
            arguments: metadata.encode_arguments(registry),
            user_provided_name: metadata.user_provided_name.clone(),
            test_runner_provided_name: metadata.test_runner_provided_name.clone(),
            update_on_next_run: false,
        }
    }

    pub fn digest(&self) -> MetadataDigest {
        MetadataDigest::compute(
            &self.arguments,
            &self.user_provided_name,
            &self.test_runner_provided_name,
        )
    }
}

/// Snapshots recorded by one call of a test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallEntry {
    pub digest: MetadataDigest,
    pub metadata: StoredMetadata,
    pub snapshots: Vec<Record>,
}

impl CallEntry {
    pub fn new(metadata: StoredMetadata) -> Self {
        Self {
            digest: metadata.digest(),
            metadata,
            snapshots: Vec::new(),
        }
    }

    /// Store a snapshot at an assertion index, appending past the end
    pub fn record(&mut self, index: usize, record: Record) {
        if index < self.snapshots.len() {
            self.snapshots[index] = record;
        } else {
            self.snapshots.push(record);
        }
    }
}

/// Contents of one snapshot file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotDocument {
    pub format_version: u64,
    pub snapcheck_version: String,
    pub tests: BTreeMap<String, Vec<CallEntry>>,
}

impl Default for SnapshotDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotDocument {
    /// Empty document for the current format
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            snapcheck_version: snapcheck_core::VERSION.to_string(),
            tests: BTreeMap::new(),
        }
    }

    pub fn find(&self, test_id: &str, digest: &MetadataDigest) -> Option<&CallEntry> {
        self.tests
            .get(test_id)?
            .iter()
            .find(|entry| &entry.digest == digest)
    }

    /// Insert a call entry, replacing the one with the same digest
    pub fn upsert(&mut self, test_id: &str, entry: CallEntry) {
        let calls = self.tests.entry(test_id.to_string()).or_default();
        match calls.iter_mut().find(|existing| existing.digest == entry.digest) {
            Some(existing) => *existing = entry,
            None => calls.push(entry),
        }
    }

    /// All call entries with their test ids
    pub fn entries(&self) -> impl Iterator<Item = (&str, &CallEntry)> {
        self.tests
            .iter()
            .flat_map(|(test_id, calls)| calls.iter().map(move |call| (test_id.as_str(), call)))
    }

    pub fn snapshot_count(&self) -> usize {
        self.entries().map(|(_, call)| call.snapshots.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.values().all(Vec::is_empty)
    }

    /// Parse and validate a document
    pub fn from_json(json: &Json) -> StoreResult<Self> {
        let format_version = check_version(json)?;
        let raw: RawDocument = serde_json::from_value(json.clone())
            .map_err(|e| SnapcheckError::record_format("$", e.to_string()))?;

        let mut tests = BTreeMap::new();
        for (test_id, raw_calls) in raw.tests {
            let mut calls = Vec::with_capacity(raw_calls.len());
            for (call_index, raw_call) in raw_calls.into_iter().enumerate() {
                let prefix = format!("tests[{:?}][{}]", test_id, call_index);
                calls.push(raw_call.into_entry(&prefix)?);
            }
            tests.insert(test_id, calls);
        }

        Ok(Self {
            format_version,
            snapcheck_version: raw.snapcheck_version,
            tests,
        })
    }

    pub fn from_json_str(text: &str) -> StoreResult<Self> {
        let json: Json = serde_json::from_str(text)?;
        Self::from_json(&json)
    }

    /// Render with the given indentation width and a trailing newline
    pub fn to_json_string(&self, indentation: usize) -> StoreResult<String> {
        let indent = " ".repeat(indentation);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        out.push(b'\n');
        String::from_utf8(out).map_err(|e| StoreError::Core(SnapcheckError::json(e.to_string())))
    }
}

fn check_version(json: &Json) -> StoreResult<u64> {
    let version = json
        .get("format_version")
        .and_then(Json::as_u64)
        .ok_or_else(|| {
            SnapcheckError::record_format("format_version", "missing or not a non-negative integer")
        })?;
    if version < MIN_FORMAT_VERSION {
        return Err(SnapcheckError::UnsupportedVersion {
            found: version,
            minimum: MIN_FORMAT_VERSION,
            current: FORMAT_VERSION,
        }
        .into());
    }
    if version > FORMAT_VERSION {
        warn!(
            "Snapshot file format version {} is newer than {}; reading it anyway",
            version, FORMAT_VERSION
        );
    }
    Ok(version)
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    snapcheck_version: String,
    #[serde(default)]
    tests: BTreeMap<String, Vec<RawCall>>,
}

#[derive(Deserialize)]
struct RawCall {
    #[serde(default)]
    digest: Option<String>,
    metadata: RawMetadata,
    #[serde(default)]
    snapshots: Vec<Json>,
}

#[derive(Deserialize)]
struct RawMetadata {
    arguments: Json,
    #[serde(default)]
    user_provided_name: String,
    #[serde(default)]
    test_runner_provided_name: String,
    #[serde(default)]
    update_on_next_run: bool,
}

impl RawCall {
    fn into_entry(self, prefix: &str) -> StoreResult<CallEntry> {
        let arguments = parse_record(&self.metadata.arguments, &format!("{}.metadata.arguments", prefix))?;
        let metadata = StoredMetadata {
            arguments,
            user_provided_name: self.metadata.user_provided_name,
            test_runner_provided_name: self.metadata.test_runner_provided_name,
            update_on_next_run: self.metadata.update_on_next_run,
        };

        let snapshots = self
            .snapshots
            .iter()
            .enumerate()
            .map(|(index, json)| parse_record(json, &format!("{}.snapshots[{}]", prefix, index)))
            .collect::<StoreResult<Vec<_>>>()?;

        // digests are always recomputed from the stored metadata
        let digest = metadata.digest();
        if let Some(stored) = self.digest.as_deref() {
            if stored != digest.as_str() {
                debug!("Recomputed digest for {}: {} -> {}", prefix, stored, digest.short());
            }
        }

        Ok(CallEntry {
            digest,
            metadata,
            snapshots,
        })
    }
}

/// Parse a record, prefixing error locations with its place in the file
fn parse_record(json: &Json, prefix: &str) -> StoreResult<Record> {
    Record::from_json(json).map_err(|error| match error {
        SnapcheckError::RecordFormat { location, message } => SnapcheckError::RecordFormat {
            location: format!("{}{}", prefix, location.trim_start_matches('$')),
            message,
        }
        .into(),
        other => other.into(),
    })
}
