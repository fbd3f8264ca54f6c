//! Shareable entry point bundling a registry with comparison options

use crate::compare::{CompareOptions, Comparator, MatchResult};
use crate::config::SnapcheckConfig;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{SnapcheckResult, SnapshotWarning};
use crate::metadata::{MetadataDigest, SnapshotMetadata};
use crate::record::Record;
use crate::registry::TypeRegistry;
use crate::value::Value;
use std::sync::Arc;

/// Encodes, decodes and compares snapshots with one registry
#[derive(Clone)]
pub struct SnapshotEngine {
    registry: Arc<TypeRegistry>,
    options: CompareOptions,
}

impl SnapshotEngine {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            options: CompareOptions::default(),
        }
    }

    /// Engine with comparison options taken from a configuration
    pub fn from_config(registry: Arc<TypeRegistry>, config: &SnapcheckConfig) -> SnapcheckResult<Self> {
        Ok(Self {
            registry,
            options: CompareOptions::from_config(config)?,
        })
    }

    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    pub fn encode(&self, value: &Value) -> Record {
        Encoder::new(&self.registry).encode(value)
    }

    /// Encode, also returning non-fatal warnings
    pub fn encode_with_warnings(&self, value: &Value) -> (Record, Vec<SnapshotWarning>) {
        let mut encoder = Encoder::new(&self.registry);
        let record = encoder.encode(value);
        (record, encoder.take_warnings())
    }

    pub fn decode(&self, record: &Record) -> SnapcheckResult<Value> {
        Decoder::new(&self.registry).decode(record)
    }

    /// Decode, also returning non-fatal warnings
    pub fn decode_with_warnings(
        &self,
        record: &Record,
    ) -> SnapcheckResult<(Value, Vec<SnapshotWarning>)> {
        let mut decoder = Decoder::new(&self.registry);
        let value = decoder.decode(record)?;
        Ok((value, decoder.take_warnings()))
    }

    pub fn comparator(&self) -> Comparator<'_> {
        Comparator::new(&self.registry, self.options.clone())
    }

    /// Compare a stored record with a new one
    pub fn compare(&self, expected: &Record, actual: &Record) -> MatchResult {
        self.comparator().compare_records(expected, actual)
    }

    /// Check a new value against its stored record, if any
    pub fn matches(&self, stored: Option<&Record>, actual: &Value) -> MatchResult {
        self.comparator().matches(stored, actual)
    }

    /// Check with one-off options, e.g. exact float comparison
    pub fn matches_with(
        &self,
        stored: Option<&Record>,
        actual: &Value,
        options: CompareOptions,
    ) -> MatchResult {
        Comparator::new(&self.registry, options).matches(stored, actual)
    }

    pub fn digest(&self, metadata: &SnapshotMetadata) -> MetadataDigest {
        metadata.digest(&self.registry)
    }
}

impl Default for SnapshotEngine {
    fn default() -> Self {
        Self::new(Arc::new(TypeRegistry::new()))
    }
}
