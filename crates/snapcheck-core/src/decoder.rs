//! Record to value decoding
//!
//! Structurally invalid payloads are errors. Anything that is merely not
//! reconstructible here (unknown tags, unregistered classes, classes that
//! reject their stored state, recursion sentinels) decodes to a
//! [`DecodedPlaceholder`] and raises a warning.

use crate::error::{SnapcheckError, SnapcheckResult, SnapshotWarning};
use crate::location::{Location, Segment};
use crate::record::Record;
use crate::registry::TypeRegistry;
use crate::value::{DecodedPlaceholder, Value};
use tracing::warn;

/// Single-use decoder state
pub struct Decoder<'r> {
    registry: &'r TypeRegistry,
    location: Location,
    warnings: Vec<SnapshotWarning>,
}

impl<'r> Decoder<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            location: Location::root(),
            warnings: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Decode a record at the current location
    pub fn decode(&mut self, record: &Record) -> SnapcheckResult<Value> {
        let registry = self.registry;
        match registry.resolve(&record.tag) {
            Some(handler) => handler.decode(record, self),
            None => {
                self.warn(SnapshotWarning::UnknownTag {
                    location: self.location.to_string(),
                    tag: record.tag.to_string(),
                });
                Ok(self.placeholder(record))
            }
        }
    }

    /// Decode a child one step below the current location
    pub fn decode_child(&mut self, segment: Segment, record: &Record) -> SnapcheckResult<Value> {
        self.location.push(segment);
        let value = self.decode(record);
        self.location.pop();
        value
    }

    /// Opaque stand-in for a record
    pub fn placeholder(&self, record: &Record) -> Value {
        Value::Placeholder(DecodedPlaceholder::new(record.clone()))
    }

    /// Format error at the current location
    pub fn error(&self, message: impl Into<String>) -> SnapcheckError {
        SnapcheckError::record_format(&self.location, message)
    }

    /// Record a non-fatal problem
    pub fn warn(&mut self, warning: SnapshotWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[SnapshotWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<SnapshotWarning> {
        std::mem::take(&mut self.warnings)
    }
}
