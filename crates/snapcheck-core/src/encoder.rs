//! Value to record encoding
//!
//! The encoder dispatches every node to the registry handler that claims it.
//! Shared nodes and objects are tracked on the active path; reaching one that
//! is already being encoded writes a recursion sentinel instead of recursing.

use crate::error::SnapshotWarning;
use crate::location::{Location, Segment};
use crate::record::Record;
use crate::registry::TypeRegistry;
use crate::value::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which hooks apply while encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeMode {
    /// Snapshot values
    #[default]
    Snapshot,
    /// Test-call metadata; objects with a metadata hook are encoded through it
    Metadata,
}

/// Single-use encoder state
pub struct Encoder<'r> {
    registry: &'r TypeRegistry,
    mode: EncodeMode,
    active: HashSet<usize>,
    location: Location,
    warnings: Vec<SnapshotWarning>,
}

impl<'r> Encoder<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self::with_mode(registry, EncodeMode::Snapshot)
    }

    /// Encoder for test-call metadata
    pub fn for_metadata(registry: &'r TypeRegistry) -> Self {
        Self::with_mode(registry, EncodeMode::Metadata)
    }

    pub fn with_mode(registry: &'r TypeRegistry, mode: EncodeMode) -> Self {
        Self {
            registry,
            mode,
            active: HashSet::new(),
            location: Location::root(),
            warnings: Vec::new(),
        }
    }

    pub fn mode(&self) -> EncodeMode {
        self.mode
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Encode a value at the current location
    pub fn encode(&mut self, value: &Value) -> Record {
        match value {
            Value::Shared(node) => {
                let identity = node.identity();
                if !self.enter(identity) {
                    return Record::recursion_sentinel();
                }
                let inner = node.read();
                let record = self.encode(&inner);
                drop(inner);
                self.active.remove(&identity);
                record
            }
            Value::Placeholder(placeholder) => placeholder.record().clone(),
            Value::Object(object) => {
                let identity = Arc::as_ptr(object) as *const () as usize;
                if !self.enter(identity) {
                    return Record::recursion_sentinel();
                }
                let record = match (self.mode, object.as_metadata_encodable()) {
                    (EncodeMode::Metadata, Some(hook)) => {
                        let replacement = hook.metadata_encode();
                        self.encode(&replacement)
                    }
                    _ => self.dispatch(value),
                };
                self.active.remove(&identity);
                record
            }
            _ => self.dispatch(value),
        }
    }

    /// Encode a child one step below the current location
    pub fn encode_child(&mut self, segment: Segment, value: &Value) -> Record {
        self.location.push(segment);
        let record = self.encode(value);
        self.location.pop();
        record
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

    fn enter(&mut self, identity: usize) -> bool {
        let fresh = self.active.insert(identity);
        if !fresh {
            debug!("Cycle detected at {}, writing recursion sentinel", self.location);
        }
        fresh
    }

    fn dispatch(&mut self, value: &Value) -> Record {
        let registry = self.registry;
        registry.handler_for(value).encode(value, self)
    }
}
