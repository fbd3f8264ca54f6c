//! Depth-first traversal state of one comparison

use super::report::{MismatchEntry, MismatchKind};
use super::{CompareOptions, RecursionPolicy};
use crate::config::ToleranceConfig;
use crate::location::{Location, Segment};
use crate::record::{Payload, Record, TypeTag};
use crate::registry::TypeRegistry;
use serde_json::Value as Json;
use std::collections::HashMap;

/// A keyed child of a mapping or class instance
pub struct KeyedEntry<'r> {
    /// Canonical form of the key, used for matching
    pub key: String,
    pub segment: Segment,
    /// JSON form of the key for reports
    pub display: Json,
    pub value: &'r Record,
}

impl<'r> KeyedEntry<'r> {
    /// Entry for a string key or attribute name
    pub fn named(name: &str, segment: Segment, value: &'r Record) -> Self {
        Self {
            key: string_key(name),
            segment,
            display: Json::String(name.to_string()),
            value,
        }
    }

    /// Entry for an arbitrary encoded key
    pub fn encoded(key: &Record, value: &'r Record) -> Self {
        match (&key.tag, &key.payload) {
            (TypeTag::Primitive, Payload::Text(name)) => {
                Self::named(name, Segment::Key(name.clone()), value)
            }
            _ => {
                let canonical = key.canonical_string();
                Self {
                    segment: Segment::EncodedKey(canonical.clone()),
                    key: canonical,
                    display: key.payload_json(),
                    value,
                }
            }
        }
    }
}

/// Canonical key of a string, identical to the canonical form of its record
fn string_key(name: &str) -> String {
    Record::new(TypeTag::Primitive, Payload::Text(name.to_string())).canonical_string()
}

/// Traversal state: current location and collected entries
pub struct Walk<'a> {
    registry: &'a TypeRegistry,
    options: &'a CompareOptions,
    location: Location,
    entries: Vec<MismatchEntry>,
    truncated: bool,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(registry: &'a TypeRegistry, options: &'a CompareOptions) -> Self {
        Self {
            registry,
            options,
            location: Location::root(),
            entries: Vec::new(),
            truncated: false,
        }
    }

    pub(crate) fn finish(self) -> (Vec<MismatchEntry>, bool) {
        (self.entries, self.truncated)
    }

    pub fn tolerance(&self) -> &ToleranceConfig {
        &self.options.tolerance
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Whether the mismatch cap has been reached
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.options.max_mismatches
    }

    /// Compare two nodes at the current location
    pub fn compare(&mut self, expected: &Record, actual: &Record) {
        if expected.is_recursion_sentinel() || actual.is_recursion_sentinel() {
            self.compare_recursion(expected, actual);
            return;
        }

        if expected.tag == actual.tag {
            let registry = self.registry;
            match registry.resolve(&expected.tag) {
                Some(handler) => handler.compare(expected, actual, self),
                None => self.compare_opaque(expected, actual),
            }
            return;
        }

        match (&expected.payload, &actual.payload) {
            (Payload::Int(_) | Payload::Float(_), Payload::Int(_) | Payload::Float(_))
                if is_number(&expected.tag) && is_number(&actual.tag) =>
            {
                self.compare_floats(as_float(expected), as_float(actual));
            }
            _ if is_mapping(&expected.tag) && is_mapping(&actual.tag) => {
                let expected_entries = keyed_entries(expected);
                let actual_entries = keyed_entries(actual);
                self.compare_keyed(&expected_entries, &actual_entries, "key");
            }
            _ => self.report_type_change(expected, actual),
        }
    }

    /// Compare two children one step below the current location
    pub fn compare_child(&mut self, segment: Segment, expected: &Record, actual: &Record) {
        self.location.push(segment);
        self.compare(expected, actual);
        self.location.pop();
    }

    /// Record a difference at the current location. Past the cap the
    /// difference is dropped and the result marked truncated.
    pub fn report(
        &mut self,
        kind: MismatchKind,
        reason: impl Into<String>,
        expected: Option<Json>,
        actual: Option<Json>,
    ) {
        if self.is_full() {
            self.truncated = true;
            return;
        }
        self.entries.push(MismatchEntry {
            location: self.location.to_string(),
            kind,
            reason: reason.into(),
            expected,
            actual,
        });
    }

    /// Record a difference one step below the current location
    pub fn report_child(
        &mut self,
        segment: Segment,
        kind: MismatchKind,
        reason: impl Into<String>,
        expected: Option<Json>,
        actual: Option<Json>,
    ) {
        self.location.push(segment);
        self.report(kind, reason, expected, actual);
        self.location.pop();
    }

    /// Differing exact payloads
    pub fn report_value_change(&mut self, expected: &Record, actual: &Record) {
        self.report(
            MismatchKind::ValueChanged,
            MismatchKind::ValueChanged.to_string(),
            Some(expected.payload_json()),
            Some(actual.payload_json()),
        );
    }

    pub fn report_type_change(&mut self, expected: &Record, actual: &Record) {
        self.report(
            MismatchKind::TypeChanged,
            format!(
                "type changed: {} -> {}",
                describe_type(expected),
                describe_type(actual)
            ),
            Some(expected.to_json()),
            Some(actual.to_json()),
        );
    }

    /// Compare floats with the configured tolerance
    pub fn compare_floats(&mut self, expected: f64, actual: f64) {
        if self.tolerance().within(expected, actual) {
            return;
        }
        let reason = format!(
            "out of tolerance: |{} - {}| exceeds {}",
            expected,
            actual,
            self.tolerance()
        );
        self.report(
            MismatchKind::OutOfTolerance,
            reason,
            Some(crate::record::float_to_json(expected)),
            Some(crate::record::float_to_json(actual)),
        );
    }

    /// Compare keyed children: missing keys and differing values in stored
    /// order, then extra keys in new order
    pub fn compare_keyed(
        &mut self,
        expected: &[KeyedEntry<'_>],
        actual: &[KeyedEntry<'_>],
        noun: &str,
    ) {
        let actual_index: HashMap<&str, &KeyedEntry<'_>> = actual
            .iter()
            .map(|entry| (entry.key.as_str(), entry))
            .collect();

        for entry in expected {
            match actual_index.get(entry.key.as_str()) {
                Some(other) => {
                    self.compare_child(entry.segment.clone(), entry.value, other.value)
                }
                None => self.report_child(
                    entry.segment.clone(),
                    MismatchKind::MissingKey,
                    format!("missing {} {}", noun, entry.display),
                    Some(entry.value.to_json()),
                    None,
                ),
            }
        }

        let expected_keys: HashMap<&str, ()> = expected
            .iter()
            .map(|entry| (entry.key.as_str(), ()))
            .collect();
        for entry in actual {
            if !expected_keys.contains_key(entry.key.as_str()) {
                self.report_child(
                    entry.segment.clone(),
                    MismatchKind::ExtraKey,
                    format!("extra {} {}", noun, entry.display),
                    None,
                    Some(entry.value.to_json()),
                );
            }
        }
    }

    fn compare_recursion(&mut self, expected: &Record, actual: &Record) {
        let both = expected.is_recursion_sentinel() && actual.is_recursion_sentinel();
        match self.options.recursion {
            RecursionPolicy::Ignore if both => {}
            RecursionPolicy::Ignore => self.report_type_change(expected, actual),
            RecursionPolicy::Mismatch => self.report(
                MismatchKind::RecursionBoundary,
                "recursion boundary: cannot verify equality",
                Some(expected.to_json()),
                Some(actual.to_json()),
            ),
        }
    }

    /// Records with a tag no handler claims compare by canonical form
    fn compare_opaque(&mut self, expected: &Record, actual: &Record) {
        if expected.canonical_string() != actual.canonical_string() {
            self.report_value_change(expected, actual);
        }
    }
}

fn is_number(tag: &TypeTag) -> bool {
    matches!(tag, TypeTag::NumericExact | TypeTag::NumericFloat)
}

fn is_mapping(tag: &TypeTag) -> bool {
    matches!(tag, TypeTag::Mapping | TypeTag::KeyListMapping)
}

fn as_float(record: &Record) -> f64 {
    match record.payload {
        Payload::Int(value) => value as f64,
        Payload::Float(value) => value,
        _ => f64::NAN,
    }
}

fn describe_type(record: &Record) -> String {
    match (&record.kind, &record.class) {
        (_, Some(class)) => format!("{}({})", record.tag, class),
        (Some(kind), None) => format!("{}<{}>", record.tag, kind),
        (None, None) => record.tag.to_string(),
    }
}

/// Keyed children of a string-keyed or key-list mapping
pub fn keyed_entries(record: &Record) -> Vec<KeyedEntry<'_>> {
    match &record.payload {
        Payload::Fields(fields) => fields
            .iter()
            .map(|(name, value)| KeyedEntry::named(name, Segment::Key(name.clone()), value))
            .collect(),
        Payload::Pairs(pairs) => pairs
            .iter()
            .map(|(key, value)| KeyedEntry::encoded(key, value))
            .collect(),
        _ => Vec::new(),
    }
}
