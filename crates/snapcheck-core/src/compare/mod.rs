//! Structural comparison of records
//!
//! The comparator walks two record trees depth-first and collects every
//! difference (up to a cap) instead of stopping at the first one. Floats are
//! compared with tolerance, mappings and instance attributes by key, sets as
//! multisets of canonical elements.

mod report;
mod walk;

pub use report::{MatchResult, MismatchEntry, MismatchKind, MismatchReport};
pub use walk::{keyed_entries, KeyedEntry, Walk};

use crate::config::{SnapcheckConfig, ToleranceConfig};
use crate::encoder::Encoder;
use crate::error::SnapcheckResult;
use crate::record::Record;
use crate::registry::TypeRegistry;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How recursion sentinels compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecursionPolicy {
    /// Any sentinel is a mismatch, since equality past it cannot be verified
    #[default]
    Mismatch,
    /// Two sentinels at the same location are equal
    Ignore,
}

/// Settings for one comparison
#[derive(Debug, Clone, PartialEq)]
pub struct CompareOptions {
    pub tolerance: ToleranceConfig,
    pub recursion: RecursionPolicy,
    /// Mismatch entries kept; later differences are dropped
    pub max_mismatches: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            tolerance: ToleranceConfig::default(),
            recursion: RecursionPolicy::default(),
            max_mismatches: 100,
        }
    }
}

impl CompareOptions {
    /// Options from a configuration; fails on invalid tolerances
    pub fn from_config(config: &SnapcheckConfig) -> SnapcheckResult<Self> {
        Ok(Self {
            tolerance: config.tolerance()?,
            recursion: RecursionPolicy::default(),
            max_mismatches: config.max_mismatches.max(1),
        })
    }

    pub fn with_tolerance(mut self, tolerance: ToleranceConfig) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Zero float tolerance
    pub fn exact(self) -> Self {
        self.with_tolerance(ToleranceConfig::exact())
    }

    pub fn with_recursion(mut self, recursion: RecursionPolicy) -> Self {
        self.recursion = recursion;
        self
    }

    pub fn with_max_mismatches(mut self, max_mismatches: usize) -> Self {
        self.max_mismatches = max_mismatches.max(1);
        self
    }
}

/// Compares stored records with new values
pub struct Comparator<'r> {
    registry: &'r TypeRegistry,
    options: CompareOptions,
}

impl<'r> Comparator<'r> {
    pub fn new(registry: &'r TypeRegistry, options: CompareOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Compare a stored record with a new one
    pub fn compare_records(&self, expected: &Record, actual: &Record) -> MatchResult {
        let mut walk = Walk::new(self.registry, &self.options);
        walk.compare(expected, actual);
        let (entries, truncated) = walk.finish();

        if entries.is_empty() && !truncated {
            return MatchResult::Match;
        }
        debug!(
            "Comparison found {} mismatch(es){}",
            entries.len(),
            if truncated { " (truncated)" } else { "" }
        );
        MatchResult::Mismatch(MismatchReport {
            entries,
            truncated,
            expected: expected.clone(),
            actual: actual.clone(),
        })
    }

    /// Encode both values and compare them
    pub fn compare_values(&self, expected: &Value, actual: &Value) -> MatchResult {
        let expected = self.encode(expected);
        let actual = self.encode(actual);
        self.compare_records(&expected, &actual)
    }

    /// Check a new value against its stored record; no record is `Unchecked`
    pub fn matches(&self, stored: Option<&Record>, actual: &Value) -> MatchResult {
        match stored {
            Some(stored) => self.compare_records(stored, &self.encode(actual)),
            None => MatchResult::Unchecked,
        }
    }

    fn encode(&self, value: &Value) -> Record {
        Encoder::new(self.registry).encode(value)
    }
}
