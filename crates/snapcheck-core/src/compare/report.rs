//! Comparison outcomes

use crate::record::Record;
use serde::Serialize;
use serde_json::Value as Json;
use std::fmt;

/// Why two nodes differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// Different type tags, or a list became a tuple
    TypeChanged,
    /// Exact values differ
    ValueChanged,
    /// Floats differ by more than the tolerance
    OutOfTolerance,
    /// Sequences of different length
    LengthChanged,
    /// Set element present only in the stored snapshot
    MissingElement,
    /// Set element present only in the new value
    ExtraElement,
    /// Mapping key or attribute present only in the stored snapshot
    MissingKey,
    /// Mapping key or attribute present only in the new value
    ExtraKey,
    ClassChanged,
    UnitChanged,
    /// A recursion sentinel was reached
    RecursionBoundary,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MismatchKind::TypeChanged => "type changed",
            MismatchKind::ValueChanged => "value changed",
            MismatchKind::OutOfTolerance => "out of tolerance",
            MismatchKind::LengthChanged => "length changed",
            MismatchKind::MissingElement => "missing element",
            MismatchKind::ExtraElement => "extra element",
            MismatchKind::MissingKey => "missing key",
            MismatchKind::ExtraKey => "extra key",
            MismatchKind::ClassChanged => "class changed",
            MismatchKind::UnitChanged => "unit changed",
            MismatchKind::RecursionBoundary => "recursion boundary",
        };
        f.write_str(text)
    }
}

/// One difference between the stored and the new value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MismatchEntry {
    /// Path from the root, e.g. `$["points"][2].x`
    pub location: String,
    pub kind: MismatchKind,
    /// Human-readable explanation
    pub reason: String,
    /// Stored side, absent for extra elements
    pub expected: Option<Json>,
    /// New side, absent for missing elements
    pub actual: Option<Json>,
}

impl fmt::Display for MismatchEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.reason)?;
        match (&self.expected, &self.actual) {
            (Some(expected), Some(actual)) => {
                write!(f, " (expected: {}, actual: {})", expected, actual)
            }
            (Some(expected), None) => write!(f, " (expected: {})", expected),
            (None, Some(actual)) => write!(f, " (actual: {})", actual),
            (None, None) => Ok(()),
        }
    }
}

/// All differences found by one comparison, in traversal order
#[derive(Debug, Clone)]
pub struct MismatchReport {
    pub entries: Vec<MismatchEntry>,
    /// Comparison stopped descending once the mismatch cap was reached
    pub truncated: bool,
    pub expected: Record,
    pub actual: Record,
}

impl MismatchReport {
    /// Numbered list of differences; `full_diff` appends both records
    pub fn summary(&self, full_diff: bool) -> String {
        let mut summary = format!("Found {} mismatch(es):\n", self.entries.len());

        for (i, entry) in self.entries.iter().enumerate() {
            summary.push_str(&format!("  {}. {}\n", i + 1, entry));
        }

        if self.truncated {
            summary.push_str("  ... comparison stopped at the mismatch limit\n");
        }

        if full_diff {
            summary.push_str("\nExpected:\n");
            summary.push_str(&self.expected.to_pretty_string());
            summary.push_str("\nActual:\n");
            summary.push_str(&self.actual.to_pretty_string());
            summary.push('\n');
        }

        summary
    }
}

/// Result of checking a value against its stored snapshot
#[derive(Debug, Clone)]
pub enum MatchResult {
    Match,
    Mismatch(MismatchReport),
    /// No stored snapshot to compare against
    Unchecked,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Match)
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, MatchResult::Mismatch(_))
    }

    pub fn is_unchecked(&self) -> bool {
        matches!(self, MatchResult::Unchecked)
    }

    /// Mismatch entries; empty unless this is a mismatch
    pub fn entries(&self) -> &[MismatchEntry] {
        match self {
            MatchResult::Mismatch(report) => &report.entries,
            _ => &[],
        }
    }

    pub fn report(&self) -> Option<&MismatchReport> {
        match self {
            MatchResult::Mismatch(report) => Some(report),
            _ => None,
        }
    }

    pub fn summary(&self, full_diff: bool) -> String {
        match self {
            MatchResult::Match => "Snapshot matches.".to_string(),
            MatchResult::Unchecked => "No stored snapshot; value is unchecked.".to_string(),
            MatchResult::Mismatch(report) => report.summary(full_diff),
        }
    }
}
