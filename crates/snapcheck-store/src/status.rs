//! Per-snapshot statuses

use serde::Serialize;
use std::fmt;

/// Outcome of one snapshot during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    /// Stored, but never asserted against in this run
    Unchecked,
    Failed,
    Passed,
    /// New value staged, not yet written
    Recorded,
    /// New value written to the snapshot file
    Written,
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Unchecked => "unchecked",
            Self::Failed => "failed",
            Self::Passed => "passed",
            Self::Recorded => "recorded",
            Self::Written => "written",
        };
        f.write_str(text)
    }
}

/// Number of snapshots per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub unchecked: usize,
    pub failed: usize,
    pub passed: usize,
    pub recorded: usize,
    pub written: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: SnapshotStatus) {
        match status {
            SnapshotStatus::Unchecked => self.unchecked += 1,
            SnapshotStatus::Failed => self.failed += 1,
            SnapshotStatus::Passed => self.passed += 1,
            SnapshotStatus::Recorded => self.recorded += 1,
            SnapshotStatus::Written => self.written += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.unchecked + self.failed + self.passed + self.recorded + self.written
    }
}

impl<'a> FromIterator<&'a SnapshotStatus> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = &'a SnapshotStatus>>(statuses: I) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            counts.add(*status);
        }
        counts
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} written, {} unchecked",
            self.passed,
            self.failed,
            self.written + self.recorded,
            self.unchecked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let statuses = [
            SnapshotStatus::Passed,
            SnapshotStatus::Passed,
            SnapshotStatus::Failed,
            SnapshotStatus::Unchecked,
            SnapshotStatus::Written,
        ];
        let counts: StatusCounts = statuses.iter().collect();
        assert_eq!(counts.passed, 2);
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.to_string(), "2 passed, 1 failed, 1 written, 1 unchecked");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&SnapshotStatus::Unchecked).unwrap();
        assert_eq!(json, "\"unchecked\"");
    }
}
