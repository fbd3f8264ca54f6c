//! Snapshot file validation

use crate::console::CliConsole;
use anyhow::bail;
use snapcheck_core::SnapshotEngine;
use snapcheck_store::{JsonFileStore, SnapshotDocument, find_snapshot_files};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Problem found in one snapshot file
#[derive(Debug, Clone, PartialEq)]
pub struct FileProblem {
    pub path: PathBuf,
    pub message: String,
}

/// Result of checking a set of snapshot files
#[derive(Debug, Default)]
pub struct CheckReport {
    pub files: usize,
    pub calls: usize,
    pub snapshots: usize,
    pub warnings: Vec<FileProblem>,
    pub errors: Vec<FileProblem>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse and decode every snapshot file below `paths`
pub fn check_files(engine: &SnapshotEngine, paths: &[PathBuf]) -> CheckReport {
    let mut report = CheckReport::default();
    for path in find_snapshot_files(paths) {
        report.files += 1;
        match JsonFileStore::read_document(&path) {
            Ok(document) => check_document(engine, &path, &document, &mut report),
            Err(e) => report.errors.push(FileProblem {
                path,
                message: e.to_string(),
            }),
        }
    }
    report
}

fn check_document(
    engine: &SnapshotEngine,
    path: &Path,
    document: &SnapshotDocument,
    report: &mut CheckReport,
) {
    for (test_id, call) in document.entries() {
        report.calls += 1;
        let records = std::iter::once(("arguments".to_string(), &call.metadata.arguments)).chain(
            call.snapshots
                .iter()
                .enumerate()
                .map(|(index, record)| (format!("snapshot {}", index), record)),
        );
        for (label, record) in records {
            let context = format!("{} [{}] {}", test_id, call.digest.short(), label);
            match engine.decode_with_warnings(record) {
                Ok((_, warnings)) => {
                    report.warnings.extend(warnings.into_iter().map(|warning| FileProblem {
                        path: path.to_path_buf(),
                        message: format!("{}: {}", context, warning),
                    }));
                }
                Err(e) => report.errors.push(FileProblem {
                    path: path.to_path_buf(),
                    message: format!("{}: {}", context, e),
                }),
            }
        }
        report.snapshots += call.snapshots.len();
    }
    debug!("Checked {:?}", path);
}

pub fn execute(console: &CliConsole, paths: &[PathBuf]) -> anyhow::Result<()> {
    console.print_header("Snapshot Check");
    let report = check_files(&SnapshotEngine::default(), paths);

    if report.files == 0 {
        console.warn("No snapshot files found");
        return Ok(());
    }

    for warning in &report.warnings {
        console.info(&format!("{}: {}", warning.path.display(), warning.message));
    }
    if !report.warnings.is_empty() {
        console.warn(&format!(
            "{} warning(s); rerun with --verbose to list them",
            report.warnings.len()
        ));
    }
    for error in &report.errors {
        console.error(&format!("{}: {}", error.path.display(), error.message));
    }

    let totals = format!(
        "{} file(s), {} call(s), {} snapshot(s)",
        report.files, report.calls, report.snapshots
    );
    if !report.is_ok() {
        bail!("{} error(s) in {}", report.errors.len(), totals);
    }
    console.success(&format!("Checked {}", totals));
    Ok(())
}
