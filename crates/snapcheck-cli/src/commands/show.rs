//! Snapshot file inspection

use crate::console::CliConsole;
use anyhow::{Context, bail};
use snapcheck_core::{Record, SnapshotEngine};
use snapcheck_store::{
    CallEntry, JsonFileStore, RecordStore, SNAPSHOT_DIRECTORY, SnapshotDocument,
};
use std::path::{Path, PathBuf};

/// Snapshot file for a path naming either the file itself or its test file
pub fn resolve_snapshot_file(file: &Path) -> anyhow::Result<PathBuf> {
    let in_snapshot_directory = file
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name == SNAPSHOT_DIRECTORY);
    if in_snapshot_directory {
        return Ok(file.to_path_buf());
    }
    JsonFileStore::default()
        .snapshot_path(file)
        .with_context(|| format!("No snapshot file for {}", file.display()))
}

/// One-line summary of a stored record and the value it decodes to
fn describe_record(engine: &SnapshotEngine, record: &Record) -> String {
    match engine.decode(record) {
        Ok(value) => format!("{} -> {}", record.describe(), value.type_name()),
        Err(e) => format!("{} (undecodable: {})", record.describe(), e),
    }
}

/// Calls of a document, optionally restricted to one test id
pub fn select_calls<'a>(
    document: &'a SnapshotDocument,
    test: Option<&str>,
) -> anyhow::Result<Vec<(&'a str, &'a CallEntry)>> {
    let calls: Vec<_> = document
        .entries()
        .filter(|(test_id, _)| test.is_none_or(|wanted| wanted == *test_id))
        .collect();
    if let Some(wanted) = test {
        if calls.is_empty() {
            bail!("No snapshots recorded for test '{}'", wanted);
        }
    }
    Ok(calls)
}

pub fn execute(
    console: &CliConsole,
    file: &Path,
    test: Option<&str>,
    full: bool,
) -> anyhow::Result<()> {
    let path = resolve_snapshot_file(file)?;
    let document = JsonFileStore::read_document(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let engine = SnapshotEngine::default();

    console.print_header(&format!("Snapshots in {}", path.display()));
    console.field("Format version", &document.format_version.to_string());
    console.field("Written by", &document.snapcheck_version);

    for (test_id, call) in select_calls(&document, test)? {
        println!();
        console.line(0, test_id);
        console.field("Digest", call.digest.as_str());
        if !call.metadata.user_provided_name.is_empty() {
            console.field("Name", &call.metadata.user_provided_name);
        }
        if !call.metadata.test_runner_provided_name.is_empty() {
            console.field("Runner name", &call.metadata.test_runner_provided_name);
        }
        console.field("Arguments", &call.metadata.arguments.canonical_string());
        if call.metadata.update_on_next_run {
            console.field("Update on next run", "yes");
        }

        for (index, record) in call.snapshots.iter().enumerate() {
            console.line(2, &format!("#{} {}", index, describe_record(&engine, record)));
            if full {
                for line in record.to_pretty_string().lines() {
                    console.line(3, line);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapcheck_core::{SnapcheckConfig, SnapshotMetadata, Value};
    use snapcheck_store::SnapshotSession;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn record(dir: &Path, test_id: &str) {
        let store: Arc<dyn RecordStore> = Arc::new(JsonFileStore::default());
        let mut session = SnapshotSession::open(
            SnapshotEngine::default(),
            SnapcheckConfig::default(),
            store,
            dir.join("test_io.rs"),
            SnapshotMetadata::new(test_id),
        )
        .unwrap();
        session.assert_match(Value::list([1, 2, 3])).unwrap();
        session.finish().unwrap();
    }

    #[test]
    fn test_resolve_from_test_file() {
        let temp = TempDir::new().unwrap();
        let path = resolve_snapshot_file(&temp.path().join("test_io.rs")).unwrap();
        assert_eq!(path, temp.path().join(".snapshots").join("test_io.json"));

        let direct = temp.path().join(".snapshots").join("other.json");
        assert_eq!(resolve_snapshot_file(&direct).unwrap(), direct);
    }

    #[test]
    fn test_select_calls_by_test_id() {
        let temp = TempDir::new().unwrap();
        record(temp.path(), "io::test_read");
        record(temp.path(), "io::test_write");
        let path = resolve_snapshot_file(&temp.path().join("test_io.rs")).unwrap();
        let document = JsonFileStore::read_document(&path).unwrap();

        assert_eq!(select_calls(&document, None).unwrap().len(), 2);
        let calls = select_calls(&document, Some("io::test_write")).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "io::test_write");
        assert!(select_calls(&document, Some("io::missing")).is_err());
    }

    #[test]
    fn test_describe_record() {
        let engine = SnapshotEngine::default();
        let record = engine.encode(&Value::list([1, 2, 3]));
        let text = describe_record(&engine, &record);
        assert!(text.ends_with("-> list"));
    }
}
