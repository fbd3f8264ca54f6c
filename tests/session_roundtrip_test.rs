//! Snapshot sessions against JSON files on disk

use snapcheck::store::find_snapshot_files;
use snapcheck::{
    JsonFileStore, RecordStore, SnapcheckConfig, SnapshotEngine, SnapshotMetadata,
    SnapshotSession, SnapshotStatus, SnapshotTracker, StoreError, Value,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn open(test_file: &Path, config: SnapcheckConfig, metadata: SnapshotMetadata) -> SnapshotSession {
    let store: Arc<dyn RecordStore> = Arc::new(JsonFileStore::from_config(&config));
    SnapshotSession::open(SnapshotEngine::default(), config, store, test_file, metadata).unwrap()
}

fn metadata(n: i64) -> SnapshotMetadata {
    SnapshotMetadata::new("stats::test_mean")
        .with_argument("n", n)
        .with_argument("seed", 7)
        .ignore("seed")
}

#[test]
fn test_record_then_compare_on_disk() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("test_stats.rs");

    let mut session = open(&test_file, SnapcheckConfig::default(), metadata(4));
    session.assert_match(Value::map([("mean", 2.5), ("spread", 1.25)])).unwrap();
    session.finish().unwrap();

    let path = temp.path().join(".snapshots").join("test_stats.json");
    let text = fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["format_version"], 1);
    assert!(json["tests"]["stats::test_mean"][0]["digest"].is_string());
    assert!(text.contains("\n    \"tests\""));

    let mut session = open(&test_file, SnapcheckConfig::default(), metadata(4));
    let status = session
        .assert_match(Value::map([("spread", 1.25), ("mean", 2.500_000_1)]))
        .unwrap();
    assert_eq!(status, SnapshotStatus::Passed);

    let mut session = open(&test_file, SnapcheckConfig::default(), metadata(4));
    match session.assert_match(Value::map([("mean", 3.0), ("spread", 1.25)])) {
        Err(StoreError::Mismatch { summary, .. }) => assert!(summary.contains("$[\"mean\"]")),
        other => panic!("expected a mismatch, got {:?}", other),
    }
}

#[test]
fn test_ignored_arguments_do_not_change_the_call() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("test_stats.rs");

    let mut session = open(&test_file, SnapcheckConfig::default(), metadata(4));
    session.assert_match(1).unwrap();
    session.finish().unwrap();

    let reseeded = SnapshotMetadata::new("stats::test_mean")
        .with_argument("n", 4)
        .with_argument("seed", 99)
        .ignore("seed");
    let mut session = open(&test_file, SnapcheckConfig::default(), reseeded);
    assert_eq!(session.assert_match(1).unwrap(), SnapshotStatus::Passed);

    let mut session = open(&test_file, SnapcheckConfig::default(), metadata(5));
    assert_eq!(session.assert_match(1).unwrap(), SnapshotStatus::Recorded);
}

#[test]
fn test_configured_indentation_and_full_diff() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("test_shapes.rs");
    let config = SnapcheckConfig {
        json_indentation: 2,
        full_diff: true,
        ..Default::default()
    };

    let mut session = open(&test_file, config.clone(), SnapshotMetadata::new("shapes::test_box"));
    session.assert_match(Value::list([1, 2])).unwrap();
    session.finish().unwrap();

    let text = fs::read_to_string(temp.path().join(".snapshots").join("test_shapes.json")).unwrap();
    assert!(text.starts_with("{\n  \"format_version\""));

    let mut session = open(&test_file, config, SnapshotMetadata::new("shapes::test_box"));
    let error = session.assert_match(Value::list([1, 2, 3])).unwrap_err();
    assert!(error.is_mismatch());
    assert!(error.to_string().contains("Expected:"));
}

#[test]
fn test_tracker_reports_unchecked_after_run() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("test_stats.rs");
    for n in [1, 2] {
        let mut session = open(&test_file, SnapcheckConfig::default(), metadata(n));
        session.assert_match(n * 10).unwrap();
        session.finish().unwrap();
    }
    assert_eq!(find_snapshot_files(&[temp.path()]).len(), 1);

    let tracker = SnapshotTracker::discover(&[temp.path()]);
    let mut session = open(&test_file, SnapcheckConfig::default(), metadata(1));
    session.assert_match(10).unwrap();
    tracker.record(&session.finish().unwrap());

    let counts = tracker.counts();
    assert_eq!(counts.passed, 1);
    assert_eq!(counts.unchecked, 1);
    assert!(tracker.summary().contains("stats::test_mean"));
}

#[test]
fn test_open_session_uses_project_config() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("snapcheck.toml"), "json_indentation = 1\n").unwrap();
    let test_file = temp.path().join("test_io.rs");

    let mut session =
        snapcheck::open_session(&test_file, SnapshotMetadata::new("io::test_read")).unwrap();
    session.assert_match("payload").unwrap();
    session.finish().unwrap();

    let text = fs::read_to_string(temp.path().join(".snapshots").join("test_io.json")).unwrap();
    assert!(text.starts_with("{\n \"format_version\""));
}

#[test]
fn test_parallel_sessions_keep_every_entry() {
    let temp = TempDir::new().unwrap();
    let test_file = temp.path().join("test_parallel.rs");

    for round in 0..3 {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let test_file = test_file.clone();
                std::thread::spawn(move || {
                    let metadata = SnapshotMetadata::new(format!("parallel::case_{}", i))
                        .with_argument("round", round);
                    let mut session = snapcheck::open_session(&test_file, metadata).unwrap();
                    session.assert_match(i).unwrap();
                    session.finish().unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    let path = temp.path().join(".snapshots").join("test_parallel.json");
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let tests = json["tests"].as_object().unwrap();
    assert_eq!(tests.len(), 8);
    for i in 0..8 {
        assert_eq!(tests[&format!("parallel::case_{}", i)].as_array().unwrap().len(), 3);
    }
}
