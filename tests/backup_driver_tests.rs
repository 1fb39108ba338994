//! # Dump Driver Tests
//!
//! Runs `DumpDriver` against the in-memory store and checks the files it leaves
//! behind.

mod common;

use common::{backup_files, FakeKvConnector};
use database_backup_controller::controller::drivers::{DriverError, DumpDriver};

#[tokio::test]
async fn test_failed_read_skips_only_that_key() {
    let store = FakeKvConnector::with_data(&[("a", "1"), ("b", "2"), ("c", "3")]);
    store.fail_reads_of("b");
    let dir = tempfile::tempdir().unwrap();

    let report = DumpDriver::new(store)
        .run("localhost:6379", "secret", dir.path())
        .await
        .unwrap();

    assert_eq!(report.written, 2);
    assert_eq!(report.skipped, 1);
    let contents = std::fs::read_to_string(&report.path).unwrap();
    assert_eq!(contents, "a: 1\nc: 3\n");
}

#[tokio::test]
async fn test_back_to_back_runs_produce_distinct_intact_files() {
    let store = FakeKvConnector::with_data(&[("session:1", "alice"), ("session:2", "bob")]);
    let dir = tempfile::tempdir().unwrap();
    let driver = DumpDriver::new(store);

    let first = driver.run("localhost:6379", "", dir.path()).await.unwrap();
    let second = driver.run("localhost:6379", "", dir.path()).await.unwrap();

    assert_ne!(first.path, second.path);
    assert_eq!(backup_files(dir.path()).len(), 2);
    for report in [first, second] {
        assert_eq!(
            std::fs::read_to_string(report.path).unwrap(),
            "session:1: alice\nsession:2: bob\n"
        );
    }
}

#[tokio::test]
async fn test_empty_store_writes_empty_file_in_new_directory() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("redis").join("nightly");

    let report = DumpDriver::new(FakeKvConnector::default())
        .run("localhost:6379", "", &target)
        .await
        .unwrap();

    assert_eq!(report.written, 0);
    assert!(report.path.starts_with(&target));
    assert_eq!(std::fs::read_to_string(report.path).unwrap(), "");
}

#[tokio::test]
async fn test_connection_failure_writes_nothing() {
    let store = FakeKvConnector::default();
    store.refuse_connections(true);
    let dir = tempfile::tempdir().unwrap();

    let result = DumpDriver::new(store)
        .run("localhost:6379", "", dir.path())
        .await;

    assert!(matches!(result, Err(DriverError::Connect { .. })));
    assert!(backup_files(dir.path()).is_empty());
}
