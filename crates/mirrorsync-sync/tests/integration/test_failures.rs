//! Failure handling: bounded retries, per-entry failure collection, and
//! permanent-failure aborts.

use std::sync::Arc;

use mirrorsync_core::domain::newtypes::RelPath;
use mirrorsync_store::RemoteBackend;

use crate::common::{quick_options, remote_engine, write_tree, FlakyObjectStore};

#[tokio::test]
async fn test_transient_upload_failures_are_retried() {
    let src = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("a.txt", b"alpha")]);

    // Two failures, three attempts: the upload lands on the last try.
    let store = Arc::new(FlakyObjectStore::failing_uploads(2));
    let engine = remote_engine(src.path(), store.clone(), quick_options());
    let report = engine.synchronize(&RelPath::root()).await.unwrap();

    assert_eq!(report.files_uploaded, 1);
    assert!(!report.has_failures());
    assert_eq!(store.inner().object("a.txt").unwrap(), b"alpha");
}

#[tokio::test]
async fn test_retry_exhaustion_records_failure_and_continues() {
    let src = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("a.txt", b"alpha"), ("b.txt", b"bravo")]);

    // Three failures eat all attempts for the first file; the second file
    // then uploads cleanly.
    let store = Arc::new(FlakyObjectStore::failing_uploads(3));
    let engine = remote_engine(src.path(), store.clone(), quick_options());
    let report = engine.synchronize(&RelPath::root()).await.unwrap();

    assert_eq!(report.files_uploaded, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "a.txt");
    assert_eq!(store.inner().object("b.txt").unwrap(), b"bravo");
}

#[tokio::test]
async fn test_permanent_failure_aborts_the_run() {
    let src = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("a.txt", b"alpha")]);

    let store = Arc::new(FlakyObjectStore::failing_uploads_permanently());
    let engine = remote_engine(src.path(), store, quick_options());
    let result = engine.synchronize(&RelPath::root()).await;

    assert!(result.unwrap_err().is_permanent());
}

#[tokio::test]
async fn test_remote_source_transfers_via_staging() {
    // Remote-to-local direction: the engine has no local source path and
    // must stage the bytes before storing them.
    let store = Arc::new(mirrorsync_store::memory::InMemoryObjectStore::new());
    store.insert_object("docs~a.txt", b"remote bytes".to_vec());

    let dest = tempfile::tempdir().unwrap();
    let engine = mirrorsync_sync::SyncEngine::new(
        Arc::new(RemoteBackend::new(store)),
        Arc::new(mirrorsync_store::LocalBackend::new(dest.path())),
        quick_options(),
    );

    let report = engine
        .synchronize(&RelPath::new("docs").unwrap())
        .await
        .unwrap();
    assert_eq!(report.files_uploaded, 1);
    assert_eq!(
        std::fs::read(dest.path().join("docs/a.txt")).unwrap(),
        b"remote bytes"
    );
}
