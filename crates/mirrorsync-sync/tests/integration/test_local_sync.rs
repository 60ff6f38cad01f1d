//! Local-to-local synchronization: full copies, idempotence, mismatch
//! overwrite, budget halt, and skip rules.

use mirrorsync_core::domain::manifest::{Manifest, MANIFEST_NAME};
use mirrorsync_core::domain::newtypes::RelPath;

use crate::common::{local_engine, quick_options, write_tree};

fn rel(path: &str) -> RelPath {
    RelPath::new(path).unwrap()
}

#[tokio::test]
async fn test_full_copy_of_nested_tree() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    write_tree(
        src.path(),
        &[
            ("a.txt", b"alpha"),
            ("docs/b.txt", b"bravo"),
            ("docs/deep/c.txt", b"charlie"),
        ],
    );

    let engine = local_engine(src.path(), dest.path(), quick_options());
    let report = engine.synchronize(&RelPath::root()).await.unwrap();

    assert_eq!(report.files_uploaded, 3);
    assert_eq!(report.files_skipped, 0);
    assert!(!report.has_failures());
    assert!(!report.budget_exhausted);
    assert_eq!(
        report.bytes_uploaded,
        ("alpha".len() + "bravo".len() + "charlie".len()) as u64
    );

    assert_eq!(std::fs::read(dest.path().join("a.txt")).unwrap(), b"alpha");
    assert_eq!(
        std::fs::read(dest.path().join("docs/deep/c.txt")).unwrap(),
        b"charlie"
    );

    // Each destination directory carries a manifest keyed by full
    // relative paths.
    let root_manifest = Manifest::parse(
        &std::fs::read_to_string(dest.path().join(MANIFEST_NAME)).unwrap(),
    )
    .unwrap();
    assert!(root_manifest.contains(&rel("a.txt")));

    let docs_manifest = Manifest::parse(
        &std::fs::read_to_string(dest.path().join("docs").join(MANIFEST_NAME)).unwrap(),
    )
    .unwrap();
    assert!(docs_manifest.contains(&rel("docs/b.txt")));
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("a.txt", b"alpha"), ("docs/b.txt", b"bravo")]);

    let engine = local_engine(src.path(), dest.path(), quick_options());
    engine.synchronize(&RelPath::root()).await.unwrap();

    let report = engine.synchronize(&RelPath::root()).await.unwrap();
    assert_eq!(report.files_uploaded, 0);
    assert_eq!(report.files_skipped, 2);
    assert_eq!(report.bytes_uploaded, 0);
    assert_eq!(report.mismatches, 0);
}

#[tokio::test]
async fn test_mismatch_is_reported_and_overwritten() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("a.txt", b"new content")]);
    write_tree(dest.path(), &[("a.txt", b"stale content")]);

    let engine = local_engine(src.path(), dest.path(), quick_options());
    let report = engine.synchronize(&RelPath::root()).await.unwrap();

    assert_eq!(report.mismatches, 1);
    assert_eq!(report.files_uploaded, 1);
    assert_eq!(
        std::fs::read(dest.path().join("a.txt")).unwrap(),
        b"new content"
    );
}

#[tokio::test]
async fn test_verification_disabled_skips_existing_files() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("a.txt", b"new content"), ("b.txt", b"fresh")]);
    write_tree(dest.path(), &[("a.txt", b"stale content")]);

    let mut options = quick_options();
    options.verify_checksums = false;
    let engine = local_engine(src.path(), dest.path(), options);
    let report = engine.synchronize(&RelPath::root()).await.unwrap();

    // Present stays untouched, absent is still transferred.
    assert_eq!(report.files_skipped, 1);
    assert_eq!(report.files_uploaded, 1);
    assert_eq!(
        std::fs::read(dest.path().join("a.txt")).unwrap(),
        b"stale content"
    );
    assert_eq!(std::fs::read(dest.path().join("b.txt")).unwrap(), b"fresh");
}

#[tokio::test]
async fn test_budget_halts_walk_gracefully() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    // Three 100-byte files against a 150-byte budget: the walk stops
    // after the transfer that pushes past the ceiling.
    write_tree(
        src.path(),
        &[
            ("a.bin", &[1u8; 100]),
            ("b.bin", &[2u8; 100]),
            ("c.bin", &[3u8; 100]),
        ],
    );

    let mut options = quick_options();
    options.budget = Some(150);
    let engine = local_engine(src.path(), dest.path(), options);
    let report = engine.synchronize(&RelPath::root()).await.unwrap();

    assert!(report.budget_exhausted);
    assert_eq!(report.files_uploaded, 2);
    assert_eq!(report.bytes_uploaded, 200);
    assert!(!report.has_failures());

    // The manifest covers what was actually transferred.
    let manifest = Manifest::parse(
        &std::fs::read_to_string(dest.path().join(MANIFEST_NAME)).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest.len(), 2);
}

#[tokio::test]
async fn test_budget_exactly_met_does_not_halt() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    write_tree(src.path(), &[("a.bin", &[1u8; 100]), ("b.bin", &[2u8; 100])]);

    let mut options = quick_options();
    options.budget = Some(200);
    let engine = local_engine(src.path(), dest.path(), options);
    let report = engine.synchronize(&RelPath::root()).await.unwrap();

    // 200 bytes uploaded against a 200-byte ceiling: not exceeded.
    assert!(!report.budget_exhausted);
    assert_eq!(report.files_uploaded, 2);
}

#[tokio::test]
async fn test_bookkeeping_names_and_symlinks_are_skipped() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    write_tree(
        src.path(),
        &[
            ("real.txt", b"data"),
            ("old.txt.sha512", b"deadbeef"),
            ("notes.txt~", b"backup"),
        ],
    );
    std::fs::write(src.path().join(MANIFEST_NAME), b"{}\n").unwrap();
    #[cfg(unix)]
    std::os::unix::fs::symlink(src.path().join("real.txt"), src.path().join("link.txt")).unwrap();

    let engine = local_engine(src.path(), dest.path(), quick_options());
    let report = engine.synchronize(&RelPath::root()).await.unwrap();

    assert_eq!(report.files_uploaded, 1);
    assert!(dest.path().join("real.txt").exists());
    assert!(!dest.path().join("old.txt.sha512").exists());
    assert!(!dest.path().join("notes.txt~").exists());
    assert!(!dest.path().join("link.txt").exists());
}

#[tokio::test]
async fn test_subtree_sync_only_touches_subtree() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    write_tree(
        src.path(),
        &[("top.txt", b"top"), ("docs/inner.txt", b"inner")],
    );

    let engine = local_engine(src.path(), dest.path(), quick_options());
    let report = engine.synchronize(&rel("docs")).await.unwrap();

    assert_eq!(report.files_uploaded, 1);
    assert!(dest.path().join("docs/inner.txt").exists());
    assert!(!dest.path().join("top.txt").exists());
}

#[tokio::test]
async fn test_empty_source_directory() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();

    let engine = local_engine(src.path(), dest.path(), quick_options());
    let report = engine.synchronize(&RelPath::root()).await.unwrap();

    assert_eq!(report.files_considered, 0);
    assert_eq!(report.files_uploaded, 0);
    // Nothing recorded, so no manifest is materialized.
    assert!(!dest.path().join(MANIFEST_NAME).exists());
}
