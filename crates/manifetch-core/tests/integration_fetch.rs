//! End-to-end runs of the manifest processor against a local HTTP server
//! and the local filesystem.

mod common;

use manifetch_core::scheduler::{ManifestError, ManifestProcessor};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use common::http_server::{self, Route};

fn write(path: &Path, text: &str) {
    std::fs::write(path, text).unwrap();
}

#[tokio::test]
async fn fetches_http_and_local_sources() {
    let base = http_server::start(vec![
        ("/data/report.txt", Route::ok("remote body")),
        (
            "/download?id=7",
            Route::ok("named by header").with_header("Content-Disposition: attachment; filename=\"release.tar.gz\""),
        ),
    ]);
    let dir = tempfile::tempdir().unwrap();
    let local_src = dir.path().join("local.txt");
    write(&local_src, "local body");
    let out = dir.path().join("out");
    std::fs::create_dir(&out).unwrap();

    let manifest = dir.path().join("mixed.manifest.yaml");
    write(
        &manifest,
        &format!(
            "version: 1\nname: mixed\nconfig:\n  parallelism: 2\n  timeout: 10s\nsources:\n\
             \x20\x20- url: {base}/data/report.txt\n    dest: {out}/nested/report.txt\n\
             \x20\x20- url: {base}/download?id=7\n    dest: {out}\n\
             \x20\x20- url: file://{local}\n    dest: {out}/copy.txt\n",
            base = base,
            out = out.display(),
            local = local_src.display(),
        ),
    );

    let processor = ManifestProcessor::new(&[dir.path()]).unwrap();
    assert_eq!(processor.manifests(), &[manifest]);
    processor.process(&CancellationToken::new()).await.unwrap();

    assert_eq!(std::fs::read_to_string(out.join("nested/report.txt")).unwrap(), "remote body");
    assert_eq!(std::fs::read_to_string(out.join("release.tar.gz")).unwrap(), "named by header");
    assert_eq!(std::fs::read_to_string(out.join("copy.txt")).unwrap(), "local body");
    assert!(!out.join("nested/report.txt.part").exists());
}

#[tokio::test]
async fn http_error_is_retried_then_reported() {
    let base = http_server::start(vec![("/ok.bin", Route::ok("fine"))]);
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("errs.manifest.yaml");
    write(
        &manifest,
        &format!(
            "version: 1\nname: errs\nconfig:\n  retries: 2\nsources:\n\
             \x20\x20- url: {base}/ok.bin\n    dest: {dir}/ok.bin\n\
             \x20\x20- url: {base}/missing.bin\n    dest: {dir}/missing.bin\n",
            base = base,
            dir = dir.path().display(),
        ),
    );

    let err = ManifestProcessor::new(&[&manifest])
        .unwrap()
        .with_backoff_unit(Duration::from_millis(5))
        .process(&CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(std::fs::read_to_string(dir.path().join("ok.bin")).unwrap(), "fine");
    assert!(!dir.path().join("missing.bin").exists());
    assert!(!dir.path().join("missing.bin.part").exists());

    let msg = err.to_string();
    assert!(
        msg.contains(&format!("{}/missing.bin: failed after 2 retries: GET", base)),
        "{}",
        msg
    );
    assert!(msg.contains("returned HTTP 404"), "{}", msg);
    match &err.failures[0].error {
        ManifestError::Sources { failures } => assert_eq!(failures[0].index, 1),
        other => panic!("expected Sources, got {:?}", other),
    }
}

#[tokio::test]
async fn slow_server_hits_attempt_deadline() {
    let base = http_server::start(vec![(
        "/slow",
        Route::ok("late").with_delay(Duration::from_secs(3)),
    )]);
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("slow.manifest.yaml");
    write(
        &manifest,
        &format!(
            "version: 1\nname: slow\nconfig:\n  retries: 1\nsources:\n\
             \x20\x20- url: {base}/slow\n    dest: {dir}/slow.bin\n    timeout: 300ms\n",
            base = base,
            dir = dir.path().display(),
        ),
    );

    let started = Instant::now();
    let err = ManifestProcessor::new(&[&manifest])
        .unwrap()
        .with_backoff_unit(Duration::from_millis(5))
        .process(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(3), "{:?}", started.elapsed());
    assert!(err.to_string().contains("exceeded the 300ms deadline"), "{}", err);
    assert!(!dir.path().join("slow.bin").exists());
}

#[tokio::test]
async fn empty_directory_argument_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = ManifestProcessor::new(&[dir.path()]).err().unwrap();
    assert!(err.to_string().contains(&dir.path().display().to_string()), "{}", err);
}
