//! Integration tests: validate → schedule → retry → report, against an
//! in-memory store and a local HTTP PUT server.

mod common;

use common::mock_store::{Behavior, MockStore};
use common::put_server::{self, ServerMode};
use osup_core::config::HttpConfig;
use osup_core::retry::{ErrorCategory, RetryPolicy, TransferError};
use osup_core::source::{collect_upload_items, UploadItem};
use osup_core::store::{self, ObjectStore};
use osup_core::upload::{upload_all, UploadOptions};
use osup_core::validate::{validate_files, ValidationConfig, ValidationErrorKind};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

fn items_for(dir: &std::path::Path, count: usize) -> Vec<UploadItem> {
    for i in 0..count {
        common::write_file(dir, &format!("file-{:02}.txt", i), 64);
    }
    collect_upload_items(dir, "batch").unwrap()
}

#[tokio::test(start_paused = true)]
async fn ten_files_all_succeed_with_ordered_progress() {
    let dir = tempdir().unwrap();
    let items = items_for(dir.path(), 10);
    let store = Arc::new(MockStore::new(Behavior::Succeed, Duration::from_millis(20)));

    let progress = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&progress);
    let options = UploadOptions {
        concurrency: 5,
        ..UploadOptions::default()
    };
    let report = upload_all(Arc::clone(&store), items, options, move |done, total, r| {
        assert!(r.is_success());
        sink.lock().unwrap().push((done, total));
    })
    .await;

    assert_eq!(report.total(), 10);
    assert_eq!(report.succeeded(), 10);
    assert!(report.is_success());
    assert_eq!(store.calls(), 10);
    assert!(store.max_in_flight() <= 5);

    let progress = progress.lock().unwrap().clone();
    let expected: Vec<_> = (1..=10).map(|d| (d, 10)).collect();
    assert_eq!(progress, expected);

    for (item, receipt) in report.successes() {
        assert_eq!(receipt.key, item.key);
        assert!(receipt.key.starts_with("batch/file-"));
    }
}

#[tokio::test(start_paused = true)]
async fn network_failure_is_attempted_six_times() {
    let dir = tempdir().unwrap();
    let items = items_for(dir.path(), 1);
    let err = TransferError::new("getaddrinfo ENOTFOUND bucket.example.com").with_code("ENOTFOUND");
    let store = Arc::new(MockStore::new(
        Behavior::AlwaysFail(err.clone()),
        Duration::from_millis(1),
    ));

    let report = upload_all(
        Arc::clone(&store),
        items,
        UploadOptions::default(),
        |_, _, _| {},
    )
    .await;

    assert_eq!(store.calls(), 6);
    assert_eq!(report.failed(), 1);
    let groups = report.failure_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].classification.category, ErrorCategory::Network);
    assert_eq!(groups[0].files[0].message, err.message);
}

#[tokio::test]
async fn oversize_files_are_never_scheduled() {
    let dir = tempdir().unwrap();
    let paths = vec![
        common::write_file(dir.path(), "a.bin", 100),
        common::write_file(dir.path(), "b.bin", 5000),
        common::write_file(dir.path(), "c.bin", 100),
        common::write_file(dir.path(), "d.bin", 9000),
        common::write_file(dir.path(), "e.bin", 100),
    ];
    let summary = validate_files(&paths, &ValidationConfig::new(1024));
    assert_eq!(summary.invalid_count(), 2);
    assert_eq!(summary.valid_count(), 3);
    assert!(summary
        .invalid
        .iter()
        .all(|f| f.kind == ValidationErrorKind::SizeExceeded));

    let items: Vec<_> = summary
        .valid
        .iter()
        .map(|f| UploadItem {
            local_path: f.path.clone(),
            key: f.path.file_name().unwrap().to_string_lossy().into_owned(),
        })
        .collect();
    let store = Arc::new(MockStore::new(Behavior::Succeed, Duration::ZERO));
    let report = upload_all(Arc::clone(&store), items, UploadOptions::default(), |_, _, _| {}).await;

    assert_eq!(store.calls(), 3);
    assert_eq!(report.succeeded(), 3);
    let mut keys = store.keys();
    keys.sort();
    assert_eq!(keys, vec!["a.bin", "c.bin", "e.bin"]);
}

#[tokio::test(start_paused = true)]
async fn one_failing_file_does_not_stop_siblings() {
    let dir = tempdir().unwrap();
    let items = items_for(dir.path(), 6);
    let store = Arc::new(MockStore::new(
        Behavior::FailMatching(
            "file-03".to_string(),
            TransferError::new("HTTP 404: NoSuchKey")
                .with_status(404)
                .with_code("NoSuchKey"),
        ),
        Duration::from_millis(5),
    ));

    let report = upload_all(Arc::clone(&store), items, UploadOptions::default(), |_, _, _| {}).await;

    assert_eq!(report.succeeded(), 5);
    assert_eq!(report.failed(), 1);
    // Missing object is classified as a file error: no retries.
    assert_eq!(store.calls(), 6);
    assert!(report.results[3].error().is_some());
    let groups = report.failure_groups();
    assert_eq!(groups[0].classification.category, ErrorCategory::File);
    assert_eq!(groups[0].files[0].key, "batch/file-03.txt");
}

#[tokio::test]
async fn http_store_uploads_bodies() {
    let (endpoint, objects) = put_server::start(ServerMode::Accept);
    let dir = tempdir().unwrap();
    common::write_file(dir.path(), "docs/readme.txt", 300);
    common::write_file(dir.path(), "img/logo one.png", 700);
    let items = collect_upload_items(dir.path(), "site").unwrap();

    let store = store::open(&endpoint, Some("secret".to_string()), &HttpConfig::default()).unwrap();
    store.check_reachable().await.unwrap();
    let report = upload_all(store, items, UploadOptions::default(), |_, _, _| {}).await;

    assert!(report.is_success(), "{:?}", report.failure_groups());
    let objects = objects.lock().unwrap();
    let readme = objects.get("/bucket/site/docs/readme.txt").expect("readme uploaded");
    assert_eq!(readme.len(), 300);
    assert_eq!(
        readme,
        &std::fs::read(dir.path().join("docs/readme.txt")).unwrap()
    );
    let logo = objects.get("/bucket/site/img/logo%20one.png").expect("logo uploaded");
    assert_eq!(logo.len(), 700);
}

#[tokio::test]
async fn http_store_missing_bucket_is_storage_service() {
    let (endpoint, _objects) = put_server::start(ServerMode::Reject {
        status: 404,
        code: "NoSuchBucket",
    });
    let dir = tempdir().unwrap();
    let items = items_for(dir.path(), 2);
    let store = store::open(&endpoint, None, &HttpConfig::default()).unwrap();

    let probe = store.check_reachable().await.unwrap_err();
    assert_eq!(probe.code.as_deref(), Some("NoSuchBucket"));

    let options = UploadOptions {
        concurrency: 2,
        retry: RetryPolicy::from_millis(0, 0, 0),
        adaptive: false,
    };
    let report = upload_all(store, items, options, |_, _, _| {}).await;
    assert_eq!(report.failed(), 2);
    let groups = report.failure_groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].classification.category,
        ErrorCategory::StorageService
    );
    assert_eq!(groups[0].files[0].message, "HTTP 404: NoSuchBucket");
}

#[tokio::test]
async fn http_store_unreachable_host_is_network() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let endpoint = format!("http://127.0.0.1:{}/bucket", port);
    let store = store::open(&endpoint, None, &HttpConfig::default()).unwrap();
    let err = store.check_reachable().await.unwrap_err();
    assert_eq!(err.code.as_deref(), Some("ECONNREFUSED"));
    assert_eq!(
        osup_core::retry::classify_category(&err),
        ErrorCategory::Network
    );
}

#[tokio::test(start_paused = true)]
async fn vanished_file_named_like_a_timeout_fails_without_backoff() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let endpoint = url::Url::from_directory_path(dst.path()).unwrap();
    let store = store::open(endpoint.as_str(), None, &HttpConfig::default()).unwrap();
    let items = vec![UploadItem {
        local_path: src.path().join("timeout-report.csv"),
        key: "reports/timeout-report.csv".to_string(),
    }];

    let started = tokio::time::Instant::now();
    let report = upload_all(store, items, UploadOptions::default(), |_, _, _| {}).await;

    assert_eq!(report.failed(), 1);
    let groups = report.failure_groups();
    assert_eq!(groups[0].classification.category, ErrorCategory::File);
    assert!(groups[0].files[0].message.contains("timeout-report.csv"));
    // File errors are never retried, so no backoff timer ran.
    assert!(started.elapsed() < Duration::from_secs(1));
}
