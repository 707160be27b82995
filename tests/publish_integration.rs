use spaces_publish::config::{PublishConfig, StorageConfig};
use spaces_publish::contract::{MockObjectStore, UploadError};
use spaces_publish::publish::{publish, PublishError};
use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn config_for(source: &Path) -> PublishConfig {
    PublishConfig {
        source: source.to_path_buf(),
        out_dir: String::new(),
        versioning: "false".to_string(),
        upload_latest: false,
        cdn_domain: None,
        concurrency: 2,
        storage: StorageConfig {
            bucket: "assets".to_string(),
            region: "fra1".to_string(),
            access_key: "key".to_string(),
            secret_key: "secret".to_string(),
            permission: "public-read".to_string(),
        },
    }
}

/// Mock store that records every (path, key) it is asked to upload.
fn recording_store(calls: Arc<Mutex<Vec<(PathBuf, String)>>>) -> MockObjectStore {
    let mut store = MockObjectStore::new();
    store.expect_upload().returning(move |path, key| {
        calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), key.to_string()));
        Ok(())
    });
    store
}

#[tokio::test]
async fn directory_upload_uses_keys_relative_to_source() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("x");
    create_dir_all(&source).unwrap();
    write(source.join("y.txt"), "hello").unwrap();

    let calls = Arc::new(Mutex::new(Vec::new()));
    let store = recording_store(calls.clone());

    let report = publish(&config_for(&source), &store)
        .await
        .expect("publish should succeed");

    let calls = calls.lock().unwrap();
    assert_eq!(*calls, vec![(source.join("y.txt"), "y.txt".to_string())]);
    assert_eq!(report.uploaded, 1);
    assert_eq!(report.keys, vec!["y.txt"]);
    assert_eq!(report.output_url, "https://assets.fra1.digitaloceanspaces.com/");
}

#[tokio::test]
async fn nested_directory_with_version_and_latest_mirror() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("dist");
    create_dir_all(source.join("js")).unwrap();
    write(source.join("index.html"), "<html/>").unwrap();
    write(source.join("js/app.js"), "console.log(1)").unwrap();

    let mut config = config_for(&source);
    config.out_dir = "site".to_string();
    config.versioning = "v1.4.0".to_string();
    config.upload_latest = true;
    config.cdn_domain = Some("cdn.example.com".to_string());

    let calls = Arc::new(Mutex::new(Vec::new()));
    let store = recording_store(calls.clone());

    let report = publish(&config, &store).await.expect("publish should succeed");

    let mut keys: Vec<String> = calls.lock().unwrap().iter().map(|(_, k)| k.clone()).collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "latest/site/index.html",
            "latest/site/js/app.js",
            "v1.4.0/site/index.html",
            "v1.4.0/site/js/app.js",
        ]
    );
    assert_eq!(report.uploaded, 4);
    assert_eq!(
        report.keys,
        vec![
            "v1.4.0/site/index.html",
            "latest/site/index.html",
            "v1.4.0/site/js/app.js",
            "latest/site/js/app.js",
        ]
    );
    assert_eq!(report.output_url, "https://cdn.example.com/v1.4.0/site");
}

#[tokio::test]
async fn single_file_versioned_from_manifest() {
    let tmp = tempdir().unwrap();
    let manifest = tmp.path().join("package.json");
    write(&manifest, r#"{"name": "widget", "version": "2.5.0"}"#).unwrap();
    let file = tmp.path().join("widget.min.js");
    write(&file, "/* widget */").unwrap();

    let mut config = config_for(&file);
    config.out_dir = "widget".to_string();
    config.versioning = manifest.to_string_lossy().into_owned();
    config.upload_latest = true;

    let calls = Arc::new(Mutex::new(Vec::new()));
    let store = recording_store(calls.clone());

    let report = publish(&config, &store).await.expect("publish should succeed");

    assert_eq!(
        report.keys,
        vec!["v2.5.0/widget/widget.min.js", "latest/widget/widget.min.js"]
    );
    assert!(calls.lock().unwrap().iter().all(|(path, _)| path == &file));
    assert_eq!(
        report.output_url,
        "https://assets.fra1.digitaloceanspaces.com/v2.5.0/widget"
    );
}

#[tokio::test]
async fn unreadable_manifest_publishes_without_version_prefix() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("a.txt");
    write(&file, "a").unwrap();

    let mut config = config_for(&file);
    config.versioning = tmp
        .path()
        .join("missing/package.json")
        .to_string_lossy()
        .into_owned();

    let calls = Arc::new(Mutex::new(Vec::new()));
    let store = recording_store(calls.clone());

    let report = publish(&config, &store).await.expect("publish should succeed");
    assert_eq!(report.keys, vec!["a.txt"]);
}

#[tokio::test]
async fn one_failed_upload_fails_the_run_after_all_uploads_ran() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().to_path_buf();
    for name in ["a.txt", "b.txt", "c.txt", "d.txt"] {
        write(source.join(name), name).unwrap();
    }

    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = calls.clone();
    let mut store = MockObjectStore::new();
    store.expect_upload().times(4).returning(move |_path, key| {
        recorded.lock().unwrap().push(key.to_string());
        if key == "b.txt" {
            Err(UploadError::storage(key, "AccessDenied"))
        } else {
            Ok(())
        }
    });

    let err = publish(&config_for(&source), &store)
        .await
        .expect_err("a failed upload must fail the run");

    assert_eq!(calls.lock().unwrap().len(), 4, "every upload should be attempted");
    match err {
        PublishError::Upload {
            failed,
            total,
            first,
        } => {
            assert_eq!(failed, 1);
            assert_eq!(total, 4);
            assert_eq!(first.to_string(), "failed to upload b.txt: AccessDenied");
        }
        other => panic!("expected an upload failure, got {other:?}"),
    }
}

#[tokio::test]
async fn first_failure_is_reported_by_task_position() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().to_path_buf();
    for name in ["a.txt", "b.txt", "c.txt"] {
        write(source.join(name), name).unwrap();
    }

    let mut store = MockObjectStore::new();
    store.expect_upload().times(3).returning(|_path, key| {
        if key == "a.txt" {
            Ok(())
        } else {
            Err(UploadError::storage(key, "SlowDown"))
        }
    });

    let err = publish(&config_for(&source), &store).await.unwrap_err();
    match err {
        PublishError::Upload { failed, first, .. } => {
            assert_eq!(failed, 2);
            assert!(first.to_string().contains("b.txt"), "got {first}");
        }
        other => panic!("expected an upload failure, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_source_aborts_before_any_upload() {
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("not-built-yet");

    let mut store = MockObjectStore::new();
    store.expect_upload().times(0);

    let err = publish(&config_for(&missing), &store).await.unwrap_err();
    assert!(
        matches!(err, PublishError::Source { ref path, .. } if path == &missing),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn empty_directory_uploads_nothing() {
    let tmp = tempdir().unwrap();

    let mut store = MockObjectStore::new();
    store.expect_upload().times(0);

    let report = publish(&config_for(tmp.path()), &store)
        .await
        .expect("empty directory is not an error");
    assert_eq!(report.uploaded, 0);
    assert!(report.keys.is_empty());
}
