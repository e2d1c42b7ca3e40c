//! Multi-file upload into a folder: sequential requests, one failing file,
//! a single listing reload at the end and the resulting banner.

use std::fs;
use std::sync::mpsc;

use serde_json::json;
use tempfile::TempDir;
use wiremock::{
    matchers::{body_string_contains, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use agar_manager::api::ApiClient;
use agar_manager::app::{AppEvent, AppState, BannerKind, ProcessingPanel};
use agar_manager::processing::IntervalTimer;
use agar_manager::upload::{FileStatus, TransferController, UploadStatus};

fn write_files(dir: &TempDir, names: &[&str]) -> Vec<std::path::PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            fs::write(&path, format!("content of {name}")).unwrap();
            path
        })
        .collect()
}

#[tokio::test]
async fn upload_continues_past_failure_and_reloads_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/s3/documents"))
        .and(body_string_contains("filename=\"b.pdf\""))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "error": "S3 write failed",
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/s3/documents"))
        .and(body_string_contains("docs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "key": "docs/uploaded.pdf",
            "filename": "uploaded.pdf",
            "size": 14,
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/s3/folder/contents"))
        .and(query_param("folder_path", "docs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "folder_path": "docs/",
            "files": [
                { "key": "docs/a.pdf", "filename": "a.pdf", "size": 14 },
                { "key": "docs/c.pdf", "filename": "c.pdf", "size": 14 },
            ],
            "folders": [],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let files = write_files(&dir, &["a.pdf", "b.pdf", "c.pdf", "photo.png"]);

    let api = ApiClient::new(&server.uri()).unwrap();
    let controller = TransferController::new(api, "docs/".to_string());
    let (tx, rx) = mpsc::channel();
    let (summary, contents) = controller.upload_then_reload(&files, &tx).await;

    assert_eq!(summary.uploaded, vec!["a.pdf", "c.pdf"]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "b.pdf");
    assert_eq!(summary.failed[0].1, "S3 write failed");
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.message(), "Uploaded 2 file(s), 1 failed, 1 skipped");

    let statuses: Vec<FileStatus> = rx.try_iter().collect();
    let started: Vec<usize> = statuses
        .iter()
        .filter_map(|s| match s.status {
            UploadStatus::Started { index, .. } => Some(index),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![1, 2, 3]);
    assert!(matches!(
        statuses.last().map(|s| &s.status),
        Some(UploadStatus::Skipped(_))
    ));

    let mut state: AppState<IntervalTimer> = AppState::new(20, ProcessingPanel::new(10, 100, 100));
    state.navigate("docs/");
    state.browser.selection.toggle("docs/old.pdf");
    state.apply(AppEvent::UploadFinished {
        summary,
        contents: contents.map_err(|e| e.user_message()),
    });

    let banner = state.banner.expect("banner after upload");
    assert_eq!(banner.kind, BannerKind::Success);
    assert!(banner.text.contains("Uploaded 2 file(s)"));
    assert!(state.browser.selection.is_empty());
    assert_eq!(state.browser.listing.filtered_count(), 2);
}

#[tokio::test]
async fn folder_upload_sends_relative_paths_in_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/s3/upload/folder"))
        .and(body_string_contains("manuals/guides/intro.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "summary": {
                "total_files": 2,
                "successful_files": 1,
                "failed_files": 1,
                "total_size_bytes": 20,
            },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let root = dir.path().join("manuals");
    fs::create_dir_all(root.join("guides")).unwrap();
    fs::write(root.join("guides/intro.pdf"), "pdf").unwrap();
    fs::write(root.join("index.md"), "# manuals").unwrap();

    let api = ApiClient::new(&server.uri()).unwrap();
    let controller = TransferController::new(api, "docs/".to_string());
    let (sent, report) = controller.upload_folder(&root, None).await.unwrap();

    assert_eq!(sent, 2);
    assert_eq!(report.summary.successful_files, 1);
    assert_eq!(report.summary.failed_files, 1);
}
