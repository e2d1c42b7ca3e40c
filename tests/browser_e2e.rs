//! Storage browser actions against a mocked document API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, method, path, query_param},
    Mock, MockServer, Request, ResponseTemplate,
};

use agar_manager::api::ApiClient;
use agar_manager::browser::actions::{self, BrowserError};
use agar_manager::browser::BrowserState;

#[tokio::test]
async fn tree_and_contents_feed_browser_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/s3/structure/tree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "tree_structure": {
                "tree": [{
                    "name": "docs",
                    "path": "docs/",
                    "type": "folder",
                    "file_count": 2,
                    "children": [{ "name": "sds", "path": "docs/sds/", "type": "folder" }],
                }],
                "root_files": [],
                "statistics": { "total_folders": 2, "total_files": 2, "total_size": 2048 },
            },
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/s3/folder/contents"))
        .and(query_param("folder_path", "docs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "folder_path": "docs/",
            "files": [
                { "key": "docs/label.pdf", "filename": "label.pdf", "size": 1024, "last_modified": "2024-05-01T08:00:00Z" },
                { "key": "docs/sds.pdf", "filename": "sds.pdf", "size": 1024, "last_modified": "2024-05-02T08:00:00Z" },
            ],
            "folders": [{ "path": "docs/sds/", "name": "sds" }],
        })))
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let mut browser = BrowserState::new(20);
    browser.apply_tree(api.folder_tree().await.unwrap());
    assert_eq!(browser.statistics.total_files, 2);

    browser.navigate("docs/");
    browser.apply_contents(api.folder_contents("docs/").await.unwrap());

    let lines = browser.tree_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].selected);
    assert_eq!(lines[1].depth, 1);

    let names: Vec<_> = browser
        .listing
        .entries()
        .iter()
        .map(|e| e.filename.as_str())
        .collect();
    assert_eq!(names, vec!["sds", "label.pdf", "sds.pdf"]);

    browser.toggle_collapsed("docs/");
    assert_eq!(browser.tree_lines().len(), 1);
}

#[tokio::test]
async fn bulk_delete_reports_each_key() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/s3/documents/docs/My%20Report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "message": "Document deleted" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/s3/documents/docs/gone.pdf"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "error": { "code": "NOT_FOUND", "message": "Document not found" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let keys = vec!["docs/My Report.pdf".to_string(), "docs/gone.pdf".to_string()];
    let report = actions::delete_files(&api, &keys).await.unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(
        report.failures,
        vec![("docs/gone.pdf".to_string(), "Document not found".to_string())]
    );
    assert_eq!(report.message(), "Deleted 1 file(s), 1 failed");
}

#[tokio::test]
async fn move_keeps_file_names_under_destination() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/s3/move"))
        .and(body_partial_json(json!({
            "source_key": "docs/a.pdf",
            "destination_key": "archive/2023/a.pdf",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/s3/move"))
        .and(body_partial_json(json!({
            "source_key": "docs/b.pdf",
            "destination_key": "archive/2023/b.pdf",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let keys = vec!["docs/a.pdf".to_string(), "docs/b.pdf".to_string()];
    let report = actions::move_files(&api, &keys, "archive/2023").await.unwrap();
    assert_eq!(report.message(), "Moved 2 file(s)");
}

#[tokio::test]
async fn success_false_with_ok_status_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/s3/folders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Folder already exists",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let err = actions::create_folder(&api, "docs/", "sds").await.unwrap_err();
    assert!(matches!(err, BrowserError::Api(_)));
    assert_eq!(err.user_message(), "Folder already exists");
}

#[tokio::test]
async fn download_opens_one_presigned_link_per_key() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    Mock::given(method("GET"))
        .and(path("/api/s3/download"))
        .and(query_param("expiration", "600"))
        .respond_with(move |request: &Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            let key = request
                .url
                .query_pairs()
                .find(|(k, _)| k == "key")
                .map(|(_, v)| v.to_string())
                .unwrap_or_default();
            ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "url": format!("https://bucket.example/{key}?sig=abc"),
                "key": key,
            }))
        })
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let keys = vec!["docs/a.pdf".to_string(), "docs/b.pdf".to_string()];
    let mut opened = Vec::new();
    let report = actions::download_files(&api, &keys, Some(600), |url| {
        opened.push(url.to_string());
        Ok(())
    })
    .await
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(
        opened,
        vec![
            "https://bucket.example/docs/a.pdf?sig=abc",
            "https://bucket.example/docs/b.pdf?sig=abc",
        ]
    );
}

#[tokio::test]
async fn empty_selection_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = ApiClient::new(&server.uri()).unwrap();
    let err = actions::delete_files(&api, &[]).await.unwrap_err();
    assert!(matches!(err, BrowserError::Validation(_)));
    let err = actions::delete_folder(&api, "/").await.unwrap_err();
    assert!(matches!(err, BrowserError::Validation(_)));
}
