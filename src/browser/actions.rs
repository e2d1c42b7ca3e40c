//! File and folder actions. Each one validates its input before touching the
//! network, then walks its items one request at a time.

use thiserror::Error;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl BrowserError {
    pub fn user_message(&self) -> String {
        match self {
            BrowserError::Validation(message) => message.clone(),
            BrowserError::Api(err) => err.user_message(),
        }
    }
}

/// Outcome of a sequential multi-item action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub verb: &'static str,
    pub succeeded: usize,
    pub failures: Vec<(String, String)>,
}

impl BulkReport {
    fn new(verb: &'static str) -> Self {
        Self {
            verb,
            ..Self::default()
        }
    }

    fn record(&mut self, key: &str, result: Result<(), ApiError>) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(err) => {
                warn!(key, error = %err, "{} failed", self.verb);
                self.failures.push((key.to_string(), err.user_message()));
            }
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn message(&self) -> String {
        if self.failures.is_empty() {
            format!("{} {} file(s)", self.verb, self.succeeded)
        } else {
            format!(
                "{} {} file(s), {} failed",
                self.verb,
                self.succeeded,
                self.failures.len()
            )
        }
    }
}

/// Full key of a new folder `name` under `parent`, with trailing slash.
pub fn child_folder_path(parent: &str, name: &str) -> Result<String, BrowserError> {
    let name = name.trim().trim_matches('/');
    if name.is_empty() {
        return Err(BrowserError::Validation("Folder name cannot be empty".into()));
    }
    if name.contains('/') {
        return Err(BrowserError::Validation(
            "Folder name cannot contain '/'".into(),
        ));
    }
    Ok(format!("{}{}/", folder_prefix(parent), name))
}

/// `parent` as a key prefix: empty for the root, otherwise slash-terminated.
pub fn folder_prefix(parent: &str) -> String {
    let parent = parent.trim_matches('/');
    if parent.is_empty() {
        String::new()
    } else {
        format!("{parent}/")
    }
}

fn require_selection(keys: &[String]) -> Result<(), BrowserError> {
    if keys.is_empty() {
        return Err(BrowserError::Validation("No files selected".into()));
    }
    Ok(())
}

pub async fn create_folder(api: &ApiClient, parent: &str, name: &str) -> Result<String, BrowserError> {
    let path = child_folder_path(parent, name)?;
    api.create_folder(&path).await?;
    info!(folder = %path, "folder created");
    Ok(path)
}

pub async fn delete_folder(api: &ApiClient, folder_path: &str) -> Result<(), BrowserError> {
    if folder_path.trim_matches('/').is_empty() {
        return Err(BrowserError::Validation("Cannot delete the root folder".into()));
    }
    api.delete_folder(folder_path).await?;
    info!(folder = %folder_path, "folder deleted");
    Ok(())
}

pub async fn delete_files(api: &ApiClient, keys: &[String]) -> Result<BulkReport, BrowserError> {
    require_selection(keys)?;
    let mut report = BulkReport::new("Deleted");
    for key in keys {
        let result = api.delete_document(key).await.map(|_| ());
        report.record(key, result);
    }
    Ok(report)
}

/// Moves each key into `destination_folder`, keeping its file name.
pub async fn move_files(
    api: &ApiClient,
    keys: &[String],
    destination_folder: &str,
) -> Result<BulkReport, BrowserError> {
    require_selection(keys)?;
    if destination_folder.trim().is_empty() {
        return Err(BrowserError::Validation(
            "No destination folder selected".into(),
        ));
    }
    let prefix = folder_prefix(destination_folder);
    let mut report = BulkReport::new("Moved");
    for key in keys {
        let file_name = key.rsplit('/').next().unwrap_or(key);
        let destination = format!("{prefix}{file_name}");
        let result = api.move_document(key, &destination).await.map(|_| ());
        report.record(key, result);
    }
    Ok(report)
}

/// Resolves a presigned URL per key and hands it to `open_url`.
pub async fn download_files<F>(
    api: &ApiClient,
    keys: &[String],
    expiration_secs: Option<u64>,
    mut open_url: F,
) -> Result<BulkReport, BrowserError>
where
    F: FnMut(&str) -> std::io::Result<()>,
{
    require_selection(keys)?;
    let mut report = BulkReport::new("Downloaded");
    for key in keys {
        let result = match api.presigned_url(key, expiration_secs).await {
            Ok(link) => open_url(&link.url).map_err(|source| ApiError::Io {
                path: key.into(),
                source,
            }),
            Err(err) => Err(err),
        };
        report.record(key, result);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_folder_paths() {
        assert_eq!(child_folder_path("", "docs").unwrap(), "docs/");
        assert_eq!(child_folder_path("docs/", " manuals ").unwrap(), "docs/manuals/");
        assert_eq!(child_folder_path("docs", "sds/").unwrap(), "docs/sds/");
        assert!(matches!(
            child_folder_path("docs/", "   "),
            Err(BrowserError::Validation(_))
        ));
        assert!(matches!(
            child_folder_path("docs/", "a/b"),
            Err(BrowserError::Validation(_))
        ));
    }

    #[test]
    fn report_message_mentions_failures() {
        let mut report = BulkReport::new("Deleted");
        report.record("a", Ok(()));
        report.record(
            "b",
            Err(ApiError::Application {
                status: 404,
                message: "Document not found".into(),
            }),
        );
        assert_eq!(report.message(), "Deleted 1 file(s), 1 failed");
        assert_eq!(report.failures[0].1, "Document not found");
    }

    #[tokio::test]
    async fn validation_happens_before_any_request() {
        // Port 9 (discard) is never contacted because validation fails first.
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        let err = delete_files(&api, &[]).await.unwrap_err();
        assert_eq!(err.user_message(), "No files selected");
        let err = move_files(&api, &["docs/a.pdf".into()], " ").await.unwrap_err();
        assert_eq!(err.user_message(), "No destination folder selected");
        let err = create_folder(&api, "docs/", "").await.unwrap_err();
        assert_eq!(err.user_message(), "Folder name cannot be empty");
    }
}
