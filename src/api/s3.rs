use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use serde_json::json;

use super::{cache_buster, ApiClient, Envelope};
use crate::api::types::{
    Ack, FolderContents, FolderTree, FolderUploadReport, HealthStatus, PresignedUrl,
    TreeResponse, UploadedDocument,
};
use crate::error::ApiError;

/// A local file queued for a folder upload, with its path relative to the
/// picked folder root (slash-separated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub relative_path: String,
}

impl ApiClient {
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json("health", &[]).await
    }

    pub async fn storage_health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json("api/health/s3", &[]).await
    }

    pub async fn folder_tree(&self) -> Result<FolderTree, ApiError> {
        let response: TreeResponse = self
            .get_json("api/s3/structure/tree", &[("_", cache_buster())])
            .await?;
        Ok(response.tree_structure)
    }

    pub async fn folder_contents(&self, folder_path: &str) -> Result<FolderContents, ApiError> {
        self.get_json(
            "api/s3/folder/contents",
            &[("folder_path", folder_path.to_string())],
        )
        .await
    }

    pub async fn upload_document(
        &self,
        folder_path: &str,
        file: &Path,
    ) -> Result<UploadedDocument, ApiError> {
        let part = file_part(file).await?;
        let form = Form::new()
            .part("file", part)
            .text("folder_path", folder_path.to_string());
        self.post_multipart("api/s3/documents", form, Envelope::Strict)
            .await
    }

    /// One request carrying every file; the server rebuilds the hierarchy
    /// from the `relative_paths` fields, which follow the `files` order.
    pub async fn upload_folder(
        &self,
        folder_path: &str,
        files: &[LocalFile],
    ) -> Result<FolderUploadReport, ApiError> {
        let mut form = Form::new().text("folder_path", folder_path.to_string());
        for file in files {
            form = form
                .part("files", file_part(&file.path).await?)
                .text("relative_paths", file.relative_path.clone());
        }
        self.post_multipart("api/s3/upload/folder", form, Envelope::StatusOnly)
            .await
    }

    pub async fn delete_document(&self, key: &str) -> Result<Ack, ApiError> {
        let url = self.url_with_tail("api/s3/documents", key)?;
        self.delete_at(url).await
    }

    pub async fn create_folder(&self, folder_path: &str) -> Result<Ack, ApiError> {
        self.post_json("api/s3/folders", &json!({ "folder_path": folder_path }))
            .await
    }

    pub async fn delete_folder(&self, folder_path: &str) -> Result<Ack, ApiError> {
        let url = self.url_with_tail("api/s3/folders", folder_path)?;
        self.delete_at(url).await
    }

    pub async fn move_document(&self, source_key: &str, destination_key: &str) -> Result<Ack, ApiError> {
        self.post_json(
            "api/s3/move",
            &json!({ "source_key": source_key, "destination_key": destination_key }),
        )
        .await
    }

    pub async fn presigned_url(
        &self,
        key: &str,
        expiration_secs: Option<u64>,
    ) -> Result<PresignedUrl, ApiError> {
        let mut query = vec![("key", key.to_string())];
        if let Some(secs) = expiration_secs {
            query.push(("expiration", secs.to_string()));
        }
        self.get_json("api/s3/download", &query).await
    }
}

async fn file_part(path: &Path) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(Part::bytes(bytes).file_name(file_name))
}
