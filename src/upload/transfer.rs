use crate::api::{ApiClient, FolderContents, FolderUploadReport, LocalFile};
use crate::error::ApiError;
use crate::upload::types::{FileStatus, UploadStatus, UploadSummary};
use glob::Pattern;
use ignore::Walk;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tracing::{info, warn};

/// Extensions the document API accepts.
const SUPPORTED_EXTENSIONS: [&str; 8] = ["pdf", "docx", "doc", "txt", "md", "json", "zip", "csv"];

#[derive(Clone)]
pub struct TransferController {
    api: ApiClient,
    folder_path: String,
}

impl TransferController {
    pub fn new(api: ApiClient, folder_path: String) -> Self {
        Self { api, folder_path }
    }

    /// Uploads `files` one after another. A failed file is reported and the
    /// loop moves on.
    pub async fn upload_files(
        &self,
        files: &[PathBuf],
        status_sender: &Sender<FileStatus>,
    ) -> UploadSummary {
        let total = files.len();
        let mut summary = UploadSummary {
            total,
            ..UploadSummary::default()
        };

        for (index, file_path) in files.iter().enumerate() {
            let file_name = file_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();

            if !Self::is_supported_file(file_path) {
                let reason = "File type not allowed".to_string();
                status_sender
                    .send(FileStatus {
                        name: file_name.clone(),
                        status: UploadStatus::Skipped(reason.clone()),
                    })
                    .unwrap_or_default();
                summary.skipped.push((file_name, reason));
                continue;
            }

            status_sender
                .send(FileStatus {
                    name: file_name.clone(),
                    status: UploadStatus::Started {
                        index: index + 1,
                        total,
                    },
                })
                .unwrap_or_default();

            match self.api.upload_document(&self.folder_path, file_path).await {
                Ok(document) => {
                    info!(key = %document.key, size = document.size, "uploaded");
                    status_sender
                        .send(FileStatus {
                            name: file_name.clone(),
                            status: UploadStatus::Success,
                        })
                        .unwrap_or_default();
                    summary.uploaded.push(file_name);
                }
                Err(err) => {
                    warn!(file = %file_name, error = %err, "upload failed");
                    let message = err.user_message();
                    status_sender
                        .send(FileStatus {
                            name: file_name.clone(),
                            status: UploadStatus::Error(message.clone()),
                        })
                        .unwrap_or_default();
                    summary.failed.push((file_name, message));
                }
            }
        }

        summary
    }

    /// Runs [`Self::upload_files`] and then refreshes the target folder once.
    pub async fn upload_then_reload(
        &self,
        files: &[PathBuf],
        status_sender: &Sender<FileStatus>,
    ) -> (UploadSummary, Result<FolderContents, ApiError>) {
        let summary = self.upload_files(files, status_sender).await;
        let contents = self.api.folder_contents(&self.folder_path).await;
        (summary, contents)
    }

    /// Every supported file under `root` (honouring ignore files), with its
    /// slash-separated path relative to `root`. When `include` is given only
    /// relative paths matching it are kept.
    pub fn collect_folder(root: &Path, include: Option<&Pattern>) -> Vec<LocalFile> {
        let mut files = Vec::new();
        for entry in Walk::new(root).flatten() {
            let path = entry.path();
            if !path.is_file() || !Self::is_supported_file(path) {
                continue;
            }
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let relative_path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if let Some(pattern) = include {
                if !pattern.matches(&relative_path) {
                    continue;
                }
            }
            files.push(LocalFile {
                path: path.to_path_buf(),
                relative_path,
            });
        }
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        files
    }

    /// Sends the whole folder in a single request. Relative paths are
    /// prefixed with the picked folder's own name so the server recreates it.
    pub async fn upload_folder(
        &self,
        root: &Path,
        include: Option<&Pattern>,
    ) -> Result<(usize, FolderUploadReport), ApiError> {
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut files = Self::collect_folder(root, include);
        if !root_name.is_empty() {
            for file in &mut files {
                file.relative_path = format!("{}/{}", root_name, file.relative_path);
            }
        }
        info!(count = files.len(), folder = %self.folder_path, "uploading folder");
        let report = self.api.upload_folder(&self.folder_path, &files).await?;
        Ok((files.len(), report))
    }

    fn is_supported_file(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn supported_extensions_are_case_insensitive() {
        assert!(TransferController::is_supported_file(Path::new("a/Report.PDF")));
        assert!(TransferController::is_supported_file(Path::new("notes.md")));
        assert!(!TransferController::is_supported_file(Path::new("photo.png")));
        assert!(!TransferController::is_supported_file(Path::new("Makefile")));
    }

    #[test]
    fn collect_folder_keeps_relative_paths_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("manuals/2024")).unwrap();
        fs::write(root.join("readme.md"), "hi").unwrap();
        fs::write(root.join("manuals/guide.pdf"), "pdf").unwrap();
        fs::write(root.join("manuals/2024/sheet.pdf"), "pdf").unwrap();
        fs::write(root.join("manuals/image.png"), "png").unwrap();

        let all = TransferController::collect_folder(root, None);
        let paths: Vec<_> = all.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["manuals/2024/sheet.pdf", "manuals/guide.pdf", "readme.md"]
        );

        let pattern = Pattern::new("**/*.pdf").unwrap();
        let pdfs = TransferController::collect_folder(root, Some(&pattern));
        assert_eq!(pdfs.len(), 2);
    }
}
