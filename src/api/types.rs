use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

/// One node of the folder hierarchy returned by the tree endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FolderNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type", default = "default_node_kind")]
    pub kind: NodeKind,
    #[serde(default)]
    pub children: Vec<FolderNode>,
    #[serde(default)]
    pub file_count: u64,
    #[serde(default)]
    pub total_size: u64,
}

fn default_node_kind() -> NodeKind {
    NodeKind::Folder
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreeStatistics {
    #[serde(default)]
    pub total_folders: u64,
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub total_size: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderTree {
    #[serde(default)]
    pub tree: Vec<FolderNode>,
    #[serde(default)]
    pub root_files: Vec<RemoteFile>,
    #[serde(default)]
    pub statistics: TreeStatistics,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TreeResponse {
    pub tree_structure: FolderTree,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFile {
    pub key: String,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub last_modified: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFolder {
    pub path: String,
    pub name: String,
}

/// Immediate children of one folder, as the contents endpoint reports them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderContents {
    #[serde(default)]
    pub folder_path: String,
    #[serde(default)]
    pub files: Vec<RemoteFile>,
    #[serde(default)]
    pub folders: Vec<RemoteFolder>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedDocument {
    pub key: String,
    pub filename: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderUploadSummary {
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub successful_files: u64,
    #[serde(default)]
    pub failed_files: u64,
    #[serde(default)]
    pub total_size_bytes: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderUploadReport {
    #[serde(default)]
    pub summary: FolderUploadSummary,
}

/// Plain acknowledgement carrying an optional human message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresignedUrl {
    pub url: String,
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingConfig {
    pub configured: bool,
    #[serde(default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Metadata,
    Pdf,
    Embeddings,
}

impl PhaseKind {
    pub const ALL: [PhaseKind; 3] = [PhaseKind::Metadata, PhaseKind::Pdf, PhaseKind::Embeddings];

    /// Path segment under `/api/processing/`.
    pub fn segment(self) -> &'static str {
        match self {
            PhaseKind::Metadata => "metadata",
            PhaseKind::Pdf => "pdf",
            PhaseKind::Embeddings => "embeddings",
        }
    }

    pub fn needs_scope(self) -> bool {
        matches!(self, PhaseKind::Metadata | PhaseKind::Pdf)
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PhaseKind::Metadata => "Metadata",
            PhaseKind::Pdf => "PDF",
            PhaseKind::Embeddings => "Embeddings",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_active(self) -> bool {
        matches!(
            self,
            JobStatus::Pending | JobStatus::Running | JobStatus::Processing
        )
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct JobProgress {
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub percentage: f64,
}

/// Server-owned job; the client only mirrors what it reports.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessingJob {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<PhaseKind>,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: JobProgress,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub phase: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<ProcessingJob>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedJob {
    pub job_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataWorkList {
    #[serde(default)]
    pub products: Vec<Value>,
    #[serde(default)]
    pub categories: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PdfEntry {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PdfList {
    #[serde(default)]
    pub pdfs: Vec<PdfEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing)]
    pub has_embedding: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityList {
    #[serde(default)]
    pub entities: Vec<Entity>,
}

/// Per-item line of a batch response.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemReport {
    pub name: String,
    pub success: bool,
    #[serde(default)]
    pub entities: Option<u64>,
    #[serde(default)]
    pub chunks: Option<u64>,
    #[serde(default)]
    pub dimensions: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub results: Vec<ItemReport>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshStatus {
    #[serde(default)]
    pub job: Option<ProcessingJob>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Free-form key/value payloads (stats, reset preview) rendered as a table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyValues {
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl KeyValues {
    /// Fields other than the envelope flags.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields
            .iter()
            .filter(|(k, _)| k.as_str() != "success" && k.as_str() != "error")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRun {
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeRuns {
    #[serde(default)]
    pub runs: Vec<ScrapeRun>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupList {
    #[serde(default)]
    pub backups: Vec<BackupInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_status_buckets() {
        for status in [JobStatus::Pending, JobStatus::Running, JobStatus::Processing] {
            assert!(status.is_active());
        }
        for status in [JobStatus::Completed, JobStatus::Failed, JobStatus::Cancelled] {
            assert!(status.is_terminal());
        }
    }

    #[test]
    fn refresh_status_tolerates_missing_job() {
        let status: RefreshStatus =
            serde_json::from_value(json!({ "success": true, "job": null })).unwrap();
        assert!(status.job.is_none());

        let status: RefreshStatus = serde_json::from_value(json!({
            "success": true,
            "job": {
                "id": "j1",
                "type": "pdf",
                "status": "processing",
                "progress": { "processed": 3, "total": 10, "percentage": 30.0 }
            }
        }))
        .unwrap();
        let job = status.job.unwrap();
        assert_eq!(job.kind, Some(PhaseKind::Pdf));
        assert_eq!(job.progress.processed, 3);
    }

    #[test]
    fn key_values_hide_envelope_flags() {
        let kv: KeyValues =
            serde_json::from_value(json!({ "success": true, "products": 12, "chunks": 40 }))
                .unwrap();
        let keys: Vec<_> = kv.entries().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["chunks", "products"]);
    }
}
