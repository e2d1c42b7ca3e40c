#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// Emitted before the request for this file is sent.
    Started { index: usize, total: usize },
    Success,
    Error(String),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub name: String,
    pub status: UploadStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub total: usize,
    pub uploaded: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub skipped: Vec<(String, String)>,
}

impl UploadSummary {
    pub fn message(&self) -> String {
        let mut message = format!("Uploaded {} file(s)", self.uploaded.len());
        if !self.failed.is_empty() {
            message.push_str(&format!(", {} failed", self.failed.len()));
        }
        if !self.skipped.is_empty() {
            message.push_str(&format!(", {} skipped", self.skipped.len()));
        }
        message
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
