//! Admin panel state: system health, database stats, the S3 refresh job,
//! database reset, and backups.

use serde_json::Value;
use thiserror::Error;

use crate::api::{
    ApiClient, BackupInfo, KeyValues, ProcessingJob, ScrapeRun, RESET_CONFIRMATION,
};
use crate::error::ApiError;
use crate::processing::{JobPoller, PollTimer};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AdminError {
    pub fn user_message(&self) -> String {
        match self {
            AdminError::Validation(message) => message.clone(),
            AdminError::Api(err) => err.user_message(),
        }
    }
}

#[derive(Debug)]
pub struct AdminState<T: PollTimer> {
    pub health: Option<KeyValues>,
    pub stats: Option<KeyValues>,
    pub scrape_runs: Vec<ScrapeRun>,
    pub selected_run: Option<String>,
    pub backups: Vec<BackupInfo>,
    pub reset_preview: Option<KeyValues>,
    /// What the user typed into the reset confirmation box.
    pub reset_confirmation: String,
    pub refresh: JobPoller<T>,
    pub processing_jobs: Vec<ProcessingJob>,
}

impl<T: PollTimer> Default for AdminState<T> {
    fn default() -> Self {
        Self {
            health: None,
            stats: None,
            scrape_runs: Vec::new(),
            selected_run: None,
            backups: Vec::new(),
            reset_preview: None,
            reset_confirmation: String::new(),
            refresh: JobPoller::new(),
            processing_jobs: Vec::new(),
        }
    }
}

impl<T: PollTimer> AdminState<T> {
    /// Reset may only run after a preview was shown and the confirmation
    /// word typed exactly.
    pub fn reset_armed(&self) -> bool {
        self.reset_preview.is_some() && self.reset_confirmation.trim() == RESET_CONFIRMATION
    }

    pub fn disarm_reset(&mut self) {
        self.reset_preview = None;
        self.reset_confirmation.clear();
    }
}

/// Runs the reset only when `typed` matches the confirmation word.
pub async fn execute_reset(api: &ApiClient, typed: &str) -> Result<KeyValues, AdminError> {
    if typed.trim() != RESET_CONFIRMATION {
        return Err(AdminError::Validation(format!(
            "Type {RESET_CONFIRMATION} to confirm the reset"
        )));
    }
    Ok(api.reset_databases().await?)
}

/// Compact rendering of a stats value for a two-column table.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".into(),
        Value::Array(items) => format!("{} item(s)", items.len()),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", display_value(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
