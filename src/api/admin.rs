use serde_json::json;

use super::{ApiClient, Envelope};
use crate::api::types::{
    Ack, BackupList, KeyValues, RefreshStatus, ScrapeRuns, StartedJob,
};
use crate::error::ApiError;

/// Value the admin API expects in `x-admin-confirm` before it wipes data.
pub const RESET_CONFIRMATION: &str = "RESET";

impl ApiClient {
    pub async fn admin_health(&self) -> Result<KeyValues, ApiError> {
        self.get_json("api/admin/health", &[]).await
    }

    pub async fn admin_stats(&self) -> Result<KeyValues, ApiError> {
        self.get_json("api/admin/stats", &[]).await
    }

    pub async fn scrape_runs(&self) -> Result<ScrapeRuns, ApiError> {
        self.get_json("api/admin/s3/scrape-runs", &[]).await
    }

    pub async fn reset_preview(&self) -> Result<KeyValues, ApiError> {
        self.get_json("api/admin/reset/preview", &[]).await
    }

    pub async fn reset_databases(&self) -> Result<KeyValues, ApiError> {
        let url = self.url("api/admin/reset")?;
        let response = self
            .http
            .post(url)
            .header("x-admin-confirm", RESET_CONFIRMATION)
            .send()
            .await?;
        Self::read_envelope(response, Envelope::Strict).await
    }

    pub async fn start_refresh(&self, scrape_run_path: Option<&str>) -> Result<StartedJob, ApiError> {
        self.post_json("api/admin/refresh", &json!({ "scrapeRunPath": scrape_run_path }))
            .await
    }

    pub async fn refresh_status(&self) -> Result<RefreshStatus, ApiError> {
        self.get_json("api/admin/refresh/status", &[]).await
    }

    pub async fn cancel_refresh(&self, job_id: &str) -> Result<Ack, ApiError> {
        let url = self.url_with_tail("api/admin/refresh/jobs", job_id)?;
        self.delete_at(url).await
    }

    pub async fn create_backup(&self, label: Option<&str>) -> Result<Ack, ApiError> {
        self.post_json("api/admin/backup", &json!({ "label": label }))
            .await
    }

    pub async fn list_backups(&self) -> Result<BackupList, ApiError> {
        self.get_json("api/admin/backup/list", &[]).await
    }

    pub async fn restore_backup(&self, backup_id: &str) -> Result<Ack, ApiError> {
        self.post_json("api/admin/backup/restore", &json!({ "backupId": backup_id }))
            .await
    }
}
