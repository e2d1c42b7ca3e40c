use serde_json::Value;

use super::ApiClient;
use crate::api::types::{
    Ack, BatchResponse, EntityList, JobList, MetadataWorkList, PdfList, PhaseKind,
    ProcessingConfig, StartedJob,
};
use crate::error::ApiError;

impl ApiClient {
    pub async fn processing_config(&self) -> Result<ProcessingConfig, ApiError> {
        self.get_json("api/processing/config", &[]).await
    }

    pub async fn start_phase(&self, kind: PhaseKind, body: &Value) -> Result<StartedJob, ApiError> {
        let path = format!("api/processing/{}/start", kind.segment());
        self.post_json(&path, body).await
    }

    pub async fn load_metadata(
        &self,
        job_id: &str,
        scrape_run_path: &str,
    ) -> Result<MetadataWorkList, ApiError> {
        self.post_json(
            "api/processing/metadata/load",
            &serde_json::json!({ "jobId": job_id, "scrapeRunPath": scrape_run_path }),
        )
        .await
    }

    pub async fn list_pdfs(&self, job_id: &str, scrape_run_path: &str) -> Result<PdfList, ApiError> {
        self.get_json(
            "api/processing/pdf/list",
            &[
                ("jobId", job_id.to_string()),
                ("scrapeRunPath", scrape_run_path.to_string()),
            ],
        )
        .await
    }

    pub async fn list_entities(&self, job_id: &str, limit: usize) -> Result<EntityList, ApiError> {
        self.get_json(
            "api/processing/embeddings/entities",
            &[("jobId", job_id.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    pub async fn submit_batch(&self, kind: PhaseKind, body: &Value) -> Result<BatchResponse, ApiError> {
        let path = format!("api/processing/{}/batch", kind.segment());
        self.post_json(&path, body).await
    }

    pub async fn sync_catalog(&self, job_id: Option<&str>) -> Result<Ack, ApiError> {
        self.post_json(
            "api/processing/metadata/sync-catalog",
            &serde_json::json!({ "jobId": job_id }),
        )
        .await
    }

    pub async fn processing_jobs(&self) -> Result<JobList, ApiError> {
        self.get_json("api/processing/jobs", &[]).await
    }

    pub async fn cancel_processing_job(&self, job_id: &str) -> Result<Ack, ApiError> {
        let url = self.url_with_tail("api/processing/jobs", job_id)?;
        self.delete_at(url).await
    }
}
