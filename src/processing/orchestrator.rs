//! Runs one processing phase: start the remote job, fetch its work list, then
//! submit the list in fixed-size batches, one request at a time.

use std::sync::mpsc::Sender;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::phase::{batch_count, PhaseRequest};
use super::tally::{BatchResult, PhaseTally};
use super::ProcessingError;
use crate::api::{ApiClient, Entity, PdfEntry, PhaseKind};
use crate::error::ApiError;

/// Results shown per embeddings batch; the rest are only counted.
pub const EMBEDDING_RESULTS_SHOWN: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum PhaseEvent {
    Started {
        kind: PhaseKind,
        job_id: String,
        total: u64,
        batches: usize,
    },
    /// Emitted after every batch and after every failed PDF fetch.
    Progress {
        kind: PhaseKind,
        tally: PhaseTally,
        batch: usize,
    },
    Results(Vec<BatchResult>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSummary {
    pub kind: PhaseKind,
    pub job_id: String,
    pub tally: PhaseTally,
    pub batches_submitted: usize,
}

impl PhaseSummary {
    pub fn message(&self) -> String {
        let mut message = format!(
            "{} phase complete: {} processed",
            self.kind, self.tally.processed
        );
        if self.tally.failed > 0 {
            message.push_str(&format!(", {} failed", self.tally.failed));
        }
        message
    }
}

pub async fn run_phase(
    api: &ApiClient,
    request: &PhaseRequest,
    events: &Sender<PhaseEvent>,
) -> Result<PhaseSummary, ProcessingError> {
    request.validate()?;

    let config = api.processing_config().await?;
    if !config.configured {
        return Err(ProcessingError::NotConfigured);
    }

    let started = api.start_phase(request.kind, &request.start_body()).await?;
    let job_id = started.job_id;
    info!(phase = %request.kind, job_id = %job_id, "phase job started");

    let mut run = BatchLoop {
        api,
        kind: request.kind,
        job_id: &job_id,
        tally: PhaseTally::default(),
        batches_submitted: 0,
        batch_index: 0,
        events,
    };

    match request.kind {
        PhaseKind::Metadata => {
            let work = api.load_metadata(&job_id, &request.scope_path).await?;
            run.begin(work.products.len(), request.batch_size);
            let categories = Value::Array(work.categories);
            for chunk in work.products.chunks(request.batch_size) {
                let body = json!({
                    "jobId": job_id,
                    "products": chunk,
                    "categories": categories,
                });
                run.submit(body, chunk.len(), None).await;
            }
        }
        PhaseKind::Pdf => {
            let work = api.list_pdfs(&job_id, &request.scope_path).await?;
            run.begin(work.pdfs.len(), request.batch_size);
            for chunk in work.pdfs.chunks(request.batch_size) {
                run.submit_pdf_chunk(chunk).await;
            }
        }
        PhaseKind::Embeddings => {
            let work = api.list_entities(&job_id, request.embeddings_limit).await?;
            let pending: Vec<Entity> = work
                .entities
                .into_iter()
                .filter(|e| !e.has_embedding)
                .collect();
            run.begin(pending.len(), request.batch_size);
            for chunk in pending.chunks(request.batch_size) {
                let body = json!({ "jobId": job_id, "entities": chunk });
                run.submit(body, chunk.len(), Some(EMBEDDING_RESULTS_SHOWN))
                    .await;
            }
        }
    }

    let summary = PhaseSummary {
        kind: request.kind,
        job_id: job_id.clone(),
        tally: run.tally,
        batches_submitted: run.batches_submitted,
    };
    info!(
        phase = %summary.kind,
        processed = summary.tally.processed,
        failed = summary.tally.failed,
        total = summary.tally.total,
        "phase finished"
    );
    Ok(summary)
}

struct BatchLoop<'a> {
    api: &'a ApiClient,
    kind: PhaseKind,
    job_id: &'a str,
    tally: PhaseTally,
    batches_submitted: usize,
    batch_index: usize,
    events: &'a Sender<PhaseEvent>,
}

impl BatchLoop<'_> {
    fn begin(&mut self, total: usize, batch_size: usize) {
        self.tally = PhaseTally::new(total as u64);
        let batches = batch_count(total, batch_size);
        info!(phase = %self.kind, total, batches, "work list loaded");
        self.emit(PhaseEvent::Started {
            kind: self.kind,
            job_id: self.job_id.to_string(),
            total: total as u64,
            batches,
        });
        if total == 0 {
            self.progress();
        }
    }

    fn emit(&self, event: PhaseEvent) {
        self.events.send(event).unwrap_or_default();
    }

    fn progress(&self) {
        self.emit(PhaseEvent::Progress {
            kind: self.kind,
            tally: self.tally,
            batch: self.batch_index,
        });
    }

    /// Posts one batch. A failed request marks the whole batch as failed and
    /// the caller carries on with the next one.
    async fn submit(&mut self, body: Value, items: usize, shown: Option<usize>) {
        self.batch_index += 1;
        self.batches_submitted += 1;
        match self.api.submit_batch(self.kind, &body).await {
            Ok(response) => {
                self.tally.record(response.processed, response.failed);
                let limit = shown.unwrap_or(usize::MAX);
                let results: Vec<BatchResult> = response
                    .results
                    .into_iter()
                    .take(limit)
                    .map(|report| BatchResult::from_report(self.kind, report))
                    .collect();
                if !results.is_empty() {
                    self.emit(PhaseEvent::Results(results));
                }
            }
            Err(err) => {
                warn!(
                    phase = %self.kind,
                    batch = self.batch_index,
                    error = %err,
                    "batch request failed"
                );
                self.tally.record_failures(items as u64);
                self.emit(PhaseEvent::Results(vec![BatchResult::failed(
                    format!("Batch {}", self.batch_index),
                    err.user_message(),
                )]));
            }
        }
        self.progress();
    }

    /// Inlines each PDF's bytes before submitting. Items whose download
    /// fails are counted as failed and left out of the batch; a batch with
    /// nothing left is not sent.
    async fn submit_pdf_chunk(&mut self, chunk: &[PdfEntry]) {
        let mut payload = Vec::with_capacity(chunk.len());
        for entry in chunk {
            match self.fetch_pdf(entry).await {
                Ok(content) => payload.push(json!({
                    "key": entry.key,
                    "name": entry.name,
                    "content": content,
                })),
                Err(err) => {
                    warn!(key = %entry.key, error = %err, "pdf download failed");
                    self.tally.record_failures(1);
                    self.emit(PhaseEvent::Results(vec![BatchResult::failed(
                        entry.name.clone(),
                        err.user_message(),
                    )]));
                    self.progress();
                }
            }
        }
        if payload.is_empty() {
            self.batch_index += 1;
            return;
        }
        let items = payload.len();
        let body = json!({ "jobId": self.job_id, "pdfs": payload });
        self.submit(body, items, None).await;
    }

    async fn fetch_pdf(&self, entry: &PdfEntry) -> Result<String, ApiError> {
        let link = self.api.presigned_url(&entry.key, None).await?;
        let bytes = self.api.fetch_bytes(&link.url).await?;
        Ok(BASE64.encode(bytes))
    }
}
