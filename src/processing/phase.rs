use serde_json::{json, Map, Value};

use super::ProcessingError;
use crate::api::PhaseKind;

/// Everything needed to run one phase end to end.
#[derive(Debug, Clone)]
pub struct PhaseRequest {
    pub kind: PhaseKind,
    /// Source folder (scrape run) for metadata and PDF phases.
    pub scope_path: String,
    pub batch_size: usize,
    /// Upper bound on entities requested for the embeddings phase.
    pub embeddings_limit: usize,
    /// Extra fields merged into the start payload.
    pub options: Map<String, Value>,
}

impl PhaseRequest {
    pub fn new(kind: PhaseKind, scope_path: impl Into<String>, batch_size: usize) -> Self {
        Self {
            kind,
            scope_path: scope_path.into(),
            batch_size,
            embeddings_limit: 100,
            options: Map::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: Value) -> Self {
        self.options.insert(key.to_string(), value);
        self
    }

    /// Client-side checks that must pass before any request is made.
    pub fn validate(&self) -> Result<(), ProcessingError> {
        if self.batch_size == 0 {
            return Err(ProcessingError::Validation(
                "Batch size must be at least 1".into(),
            ));
        }
        if self.kind.needs_scope() && self.scope_path.trim().is_empty() {
            return Err(ProcessingError::Validation(format!(
                "Select a source folder before starting the {} phase",
                self.kind
            )));
        }
        Ok(())
    }

    pub fn start_body(&self) -> Value {
        let mut body = self.options.clone();
        body.insert("batchSize".into(), json!(self.batch_size));
        if !self.scope_path.trim().is_empty() {
            body.insert("scrapeRunPath".into(), json!(self.scope_path));
        }
        Value::Object(body)
    }
}

/// Number of batch requests a work list of `items` produces.
pub fn batch_count(items: usize, batch_size: usize) -> usize {
    items.div_ceil(batch_size.max(1))
}

/// `round(done / total * 100)`; an empty phase counts as finished.
pub fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let ratio = done.min(total) as f64 / total as f64;
    (ratio * 100.0).round() as u8
}
