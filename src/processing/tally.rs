//! Client-side aggregation of batch outcomes.

use std::collections::VecDeque;
use std::fmt;

use crate::api::{ItemReport, PhaseKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemDetail {
    Entities(u64),
    Chunks(u64),
    Dimensions(u64),
    Error(String),
}

impl fmt::Display for ItemDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemDetail::Entities(n) => write!(f, "{n} entities"),
            ItemDetail::Chunks(n) => write!(f, "{n} chunks"),
            ItemDetail::Dimensions(n) => write!(f, "{n} dimensions"),
            ItemDetail::Error(message) => f.write_str(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub name: String,
    pub success: bool,
    pub detail: ItemDetail,
}

impl BatchResult {
    pub fn from_report(kind: PhaseKind, report: ItemReport) -> Self {
        let detail = if report.success {
            match kind {
                PhaseKind::Metadata => ItemDetail::Entities(report.entities.unwrap_or_default()),
                PhaseKind::Pdf => ItemDetail::Chunks(report.chunks.unwrap_or_default()),
                PhaseKind::Embeddings => {
                    ItemDetail::Dimensions(report.dimensions.unwrap_or_default())
                }
            }
        } else {
            ItemDetail::Error(report.error.unwrap_or_else(|| "unknown error".into()))
        };
        Self {
            name: report.name,
            success: report.success,
            detail,
        }
    }

    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            detail: ItemDetail::Error(message.into()),
        }
    }
}

/// Running counters of one phase. `processed + failed` never exceeds `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTally {
    pub processed: u64,
    pub failed: u64,
    pub total: u64,
}

impl PhaseTally {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn done(&self) -> u64 {
        self.processed + self.failed
    }

    pub fn remaining(&self) -> u64 {
        self.total - self.done()
    }

    /// Adds server-reported counts, clamped to what is still outstanding.
    pub fn record(&mut self, processed: u64, failed: u64) {
        let processed = processed.min(self.remaining());
        self.processed += processed;
        let failed = failed.min(self.remaining());
        self.failed += failed;
    }

    pub fn record_failures(&mut self, count: u64) {
        self.record(0, count);
    }

    pub fn percent(&self) -> u8 {
        super::phase::percent(self.done(), self.total)
    }

    pub fn is_complete(&self) -> bool {
        self.done() == self.total
    }
}

/// Most recent results, oldest dropped once `cap` is reached.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    cap: usize,
    entries: VecDeque<BatchResult>,
}

impl ResultsLog {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, result: BatchResult) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(result);
    }

    pub fn extend(&mut self, results: impl IntoIterator<Item = BatchResult>) {
        for result in results {
            self.push(result);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
