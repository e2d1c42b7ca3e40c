//! Batch processing phases (metadata, PDF, embeddings) and the job poller.

pub mod orchestrator;
pub mod phase;
pub mod poller;
pub mod tally;

use thiserror::Error;

use crate::error::ApiError;

pub use orchestrator::{run_phase, PhaseEvent, PhaseSummary};
pub use phase::PhaseRequest;
pub use poller::{IntervalTimer, JobPoller, PollOutcome, PollTimer, PollerState};
pub use tally::{BatchResult, ItemDetail, PhaseTally, ResultsLog};

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("{0}")]
    Validation(String),
    #[error("processing API is not configured on the server")]
    NotConfigured,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ProcessingError {
    pub fn user_message(&self) -> String {
        match self {
            ProcessingError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
