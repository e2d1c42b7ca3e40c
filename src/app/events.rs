use crate::api::{
    Ack, BackupList, FolderContents, FolderTree, FolderUploadReport, HealthStatus, JobList,
    KeyValues, RefreshStatus, ScrapeRuns,
};
use crate::browser::BulkReport;
use crate::processing::PhaseSummary;
use crate::upload::UploadSummary;

/// Errors cross the channel as banner-ready strings.
pub type Outcome<T> = Result<T, String>;

/// Completion of a background task, delivered to the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    Health(Outcome<HealthStatus>),
    StorageHealth(Outcome<HealthStatus>),
    TreeLoaded(Outcome<FolderTree>),
    ContentsLoaded {
        folder: String,
        result: Outcome<FolderContents>,
    },
    UploadFinished {
        summary: UploadSummary,
        contents: Outcome<FolderContents>,
    },
    FolderUploadFinished(Outcome<(usize, FolderUploadReport)>),
    FolderCreated(Outcome<String>),
    FolderDeleted(Outcome<String>),
    /// Delete, move or download over the selection.
    BulkFinished(Outcome<BulkReport>),
    ProcessingConfigured(Outcome<bool>),
    PhaseFinished(Outcome<PhaseSummary>),
    CatalogSynced(Outcome<Ack>),
    ProcessingJobs(Outcome<JobList>),
    ProcessingJobCancelled(Outcome<String>),
    PollTick,
    RefreshStarted(Outcome<String>),
    /// Status reply tagged with the poll session that requested it.
    RefreshStatus {
        generation: u64,
        result: Outcome<RefreshStatus>,
    },
    RefreshCancelled {
        generation: u64,
        result: Outcome<()>,
    },
    AdminHealth(Outcome<KeyValues>),
    Stats(Outcome<KeyValues>),
    ScrapeRuns(Outcome<ScrapeRuns>),
    ResetPreview(Outcome<KeyValues>),
    ResetDone(Outcome<KeyValues>),
    Backups(Outcome<BackupList>),
    BackupDone(Outcome<Ack>),
}

/// Follow-up work a state transition asks the shell to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadTree,
    LoadContents(String),
    LoadStats,
    LoadBackups,
    LoadProcessingJobs,
    /// Install a fresh poll timer, watching the given job when known.
    StartPolling(Option<String>),
    PollRefreshStatus(u64),
}
