use super::events::{AppEvent, Effect};
use crate::admin::AdminState;
use crate::api::{HealthStatus, PhaseKind};
use crate::browser::BrowserState;
use crate::processing::{PhaseEvent, PhaseSummary, PhaseTally, PollOutcome, PollTimer, ResultsLog};
use crate::upload::{FileStatus, UploadStatus};
use derivative::Derivative;
use std::sync::mpsc::Receiver;
use tracing::{info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ActionProgress {
    #[default]
    NotStarted,
    Uploading {
        total: usize,
        current: usize,
        successful: usize,
        failed: usize,
        skipped: usize,
    },
    Completed {
        total: usize,
        successful: usize,
        failed: usize,
        skipped: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

/// Phase panel state. `current_phase` is the only job-related value the
/// client owns; everything else mirrors what the orchestrator reports.
#[derive(Debug)]
pub struct ProcessingPanel {
    pub scope_path: String,
    pub batch_size: usize,
    pub embeddings_limit: usize,
    pub configured: Option<bool>,
    pub current_phase: Option<PhaseKind>,
    pub running: bool,
    pub job_id: Option<String>,
    pub tally: PhaseTally,
    pub batches: usize,
    pub results: ResultsLog,
    pub completed: Vec<PhaseSummary>,
}

impl ProcessingPanel {
    pub fn new(batch_size: usize, embeddings_limit: usize, log_cap: usize) -> Self {
        Self {
            scope_path: String::new(),
            batch_size,
            embeddings_limit,
            configured: None,
            current_phase: None,
            running: false,
            job_id: None,
            tally: PhaseTally::default(),
            batches: 0,
            results: ResultsLog::new(log_cap),
            completed: Vec::new(),
        }
    }

    pub fn is_complete(&self, kind: PhaseKind) -> bool {
        self.completed.iter().any(|s| s.kind == kind)
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct AppState<T: PollTimer> {
    pub browser: BrowserState,
    pub progress: ActionProgress,
    pub current_file: Option<String>,
    pub file_statuses: Vec<FileStatus>,
    pub banner: Option<Banner>,
    pub show_details: bool,
    pub is_uploading: bool,
    /// A delete, move, download or folder action is running.
    pub is_busy: bool,
    pub health: Option<Result<HealthStatus, String>>,
    pub storage_health: Option<Result<HealthStatus, String>>,
    pub processing: ProcessingPanel,
    pub admin: AdminState<T>,
    #[derivative(Debug = "ignore")]
    pub status_receiver: Option<Receiver<FileStatus>>,
    #[derivative(Debug = "ignore")]
    pub phase_receiver: Option<Receiver<PhaseEvent>>,
}

impl<T: PollTimer> AppState<T> {
    pub fn new(page_size: usize, processing: ProcessingPanel) -> Self {
        Self {
            browser: BrowserState::new(page_size),
            progress: ActionProgress::NotStarted,
            current_file: None,
            file_statuses: Vec::new(),
            banner: None,
            show_details: false,
            is_uploading: false,
            is_busy: false,
            health: None,
            storage_health: None,
            processing,
            admin: AdminState::default(),
            status_receiver: None,
            phase_receiver: None,
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.set_banner(BannerKind::Info, text);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.set_banner(BannerKind::Success, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        warn!(message = %text, "error banner");
        self.set_banner(BannerKind::Error, text);
    }

    fn set_banner(&mut self, kind: BannerKind, text: impl Into<String>) {
        self.banner = Some(Banner {
            kind,
            text: text.into(),
        });
    }

    pub fn navigate(&mut self, path: &str) -> Vec<Effect> {
        self.browser.navigate(path);
        vec![Effect::LoadContents(path.to_string())]
    }

    pub fn begin_upload(&mut self, total: usize, receiver: Receiver<FileStatus>) {
        self.is_uploading = true;
        self.file_statuses.clear();
        self.current_file = None;
        self.status_receiver = Some(receiver);
        self.progress = ActionProgress::Uploading {
            total,
            current: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
        };
    }

    pub fn apply_upload_status(&mut self, status: FileStatus) {
        if let ActionProgress::Uploading {
            current,
            successful,
            failed,
            skipped,
            ..
        } = &mut self.progress
        {
            match &status.status {
                UploadStatus::Started { index, .. } => *current = *index,
                UploadStatus::Success => *successful += 1,
                UploadStatus::Error(_) => *failed += 1,
                UploadStatus::Skipped(_) => *skipped += 1,
            }
        }
        self.current_file = Some(status.name.clone());
        if !matches!(status.status, UploadStatus::Started { .. }) {
            self.file_statuses.push(status);
        }
    }

    pub fn begin_phase(&mut self, kind: PhaseKind, receiver: Receiver<PhaseEvent>) {
        let panel = &mut self.processing;
        panel.current_phase = Some(kind);
        panel.running = true;
        panel.job_id = None;
        panel.tally = PhaseTally::default();
        panel.batches = 0;
        panel.results.clear();
        panel.completed.retain(|s| s.kind != kind);
        self.phase_receiver = Some(receiver);
        self.info(format!("Starting {kind} phase..."));
    }

    pub fn apply_phase_event(&mut self, event: PhaseEvent) {
        let panel = &mut self.processing;
        match event {
            PhaseEvent::Started {
                job_id,
                total,
                batches,
                ..
            } => {
                panel.job_id = Some(job_id);
                panel.tally = PhaseTally::new(total);
                panel.batches = batches;
            }
            PhaseEvent::Progress { tally, .. } => panel.tally = tally,
            PhaseEvent::Results(results) => panel.results.extend(results),
        }
    }

    /// Applies a finished background task and returns the follow-up work.
    pub fn apply(&mut self, event: AppEvent) -> Vec<Effect> {
        let current = self.browser.current_folder.clone();
        match event {
            AppEvent::Health(result) => {
                if let Err(err) = &result {
                    self.error(format!("API unreachable: {err}"));
                }
                self.health = Some(result);
                vec![]
            }
            AppEvent::StorageHealth(result) => {
                self.storage_health = Some(result);
                vec![]
            }
            AppEvent::TreeLoaded(Ok(tree)) => {
                self.browser.apply_tree(tree);
                vec![]
            }
            AppEvent::ContentsLoaded { folder, result } => {
                match result {
                    Ok(contents) if folder == current => self.browser.apply_contents(contents),
                    Ok(_) => {}
                    Err(err) => self.error(format!("Failed to load folder: {err}")),
                }
                vec![]
            }
            AppEvent::UploadFinished { summary, contents } => {
                self.is_uploading = false;
                self.status_receiver = None;
                self.progress = ActionProgress::Completed {
                    total: summary.total,
                    successful: summary.uploaded.len(),
                    failed: summary.failed.len(),
                    skipped: summary.skipped.len(),
                };
                if summary.uploaded.is_empty() && summary.has_failures() {
                    self.error(summary.message());
                } else {
                    self.success(summary.message());
                }
                self.browser.selection.clear();
                match contents {
                    Ok(contents) => self.browser.apply_contents(contents),
                    Err(err) => self.error(format!("Failed to reload folder: {err}")),
                }
                vec![Effect::LoadTree]
            }
            AppEvent::FolderUploadFinished(result) => {
                self.is_uploading = false;
                match result {
                    Ok((sent, report)) => {
                        let summary = report.summary;
                        let text = format!(
                            "Uploaded {} of {} file(s)",
                            summary.successful_files, sent
                        );
                        if summary.failed_files > 0 {
                            self.error(format!("{text}, {} failed", summary.failed_files));
                        } else {
                            self.success(text);
                        }
                    }
                    Err(err) => self.error(format!("Folder upload failed: {err}")),
                }
                vec![Effect::LoadTree, Effect::LoadContents(current)]
            }
            AppEvent::FolderCreated(result) => {
                self.is_busy = false;
                match result {
                    Ok(path) => {
                        self.success(format!("Created folder {path}"));
                        vec![Effect::LoadTree, Effect::LoadContents(current)]
                    }
                    Err(err) => {
                        self.error(err);
                        vec![]
                    }
                }
            }
            AppEvent::FolderDeleted(result) => {
                self.is_busy = false;
                match result {
                    Ok(path) => {
                        self.success(format!("Deleted folder {path}"));
                        if current.starts_with(&path) {
                            let mut effects = self.navigate("");
                            effects.insert(0, Effect::LoadTree);
                            effects
                        } else {
                            vec![Effect::LoadTree, Effect::LoadContents(current)]
                        }
                    }
                    Err(err) => {
                        self.error(err);
                        vec![]
                    }
                }
            }
            AppEvent::BulkFinished(result) => {
                self.is_busy = false;
                match result {
                    Ok(report) => {
                        if report.has_failures() {
                            self.error(report.message());
                        } else {
                            self.success(report.message());
                        }
                        self.browser.selection.clear();
                        if report.verb == "Downloaded" {
                            vec![]
                        } else {
                            vec![Effect::LoadTree, Effect::LoadContents(current)]
                        }
                    }
                    Err(err) => {
                        self.error(err);
                        vec![]
                    }
                }
            }
            AppEvent::ProcessingConfigured(result) => {
                match result {
                    Ok(configured) => self.processing.configured = Some(configured),
                    Err(err) => self.error(format!("Processing config check failed: {err}")),
                }
                vec![]
            }
            AppEvent::PhaseFinished(result) => {
                self.processing.running = false;
                self.phase_receiver = None;
                match result {
                    Ok(summary) => {
                        info!(phase = %summary.kind, "phase marked complete");
                        self.processing.tally = summary.tally;
                        if summary.tally.failed > 0 {
                            self.info(summary.message());
                        } else {
                            self.success(summary.message());
                        }
                        self.processing.completed.push(summary);
                    }
                    Err(err) => self.error(err),
                }
                vec![]
            }
            AppEvent::CatalogSynced(result) => {
                match result {
                    Ok(ack) => self.success(
                        ack.message
                            .unwrap_or_else(|| "Catalog sync complete".to_string()),
                    ),
                    Err(err) => self.error(format!("Catalog sync failed: {err}")),
                }
                vec![]
            }
            AppEvent::ProcessingJobs(result) => {
                match result {
                    Ok(list) => self.admin.processing_jobs = list.jobs,
                    Err(err) => self.error(format!("Failed to list jobs: {err}")),
                }
                vec![]
            }
            AppEvent::ProcessingJobCancelled(result) => {
                match result {
                    Ok(id) => {
                        self.success(format!("Cancelled job {id}"));
                        vec![Effect::LoadProcessingJobs]
                    }
                    Err(err) => {
                        self.error(format!("Cancel failed: {err}"));
                        vec![]
                    }
                }
            }
            AppEvent::PollTick => match self.admin.refresh.tick() {
                Some(generation) => vec![Effect::PollRefreshStatus(generation)],
                None => vec![],
            },
            AppEvent::RefreshStarted(result) => match result {
                Ok(job_id) => {
                    self.info(format!("Refresh job {job_id} started"));
                    vec![Effect::StartPolling(Some(job_id))]
                }
                Err(err) => {
                    self.error(format!("Failed to start refresh: {err}"));
                    vec![]
                }
            },
            AppEvent::RefreshStatus {
                generation,
                result: Ok(report),
            } => match self.admin.refresh.on_status(generation, report) {
                PollOutcome::Finished {
                    job: Some(job),
                    refresh_stats,
                    message,
                } => {
                    if job.status == crate::api::JobStatus::Failed {
                        self.error(message);
                    } else {
                        self.info(message);
                    }
                    if refresh_stats {
                        vec![Effect::LoadStats]
                    } else {
                        vec![]
                    }
                }
                PollOutcome::Finished { job: None, .. }
                | PollOutcome::Continue(_)
                | PollOutcome::Ignored => vec![],
            },
            AppEvent::RefreshStatus {
                generation,
                result: Err(err),
            } => {
                self.admin.refresh.on_poll_error(generation, &err);
                vec![]
            }
            AppEvent::RefreshCancelled { generation, result } => {
                let ok = result.is_ok();
                match self.admin.refresh.cancel_finished(generation, result) {
                    Some(message) if ok => self.info(message),
                    Some(message) => self.error(message),
                    None => {}
                }
                vec![]
            }
            AppEvent::AdminHealth(result) => {
                match result {
                    Ok(health) => self.admin.health = Some(health),
                    Err(err) => self.error(format!("Admin health check failed: {err}")),
                }
                vec![]
            }
            AppEvent::Stats(result) => {
                match result {
                    Ok(stats) => self.admin.stats = Some(stats),
                    Err(err) => self.error(format!("Failed to load stats: {err}")),
                }
                vec![]
            }
            AppEvent::ScrapeRuns(result) => {
                match result {
                    Ok(runs) => self.admin.scrape_runs = runs.runs,
                    Err(err) => self.error(format!("Failed to list scrape runs: {err}")),
                }
                vec![]
            }
            AppEvent::ResetPreview(result) => {
                match result {
                    Ok(preview) => self.admin.reset_preview = Some(preview),
                    Err(err) => self.error(format!("Reset preview failed: {err}")),
                }
                vec![]
            }
            AppEvent::ResetDone(result) => {
                self.admin.disarm_reset();
                match result {
                    Ok(_) => {
                        self.success("Databases reset");
                        vec![Effect::LoadStats]
                    }
                    Err(err) => {
                        self.error(format!("Reset failed: {err}"));
                        vec![]
                    }
                }
            }
            AppEvent::Backups(result) => {
                match result {
                    Ok(list) => self.admin.backups = list.backups,
                    Err(err) => self.error(format!("Failed to list backups: {err}")),
                }
                vec![]
            }
            AppEvent::BackupDone(result) => match result {
                Ok(ack) => {
                    self.success(ack.message.unwrap_or_else(|| "Backup done".to_string()));
                    vec![Effect::LoadBackups, Effect::LoadStats]
                }
                Err(err) => {
                    self.error(format!("Backup operation failed: {err}"));
                    vec![]
                }
            },
            AppEvent::TreeLoaded(Err(err)) => {
                self.error(format!("Failed to load folder tree: {err}"));
                vec![]
            }
        }
    }

    pub fn get_progress_percentage(&self) -> f32 {
        match &self.progress {
            ActionProgress::NotStarted => 0.0,
            ActionProgress::Uploading { total, current, .. } => {
                if *total == 0 {
                    0.0
                } else {
                    (*current as f32) / (*total as f32)
                }
            }
            ActionProgress::Completed { total, .. } => {
                if *total == 0 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    pub fn get_status_text(&self) -> String {
        match &self.progress {
            ActionProgress::NotStarted => String::new(),
            ActionProgress::Uploading {
                total,
                current,
                successful,
                failed,
                skipped,
            } => format!(
                "Uploading {current}/{total} | ✅ {successful} | ⏩ {skipped} | ❌ {failed}"
            ),
            ActionProgress::Completed {
                total,
                successful,
                failed,
                skipped,
            } => format!(
                "Done: {total} file(s) | ✅ {successful} | ⏩ {skipped} | ❌ {failed}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        FolderContents, JobProgress, JobStatus, ProcessingJob, RefreshStatus, RemoteFile,
    };
    use crate::processing::PollerState;
    use crate::upload::UploadSummary;
    use std::cell::Cell;
    use std::rc::Rc;

    struct NoopTimer(Rc<Cell<bool>>);

    impl PollTimer for NoopTimer {
        fn cancel(&mut self) {
            self.0.set(true);
        }
    }

    fn state() -> AppState<NoopTimer> {
        AppState::new(20, ProcessingPanel::new(10, 100, 100))
    }

    fn contents(keys: &[&str]) -> FolderContents {
        FolderContents {
            folder_path: "docs/".into(),
            files: keys
                .iter()
                .map(|k| RemoteFile {
                    key: format!("docs/{k}"),
                    filename: k.to_string(),
                    size: 1,
                    last_modified: String::new(),
                })
                .collect(),
            folders: vec![],
        }
    }

    #[test]
    fn upload_finished_reports_count_and_uses_single_reload() {
        let mut state = state();
        state.navigate("docs/");
        let (_tx, rx) = std::sync::mpsc::channel();
        state.begin_upload(3, rx);
        state.browser.selection.toggle("docs/old.pdf");

        let summary = UploadSummary {
            total: 3,
            uploaded: vec!["a.pdf".into(), "c.pdf".into()],
            failed: vec![("b.pdf".into(), "boom".into())],
            skipped: vec![],
        };
        let effects = state.apply(AppEvent::UploadFinished {
            summary,
            contents: Ok(contents(&["a.pdf", "c.pdf"])),
        });

        let banner = state.banner.clone().unwrap();
        assert!(banner.text.starts_with("Uploaded 2 file(s)"));
        assert!(state.browser.selection.is_empty());
        assert_eq!(state.browser.listing.entries().len(), 2);
        assert!(!effects
            .iter()
            .any(|e| matches!(e, Effect::LoadContents(_))));
        assert!(!state.is_uploading);
    }

    #[test]
    fn upload_progress_counts_started_files() {
        let mut state = state();
        let (_tx, rx) = std::sync::mpsc::channel();
        state.begin_upload(2, rx);
        state.apply_upload_status(FileStatus {
            name: "a.pdf".into(),
            status: UploadStatus::Started { index: 1, total: 2 },
        });
        assert_eq!(state.get_progress_percentage(), 0.5);
        assert!(state.file_statuses.is_empty());
        state.apply_upload_status(FileStatus {
            name: "a.pdf".into(),
            status: UploadStatus::Error("nope".into()),
        });
        assert_eq!(state.file_statuses.len(), 1);
    }

    #[test]
    fn stale_folder_contents_are_ignored() {
        let mut state = state();
        state.navigate("other/");
        state.apply(AppEvent::ContentsLoaded {
            folder: "docs/".into(),
            result: Ok(contents(&["a.pdf"])),
        });
        assert!(state.browser.listing.entries().is_empty());
    }

    fn status(generation: u64, job: Option<ProcessingJob>) -> AppEvent {
        AppEvent::RefreshStatus {
            generation,
            result: Ok(RefreshStatus { job, message: None }),
        }
    }

    #[test]
    fn refresh_poll_cycle() {
        let mut state = state();
        let cancelled = Rc::new(Cell::new(false));

        assert_eq!(
            state.apply(AppEvent::RefreshStarted(Ok("job-9".into()))),
            vec![Effect::StartPolling(Some("job-9".into()))]
        );
        let session = state
            .admin
            .refresh
            .start(NoopTimer(cancelled.clone()), Some("job-9".into()))
            .unwrap();
        // Immediate poll still outstanding: the tick is dropped.
        assert!(state.apply(AppEvent::PollTick).is_empty());

        let running = ProcessingJob {
            id: "job-9".into(),
            kind: None,
            status: JobStatus::Running,
            progress: JobProgress::default(),
            message: Some("Loading products".into()),
            phase: Some("metadata".into()),
        };
        assert!(state.apply(status(session, Some(running.clone()))).is_empty());
        assert_eq!(
            state.apply(AppEvent::PollTick),
            vec![Effect::PollRefreshStatus(session)]
        );

        let done = ProcessingJob {
            status: JobStatus::Completed,
            message: None,
            ..running
        };
        let effects = state.apply(status(session, Some(done)));
        assert_eq!(effects, vec![Effect::LoadStats]);
        assert!(cancelled.get());
        assert!(!state.admin.refresh.has_timer());
    }

    #[test]
    fn startup_no_job_reply_does_not_stop_started_refresh() {
        let mut state = state();
        let startup = state
            .admin
            .refresh
            .start(NoopTimer(Rc::new(Cell::new(false))), None)
            .unwrap();

        let effects = state.apply(AppEvent::RefreshStarted(Ok("r2".into())));
        let Some(Effect::StartPolling(job_id)) = effects.into_iter().next() else {
            panic!("expected a polling effect");
        };
        let timer_cancelled = Rc::new(Cell::new(false));
        state
            .admin
            .refresh
            .start(NoopTimer(timer_cancelled.clone()), job_id)
            .unwrap();
        assert_eq!(state.admin.refresh.job_id(), Some("r2"));

        state.apply(status(startup, None));
        assert_eq!(state.admin.refresh.state(), PollerState::Polling);
        assert!(!timer_cancelled.get());
        assert_eq!(state.admin.refresh.job_id(), Some("r2"));
    }

    #[test]
    fn cancelled_processing_job_reloads_job_list() {
        let mut state = state();
        let effects = state.apply(AppEvent::ProcessingJobCancelled(Ok("m1".into())));
        assert_eq!(effects, vec![Effect::LoadProcessingJobs]);
        assert!(state
            .apply(AppEvent::ProcessingJobCancelled(Err("HTTP 500".into())))
            .is_empty());
    }

    #[test]
    fn failed_phase_batches_still_complete_the_phase() {
        let mut state = state();
        let (_tx, rx) = std::sync::mpsc::channel();
        state.begin_phase(PhaseKind::Embeddings, rx);
        state.apply(AppEvent::PhaseFinished(Ok(PhaseSummary {
            kind: PhaseKind::Embeddings,
            job_id: "e1".into(),
            tally: PhaseTally {
                processed: 7,
                failed: 3,
                total: 10,
            },
            batches_submitted: 2,
        })));
        assert!(state.processing.is_complete(PhaseKind::Embeddings));
        assert!(!state.processing.running);
        let banner = state.banner.unwrap();
        assert_eq!(banner.text, "Embeddings phase complete: 7 processed, 3 failed");
    }
}
