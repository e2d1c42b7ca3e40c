mod events;
mod state;
mod ui;

use crate::admin::execute_reset;
use crate::api::{ApiClient, PhaseKind};
use crate::browser::actions;
use crate::config::AppConfig;
use crate::processing::{run_phase, IntervalTimer, PhaseRequest};
use crate::upload::TransferController;
use eframe::{egui, App};
use glob::Pattern;
use serde_json::json;
use std::future::Future;
use std::sync::mpsc::{self as std_mpsc, Receiver, Sender};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info};

pub use events::{AppEvent, Effect, Outcome};
pub use state::{ActionProgress, AppState, Banner, BannerKind, ProcessingPanel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Browser,
    Processing,
    Admin,
}

pub struct DocumentManager {
    api: ApiClient,
    config: AppConfig,
    runtime: Runtime,
    ctx: egui::Context,
    events: Sender<AppEvent>,
    event_receiver: Receiver<AppEvent>,
    state: AppState<IntervalTimer>,
    tab: Tab,
    search_text: String,
    new_folder_name: String,
    move_destination: String,
    include_pattern: String,
    backup_label: String,
}

impl DocumentManager {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        api: ApiClient,
        runtime: Runtime,
    ) -> Self {
        info!(api = %api.base_url(), "initializing document manager");
        let (events, event_receiver) = std_mpsc::channel();
        let processing = ProcessingPanel::new(
            config.processing.batch_size,
            config.processing.embeddings_limit,
            config.processing.results_log_cap,
        );
        let state = AppState::new(config.browser.page_size, processing);

        let mut app = Self {
            api,
            config,
            runtime,
            ctx: cc.egui_ctx.clone(),
            events,
            event_receiver,
            state,
            tab: Tab::Browser,
            search_text: String::new(),
            new_folder_name: String::new(),
            move_destination: String::new(),
            include_pattern: String::new(),
            backup_label: String::new(),
        };
        app.check_health();
        app.load_tree();
        app.navigate("");
        app.check_processing_config();
        // Pick up a refresh job that was started before this session.
        app.execute(vec![Effect::StartPolling(None)]);
        app
    }

    /// Runs `task` on the runtime and routes its event back to the UI thread.
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let sender = self.events.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            let event = task.await;
            sender.send(event).unwrap_or_default();
            ctx.request_repaint();
        });
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            debug!(?effect, "executing effect");
            match effect {
                Effect::LoadTree => self.load_tree(),
                Effect::LoadContents(folder) => self.load_contents(folder),
                Effect::LoadStats => self.load_stats(),
                Effect::LoadBackups => self.load_backups(),
                Effect::LoadProcessingJobs => self.load_processing_jobs(),
                Effect::StartPolling(job_id) => self.start_polling(job_id),
                Effect::PollRefreshStatus(generation) => self.poll_refresh_status(generation),
            }
        }
    }

    pub fn check_health(&self) {
        let api = self.api.clone();
        self.spawn(async move { AppEvent::Health(api.health().await.map_err(|e| e.user_message())) });
        let api = self.api.clone();
        self.spawn(async move {
            AppEvent::StorageHealth(api.storage_health().await.map_err(|e| e.user_message()))
        });
    }

    pub fn load_tree(&self) {
        let api = self.api.clone();
        self.spawn(async move {
            AppEvent::TreeLoaded(api.folder_tree().await.map_err(|e| e.user_message()))
        });
    }

    fn load_contents(&self, folder: String) {
        let api = self.api.clone();
        self.spawn(async move {
            let result = api
                .folder_contents(&folder)
                .await
                .map_err(|e| e.user_message());
            AppEvent::ContentsLoaded { folder, result }
        });
    }

    pub fn navigate(&mut self, path: &str) {
        self.search_text.clear();
        let effects = self.state.navigate(path);
        self.execute(effects);
    }

    pub fn refresh_current(&mut self) {
        let current = self.state.browser.current_folder.clone();
        self.execute(vec![Effect::LoadTree, Effect::LoadContents(current)]);
    }

    fn include_filter(&mut self) -> Result<Option<Pattern>, ()> {
        let text = self.include_pattern.trim();
        if text.is_empty() {
            return Ok(None);
        }
        match Pattern::new(text) {
            Ok(pattern) => Ok(Some(pattern)),
            Err(err) => {
                self.state.error(format!("Invalid include pattern: {err}"));
                Err(())
            }
        }
    }

    pub fn upload_files(&mut self) {
        let Some(files) = rfd::FileDialog::new().pick_files() else {
            return;
        };
        if files.is_empty() {
            return;
        }
        let folder = self.state.browser.current_folder.clone();
        info!(count = files.len(), folder = %folder, "starting upload");

        let (status_sender, status_receiver) = std_mpsc::channel();
        self.state.begin_upload(files.len(), status_receiver);
        let controller = TransferController::new(self.api.clone(), folder);
        self.spawn(async move {
            let (summary, contents) = controller
                .upload_then_reload(&files, &status_sender)
                .await;
            AppEvent::UploadFinished {
                summary,
                contents: contents.map_err(|e| e.user_message()),
            }
        });
    }

    pub fn upload_folder(&mut self) {
        let Ok(include) = self.include_filter() else {
            return;
        };
        let Some(root) = rfd::FileDialog::new().pick_folder() else {
            return;
        };
        self.state.is_uploading = true;
        self.state.info(format!("Uploading folder {}...", root.display()));
        let controller = TransferController::new(
            self.api.clone(),
            self.state.browser.current_folder.clone(),
        );
        self.spawn(async move {
            let result = controller
                .upload_folder(&root, include.as_ref())
                .await
                .map_err(|e| e.user_message());
            AppEvent::FolderUploadFinished(result)
        });
    }

    pub fn create_folder(&mut self) {
        let api = self.api.clone();
        let parent = self.state.browser.current_folder.clone();
        let name = std::mem::take(&mut self.new_folder_name);
        self.state.is_busy = true;
        self.spawn(async move {
            let result = actions::create_folder(&api, &parent, &name)
                .await
                .map_err(|e| e.user_message());
            AppEvent::FolderCreated(result)
        });
    }

    pub fn delete_current_folder(&mut self) {
        let api = self.api.clone();
        let folder = self.state.browser.current_folder.clone();
        self.state.is_busy = true;
        self.spawn(async move {
            let result = actions::delete_folder(&api, &folder)
                .await
                .map(|_| folder)
                .map_err(|e| e.user_message());
            AppEvent::FolderDeleted(result)
        });
    }

    pub fn delete_selected(&mut self) {
        let api = self.api.clone();
        let keys = self.state.browser.selection.keys();
        self.state.is_busy = true;
        self.spawn(async move {
            let result = actions::delete_files(&api, &keys)
                .await
                .map_err(|e| e.user_message());
            AppEvent::BulkFinished(result)
        });
    }

    pub fn move_selected(&mut self) {
        let api = self.api.clone();
        let keys = self.state.browser.selection.keys();
        let destination = self.move_destination.clone();
        self.state.is_busy = true;
        self.spawn(async move {
            let result = actions::move_files(&api, &keys, &destination)
                .await
                .map_err(|e| e.user_message());
            AppEvent::BulkFinished(result)
        });
    }

    pub fn download_selected(&mut self) {
        let api = self.api.clone();
        let keys = self.state.browser.selection.keys();
        let expiration = Some(self.config.download.expiration_secs);
        self.state.is_busy = true;
        self.spawn(async move {
            let result = actions::download_files(&api, &keys, expiration, |url| open::that(url))
                .await
                .map_err(|e| e.user_message());
            AppEvent::BulkFinished(result)
        });
    }

    fn check_processing_config(&self) {
        let api = self.api.clone();
        self.spawn(async move {
            let result = api
                .processing_config()
                .await
                .map(|c| c.configured)
                .map_err(|e| e.user_message());
            AppEvent::ProcessingConfigured(result)
        });
    }

    pub fn start_phase(&mut self, kind: PhaseKind) {
        if self.state.processing.running {
            return;
        }
        let panel = &self.state.processing;
        let mut request = PhaseRequest::new(kind, panel.scope_path.clone(), panel.batch_size);
        request.embeddings_limit = panel.embeddings_limit;
        if kind == PhaseKind::Embeddings {
            request = request.with_option("limit", json!(panel.embeddings_limit));
        }

        let (phase_sender, phase_receiver) = std_mpsc::channel();
        self.state.begin_phase(kind, phase_receiver);
        let api = self.api.clone();
        self.spawn(async move {
            let result = run_phase(&api, &request, &phase_sender)
                .await
                .map_err(|e| e.user_message());
            AppEvent::PhaseFinished(result)
        });
    }

    pub fn sync_catalog(&self) {
        let api = self.api.clone();
        let job_id = self.state.processing.job_id.clone();
        self.spawn(async move {
            let result = api
                .sync_catalog(job_id.as_deref())
                .await
                .map_err(|e| e.user_message());
            AppEvent::CatalogSynced(result)
        });
    }

    pub fn load_processing_jobs(&self) {
        let api = self.api.clone();
        self.spawn(async move {
            AppEvent::ProcessingJobs(api.processing_jobs().await.map_err(|e| e.user_message()))
        });
    }

    pub fn cancel_processing_job(&self, job_id: String) {
        let api = self.api.clone();
        self.spawn(async move {
            let result = api
                .cancel_processing_job(&job_id)
                .await
                .map(|_| job_id)
                .map_err(|e| e.user_message());
            AppEvent::ProcessingJobCancelled(result)
        });
    }

    pub fn load_admin(&mut self) {
        let api = self.api.clone();
        self.spawn(async move {
            AppEvent::AdminHealth(api.admin_health().await.map_err(|e| e.user_message()))
        });
        let api = self.api.clone();
        self.spawn(async move {
            AppEvent::ScrapeRuns(api.scrape_runs().await.map_err(|e| e.user_message()))
        });
        self.execute(vec![Effect::LoadStats, Effect::LoadBackups]);
        self.load_processing_jobs();
    }

    fn load_stats(&self) {
        let api = self.api.clone();
        self.spawn(async move { AppEvent::Stats(api.admin_stats().await.map_err(|e| e.user_message())) });
    }

    fn load_backups(&self) {
        let api = self.api.clone();
        self.spawn(async move {
            AppEvent::Backups(api.list_backups().await.map_err(|e| e.user_message()))
        });
    }

    pub fn preview_reset(&self) {
        let api = self.api.clone();
        self.spawn(async move {
            AppEvent::ResetPreview(api.reset_preview().await.map_err(|e| e.user_message()))
        });
    }

    pub fn execute_reset(&self) {
        let api = self.api.clone();
        let typed = self.state.admin.reset_confirmation.clone();
        self.spawn(async move {
            AppEvent::ResetDone(execute_reset(&api, &typed).await.map_err(|e| e.user_message()))
        });
    }

    pub fn create_backup(&mut self) {
        let api = self.api.clone();
        let label = std::mem::take(&mut self.backup_label);
        self.spawn(async move {
            let label = label.trim();
            let label = (!label.is_empty()).then_some(label);
            AppEvent::BackupDone(api.create_backup(label).await.map_err(|e| e.user_message()))
        });
    }

    pub fn restore_backup(&self, backup_id: String) {
        let api = self.api.clone();
        self.spawn(async move {
            AppEvent::BackupDone(
                api.restore_backup(&backup_id)
                    .await
                    .map_err(|e| e.user_message()),
            )
        });
    }

    pub fn start_refresh(&self) {
        let api = self.api.clone();
        let scope = self.state.admin.selected_run.clone();
        self.spawn(async move {
            let result = api
                .start_refresh(scope.as_deref())
                .await
                .map(|job| job.job_id)
                .map_err(|e| e.user_message());
            AppEvent::RefreshStarted(result)
        });
    }

    pub fn cancel_refresh(&self) {
        let refresh = &self.state.admin.refresh;
        let Some(job_id) = refresh.job_id().map(str::to_string) else {
            return;
        };
        let generation = refresh.generation();
        let api = self.api.clone();
        self.spawn(async move {
            let result = api
                .cancel_refresh(&job_id)
                .await
                .map(|_| ())
                .map_err(|e| e.user_message());
            AppEvent::RefreshCancelled { generation, result }
        });
    }

    fn start_polling(&mut self, job_id: Option<String>) {
        let sender = self.events.clone();
        let ctx = self.ctx.clone();
        let period = Duration::from_millis(self.config.poller.interval_ms);
        let timer = IntervalTimer::spawn(self.runtime.handle(), period, move || {
            sender.send(AppEvent::PollTick).unwrap_or_default();
            ctx.request_repaint();
        });
        if let Some(generation) = self.state.admin.refresh.start(timer, job_id) {
            self.poll_refresh_status(generation);
        }
    }

    fn poll_refresh_status(&self, generation: u64) {
        let api = self.api.clone();
        self.spawn(async move {
            let result = api.refresh_status().await.map_err(|e| e.user_message());
            AppEvent::RefreshStatus { generation, result }
        });
    }

    pub fn update_state(&mut self) {
        let statuses: Vec<_> = self
            .state
            .status_receiver
            .as_ref()
            .map(|receiver| receiver.try_iter().collect())
            .unwrap_or_default();
        for status in statuses {
            self.state.apply_upload_status(status);
        }

        let phase_events: Vec<_> = self
            .state
            .phase_receiver
            .as_ref()
            .map(|receiver| receiver.try_iter().collect())
            .unwrap_or_default();
        for event in phase_events {
            self.state.apply_phase_event(event);
        }

        while let Ok(event) = self.event_receiver.try_recv() {
            let effects = self.state.apply(event);
            self.execute(effects);
        }

        if self.state.is_uploading || self.state.processing.running {
            self.ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl App for DocumentManager {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state();
        self.render(ctx);
    }
}
