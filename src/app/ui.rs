use super::{ActionProgress, BannerKind, DocumentManager, Tab};
use crate::admin::display_value;
use crate::api::{KeyValues, PhaseKind};
use crate::browser::{FileEntry, TreeLine};
use crate::processing::PollerState;
use crate::upload::UploadStatus;
use crate::utils::file_size::{format_size, format_timestamp};
use eframe::egui::{self, Color32, RichText};

const ACCENT: Color32 = Color32::from_rgb(161, 89, 225);
const SUCCESS: Color32 = Color32::from_rgb(0, 180, 0);
const ERROR: Color32 = Color32::from_rgb(220, 50, 50);
const MUTED: Color32 = Color32::from_rgb(150, 150, 150);

impl DocumentManager {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("Agar Document Manager");
                ui.add_space(20.0);
                let previous = self.tab;
                ui.selectable_value(&mut self.tab, Tab::Browser, "📂 Documents");
                ui.selectable_value(&mut self.tab, Tab::Processing, "⚙ Processing");
                ui.selectable_value(&mut self.tab, Tab::Admin, "🛠 Admin");
                if previous != self.tab && self.tab == Tab::Admin {
                    self.load_admin();
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_health(ui);
                });
            });
            ui.add_space(6.0);
        });

        egui::TopBottomPanel::bottom("banner").show(ctx, |ui| {
            self.render_banner(ui);
        });

        match self.tab {
            Tab::Browser => {
                egui::SidePanel::left("folder_tree")
                    .resizable(true)
                    .default_width(240.0)
                    .show(ctx, |ui| self.render_tree(ui));
                egui::CentralPanel::default().show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| self.render_browser(ui));
                });
            }
            Tab::Processing => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| self.render_processing(ui));
                });
            }
            Tab::Admin => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| self.render_admin(ui));
                });
            }
        }
    }

    fn render_health(&mut self, ui: &mut egui::Ui) {
        if ui.button("🔄").on_hover_text("Check API health").clicked() {
            self.check_health();
        }
        match &self.state.storage_health {
            Some(Ok(health)) => {
                ui.colored_label(SUCCESS, format!("S3: {}", health.status));
            }
            Some(Err(_)) => {
                ui.colored_label(ERROR, "S3: unavailable");
            }
            None => {}
        }
        match &self.state.health {
            Some(Ok(health)) => {
                ui.colored_label(SUCCESS, "● API connected")
                    .on_hover_text(health.version.clone().unwrap_or_default());
            }
            Some(Err(err)) => {
                ui.colored_label(ERROR, "● API offline").on_hover_text(err);
            }
            None => {
                ui.colored_label(MUTED, "● checking...");
            }
        }
    }

    fn render_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = &self.state.banner else {
            ui.add_space(4.0);
            return;
        };
        let color = match banner.kind {
            BannerKind::Info => ui.visuals().text_color(),
            BannerKind::Success => SUCCESS,
            BannerKind::Error => ERROR,
        };
        let text = banner.text.clone();
        ui.horizontal(|ui| {
            ui.colored_label(color, text);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("✖").clicked() {
                    self.state.banner = None;
                }
            });
        });
    }

    fn render_tree(&mut self, ui: &mut egui::Ui) {
        let stats = &self.state.browser.statistics;
        ui.label(
            RichText::new(format!(
                "{} folders · {} files · {}",
                stats.total_folders,
                stats.total_files,
                format_size(stats.total_size)
            ))
            .color(MUTED),
        );
        ui.separator();

        let mut navigate_to = None;
        let mut toggle = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            let at_root = self.state.browser.current_folder.is_empty();
            if ui.selectable_label(at_root, "🏠 All documents").clicked() {
                navigate_to = Some(String::new());
            }
            for line in self.state.browser.tree_lines() {
                Self::render_tree_line(ui, &line, &mut navigate_to, &mut toggle);
            }
        });

        if let Some(path) = toggle {
            self.state.browser.toggle_collapsed(&path);
        }
        if let Some(path) = navigate_to {
            self.navigate(&path);
        }
    }

    fn render_tree_line(
        ui: &mut egui::Ui,
        line: &TreeLine,
        navigate_to: &mut Option<String>,
        toggle: &mut Option<String>,
    ) {
        ui.horizontal(|ui| {
            ui.add_space(line.depth as f32 * 14.0);
            if line.has_children {
                let arrow = if line.collapsed { "▶" } else { "▼" };
                if ui.small_button(arrow).clicked() {
                    *toggle = Some(line.path.clone());
                }
            } else {
                ui.add_space(18.0);
            }
            let label = if line.file_count > 0 {
                format!("📁 {} ({})", line.name, line.file_count)
            } else {
                format!("📁 {}", line.name)
            };
            if ui.selectable_label(line.selected, label).clicked() {
                *navigate_to = Some(line.path.clone());
            }
        });
    }

    fn render_browser(&mut self, ui: &mut egui::Ui) {
        let busy = self.state.is_busy || self.state.is_uploading;
        let current = self.state.browser.current_folder.clone();

        ui.horizontal(|ui| {
            let parent = self.state.browser.parent_folder();
            if ui
                .add_enabled(parent.is_some(), egui::Button::new("⬆ Up"))
                .clicked()
            {
                if let Some(parent) = parent {
                    self.navigate(&parent);
                }
            }
            if ui.button("🔄 Refresh").clicked() {
                self.refresh_current();
            }
            ui.label(RichText::new(format!("/{current}")).monospace().strong());
        });

        ui.add_space(8.0);
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.add_enabled_ui(!busy, |ui| {
                    if ui.button("📤 Upload Files").clicked() {
                        self.upload_files();
                    }
                    if ui.button("📁 Upload Folder").clicked() {
                        self.upload_folder();
                    }
                });
                ui.add(
                    egui::TextEdit::singleline(&mut self.include_pattern)
                        .desired_width(140.0)
                        .hint_text("include, e.g. **/*.pdf"),
                );
                ui.label("ℹ").on_hover_text_at_pointer(
                    "Folder uploads skip files listed in .gitignore.\n\
                    An optional glob limits which files are sent.",
                );
            });
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.new_folder_name)
                        .desired_width(160.0)
                        .hint_text("New folder name"),
                );
                let can_create = !busy && !self.new_folder_name.trim().is_empty();
                if ui
                    .add_enabled(can_create, egui::Button::new("➕ Create Folder"))
                    .clicked()
                {
                    self.create_folder();
                }
                if ui
                    .add_enabled(!busy && !current.is_empty(), egui::Button::new("🗑 Delete Folder"))
                    .on_hover_text("Deletes this folder and everything in it")
                    .clicked()
                {
                    self.delete_current_folder();
                }
            });
        });

        self.render_upload_progress(ui);

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("🔍");
            let search = ui.add(
                egui::TextEdit::singleline(&mut self.search_text)
                    .desired_width(200.0)
                    .hint_text("Filter by name"),
            );
            if search.changed() {
                self.state.browser.listing.set_filter(&self.search_text);
            }

            let selected = self.state.browser.selection.len();
            ui.separator();
            ui.label(format!("{selected} selected"));
            let can_act = !busy && selected > 0;
            if ui
                .add_enabled(can_act, egui::Button::new("⬇ Download"))
                .clicked()
            {
                self.download_selected();
            }
            if ui
                .add_enabled(can_act, egui::Button::new("🗑 Delete"))
                .clicked()
            {
                self.delete_selected();
            }
            ui.add(
                egui::TextEdit::singleline(&mut self.move_destination)
                    .desired_width(140.0)
                    .hint_text("destination/folder/"),
            );
            if ui
                .add_enabled(
                    can_act && !self.move_destination.trim().is_empty(),
                    egui::Button::new("↪ Move"),
                )
                .clicked()
            {
                self.move_selected();
            }
        });

        ui.add_space(6.0);
        self.render_file_table(ui);
        self.render_pagination(ui);
    }

    fn render_file_table(&mut self, ui: &mut egui::Ui) {
        let rows: Vec<FileEntry> = self
            .state
            .browser
            .listing
            .page_entries()
            .into_iter()
            .cloned()
            .collect();

        if rows.is_empty() {
            ui.label(RichText::new("No documents in this folder").color(MUTED));
            return;
        }

        let mut navigate_to = None;
        let mut toggles = Vec::new();
        let mut select_all = self.state.browser.select_all_checked();

        egui::Grid::new("file_table")
            .striped(true)
            .num_columns(4)
            .spacing([16.0, 6.0])
            .show(ui, |ui| {
                if ui.checkbox(&mut select_all, "").changed() {
                    self.state.browser.set_select_all(select_all);
                }
                ui.strong("Name");
                ui.strong("Size");
                ui.strong("Modified");
                ui.end_row();

                for entry in &rows {
                    if entry.is_folder() {
                        ui.label("");
                        if ui.link(format!("📁 {}", entry.filename)).clicked() {
                            navigate_to = Some(entry.key.clone());
                        }
                        ui.label("-");
                        ui.label("");
                    } else {
                        let mut checked = self.state.browser.selection.contains(&entry.key);
                        if ui.checkbox(&mut checked, "").changed() {
                            toggles.push(entry.key.clone());
                        }
                        ui.label(format!("📄 {}", entry.filename))
                            .on_hover_text(&entry.key);
                        ui.label(format_size(entry.size));
                        ui.label(format_timestamp(&entry.last_modified));
                    }
                    ui.end_row();
                }
            });

        for key in toggles {
            self.state.browser.selection.toggle(&key);
        }
        if let Some(path) = navigate_to {
            self.navigate(&path);
        }
    }

    fn render_pagination(&mut self, ui: &mut egui::Ui) {
        let listing = &self.state.browser.listing;
        let total_pages = listing.total_pages();
        if total_pages <= 1 {
            return;
        }
        let page = listing.page();
        let count = listing.filtered_count();

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(page > 1, egui::Button::new("◀ Prev"))
                .clicked()
            {
                self.state.browser.listing.previous_page();
            }
            ui.label(format!("Page {page} of {total_pages} ({count} items)"));
            if ui
                .add_enabled(page < total_pages, egui::Button::new("Next ▶"))
                .clicked()
            {
                self.state.browser.listing.next_page();
            }
        });
    }

    fn render_upload_progress(&mut self, ui: &mut egui::Ui) {
        if matches!(self.state.progress, ActionProgress::NotStarted) {
            return;
        }
        ui.add_space(8.0);
        ui.group(|ui| {
            if let Some(current_file) = &self.state.current_file {
                let status_text = match &self.state.progress {
                    ActionProgress::Completed { failed, .. } if *failed > 0 => {
                        "Upload finished with errors"
                    }
                    ActionProgress::Completed { .. } => "Upload complete",
                    _ => "📤 Uploading",
                };
                ui.label(format!("{status_text}: {current_file}"));
            }

            let progress_bar = egui::ProgressBar::new(self.state.get_progress_percentage())
                .show_percentage()
                .animate(self.state.is_uploading)
                .fill(ACCENT);
            ui.add(progress_bar);
            ui.label(self.state.get_status_text());

            if !self.state.file_statuses.is_empty() {
                self.render_details(ui);
            }
        });
    }

    fn render_details(&mut self, ui: &mut egui::Ui) {
        if ui
            .button(if self.state.show_details {
                "Hide Details"
            } else {
                "Show Details"
            })
            .clicked()
        {
            self.state.show_details = !self.state.show_details;
        }

        if self.state.show_details {
            egui::ScrollArea::vertical()
                .id_source("upload_details")
                .max_height(200.0)
                .show(ui, |ui| {
                    egui::Frame::none()
                        .fill(ui.style().visuals.extreme_bg_color)
                        .show(ui, |ui| {
                            for status in &self.state.file_statuses {
                                ui.horizontal(|ui| match &status.status {
                                    UploadStatus::Started { .. } => {
                                        ui.label("⏳");
                                        ui.colored_label(MUTED, &status.name);
                                    }
                                    UploadStatus::Success => {
                                        ui.label("✅");
                                        ui.colored_label(SUCCESS, &status.name);
                                    }
                                    UploadStatus::Error(err) => {
                                        ui.label("❌");
                                        ui.colored_label(ERROR, format!("{} - {}", status.name, err));
                                    }
                                    UploadStatus::Skipped(reason) => {
                                        ui.label("⏩");
                                        ui.colored_label(MUTED, format!("{} - {}", status.name, reason));
                                    }
                                });
                            }
                        });
                });
        }
    }

    fn render_processing(&mut self, ui: &mut egui::Ui) {
        ui.heading("Batch processing");
        match self.state.processing.configured {
            Some(true) => {
                ui.colored_label(SUCCESS, "Processing API configured");
            }
            Some(false) => {
                ui.colored_label(ERROR, "Processing API is not configured on the server");
            }
            None => {
                ui.colored_label(MUTED, "Checking processing configuration...");
            }
        }

        ui.add_space(8.0);
        let running = self.state.processing.running;
        ui.group(|ui| {
            ui.add_enabled_ui(!running, |ui| {
                egui::Grid::new("phase_settings")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Scrape run");
                        let panel = &mut self.state.processing;
                        let runs = &self.state.admin.scrape_runs;
                        ui.horizontal(|ui| {
                            egui::ComboBox::from_id_source("scope_runs")
                                .selected_text("Pick…")
                                .show_ui(ui, |ui| {
                                    for run in runs {
                                        let label = run.name.clone().unwrap_or_else(|| run.path.clone());
                                        ui.selectable_value(&mut panel.scope_path, run.path.clone(), label);
                                    }
                                });
                            ui.add(
                                egui::TextEdit::singleline(&mut panel.scope_path)
                                    .desired_width(260.0)
                                    .hint_text("scrape run path"),
                            );
                        });
                        ui.end_row();

                        ui.label("Batch size");
                        ui.add(egui::DragValue::new(&mut panel.batch_size).clamp_range(1..=500));
                        ui.end_row();

                        ui.label("Embeddings limit");
                        ui.add(
                            egui::DragValue::new(&mut panel.embeddings_limit).clamp_range(1..=10_000),
                        );
                        ui.end_row();
                    });
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                for kind in PhaseKind::ALL {
                    let done = self.state.processing.is_complete(kind);
                    let label = if done {
                        format!("✅ {kind}")
                    } else {
                        format!("▶ {kind}")
                    };
                    if ui
                        .add_enabled(!running, egui::Button::new(label).min_size(egui::vec2(120.0, 32.0)))
                        .clicked()
                    {
                        self.start_phase(kind);
                    }
                }
                ui.separator();
                if ui
                    .add_enabled(!running, egui::Button::new("🔁 Sync Catalog"))
                    .clicked()
                {
                    self.sync_catalog();
                }
            });
        });

        let panel = &self.state.processing;
        if let Some(kind) = panel.current_phase {
            ui.add_space(8.0);
            ui.group(|ui| {
                let tally = panel.tally;
                ui.label(format!(
                    "{kind}: {} processed, {} failed of {} ({} batches)",
                    tally.processed, tally.failed, tally.total, panel.batches
                ));
                if let Some(job_id) = &panel.job_id {
                    ui.label(RichText::new(format!("job {job_id}")).color(MUTED).small());
                }
                ui.add(
                    egui::ProgressBar::new(f32::from(tally.percent()) / 100.0)
                        .show_percentage()
                        .animate(panel.running)
                        .fill(ACCENT),
                );
            });
        }

        if !panel.results.is_empty() {
            ui.add_space(8.0);
            ui.label(RichText::new("Results").strong());
            egui::ScrollArea::vertical()
                .id_source("phase_results")
                .max_height(240.0)
                .show(ui, |ui| {
                    for result in panel.results.iter() {
                        ui.horizontal(|ui| {
                            if result.success {
                                ui.label("✅");
                                ui.colored_label(SUCCESS, format!("{} - {}", result.name, result.detail));
                            } else {
                                ui.label("❌");
                                ui.colored_label(ERROR, format!("{} - {}", result.name, result.detail));
                            }
                        });
                    }
                });
        }

        ui.add_space(12.0);
        ui.separator();
        self.render_jobs(ui);
    }

    fn render_jobs(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Server jobs").strong());
            if ui.small_button("🔄").clicked() {
                self.load_processing_jobs();
            }
        });
        let mut cancel = None;
        egui::Grid::new("processing_jobs")
            .striped(true)
            .num_columns(4)
            .show(ui, |ui| {
                for job in &self.state.admin.processing_jobs {
                    ui.label(&job.id);
                    ui.label(job.kind.map(|k| k.to_string()).unwrap_or_default());
                    ui.label(format!(
                        "{:?} {}/{}",
                        job.status, job.progress.processed, job.progress.total
                    ));
                    if job.status.is_active() && ui.small_button("Cancel").clicked() {
                        cancel = Some(job.id.clone());
                    }
                    ui.end_row();
                }
            });
        if let Some(job_id) = cancel {
            self.cancel_processing_job(job_id);
        }
    }

    fn render_admin(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Administration");
            if ui.button("🔄 Reload").clicked() {
                self.load_admin();
            }
        });

        ui.add_space(8.0);
        ui.columns(2, |columns| {
            Self::render_key_values(&mut columns[0], "System health", self.state.admin.health.as_ref());
            Self::render_key_values(&mut columns[1], "Database stats", self.state.admin.stats.as_ref());
        });

        ui.add_space(12.0);
        self.render_refresh(ui);
        ui.add_space(12.0);
        self.render_reset(ui);
        ui.add_space(12.0);
        self.render_backups(ui);
    }

    fn render_key_values(ui: &mut egui::Ui, title: &str, values: Option<&KeyValues>) {
        ui.group(|ui| {
            ui.label(RichText::new(title).strong());
            let Some(values) = values else {
                ui.colored_label(MUTED, "Not loaded");
                return;
            };
            egui::Grid::new(title).num_columns(2).striped(true).show(ui, |ui| {
                for (key, value) in values.entries() {
                    ui.label(key);
                    ui.label(display_value(value));
                    ui.end_row();
                }
            });
        });
    }

    fn render_refresh(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(RichText::new("S3 refresh").strong());
            let refresh = &self.state.admin.refresh;
            let polling = refresh.state() == PollerState::Polling;

            let selected = self.state.admin.selected_run.clone();
            egui::ComboBox::from_label("Scrape run")
                .selected_text(selected.clone().unwrap_or_else(|| "All runs".into()))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.state.admin.selected_run, None, "All runs");
                    for run in &self.state.admin.scrape_runs {
                        ui.selectable_value(
                            &mut self.state.admin.selected_run,
                            Some(run.path.clone()),
                            run.name.clone().unwrap_or_else(|| run.path.clone()),
                        );
                    }
                });

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!polling, egui::Button::new("▶ Start refresh"))
                    .clicked()
                {
                    self.start_refresh();
                }
                let cancellable = self.state.admin.refresh.can_cancel();
                if ui
                    .add_enabled(cancellable, egui::Button::new("⏹ Cancel"))
                    .clicked()
                {
                    self.cancel_refresh();
                }
            });

            let refresh = &self.state.admin.refresh;
            if let Some(job) = refresh.job() {
                let fraction = (job.progress.percentage / 100.0).clamp(0.0, 1.0) as f32;
                ui.add(
                    egui::ProgressBar::new(fraction)
                        .show_percentage()
                        .animate(polling)
                        .fill(ACCENT),
                );
            }
            if !refresh.message().is_empty() {
                ui.label(refresh.message());
            }
        });
    }

    fn render_reset(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(RichText::new("Reset databases").strong().color(ERROR));
            if ui.button("Preview reset").clicked() {
                self.preview_reset();
            }
            if let Some(preview) = &self.state.admin.reset_preview {
                Self::render_key_values(ui, "Will be removed", Some(preview));
                ui.horizontal(|ui| {
                    ui.label("Type RESET to confirm");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.state.admin.reset_confirmation)
                            .desired_width(100.0),
                    );
                });
                if ui
                    .add_enabled(
                        self.state.admin.reset_armed(),
                        egui::Button::new(RichText::new("Reset now").color(ERROR)),
                    )
                    .clicked()
                {
                    self.execute_reset();
                }
            }
        });
    }

    fn render_backups(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(RichText::new("Backups").strong());
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.backup_label)
                        .desired_width(160.0)
                        .hint_text("label (optional)"),
                );
                if ui.button("💾 Create backup").clicked() {
                    self.create_backup();
                }
            });

            let mut restore = None;
            egui::Grid::new("backups").striped(true).num_columns(4).show(ui, |ui| {
                for backup in &self.state.admin.backups {
                    ui.label(&backup.id);
                    ui.label(backup.created_at.clone().unwrap_or_default());
                    ui.label(backup.size.map(format_size).unwrap_or_default());
                    if ui.small_button("Restore").clicked() {
                        restore = Some(backup.id.clone());
                    }
                    ui.end_row();
                }
            });
            if let Some(id) = restore {
                self.restore_backup(id);
            }
        });
    }
}
