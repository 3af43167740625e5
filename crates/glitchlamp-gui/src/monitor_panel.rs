//! Generation monitor window.
//!
//! Polling runs only while the window is open. Each endpoint gets its own
//! [`PollTask`] writing into a [`Latest`] slot; the UI thread copies new
//! snapshots into the session's [`GenerationMonitor`] once per frame.

use egui::{Color32, Context, Grid, ProgressBar, RichText, ScrollArea};
use std::sync::Arc;

use glitchlamp_client::{
    Backend, GenerationMonitor, GenerationStatus, Latest, LogEntry, PollTask, Progress, WorkerInfo,
};
use glitchlamp_config::PollIntervals;
use glitchlamp_gui_core::Theme;

/// Newest log lines kept on screen.
const LOG_LINES: usize = 200;

/// A generator control pressed in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorRequest {
    /// Pause (`true`) or resume generation.
    SetPaused(bool),
    /// Render a preview clip.
    GeneratePreview,
}

#[derive(Default)]
struct Feeds {
    status: Latest<GenerationStatus>,
    progress: Latest<Progress>,
    preview: Latest<Progress>,
    workers: Latest<Vec<WorkerInfo>>,
    logs: Latest<Vec<LogEntry>>,
}

/// Monitor window and its pollers.
pub struct MonitorPanel {
    intervals: PollIntervals,
    feeds: Feeds,
    tasks: Vec<PollTask>,
    seen_status: u64,
    seen_progress: u64,
}

impl MonitorPanel {
    /// Closed panel polling at `intervals` once opened.
    pub fn new(intervals: PollIntervals) -> Self {
        Self {
            intervals,
            feeds: Feeds::default(),
            tasks: Vec::new(),
            seen_status: 0,
            seen_progress: 0,
        }
    }

    /// Whether the pollers are running.
    pub fn is_open(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Starts polling `backend`. Each new snapshot wakes `ctx`.
    pub fn open(&mut self, backend: &Arc<dyn Backend>, ctx: &Context) {
        if self.is_open() {
            return;
        }
        self.feeds = Feeds::default();
        self.seen_status = 0;
        self.seen_progress = 0;

        let every = PollIntervals::duration;
        self.tasks = vec![
            fetch("status", every(self.intervals.status_ms), &self.feeds.status, backend, ctx, |b| {
                b.generation_status()
            }),
            fetch("progress", every(self.intervals.progress_ms), &self.feeds.progress, backend, ctx, |b| {
                b.progress()
            }),
            fetch("preview", every(self.intervals.progress_ms), &self.feeds.preview, backend, ctx, |b| {
                b.preview_progress()
            }),
            fetch("workers", every(self.intervals.workers_ms), &self.feeds.workers, backend, ctx, |b| {
                b.workers()
            }),
            fetch("logs", every(self.intervals.logs_ms), &self.feeds.logs, backend, ctx, |b| b.logs()),
        ];
        tracing::info!(pollers = self.tasks.len(), "generation monitor opened");
    }

    /// Stops polling and forgets the last status.
    pub fn close(&mut self, monitor: &mut GenerationMonitor) {
        if self.tasks.is_empty() {
            return;
        }
        // Detached, so a request in flight never stalls the frame.
        for task in &mut self.tasks {
            task.cancel();
        }
        self.tasks.clear();
        monitor.clear();
        tracing::info!("generation monitor closed");
    }

    /// Copies fresh snapshots into `monitor`.
    pub fn sync(&mut self, monitor: &mut GenerationMonitor) {
        let updates = self.feeds.status.updates();
        if updates != self.seen_status {
            self.seen_status = updates;
            if let Some(status) = self.feeds.status.get() {
                monitor.update(status);
            }
        }
        let updates = self.feeds.progress.updates();
        if updates != self.seen_progress {
            self.seen_progress = updates;
            if let Some(progress) = self.feeds.progress.get() {
                monitor.update_progress(progress);
            }
        }
    }

    /// Draws the window while open. Closing it stops the pollers.
    pub fn show(
        &mut self,
        ctx: &Context,
        monitor: &mut GenerationMonitor,
        theme: &Theme,
    ) -> Vec<MonitorRequest> {
        let mut requests = Vec::new();
        if !self.is_open() {
            return requests;
        }
        self.sync(monitor);

        let mut open = true;
        egui::Window::new("Generation")
            .open(&mut open)
            .default_width(420.0)
            .resizable(true)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(monitor.summary()).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Preview").clicked() {
                            requests.push(MonitorRequest::GeneratePreview);
                        }
                        let paused = monitor.is_paused();
                        if ui.button(if paused { "Resume" } else { "Pause" }).clicked() {
                            requests.push(MonitorRequest::SetPaused(!paused));
                        }
                    });
                });
                if let Some(message) = &monitor.status().message {
                    ui.label(RichText::new(message).color(theme.text_secondary).small());
                }
                if let Some(error) = self.feeds.status.error() {
                    ui.label(RichText::new(format!("Status unavailable: {error}")).color(theme.toast_warning).small());
                }

                ui.separator();
                progress_row(ui, "Clip", monitor.progress());
                progress_row(ui, "Preview", self.feeds.preview.get().as_ref());

                ui.separator();
                ui.label(RichText::new("Workers").strong());
                let workers = self.feeds.workers.get().unwrap_or_default();
                if workers.is_empty() {
                    ui.label(RichText::new("No workers reported").color(theme.text_secondary).italics());
                } else {
                    Grid::new("monitor-workers").striped(true).num_columns(3).show(ui, |ui| {
                        for worker in &workers {
                            ui.label(&worker.id);
                            ui.label(&worker.status);
                            let task = worker.task.as_deref().unwrap_or("");
                            match worker.progress {
                                Some(p) => ui.add(
                                    ProgressBar::new((p / 100.0).clamp(0.0, 1.0))
                                        .desired_width(140.0)
                                        .text(task),
                                ),
                                None => ui.label(task),
                            };
                            ui.end_row();
                        }
                    });
                }

                ui.separator();
                ui.label(RichText::new("Log").strong());
                let logs = self.feeds.logs.get().unwrap_or_default();
                ScrollArea::vertical()
                    .max_height(180.0)
                    .stick_to_bottom(true)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        let skip = logs.len().saturating_sub(LOG_LINES);
                        for entry in &logs[skip..] {
                            log_line(ui, entry, theme);
                        }
                    });
            });

        if !open {
            self.close(monitor);
        }
        requests
    }
}

impl Drop for MonitorPanel {
    fn drop(&mut self) {
        for task in &mut self.tasks {
            task.cancel();
        }
    }
}

fn fetch<T, F>(
    name: &str,
    interval: std::time::Duration,
    latest: &Latest<T>,
    backend: &Arc<dyn Backend>,
    ctx: &Context,
    call: F,
) -> PollTask
where
    T: Clone + Send + 'static,
    F: Fn(&dyn Backend) -> Result<T, glitchlamp_client::ClientError> + Send + 'static,
{
    let backend = Arc::clone(backend);
    let ctx = ctx.clone();
    PollTask::spawn_fetch(name, interval, latest.clone(), move || {
        let result = call(backend.as_ref());
        ctx.request_repaint();
        result
    })
}

fn progress_row(ui: &mut egui::Ui, label: &str, progress: Option<&Progress>) {
    ui.horizontal(|ui| {
        ui.label(label);
        match progress {
            Some(p) => {
                let text = match &p.message {
                    Some(m) if !m.is_empty() => format!("{} {:.0}% {m}", p.stage, p.percent),
                    _ => format!("{} {:.0}%", p.stage, p.percent),
                };
                ui.add(ProgressBar::new(p.fraction()).text(text));
            }
            None => {
                ui.add(ProgressBar::new(0.0).text("waiting"));
            }
        }
    });
}

fn log_line(ui: &mut egui::Ui, entry: &LogEntry, theme: &Theme) {
    let color = match entry.level.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("error" | "critical") => Color32::from_rgb(220, 100, 100),
        Some("warn" | "warning") => theme.toast_warning,
        _ => theme.text_secondary,
    };
    let mut line = String::new();
    if let Some(ts) = &entry.timestamp {
        line.push_str(ts);
        line.push(' ');
    }
    line.push_str(&entry.message);
    ui.label(RichText::new(line).monospace().small().color(color));
}
