//! Main application state and UI layout.

use egui::{
    Align, CentralPanel, Color32, ComboBox, Context, DragValue, Key, Layout, RichText, Slider,
    TopBottomPanel,
};
use std::sync::Arc;

use glitchlamp_client::Backend;
use glitchlamp_config::{
    AppConfig, PlaybackSettings, PollIntervals, Preset, SCREEN_ORIENTATIONS, VIDEO_QUALITIES,
    ViewPreference, validate_chain, validate_playback,
};
use glitchlamp_gui_core::{DisplayHints, InputCapabilityProfile, Theme};

use crate::monitor_panel::{MonitorPanel, MonitorRequest};
use crate::preset_panel::{PresetPanel, PresetRequest};
use crate::session::{EditorSession, SavePoint};
use crate::settings_bridge::{BridgeEvent, SettingsBridge};
use crate::view_coordinator::{ActiveView, ViewCoordinator, initial_view};

/// Everything the app needs from the command line and config file.
pub struct AppOptions {
    /// Loaded configuration.
    pub config: AppConfig,
    /// Backend all requests go to.
    pub backend: Arc<dyn Backend>,
    /// Shown in the header, usually the base URL.
    pub backend_label: String,
    /// Whether `backend` is the in-process demo.
    pub offline: bool,
    /// Startup view preference.
    pub view_preference: ViewPreference,
    /// Touch override; `None` keeps the config value.
    pub touch: Option<bool>,
}

/// Main application state.
pub struct GlitchlampApp {
    session: EditorSession,
    /// Decided on the first frame, once the screen size is known.
    views: Option<ViewCoordinator>,
    view_preference: ViewPreference,
    touch: bool,

    bridge: SettingsBridge,
    presets: PresetPanel,
    monitor: MonitorPanel,
    theme: Theme,
    intervals: PollIntervals,

    backend_label: String,
    offline: bool,
    loading: bool,
    settings_loaded: bool,
    load_error: Option<String>,
    /// Chain state the save in flight was issued from.
    saving: Option<SavePoint>,
    last_refresh: f64,

    playback_draft: Option<PlaybackSettings>,
    playback_errors: Vec<String>,
}

impl GlitchlampApp {
    /// Create a new application instance and start loading settings.
    pub fn new(cc: &eframe::CreationContext<'_>, options: AppOptions) -> Self {
        let theme = Theme::default();
        theme.apply(&cc.egui_ctx);
        Self::with_context(&cc.egui_ctx, options)
    }

    /// App bound to `ctx` without a native window.
    pub fn with_context(ctx: &Context, options: AppOptions) -> Self {
        let touch = options.touch.or(options.config.touch).unwrap_or(false);
        let capability = InputCapabilityProfile::from_hints(&DisplayHints::new(touch, None));
        let registry = glitchlamp_core::EffectRegistry::new();
        let mut bridge = SettingsBridge::new(Arc::clone(&options.backend), ctx.clone());
        bridge.load_session();

        tracing::info!(backend = %options.backend_label, offline = options.offline, "editor starting");
        Self {
            session: EditorSession::new(registry, capability),
            views: None,
            view_preference: options.view_preference,
            touch,
            bridge,
            presets: PresetPanel::new(),
            monitor: MonitorPanel::new(options.config.poll.clone()),
            theme: Theme::default(),
            intervals: options.config.poll,
            backend_label: options.backend_label,
            offline: options.offline,
            loading: true,
            settings_loaded: false,
            load_error: None,
            saving: None,
            last_refresh: 0.0,
            playback_draft: None,
            playback_errors: Vec::new(),
        }
    }

    /// The editing session.
    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    /// Mutable editing session.
    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    /// The showing view, once decided.
    pub fn active_view(&self) -> Option<ActiveView> {
        self.views.as_ref().map(ViewCoordinator::active)
    }

    /// Whether backend settings have been loaded.
    pub fn is_loaded(&self) -> bool {
        self.settings_loaded
    }

    /// Whether a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Switches to the other view. No-op before the first frame.
    pub fn toggle_view(&mut self) {
        if let Some(views) = &mut self.views {
            views.toggle(&mut self.session);
        }
    }

    /// Draws one frame.
    pub fn ui(&mut self, ctx: &Context) {
        let now = ctx.input(|i| i.time);
        self.session.set_time(now);
        self.decide_view(ctx);

        for event in self.bridge.poll() {
            self.handle(event);
        }
        self.refresh_if_idle(ctx, now);

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.session.wiring.cancel();
        }

        TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(4.0);
            self.render_header(ui);
            ui.add_space(4.0);
        });
        TopBottomPanel::bottom("status").show(ctx, |ui| self.render_status_bar(ui));

        CentralPanel::default().show(ctx, |ui| {
            if self.loading && !self.settings_loaded {
                ui.centered_and_justified(|ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading settings…");
                    });
                });
                return;
            }
            if let Some(views) = &mut self.views {
                views.show(ui, &mut self.session, &self.theme);
            }
        });

        for request in self.presets.show(ctx) {
            self.preset_request(request);
        }
        for request in self.monitor.show(ctx, &mut self.session.monitor, &self.theme) {
            match request {
                MonitorRequest::SetPaused(paused) => self.bridge.set_paused(paused),
                MonitorRequest::GeneratePreview => self.bridge.generate_preview(),
            }
        }
        self.render_playback_window(ctx);

        self.session.toasts.show(ctx, &self.theme);
    }

    fn decide_view(&mut self, ctx: &Context) {
        if self.views.is_some() {
            return;
        }
        let hints = DisplayHints::new(self.touch, Some(ctx.screen_rect().width()));
        self.session.capability = InputCapabilityProfile::from_hints(&hints);
        self.views = Some(ViewCoordinator::new(initial_view(self.view_preference, &hints)));
    }

    /// Re-reads settings periodically, but only while nothing is unsaved so
    /// a refresh never clobbers local edits.
    fn refresh_if_idle(&mut self, ctx: &Context, now: f64) {
        let every = PollIntervals::duration(self.intervals.settings_ms);
        if !self.settings_loaded {
            return;
        }
        ctx.request_repaint_after(every);
        if self.session.is_dirty()
            || self.saving.is_some()
            || now - self.last_refresh < every.as_secs_f64()
        {
            return;
        }
        self.last_refresh = now;
        self.bridge.refresh_settings(self.session.registry.clone());
    }

    fn handle(&mut self, event: BridgeEvent) {
        let now = self.session.time();
        match event {
            BridgeEvent::SessionLoaded {
                registry,
                catalog_error,
                session,
            } => {
                self.loading = false;
                self.session.set_registry(registry);
                if let Some(e) = catalog_error {
                    self.session
                        .warn(format!("Effect catalog unavailable ({e}); only sources can be added"));
                }
                match session {
                    Ok((settings, chain)) => {
                        tracing::info!(nodes = chain.len(), "settings loaded");
                        self.session.replace_settings(settings, chain);
                        self.settings_loaded = true;
                        self.load_error = None;
                        self.last_refresh = now;
                    }
                    Err(e) => {
                        tracing::error!("failed to load settings: {e}");
                        self.session
                            .toasts
                            .persistent_error(format!("Could not load settings: {e}"), now);
                        self.load_error = Some(e.to_string());
                    }
                }
            }
            BridgeEvent::SettingsRefreshed { settings, chain } => {
                if self.session.is_dirty() || self.saving.is_some() {
                    return;
                }
                if chain != self.session.chain {
                    tracing::info!("settings changed on the backend");
                    self.session.replace_settings(settings, chain);
                    self.session.notify("Chain updated from the appliance");
                } else if settings != self.session.settings {
                    self.session.settings = settings;
                }
            }
            BridgeEvent::RefreshFailed(e) => tracing::debug!("settings refresh failed: {e}"),
            BridgeEvent::SettingsSaved(result) => {
                let issued = self.saving.take();
                match result {
                    Ok(stored) => {
                        self.last_refresh = now;
                        // A chain loaded since is still unsaved; keep its base settings.
                        if issued.is_none_or(|point| self.session.mark_saved_at(point)) {
                            self.session.settings = stored;
                        }
                        self.session.notify("Settings saved");
                    }
                    Err(e) => {
                        tracing::error!("failed to save settings: {e}");
                        self.session.error(format!("Save failed: {e}"));
                    }
                }
            }
            BridgeEvent::PresetsListed(result) => {
                self.presets.set_listing(result.map_err(|e| e.to_string()));
            }
            BridgeEvent::PresetLoaded { name, chain } => match chain {
                Ok(chain) => {
                    self.session.replace_chain(chain);
                    self.session
                        .notify(format!("Loaded preset '{name}'. Save to apply it"));
                }
                Err(e) if e.is_not_found() => {
                    self.session.warn(format!("Preset '{name}' no longer exists"));
                    self.bridge.list_presets();
                }
                Err(e) => self.session.error(format!("Could not load '{name}': {e}")),
            },
            BridgeEvent::PresetSaved { name, result } => {
                self.preset_outcome(result, format!("Saved preset '{name}'"));
            }
            BridgeEvent::PresetDeleted { name, result } => {
                self.preset_outcome(result, format!("Deleted preset '{name}'"));
            }
            BridgeEvent::PresetImported(result) => match result {
                Ok(name) => {
                    self.session.notify(format!("Imported preset '{name}'"));
                    self.bridge.list_presets();
                }
                Err(e) => self.session.error(format!("Import failed: {e}")),
            },
            BridgeEvent::PresetExported { path, result } => match result {
                Ok(()) => self.session.notify(format!("Exported to {}", path.display())),
                Err(e) => self.session.error(format!("Export failed: {e}")),
            },
            BridgeEvent::GenerationToggled { paused, result } => match result {
                Ok(()) if paused => self.session.notify("Generation paused"),
                Ok(()) => self.session.notify("Generation resumed"),
                Err(e) => self.session.error(format!("Could not change generation: {e}")),
            },
            BridgeEvent::PreviewRequested(result) => match result {
                Ok(()) => self.session.notify("Preview requested"),
                Err(e) => self.session.error(format!("Preview failed: {e}")),
            },
        }
    }

    fn preset_outcome(&mut self, result: Result<(), glitchlamp_client::ClientError>, done: String) {
        match result {
            Ok(()) => {
                self.session.notify(done);
                self.bridge.list_presets();
            }
            Err(e) => self.session.error(format!("Preset request failed: {e}")),
        }
    }

    fn preset_request(&mut self, request: PresetRequest) {
        match request {
            PresetRequest::Refresh => self.bridge.list_presets(),
            PresetRequest::Load(name) => {
                self.bridge.load_preset(name, self.session.registry.clone());
            }
            PresetRequest::Save(name) => {
                let preset = Preset::from_chain(name, &self.session.chain);
                self.bridge.save_preset(preset);
            }
            PresetRequest::Delete(name) => self.bridge.delete_preset(name),
            PresetRequest::Import(path) => self.bridge.import_preset(path),
            PresetRequest::Export(name, path) => self.bridge.export_preset(name, path),
        }
    }

    /// Stores the chain into settings and posts them.
    fn save(&mut self) {
        let problems = validate_chain(&self.session.chain.to_wire(), &self.session.registry);
        for problem in &problems {
            tracing::warn!("saving chain with problem: {problem}");
        }
        match self.session.settings_to_save() {
            Ok(settings) => {
                self.saving = Some(self.session.save_point());
                self.bridge.save_settings(settings);
            }
            Err(e) => self.session.error(format!("Cannot save: {e}")),
        }
    }

    fn reload(&mut self) {
        self.loading = true;
        self.saving = None;
        self.bridge.load_session();
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.heading(RichText::new("GLITCHLAMP").color(self.theme.accent).strong());
            ui.add_space(12.0);

            let other = self.active_view().map(ActiveView::toggled);
            if let Some(other) = other
                && ui.button(format!("{} view", other.label())).clicked()
            {
                self.toggle_view();
            }

            // Collect entries first; adding borrows the session mutably.
            let entries: Vec<(String, String)> = self
                .session
                .registry
                .iter()
                .map(|d| (d.name.clone(), d.description.clone()))
                .collect();
            let mut chosen = None;
            ui.menu_button("Add effect", |ui| {
                egui::ScrollArea::vertical().max_height(360.0).show(ui, |ui| {
                    for (name, description) in &entries {
                        let button = ui.button(name);
                        let button = if description.is_empty() {
                            button
                        } else {
                            button.on_hover_text(description)
                        };
                        if button.clicked() {
                            chosen = Some(name.clone());
                            ui.close_menu();
                        }
                    }
                });
            });
            if let Some(effect) = chosen {
                self.session.add_node(&effect);
            }

            let can_save = self.settings_loaded && self.session.is_dirty() && self.saving.is_none();
            if ui.add_enabled(can_save, egui::Button::new("Save")).clicked() {
                self.save();
            }
            if ui.add_enabled(!self.loading, egui::Button::new("Reload")).clicked() {
                self.reload();
            }
            if ui.button("Presets").clicked()
                && let Some(request) = self.presets.toggle()
            {
                self.preset_request(request);
            }
            if ui.button("Monitor").clicked() {
                if self.monitor.is_open() {
                    self.monitor.close(&mut self.session.monitor);
                } else {
                    self.monitor.open(self.bridge.backend(), ui.ctx());
                }
            }
            if ui
                .add_enabled(self.settings_loaded, egui::Button::new("Playback…"))
                .clicked()
            {
                self.playback_draft = Some(self.session.playback());
                self.playback_errors.clear();
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let color = if self.load_error.is_some() {
                    Color32::from_rgb(200, 80, 80)
                } else if self.offline {
                    Color32::from_rgb(220, 180, 60)
                } else {
                    Color32::from_rgb(80, 200, 80)
                };
                ui.label(RichText::new("●").color(color).size(12.0));
                let label = if self.offline {
                    "offline demo".to_owned()
                } else {
                    self.backend_label.clone()
                };
                ui.label(RichText::new(label).color(self.theme.text_secondary).small());
            });
        });
    }

    fn render_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let count = self.session.chain.len();
            ui.label(format!("{count} node{}", if count == 1 { "" } else { "s" }));
            if self.session.is_dirty() && self.settings_loaded {
                ui.separator();
                ui.label(RichText::new("unsaved").color(self.theme.toast_warning));
            }
            if self.saving.is_some() {
                ui.separator();
                ui.label("saving…");
            }
            if self.monitor.is_open() {
                ui.separator();
                ui.label(self.session.monitor.summary());
            }
            if self.active_view() == Some(ActiveView::Canvas) {
                ui.separator();
                ui.label(format!("{:.0}%", self.session.viewport.zoom_percent()));
            }
            if let Some(error) = &self.load_error {
                ui.separator();
                ui.label(
                    RichText::new(format!("load failed: {error}"))
                        .color(Color32::from_rgb(220, 100, 100))
                        .small(),
                );
            }
        });
    }

    fn render_playback_window(&mut self, ctx: &Context) {
        let Some(draft) = &mut self.playback_draft else {
            return;
        };
        let mut open = true;
        let mut apply = false;
        let mut cancel = false;
        egui::Window::new("Playback")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("playback-grid").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
                    ui.label("Clip length (s)");
                    ui.add(DragValue::new(&mut draft.duration).range(1..=600));
                    ui.end_row();

                    ui.label("Length variation (s)");
                    ui.add(DragValue::new(&mut draft.duration_variation).range(0..=600));
                    ui.end_row();

                    ui.label("Video quality");
                    choice(ui, "playback-quality", &mut draft.video_quality, &VIDEO_QUALITIES);
                    ui.end_row();

                    ui.label("Playback speed");
                    ui.add(Slider::new(&mut draft.playback_speed, 0.25..=4.0).step_by(0.05));
                    ui.end_row();

                    ui.label("Screen orientation");
                    choice(ui, "playback-orientation", &mut draft.screen_orientation, &SCREEN_ORIENTATIONS);
                    ui.end_row();

                    ui.label("Replays before next");
                    ui.add(DragValue::new(&mut draft.min_replays_before_next).range(0..=100));
                    ui.end_row();

                    ui.label("Batch size");
                    ui.add_enabled(draft.batch_mode, DragValue::new(&mut draft.batch_size).range(1..=100));
                    ui.end_row();

                    ui.label("Batch interval (s)");
                    ui.add_enabled(
                        draft.batch_mode,
                        DragValue::new(&mut draft.batch_interval).range(0..=3600),
                    );
                    ui.end_row();
                });

                ui.checkbox(&mut draft.include_reels, "Include reels");
                ui.checkbox(&mut draft.randomize_effects, "Randomize effects");
                ui.checkbox(&mut draft.random_preset_mode, "Random preset mode");
                ui.checkbox(&mut draft.freestyle_mode, "Freestyle mode");
                ui.checkbox(&mut draft.batch_mode, "Batch mode");

                for error in &self.playback_errors {
                    ui.label(RichText::new(error).color(self.theme.toast_warning).small());
                }
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    cancel = ui.button("Cancel").clicked();
                    apply = ui.button("Apply").clicked();
                });
            });

        if apply {
            let errors = validate_playback(draft);
            if errors.is_empty() {
                let draft = draft.clone();
                self.session.apply_playback(&draft);
                self.playback_draft = None;
                self.playback_errors.clear();
            } else {
                self.playback_errors = errors.iter().map(ToString::to_string).collect();
            }
        } else if cancel || !open {
            self.playback_draft = None;
            self.playback_errors.clear();
        }
    }

    /// Stops background polling.
    pub fn shutdown(&mut self) {
        self.monitor.close(&mut self.session.monitor);
    }
}

fn choice(ui: &mut egui::Ui, id: &str, value: &mut String, options: &[&str]) {
    ComboBox::from_id_salt(id)
        .selected_text(value.as_str())
        .show_ui(ui, |ui| {
            for option in options {
                if ui.selectable_label(value.as_str() == *option, *option).clicked() {
                    *value = (*option).to_owned();
                }
            }
        });
}

impl eframe::App for GlitchlampApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.shutdown();
        tracing::info!("editor closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glitchlamp_client::MemoryBackend;
    use std::time::{Duration, Instant};

    fn app_with(backend: MemoryBackend) -> (Context, GlitchlampApp) {
        let ctx = Context::default();
        let app = GlitchlampApp::with_context(
            &ctx,
            AppOptions {
                config: AppConfig::default(),
                backend: Arc::new(backend),
                backend_label: "memory".into(),
                offline: true,
                view_preference: ViewPreference::List,
                touch: None,
            },
        );
        (ctx, app)
    }

    fn pump_until(ctx: &Context, app: &mut GlitchlampApp, done: impl Fn(&GlitchlampApp) -> bool) {
        let started = Instant::now();
        while !done(app) && started.elapsed() < Duration::from_secs(5) {
            let input = egui::RawInput {
                time: Some(started.elapsed().as_secs_f64()),
                ..Default::default()
            };
            let _ = ctx.run(input, |ctx| app.ui(ctx));
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn preset_load_during_save_still_finishes_the_save() {
        let backend = MemoryBackend::demo();
        backend
            .save_preset(&Preset::new("p", vec![]))
            .expect("memory backend stores presets");
        let (ctx, mut app) = app_with(backend);
        pump_until(&ctx, &mut app, GlitchlampApp::is_loaded);
        assert!(app.is_loaded());

        app.session_mut().add_node("glitch").expect("glitch is in the demo catalog");
        app.save();
        assert!(app.saving.is_some());
        app.preset_request(PresetRequest::Load("p".into()));

        pump_until(&ctx, &mut app, |app| app.saving.is_none() && app.session.chain.len() == 1);
        assert!(app.saving.is_none(), "save reply was dropped");
        // The loaded preset replaced the chain after the save was issued.
        assert_eq!(app.session().chain.len(), 1);
        assert!(app.session().is_dirty());
    }
}
