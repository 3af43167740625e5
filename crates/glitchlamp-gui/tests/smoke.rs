//! Headless smoke tests: the whole editor against the in-process backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glitchlamp_client::{Backend, MemoryBackend};
use glitchlamp_config::{AppConfig, ViewPreference};
use glitchlamp_gui::{ActiveView, AppOptions, GlitchlampApp};

struct Harness {
    ctx: egui::Context,
    app: GlitchlampApp,
    started: Instant,
}

impl Harness {
    fn new(view: ViewPreference) -> Self {
        Self::with_config(view, AppConfig::default())
    }

    fn with_config(view: ViewPreference, config: AppConfig) -> Self {
        let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::demo());
        let ctx = egui::Context::default();
        let app = GlitchlampApp::with_context(
            &ctx,
            AppOptions {
                config,
                backend,
                backend_label: "memory".into(),
                offline: true,
                view_preference: view,
                touch: None,
            },
        );
        Self {
            ctx,
            app,
            started: Instant::now(),
        }
    }

    fn frame(&mut self) {
        let input = egui::RawInput {
            time: Some(self.started.elapsed().as_secs_f64()),
            ..Default::default()
        };
        let app = &mut self.app;
        let _ = self.ctx.run(input, |ctx| app.ui(ctx));
    }

    fn until_loaded(&mut self) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !self.app.is_loaded() && Instant::now() < deadline {
            self.frame();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(self.app.is_loaded(), "settings never loaded");
    }
}

#[test]
fn loads_settings_and_renders_both_views() {
    let mut h = Harness::new(ViewPreference::Canvas);
    h.until_loaded();
    assert_eq!(h.app.active_view(), Some(ActiveView::Canvas));
    assert_eq!(h.app.session().chain.nodes()[0].name, "source");
    assert!(!h.app.session().is_dirty());

    let revision = h.app.session().chain.revision();
    h.frame();
    h.app.toggle_view();
    assert_eq!(h.app.active_view(), Some(ActiveView::List));
    h.frame();
    h.frame();
    assert_eq!(h.app.session().chain.revision(), revision);
}

#[test]
fn explicit_list_preference_is_honored() {
    let mut h = Harness::new(ViewPreference::List);
    h.frame();
    assert_eq!(h.app.active_view(), Some(ActiveView::List));
}

#[test]
fn refresh_never_clobbers_unsaved_edits() {
    let mut config = AppConfig::default();
    config.poll.settings_ms = 100;
    let mut h = Harness::with_config(ViewPreference::List, config);
    h.until_loaded();
    let added = h.app.session_mut().add_node("glitch").expect("glitch is in the demo catalog");
    assert!(h.app.session().is_dirty());

    // Several refresh intervals.
    let deadline = Instant::now() + Duration::from_millis(400);
    while Instant::now() < deadline {
        h.frame();
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(h.app.session().chain.contains(&added));
    assert!(h.app.session().is_dirty());
}
