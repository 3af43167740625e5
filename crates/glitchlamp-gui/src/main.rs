//! Glitchlamp GUI - effect chain editor for the glitchlamp appliance.

use clap::Parser;
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;

use glitchlamp_client::{Backend, HttpBackend, MemoryBackend};
use glitchlamp_config::{AppConfig, BACKEND_ENV, ViewPreference};
use glitchlamp_gui::{AppOptions, GlitchlampApp};

/// Glitchlamp effect chain editor.
#[derive(Parser, Debug)]
#[command(name = "glitchlamp-gui")]
#[command(about = "Node-graph effect chain editor for the glitchlamp appliance")]
#[command(version)]
struct Args {
    /// Backend base URL (overrides config and GLITCHLAMP_BACKEND)
    #[arg(long)]
    backend: Option<String>,

    /// Startup view: auto, list or canvas
    #[arg(long)]
    view: Option<ViewPreference>,

    /// Treat the display as a touch screen
    #[arg(long)]
    touch: bool,

    /// Run against the built-in demo backend instead of the network
    #[arg(long)]
    offline: bool,

    /// Config file (default: the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    use tracing_subscriber::EnvFilter;

    // Initialize tracing subscriber; bridge legacy log:: calls from eframe/egui
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    tracing_log::LogTracer::init().ok();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)
            .unwrap_or_else(|e| {
                tracing::warn!("ignoring config file: {e}");
                AppConfig::default()
            })
            .with_env_override(std::env::var(BACKEND_ENV).ok()),
        None => AppConfig::load_default(),
    };
    if let Some(url) = args.backend.clone() {
        config.backend_url = url;
    }
    if args.touch {
        config.touch = Some(true);
    }
    let view_preference = args.view.unwrap_or(config.default_view);

    let (backend, offline): (Arc<dyn Backend>, bool) = if args.offline {
        (Arc::new(MemoryBackend::demo()), true)
    } else {
        match HttpBackend::from_config(&config) {
            Ok(http) => (Arc::new(http), false),
            Err(e) => {
                tracing::warn!("backend unusable ({e}), running offline");
                (Arc::new(MemoryBackend::demo()), true)
            }
        }
    };

    tracing::info!("Starting Glitchlamp GUI");
    tracing::info!(backend = %config.backend_base(), offline, "backend");
    tracing::info!(view = %view_preference, "view preference");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([360.0, 480.0])
            .with_title("Glitchlamp"),
        ..Default::default()
    };

    let app_options = AppOptions {
        backend_label: config.backend_base().to_owned(),
        view_preference,
        touch: args.touch.then_some(true),
        backend,
        offline,
        config,
    };
    eframe::run_native(
        "Glitchlamp",
        options,
        Box::new(move |cc| Ok(Box::new(GlitchlampApp::new(cc, app_options)))),
    )
}
