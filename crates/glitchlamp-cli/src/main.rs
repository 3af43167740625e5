//! Glitchlamp CLI - inspect and manage the appliance from a terminal.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glitchlamp")]
#[command(author, version, about = "Glitchlamp appliance CLI", long_about = None)]
struct Cli {
    #[command(flatten)]
    backend: commands::common::BackendArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the effect catalog, or describe one effect
    Effects(commands::effects::EffectsArgs),

    /// Manage presets on the backend
    Presets(commands::presets::PresetsArgs),

    /// Inspect the stored settings
    Settings(commands::settings::SettingsArgs),

    /// Show generation status, optionally pausing or resuming it
    Status(commands::status::StatusArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let backend = cli.backend.connect()?;

    match cli.command {
        Commands::Effects(args) => commands::effects::run(backend.as_ref(), args),
        Commands::Presets(args) => commands::presets::run(backend.as_ref(), args),
        Commands::Settings(args) => commands::settings::run(backend.as_ref(), args),
        Commands::Status(args) => commands::status::run(backend.as_ref(), args),
    }
}
