//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

use glitchlamp_client::{Backend, HttpBackend, MemoryBackend};
use glitchlamp_config::{AppConfig, BACKEND_ENV};
use glitchlamp_core::{EffectRegistry, WireNode};

/// Backend selection flags, accepted by every subcommand.
#[derive(Args)]
pub struct BackendArgs {
    /// Backend base URL (overrides config and GLITCHLAMP_BACKEND)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Use the built-in demo backend; nothing is persisted
    #[arg(long, global = true)]
    offline: bool,

    /// Config file (default: the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

impl BackendArgs {
    /// Builds the backend these flags select.
    pub fn connect(&self) -> anyhow::Result<Box<dyn Backend>> {
        if self.offline {
            tracing::info!("using the offline demo backend");
            return Ok(Box::new(MemoryBackend::demo()));
        }
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?
                .with_env_override(std::env::var(BACKEND_ENV).ok()),
            None => AppConfig::load_default(),
        };
        if let Some(url) = &self.backend {
            config.backend_url.clone_from(url);
        }
        let backend = HttpBackend::from_config(&config)
            .with_context(|| format!("invalid backend URL '{}'", config.backend_url))?;
        tracing::debug!(url = %backend.base_url(), "using backend");
        Ok(Box::new(backend))
    }
}

/// Catalog as a registry; unavailable catalogs fail the command.
pub fn registry(backend: &dyn Backend) -> anyhow::Result<EffectRegistry> {
    glitchlamp_client::bridge::load_registry(backend).context("failed to load the effect catalog")
}

/// Prints nodes in sequence order with their wiring and options.
pub fn print_nodes(nodes: &[WireNode]) {
    if nodes.is_empty() {
        println!("  (empty chain)");
        return;
    }
    for (i, node) in nodes.iter().enumerate() {
        let title = match &node.label {
            Some(label) => format!("{label} ({})", node.name),
            None => node.name.clone(),
        };
        println!("  {}. [{}] {}", i + 1, node.id, title);

        for (port, input) in node.inputs.iter().enumerate() {
            match input {
                Some(from) => println!("      in{port} <- {from}"),
                None => println!("      in{port} <- (open)"),
            }
        }
        for (key, value) in &node.options {
            println!("      {key} = {value}");
        }
    }
}
