//! Preset management commands.
//!
//! Presets live on the backend; `import`/`export` move them to and from
//! local JSON files, and `validate` checks either kind against the catalog.

use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use glitchlamp_client::{Backend, RetryPolicy, bridge};
use glitchlamp_config::{
    PRESET_EXTENSION, Preset, list_presets as list_local, name_from_path, paths, validate_chain,
    validate_name,
};
use glitchlamp_core::WireNode;

use super::common;

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List presets stored on the backend
    List {
        /// List presets in the local presets directory instead
        #[arg(long)]
        local: bool,
    },

    /// Show the nodes of a preset
    Show {
        /// Preset name
        name: String,
    },

    /// Save a chain as a preset
    Save {
        /// Name for the new preset
        name: String,

        /// Preset JSON file to take the nodes from (default: the current settings chain)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Overwrite if the preset already exists
        #[arg(long)]
        force: bool,
    },

    /// Delete a preset
    Delete {
        /// Preset name to delete
        name: String,
    },

    /// Upload a preset file
    Import {
        /// Preset JSON file; its stem becomes the preset name
        file: PathBuf,
    },

    /// Download a preset into a file
    Export {
        /// Preset name
        name: String,

        /// Destination (default: the local presets directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a preset file or stored preset against the catalog
    Validate {
        /// Preset file path or preset name
        preset: String,
    },
}

pub fn run(backend: &dyn Backend, args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List { local } => list_presets(backend, local),
        PresetsCommand::Show { name } => show_preset(backend, &name),
        PresetsCommand::Save { name, file, force } => {
            save_preset(backend, &name, file.as_deref(), force)
        }
        PresetsCommand::Delete { name } => {
            backend.delete_preset(&name)?;
            println!("Deleted preset '{name}'");
            Ok(())
        }
        PresetsCommand::Import { file } => import_preset(backend, &file),
        PresetsCommand::Export { name, output } => export_preset(backend, &name, output),
        PresetsCommand::Validate { preset } => validate_preset(backend, &preset),
    }
}

fn list_presets(backend: &dyn Backend, local: bool) -> anyhow::Result<()> {
    let (title, names) = if local {
        let dir = paths::user_presets_dir();
        ("Local Presets:", list_local(&dir)?)
    } else {
        ("Presets:", backend.presets()?)
    };
    println!("{title}");
    println!("{}", "=".repeat(title.len()));
    if names.is_empty() {
        println!("  (none)");
        println!();
        println!("  Create one with: glitchlamp presets save <name>");
    }
    for name in names {
        println!("  {name}");
    }
    Ok(())
}

fn show_preset(backend: &dyn Backend, name: &str) -> anyhow::Result<()> {
    let preset = backend
        .preset(name)
        .with_context(|| format!("Preset '{name}' not found. Use 'glitchlamp presets list' to see available presets."))?;

    println!("Preset: {}", preset.name);
    println!("{}", "=".repeat(8 + preset.name.len()));
    println!();
    println!("Nodes ({}):", preset.len());
    common::print_nodes(&preset.nodes);
    Ok(())
}

fn save_preset(
    backend: &dyn Backend,
    name: &str,
    file: Option<&Path>,
    force: bool,
) -> anyhow::Result<()> {
    validate_name(name)?;
    if !force && backend.presets()?.iter().any(|n| n == name) {
        anyhow::bail!("Preset '{}' already exists. Use --force to overwrite.", name);
    }

    let preset = match file {
        Some(path) => {
            let loaded = Preset::load(path)?;
            Preset::new(name, loaded.nodes)
        }
        None => {
            let registry = common::registry(backend)?;
            let (_, chain) = bridge::load_chain(backend, &registry, RetryPolicy::default())?;
            Preset::from_chain(name, &chain)
        }
    };
    backend.save_preset(&preset)?;
    println!("Saved preset '{}' ({} nodes)", name, preset.len());
    Ok(())
}

fn import_preset(backend: &dyn Backend, file: &Path) -> anyhow::Result<()> {
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("'{}' is not a preset file name", file.display()))?;
    let contents =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let stored = backend.import_preset(file_name, &contents)?;
    println!("Imported preset '{stored}'");
    Ok(())
}

fn export_preset(backend: &dyn Backend, name: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match output {
        Some(path) => path,
        None => paths::ensure_user_presets_dir()?.join(format!("{name}.{PRESET_EXTENSION}")),
    };
    let contents = backend.export_preset(name)?;
    std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Exported '{}' to {}", name, path.display());
    Ok(())
}

fn validate_preset(backend: &dyn Backend, preset: &str) -> anyhow::Result<()> {
    let path = Path::new(preset);
    let preset = if path.is_file() {
        read_as_written(path)?
    } else {
        backend.preset(preset)?
    };
    let registry = common::registry(backend)?;
    let errors = validate_chain(&preset.nodes, &registry);
    if errors.is_empty() {
        println!("Preset '{}' is valid ({} nodes)", preset.name, preset.len());
        return Ok(());
    }
    for error in &errors {
        println!("  {error}");
    }
    anyhow::bail!("Preset '{}' has {} problem(s)", preset.name, errors.len())
}

/// Reads a preset file without the repairs loading applies, so validation
/// sees dangling inputs and duplicate ids as written. Files that are not in
/// canonical form are validated after repair.
fn read_as_written(path: &Path) -> anyhow::Result<Preset> {
    let name = name_from_path(path)
        .ok_or_else(|| anyhow::anyhow!("'{}' is not a preset file name", path.display()))?;
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    match serde_json::from_str::<Vec<WireNode>>(&content) {
        Ok(nodes) => Ok(Preset::new(name, nodes)),
        Err(e) => {
            tracing::warn!("{} is not in canonical form ({e}); validating the repaired chain", path.display());
            Ok(Preset::from_json(name, &content)?)
        }
    }
}
