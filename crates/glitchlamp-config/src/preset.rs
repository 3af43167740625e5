//! Named chain snapshots.
//!
//! A preset file is the bare node array, named by its file stem:
//!
//! ```json
//! [
//!   {"id": "node-1", "name": "source", "options": {}, "inputs": [], "position": {"x": 40, "y": 40}},
//!   {"id": "node-2", "name": "glitch", "options": {"intensity": 40}, "inputs": ["node-1"], "position": {"x": 300, "y": 40}}
//! ]
//! ```
//!
//! Loading replaces the live chain wholesale; saving serializes the live
//! chain. The files share their shape with the backend's preset store, so a
//! file exported from one appliance imports on another.

use serde_json::Value;
use std::path::{Path, PathBuf};

use glitchlamp_core::{ChainModel, WireNode, normalize_value};

use crate::error::ConfigError;

/// File extension of preset files.
pub const PRESET_EXTENSION: &str = "json";

/// A named chain snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    /// Preset name (file stem).
    pub name: String,
    /// Nodes in sequence order.
    pub nodes: Vec<WireNode>,
}

impl Preset {
    /// Creates a preset from wire nodes.
    pub fn new(name: impl Into<String>, nodes: Vec<WireNode>) -> Self {
        Self {
            name: name.into(),
            nodes,
        }
    }

    /// Snapshot of a live chain.
    pub fn from_chain(name: impl Into<String>, chain: &ChainModel) -> Self {
        Self::new(name, chain.to_wire())
    }

    /// Chain built from this snapshot.
    pub fn to_chain(&self) -> ChainModel {
        ChainModel::from_wire(self.nodes.clone())
    }

    /// Parses a preset document, repairing malformed entries.
    pub fn from_value(name: impl Into<String>, value: &Value) -> Self {
        Self::new(name, normalize_value(value).to_wire())
    }

    /// Parses preset JSON text.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(name, &value))
    }

    /// The node array as JSON.
    pub fn to_value(&self) -> Result<Value, ConfigError> {
        Ok(serde_json::to_value(&self.nodes)?)
    }

    /// The node array as pretty-printed JSON text.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self.nodes)?)
    }

    /// Loads a preset file; the name comes from the file stem.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let name = name_from_path(path)
            .ok_or_else(|| ConfigError::InvalidPresetName(path.display().to_string()))?;
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let preset = Self::from_json(name, &content)?;
        tracing::info!(name = %preset.name, nodes = preset.nodes.len(), "preset loaded");
        Ok(preset)
    }

    /// Writes the preset to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_json_pretty()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::info!(name = %self.name, path = %path.display(), "preset saved");
        Ok(())
    }

    /// Writes the preset as `<dir>/<name>.json` and returns the path.
    pub fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
        let path = preset_path(dir, &self.name)?;
        self.save(&path)?;
        Ok(path)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the preset has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Preset name from a file path (its stem).
pub fn name_from_path(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_owned)
        .filter(|s| validate_name(s).is_ok())
}

/// Checks that `name` is usable as a file stem.
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    let trimmed = name.trim();
    let bad = trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        Err(ConfigError::InvalidPresetName(name.to_owned()))
    } else {
        Ok(())
    }
}

/// Path of preset `name` inside `dir`.
pub fn preset_path(dir: impl AsRef<Path>, name: &str) -> Result<PathBuf, ConfigError> {
    validate_name(name)?;
    Ok(dir.as_ref().join(format!("{name}.{PRESET_EXTENSION}")))
}

/// Names of the presets stored in `dir`, sorted. A missing directory is empty.
pub fn list_presets(dir: impl AsRef<Path>) -> Result<Vec<String>, ConfigError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::read_dir(dir, e))?;

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(PRESET_EXTENSION))
        })
        .filter_map(name_from_path)
        .collect();
    names.sort();
    Ok(names)
}

/// Loads preset `name` from `dir`.
pub fn load_preset(dir: impl AsRef<Path>, name: &str) -> Result<Preset, ConfigError> {
    let path = preset_path(dir, name)?;
    if !path.is_file() {
        return Err(ConfigError::PresetNotFound(name.to_owned()));
    }
    Preset::load(path)
}

/// Deletes preset `name` from `dir`.
pub fn delete_preset(dir: impl AsRef<Path>, name: &str) -> Result<(), ConfigError> {
    let path = preset_path(dir, name)?;
    if !path.is_file() {
        return Err(ConfigError::PresetNotFound(name.to_owned()));
    }
    std::fs::remove_file(&path).map_err(|e| ConfigError::write_file(&path, e))?;
    tracing::info!(name, "preset deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_from_paths() {
        assert_eq!(name_from_path("/tmp/vhs melt.json"), Some("vhs melt".into()));
        assert_eq!(name_from_path("noext"), Some("noext".into()));
        assert_eq!(name_from_path("/"), None);
    }

    #[test]
    fn invalid_names_are_rejected() {
        for name in ["", " ", "..", "a/b", "a\\b", " padded"] {
            assert!(validate_name(name).is_err(), "{name:?} accepted");
        }
        assert!(validate_name("datamosh-heavy").is_ok());
        assert!(preset_path("/p", "../etc").is_err());
    }

    #[test]
    fn from_json_repairs_entries() {
        let preset = Preset::from_json("p", r#"["glitch", {"name": "blur", "inputs": ["node-1"]}]"#)
            .unwrap();
        assert_eq!(preset.len(), 2);
        assert_eq!(preset.nodes[1].inputs, vec![Some("node-1".into())]);
    }

    #[test]
    fn non_array_json_is_an_empty_preset() {
        let preset = Preset::from_value("p", &json!({"nodes": []}));
        assert!(preset.is_empty());
    }

    #[test]
    fn to_value_is_bare_array() {
        let mut chain = ChainModel::new();
        chain.add_node("glitch", None).unwrap();
        let value = Preset::from_chain("p", &chain).to_value().unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["name"], json!("glitch"));
    }
}
