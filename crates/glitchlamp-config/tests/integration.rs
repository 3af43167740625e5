//! Integration tests for glitchlamp-config.
//!
//! These tests verify settings and preset flows end to end, including file I/O.

use glitchlamp_config::{
    AppConfig, ConfigError, Preset, Settings, delete_preset, list_presets, load_preset,
    validate_chain,
};
use glitchlamp_core::{ChainModel, EffectDefinition, EffectRegistry, OptionValue, SOURCE};
use tempfile::TempDir;

fn registry() -> EffectRegistry {
    EffectRegistry::from_catalog(vec![
        EffectDefinition::new("glitch", ""),
        EffectDefinition::new("mix", "").file_level(),
    ])
}

fn sample_chain() -> ChainModel {
    let registry = registry();
    let mut chain = ChainModel::new();
    let src = chain.add_node(SOURCE, None).unwrap();
    let glitch = chain.add_node("glitch", None).unwrap();
    let mix = chain.add_node("mix", None).unwrap();
    chain.connect(&registry, &src, &glitch, 0).unwrap();
    chain.connect(&registry, &glitch, &mix, 0).unwrap();
    chain.connect(&registry, &src, &mix, 1).unwrap();
    chain
        .set_option(&glitch, "intensity", OptionValue::Int(55))
        .unwrap();
    chain
}

/// Save, list, load and delete presets in a directory.
#[test]
fn test_preset_directory_lifecycle() {
    let dir = TempDir::new().unwrap();
    let chain = sample_chain();

    Preset::from_chain("crunchy", &chain)
        .save_to_dir(dir.path())
        .unwrap();
    Preset::from_chain("alpha", &chain)
        .save_to_dir(dir.path())
        .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    assert_eq!(list_presets(dir.path()).unwrap(), vec!["alpha", "crunchy"]);

    let loaded = load_preset(dir.path(), "crunchy").unwrap();
    assert_eq!(loaded.name, "crunchy");
    assert_eq!(loaded.to_chain(), chain);

    delete_preset(dir.path(), "crunchy").unwrap();
    assert!(matches!(
        load_preset(dir.path(), "crunchy"),
        Err(ConfigError::PresetNotFound(_))
    ));
    assert!(matches!(
        delete_preset(dir.path(), "crunchy"),
        Err(ConfigError::PresetNotFound(_))
    ));
}

/// A missing directory lists as empty.
#[test]
fn test_list_missing_directory() {
    let dir = TempDir::new().unwrap();
    assert!(list_presets(dir.path().join("nope")).unwrap().is_empty());
}

/// Preset files are bare node arrays, importable by name from the file stem.
#[test]
fn test_preset_file_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("export").join("vhs.json");
    Preset::from_chain("vhs", &sample_chain()).save(&path).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(raw.is_array());
    assert_eq!(raw[1]["options"]["intensity"], serde_json::json!(55));

    let imported = Preset::load(&path).unwrap();
    assert_eq!(imported.name, "vhs");
    assert!(validate_chain(&imported.nodes, &registry()).is_empty());
}

/// Malformed preset files surface as JSON errors.
#[test]
fn test_malformed_preset_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "[{").unwrap();
    assert!(matches!(Preset::load(&path), Err(ConfigError::Json(_))));
}

/// Settings round-trip through JSON with the chain intact.
#[test]
fn test_settings_chain_roundtrip() {
    let registry = registry();
    let chain = sample_chain();
    let mut settings = Settings::default();
    settings.store_chain(&chain).unwrap();

    let json = settings.to_json_pretty().unwrap();
    let reloaded = Settings::from_json(&json).unwrap();
    assert_eq!(reloaded.chain(&registry), chain);
    assert_eq!(reloaded.active_effects, vec!["glitch", "mix"]);
}

/// App config saves and reloads.
#[test]
fn test_app_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("glitchlamp").join("config.toml");

    assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());

    let mut config = AppConfig::default();
    config.backend_url = "http://lamp.local:8000".into();
    config.poll.workers_ms = 4000;
    config.save(&path).unwrap();

    assert_eq!(AppConfig::load(&path).unwrap(), config);
}
