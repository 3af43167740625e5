//! Settings, presets, and configuration for the glitchlamp editor.
//!
//! This crate maps the editor's chain model to the documents the appliance
//! backend persists, and owns the local configuration of the editor and CLI.
//!
//! # Features
//!
//! - **Settings**: the backend settings document, with the chain read from
//!   `effect_chain` or the legacy `active_effects` pair
//! - **Presets**: named chain snapshots stored as JSON node arrays
//! - **Validation**: structural checks on chains loaded from elsewhere
//! - **App config**: backend URL, poll intervals and default view in TOML
//! - **Paths**: platform-specific config and preset directories
//!
//! # Example
//!
//! ```rust,no_run
//! use glitchlamp_config::{Preset, Settings, paths};
//! use glitchlamp_core::EffectRegistry;
//!
//! let registry = EffectRegistry::new();
//! let settings = Settings::from_json(r#"{"active_effects": ["glitch"]}"#).unwrap();
//! let chain = settings.chain(&registry);
//!
//! let preset = Preset::from_chain("startup", &chain);
//! preset.save_to_dir(paths::user_presets_dir()).unwrap();
//! ```

mod app_config;
mod error;
mod preset;
mod settings;

/// Platform-specific paths for configuration and presets.
pub mod paths;

/// Chain and settings validation.
pub mod validation;

pub use app_config::{AppConfig, BACKEND_ENV, DEFAULT_BACKEND_URL, PollIntervals, ViewPreference};
pub use error::ConfigError;
pub use preset::{
    PRESET_EXTENSION, Preset, delete_preset, list_presets, load_preset, name_from_path,
    preset_path, validate_name,
};
pub use settings::{PlaybackSettings, SCREEN_ORIENTATIONS, Settings, VIDEO_QUALITIES};
pub use validation::{ValidationError, ValidationResult, validate_chain, validate_playback};
