//! Backend-persisted settings (`GET`/`POST /settings`).
//!
//! [`Settings`] mirrors the backend's JSON document. Fields the editor does
//! not know about are kept in [`Settings::extra`] and written back untouched.
//!
//! The effect chain lives in `effect_chain`. Older backends only stored a flat
//! `active_effects` list plus per-effect `effect_options`; that pair is still
//! read when `effect_chain` is empty and echoed on save, but the chain is
//! always authoritative.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use glitchlamp_core::{ChainModel, EffectRegistry, OptionMap, normalize};

use crate::error::ConfigError;

/// Video quality choices offered by the backend downloader.
pub const VIDEO_QUALITIES: [&str; 4] = ["best", "1080p", "720p", "480p"];

/// Screen orientation choices of the player.
pub const SCREEN_ORIENTATIONS: [&str; 5] = [
    "auto",
    "portrait",
    "landscape",
    "portrait-left",
    "portrait-right",
];

/// The persisted settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Clip length in seconds.
    pub duration: u32,
    /// Random variation applied to `duration`, in seconds.
    pub duration_variation: u32,
    /// Search keywords for the YouTube source.
    pub keywords: String,
    /// Playlist used instead of keywords, if set.
    pub playlist_url: Option<String>,
    /// Uploaded file used by `source-local`.
    pub local_file: Option<String>,
    /// Legacy flat effect list.
    pub active_effects: Vec<String>,
    /// Legacy per-effect options, keyed by effect name.
    pub effect_options: BTreeMap<String, OptionMap>,
    /// Node chain in wire format. Kept raw so malformed entries survive until
    /// normalisation.
    pub effect_chain: Vec<Value>,
    /// Randomize effect options on every clip.
    pub randomize_effects: bool,
    /// Pick a random preset for every clip.
    pub random_preset_mode: bool,
    /// Let the backend build chains freely.
    pub freestyle_mode: bool,
    /// Replays of a clip before moving on.
    pub min_replays_before_next: u32,
    /// Playback rate multiplier.
    pub playback_speed: f64,
    /// Downloader quality (see [`VIDEO_QUALITIES`]).
    pub video_quality: String,
    /// Include short-form reels in search results.
    pub include_reels: bool,
    /// Player orientation (see [`SCREEN_ORIENTATIONS`]).
    pub screen_orientation: String,
    /// Generate clips in batches instead of one by one.
    pub batch_mode: bool,
    /// Clips per batch.
    pub batch_size: u32,
    /// Seconds between batches.
    pub batch_interval: u32,
    /// Fields this editor does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            duration: 5,
            duration_variation: 2,
            keywords: "glitch art, datamosh, vhs aesthetic".to_owned(),
            playlist_url: None,
            local_file: None,
            active_effects: vec!["glitch".to_owned()],
            effect_options: BTreeMap::new(),
            effect_chain: Vec::new(),
            randomize_effects: false,
            random_preset_mode: false,
            freestyle_mode: false,
            min_replays_before_next: 1,
            playback_speed: 1.0,
            video_quality: "best".to_owned(),
            include_reels: true,
            screen_orientation: "auto".to_owned(),
            batch_mode: false,
            batch_size: 5,
            batch_interval: 60,
            extra: Map::new(),
        }
    }
}

impl Settings {
    /// Parses a settings document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the settings document.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds the editor chain from these settings.
    ///
    /// `effect_chain` wins when non-empty; otherwise a linear chain is built
    /// from the legacy `active_effects`/`effect_options` pair. Either way a
    /// default source is prepended when the chain has none.
    pub fn chain(&self, registry: &EffectRegistry) -> ChainModel {
        let mut chain = if self.effect_chain.is_empty() {
            self.legacy_chain(registry)
        } else {
            normalize(&self.effect_chain)
        };
        chain.ensure_source(registry);
        tracing::info!(nodes = chain.len(), "chain loaded from settings");
        chain
    }

    fn legacy_chain(&self, registry: &EffectRegistry) -> ChainModel {
        let mut chain = ChainModel::new();
        let mut previous = None;
        for name in &self.active_effects {
            let id = match chain.add_node(name, None) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(effect = %name, "skipping legacy effect: {e}");
                    continue;
                }
            };
            if let Some(options) = self.effect_options.get(name) {
                for (key, value) in options {
                    if let Err(e) = chain.set_option(&id, key, value.clone()) {
                        tracing::warn!(effect = %name, option = %key, "legacy option dropped: {e}");
                    }
                }
            }
            if let Some(prev) = &previous
                && registry.max_inputs(name) > 0
                && let Err(e) = chain.connect(registry, prev, &id, 0)
            {
                tracing::debug!("legacy link skipped: {e}");
            }
            previous = Some(id);
        }
        chain
    }

    /// Writes the chain into `effect_chain` and echoes the legacy fields.
    ///
    /// Only the model is read; nothing here depends on UI state.
    pub fn store_chain(&mut self, chain: &ChainModel) -> Result<(), ConfigError> {
        self.effect_chain = chain
            .to_wire()
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()?;

        self.active_effects.clear();
        self.effect_options.clear();
        for node in chain.iter().filter(|n| !is_builtin_source(&n.name)) {
            self.active_effects.push(node.name.clone());
            if !node.options.is_empty() {
                self.effect_options
                    .entry(node.name.clone())
                    .or_default()
                    .extend(node.options.clone());
            }
        }
        Ok(())
    }

    /// The global playback fields.
    pub fn playback(&self) -> PlaybackSettings {
        PlaybackSettings {
            duration: self.duration,
            duration_variation: self.duration_variation,
            video_quality: self.video_quality.clone(),
            playback_speed: self.playback_speed,
            include_reels: self.include_reels,
            screen_orientation: self.screen_orientation.clone(),
            randomize_effects: self.randomize_effects,
            random_preset_mode: self.random_preset_mode,
            freestyle_mode: self.freestyle_mode,
            min_replays_before_next: self.min_replays_before_next,
            batch_mode: self.batch_mode,
            batch_size: self.batch_size,
            batch_interval: self.batch_interval,
        }
    }

    /// Copies the global playback fields back.
    pub fn apply_playback(&mut self, playback: &PlaybackSettings) {
        self.duration = playback.duration;
        self.duration_variation = playback.duration_variation;
        self.video_quality.clone_from(&playback.video_quality);
        self.playback_speed = playback.playback_speed;
        self.include_reels = playback.include_reels;
        self.screen_orientation.clone_from(&playback.screen_orientation);
        self.randomize_effects = playback.randomize_effects;
        self.random_preset_mode = playback.random_preset_mode;
        self.freestyle_mode = playback.freestyle_mode;
        self.min_replays_before_next = playback.min_replays_before_next;
        self.batch_mode = playback.batch_mode;
        self.batch_size = playback.batch_size;
        self.batch_interval = playback.batch_interval;
    }
}

fn is_builtin_source(name: &str) -> bool {
    name == glitchlamp_core::SOURCE || name == glitchlamp_core::SOURCE_LOCAL
}

/// Global playback settings edited next to the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    /// Clip length in seconds.
    pub duration: u32,
    /// Random variation of the clip length.
    pub duration_variation: u32,
    /// Downloader quality.
    pub video_quality: String,
    /// Playback rate multiplier.
    pub playback_speed: f64,
    /// Include reels.
    pub include_reels: bool,
    /// Player orientation.
    pub screen_orientation: String,
    /// Randomize options per clip.
    pub randomize_effects: bool,
    /// Random preset per clip.
    pub random_preset_mode: bool,
    /// Freestyle chains.
    pub freestyle_mode: bool,
    /// Replays before the next clip.
    pub min_replays_before_next: u32,
    /// Batch generation.
    pub batch_mode: bool,
    /// Clips per batch.
    pub batch_size: u32,
    /// Seconds between batches.
    pub batch_interval: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Settings::default().playback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glitchlamp_core::{EffectDefinition, NodeId, OptionValue, SOURCE};
    use serde_json::json;

    fn registry() -> EffectRegistry {
        EffectRegistry::from_catalog(vec![
            EffectDefinition::new("glitch", ""),
            EffectDefinition::new("blur", ""),
        ])
    }

    #[test]
    fn defaults_match_backend() {
        let s = Settings::from_json("{}").unwrap();
        assert_eq!(s.duration, 5);
        assert_eq!(s.duration_variation, 2);
        assert_eq!(s.active_effects, vec!["glitch"]);
        assert_eq!(s.min_replays_before_next, 1);
        assert_eq!(s.video_quality, "best");
        assert!(s.include_reels);
        assert_eq!(s.screen_orientation, "auto");
    }

    #[test]
    fn unknown_fields_roundtrip() {
        let s = Settings::from_json(r#"{"duration": 9, "theme": "dark"}"#).unwrap();
        assert_eq!(s.extra.get("theme"), Some(&json!("dark")));
        let back: Value = serde_json::from_str(&s.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back["theme"], json!("dark"));
        assert_eq!(back["duration"], json!(9));
    }

    #[test]
    fn effect_chain_is_preferred() {
        let s: Settings = serde_json::from_value(json!({
            "active_effects": ["blur"],
            "effect_chain": [
                {"id": "node-1", "name": "source"},
                {"id": "node-2", "name": "glitch", "inputs": ["node-1"]}
            ]
        }))
        .unwrap();
        let chain = s.chain(&registry());
        let names: Vec<_> = chain.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["source", "glitch"]);
    }

    #[test]
    fn legacy_fields_build_linear_chain() {
        let s: Settings = serde_json::from_value(json!({
            "active_effects": ["glitch", "blur"],
            "effect_options": {"glitch": {"intensity": 40}}
        }))
        .unwrap();
        let chain = s.chain(&registry());
        let names: Vec<_> = chain.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec![SOURCE, "glitch", "blur"]);

        let glitch = &chain.nodes()[1];
        let blur = &chain.nodes()[2];
        assert_eq!(glitch.options["intensity"], OptionValue::Int(40));
        assert_eq!(glitch.inputs, vec![Some(chain.nodes()[0].id.clone())]);
        assert_eq!(blur.inputs, vec![Some(glitch.id.clone())]);
    }

    #[test]
    fn store_chain_writes_chain_and_echo() {
        let reg = registry();
        let mut chain = ChainModel::new();
        let src = chain.add_node(SOURCE, None).unwrap();
        let g = chain.add_node("glitch", None).unwrap();
        chain.connect(&reg, &src, &g, 0).unwrap();
        chain.set_option(&g, "intensity", OptionValue::Int(7)).unwrap();

        let mut s = Settings::default();
        s.store_chain(&chain).unwrap();
        assert_eq!(s.effect_chain.len(), 2);
        assert_eq!(s.effect_chain[1]["inputs"], json!([src.as_str()]));
        assert_eq!(s.active_effects, vec!["glitch"]);
        assert_eq!(s.effect_options["glitch"]["intensity"], OptionValue::Int(7));

        let reloaded = s.chain(&reg);
        assert_eq!(reloaded, chain);
        assert!(reloaded.contains(&NodeId::from(g.as_str())));
    }

    #[test]
    fn playback_view_roundtrip() {
        let mut s = Settings::default();
        let mut p = s.playback();
        p.playback_speed = 0.5;
        p.batch_mode = true;
        p.video_quality = "720p".into();
        s.apply_playback(&p);
        assert_eq!(s.playback(), p);
        assert_eq!(s.video_quality, "720p");
    }
}
