//! Local configuration of the editor and CLI.
//!
//! Stored as TOML in [`app_config_path`](crate::paths::app_config_path):
//!
//! ```toml
//! backend_url = "http://glitchlamp.local:8000"
//! request_timeout_secs = 10
//! default_view = "auto"
//!
//! [poll]
//! status_ms = 1000
//! progress_ms = 500
//! workers_ms = 2000
//! logs_ms = 2000
//! ```
//!
//! Every field is optional. `GLITCHLAMP_BACKEND` overrides `backend_url`,
//! and command-line flags override both.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable that overrides the backend URL.
pub const BACKEND_ENV: &str = "GLITCHLAMP_BACKEND";

/// Backend URL used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Which chain editor view to open with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewPreference {
    /// Decide from the display (touch or narrow → list).
    #[default]
    Auto,
    /// Always start in the list view.
    List,
    /// Always start in the canvas view.
    Canvas,
}

impl FromStr for ViewPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ViewPreference::Auto),
            "list" => Ok(ViewPreference::List),
            "canvas" => Ok(ViewPreference::Canvas),
            other => Err(format!("unknown view '{other}' (expected auto, list or canvas)")),
        }
    }
}

impl fmt::Display for ViewPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewPreference::Auto => "auto",
            ViewPreference::List => "list",
            ViewPreference::Canvas => "canvas",
        })
    }
}

/// Refresh intervals of the polling panels, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollIntervals {
    /// Generation status.
    pub status_ms: u64,
    /// Download/processing progress.
    pub progress_ms: u64,
    /// Worker list.
    pub workers_ms: u64,
    /// Backend log tail.
    pub logs_ms: u64,
    /// Settings refresh.
    pub settings_ms: u64,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            status_ms: 1000,
            progress_ms: 500,
            workers_ms: 2000,
            logs_ms: 2000,
            settings_ms: 10_000,
        }
    }
}

impl PollIntervals {
    /// Interval as a [`Duration`], never shorter than 100 ms.
    pub fn duration(ms: u64) -> Duration {
        Duration::from_millis(ms.max(100))
    }
}

/// Editor and CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the appliance backend.
    pub backend_url: String,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Initial chain view.
    pub default_view: ViewPreference,
    /// Force touch mode regardless of detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub touch: Option<bool>,
    /// Poll intervals.
    pub poll: PollIntervals,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            request_timeout_secs: 10,
            default_view: ViewPreference::Auto,
            touch: None,
            poll: PollIntervals::default(),
        }
    }
}

impl AppConfig {
    /// Loads a config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Loads the config from the default location, then applies the
    /// environment override. Errors fall back to defaults with a warning.
    pub fn load_default() -> Self {
        let path = crate::paths::app_config_path();
        let config = Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("ignoring config file: {e}");
            Self::default()
        });
        config.with_env_override(std::env::var(BACKEND_ENV).ok())
    }

    /// Parses TOML text.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serializes to TOML text.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes the config file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            crate::paths::ensure_dir(parent)?;
        }
        std::fs::write(path, self.to_toml()?).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Replaces the backend URL with `value` when it is set and non-blank.
    pub fn with_env_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty()) {
            self.backend_url = url;
        }
        self
    }

    /// Backend URL without a trailing slash.
    pub fn backend_base(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            "backend_url = \"http://lamp:9000/\"\ndefault_view = \"canvas\"\n[poll]\nlogs_ms = 5000\n",
        )
        .unwrap();
        assert_eq!(config.backend_base(), "http://lamp:9000");
        assert_eq!(config.default_view, ViewPreference::Canvas);
        assert_eq!(config.poll.logs_ms, 5000);
        assert_eq!(config.poll.status_ms, 1000);
        assert_eq!(config.request_timeout_secs, 10);
    }

    #[test]
    fn env_override_ignores_blank() {
        let config = AppConfig::default().with_env_override(Some("  ".into()));
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        let config = AppConfig::default().with_env_override(Some("http://x:1".into()));
        assert_eq!(config.backend_url, "http://x:1");
    }

    #[test]
    fn view_preference_parses() {
        assert_eq!("LIST".parse::<ViewPreference>(), Ok(ViewPreference::List));
        assert!("grid".parse::<ViewPreference>().is_err());
        assert_eq!(ViewPreference::Canvas.to_string(), "canvas");
    }

    #[test]
    fn poll_interval_floor() {
        assert_eq!(PollIntervals::duration(0), Duration::from_millis(100));
        assert_eq!(PollIntervals::duration(750), Duration::from_millis(750));
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(matches!(
            AppConfig::from_toml("backend_url = 3"),
            Err(ConfigError::TomlParse(_))
        ));
    }
}
