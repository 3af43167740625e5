//! Platform-specific paths for configuration and local presets.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/glitchlamp/` (Linux), `~/Library/Application Support/glitchlamp/` (macOS), `%APPDATA%\glitchlamp\` (Windows)
//! - **App config file**: `<user config>/config.toml`
//! - **Local presets**: `<user config>/presets/`, used by CLI import/export
//! - **Exports**: the user's download directory, else `<user config>/exports/`

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "glitchlamp";

/// Subdirectory name for presets.
const PRESETS_SUBDIR: &str = "presets";

/// File name of the app configuration.
const CONFIG_FILE: &str = "config.toml";

/// Returns the user-specific configuration directory.
///
/// Falls back to the working directory if the platform has no config dir.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the app configuration file.
pub fn app_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

/// Directory for presets kept on this machine.
pub fn user_presets_dir() -> PathBuf {
    user_config_dir().join(PRESETS_SUBDIR)
}

/// Default directory for exported preset files.
pub fn export_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| user_config_dir().join("exports"))
}

/// Creates `dir` and its parents if missing, and returns it.
pub fn ensure_dir(dir: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }
    Ok(dir.to_path_buf())
}

/// Ensures the local presets directory exists.
pub fn ensure_user_presets_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_presets_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_share_app_dir() {
        let base = user_config_dir();
        assert!(base.ends_with(APP_NAME));
        assert_eq!(app_config_path(), base.join("config.toml"));
        assert_eq!(user_presets_dir(), base.join("presets"));
    }

    #[test]
    fn ensure_dir_creates_nested() {
        let tmp = tempfile::TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");
        let created = ensure_dir(&nested).unwrap();
        assert!(created.is_dir());
        // Idempotent.
        ensure_dir(&nested).unwrap();
    }
}
