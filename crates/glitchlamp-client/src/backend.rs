//! The backend REST surface the editor consumes.
//!
//! [`Backend`] is object-safe so the GUI and CLI hold an
//! `Arc<dyn Backend>` and never care whether it is the appliance over HTTP
//! ([`HttpBackend`](crate::HttpBackend)) or the in-process
//! [`MemoryBackend`] used for offline editing and tests.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use glitchlamp_config::{Preset, Settings, validate_name};
use glitchlamp_core::EffectDefinition;

use crate::error::ClientError;
use crate::status::{GenerationState, GenerationStatus, LogEntry, Progress, WorkerInfo};

/// Operations offered by the appliance backend.
pub trait Backend: Send + Sync {
    /// `GET /effects`
    fn effects(&self) -> Result<Vec<EffectDefinition>, ClientError>;

    /// `GET /presets`
    fn presets(&self) -> Result<Vec<String>, ClientError>;

    /// `GET /presets/{name}`
    fn preset(&self, name: &str) -> Result<Preset, ClientError>;

    /// `POST /presets/{name}`
    fn save_preset(&self, preset: &Preset) -> Result<(), ClientError>;

    /// `DELETE /presets/{name}`
    fn delete_preset(&self, name: &str) -> Result<(), ClientError>;

    /// `GET /presets/export/{name}`: the preset file contents.
    fn export_preset(&self, name: &str) -> Result<String, ClientError>;

    /// `POST /presets/import`: uploads a preset file. Returns the stored name.
    fn import_preset(&self, file_name: &str, contents: &[u8]) -> Result<String, ClientError>;

    /// `GET /settings`
    fn settings(&self) -> Result<Settings, ClientError>;

    /// `POST /settings`. Returns the settings as stored.
    fn save_settings(&self, settings: &Settings) -> Result<Settings, ClientError>;

    /// `GET /generation/status`
    fn generation_status(&self) -> Result<GenerationStatus, ClientError>;

    /// `POST /generation/pause`
    fn pause_generation(&self) -> Result<(), ClientError>;

    /// `POST /generation/resume`
    fn resume_generation(&self) -> Result<(), ClientError>;

    /// `GET /progress`
    fn progress(&self) -> Result<Progress, ClientError>;

    /// `GET /preview/progress`
    fn preview_progress(&self) -> Result<Progress, ClientError>;

    /// `POST /preview/generate`
    fn generate_preview(&self) -> Result<(), ClientError>;

    /// `GET /workers`
    fn workers(&self) -> Result<Vec<WorkerInfo>, ClientError>;

    /// `GET /logs`
    fn logs(&self) -> Result<Vec<LogEntry>, ClientError>;
}

/// Effect catalog bundled for offline editing.
pub fn demo_catalog() -> Vec<EffectDefinition> {
    match serde_json::from_str(include_str!("../data/demo_catalog.json")) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("bundled demo catalog is malformed: {e}");
            Vec::new()
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    catalog: Vec<EffectDefinition>,
    presets: BTreeMap<String, Preset>,
    settings: Settings,
    status: GenerationStatus,
    preview: Progress,
    logs: Vec<LogEntry>,
}

/// In-process backend holding everything in memory.
///
/// Backs the editor's offline mode. [`fail_next`](Self::fail_next) makes the
/// next requests fail with a transient error, for exercising retry paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    failures: AtomicU32,
}

impl MemoryBackend {
    /// Backend with the given catalog and default settings.
    pub fn new(catalog: Vec<EffectDefinition>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                catalog,
                ..MemoryState::default()
            }),
            failures: AtomicU32::new(0),
        }
    }

    /// Backend with the bundled demo catalog.
    pub fn demo() -> Self {
        Self::new(demo_catalog())
    }

    /// Replaces the stored settings.
    pub fn with_settings(self, settings: Settings) -> Self {
        self.state.lock().settings = settings;
        self
    }

    /// Makes the next `count` requests fail with a transient error.
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Replaces the generation status reported to pollers.
    pub fn set_status(&self, status: GenerationStatus) {
        self.state.lock().status = status;
    }

    /// Appends a log line.
    pub fn push_log(&self, entry: LogEntry) {
        self.state.lock().logs.push(entry);
    }

    fn gate(&self, what: &str) -> Result<(), ClientError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ClientError::Transport {
                url: format!("memory://{what}"),
                message: "simulated failure".to_owned(),
            });
        }
        Ok(())
    }

    fn not_found(name: &str) -> ClientError {
        ClientError::Status {
            status: 404,
            message: format!("Preset not found: {name}"),
        }
    }
}

impl Backend for MemoryBackend {
    fn effects(&self) -> Result<Vec<EffectDefinition>, ClientError> {
        self.gate("effects")?;
        Ok(self.state.lock().catalog.clone())
    }

    fn presets(&self) -> Result<Vec<String>, ClientError> {
        self.gate("presets")?;
        Ok(self.state.lock().presets.keys().cloned().collect())
    }

    fn preset(&self, name: &str) -> Result<Preset, ClientError> {
        self.gate("presets/{name}")?;
        self.state
            .lock()
            .presets
            .get(name)
            .cloned()
            .ok_or_else(|| Self::not_found(name))
    }

    fn save_preset(&self, preset: &Preset) -> Result<(), ClientError> {
        self.gate("presets/{name}")?;
        validate_name(&preset.name)?;
        self.state
            .lock()
            .presets
            .insert(preset.name.clone(), preset.clone());
        Ok(())
    }

    fn delete_preset(&self, name: &str) -> Result<(), ClientError> {
        self.gate("presets/{name}")?;
        self.state
            .lock()
            .presets
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(name))
    }

    fn export_preset(&self, name: &str) -> Result<String, ClientError> {
        let preset = self.preset(name)?;
        Ok(preset.to_json_pretty()?)
    }

    fn import_preset(&self, file_name: &str, contents: &[u8]) -> Result<String, ClientError> {
        self.gate("presets/import")?;
        let name = file_name
            .strip_suffix(".json")
            .ok_or_else(|| ClientError::Status {
                status: 400,
                message: "preset file must be .json".to_owned(),
            })?;
        let text = String::from_utf8_lossy(contents);
        let preset = Preset::from_json(name, &text)?;
        self.save_preset(&preset)?;
        Ok(preset.name)
    }

    fn settings(&self) -> Result<Settings, ClientError> {
        self.gate("settings")?;
        Ok(self.state.lock().settings.clone())
    }

    fn save_settings(&self, settings: &Settings) -> Result<Settings, ClientError> {
        self.gate("settings")?;
        self.state.lock().settings = settings.clone();
        Ok(settings.clone())
    }

    fn generation_status(&self) -> Result<GenerationStatus, ClientError> {
        self.gate("generation/status")?;
        Ok(self.state.lock().status.clone())
    }

    fn pause_generation(&self) -> Result<(), ClientError> {
        self.gate("generation/pause")?;
        let mut state = self.state.lock();
        state.status.paused = true;
        state.status.state = GenerationState::Paused;
        Ok(())
    }

    fn resume_generation(&self) -> Result<(), ClientError> {
        self.gate("generation/resume")?;
        let mut state = self.state.lock();
        state.status.paused = false;
        state.status.state = GenerationState::Idle;
        Ok(())
    }

    fn progress(&self) -> Result<Progress, ClientError> {
        self.gate("progress")?;
        let state = self.state.lock();
        Ok(Progress {
            stage: String::from(state.status.state.clone()),
            percent: 0.0,
            message: state.status.message.clone(),
            current_node: state.status.current_node.clone(),
        })
    }

    fn preview_progress(&self) -> Result<Progress, ClientError> {
        self.gate("preview/progress")?;
        Ok(self.state.lock().preview.clone())
    }

    fn generate_preview(&self) -> Result<(), ClientError> {
        self.gate("preview/generate")?;
        let mut state = self.state.lock();
        state.preview = Progress {
            stage: "ready".to_owned(),
            percent: 100.0,
            message: Some("preview rendering is not available offline".to_owned()),
            current_node: None,
        };
        Ok(())
    }

    fn workers(&self) -> Result<Vec<WorkerInfo>, ClientError> {
        self.gate("workers")?;
        Ok(Vec::new())
    }

    fn logs(&self) -> Result<Vec<LogEntry>, ClientError> {
        self.gate("logs")?;
        Ok(self.state.lock().logs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_catalog_parses() {
        let catalog = demo_catalog();
        assert!(catalog.len() >= 10);
        assert!(catalog.iter().any(|d| d.name == "mix"));
        assert!(catalog.iter().all(|d| d.name != "source"));
    }

    #[test]
    fn presets_crud() {
        let backend = MemoryBackend::demo();
        backend.save_preset(&Preset::new("b", vec![])).unwrap();
        backend.save_preset(&Preset::new("a", vec![])).unwrap();
        assert_eq!(backend.presets().unwrap(), vec!["a", "b"]);
        backend.delete_preset("a").unwrap();
        assert!(backend.delete_preset("a").unwrap_err().is_not_found());
        assert!(backend.save_preset(&Preset::new("../x", vec![])).is_err());
    }

    #[test]
    fn import_takes_name_from_file() {
        let backend = MemoryBackend::demo();
        let name = backend
            .import_preset("melt.json", br#"[{"id": "node-1", "name": "glitch"}]"#)
            .unwrap();
        assert_eq!(name, "melt");
        assert_eq!(backend.preset("melt").unwrap().len(), 1);
        assert!(backend.import_preset("melt.txt", b"[]").is_err());
    }

    #[test]
    fn simulated_failures_are_transient_and_counted() {
        let backend = MemoryBackend::demo();
        backend.fail_next(2);
        assert!(backend.settings().unwrap_err().is_transient());
        assert!(backend.settings().is_err());
        assert!(backend.settings().is_ok());
    }

    #[test]
    fn pause_and_resume() {
        let backend = MemoryBackend::demo();
        backend.pause_generation().unwrap();
        assert!(backend.generation_status().unwrap().paused);
        backend.resume_generation().unwrap();
        assert!(!backend.generation_status().unwrap().paused);
    }
}
