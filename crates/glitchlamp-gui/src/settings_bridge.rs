//! Background backend requests for the editor.
//!
//! Every request runs on its own short-lived thread and answers over a
//! crossbeam channel that the UI drains once per frame. Requests that
//! replace the chain share one token channel, so when two loads overlap
//! only the one issued last is applied, whichever resolves first. Saves
//! have their own channel: a load never swallows a save's reply.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use glitchlamp_client::{Backend, ClientError, RequestToken, RequestTokens, RetryPolicy, bridge};
use glitchlamp_config::{ConfigError, Preset, Settings};
use glitchlamp_core::{ChainModel, EffectRegistry};

/// Token channels. Requests on the same channel supersede each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Anything that replaces the chain.
    Chain,
    /// Settings saves.
    Save,
    /// Preset list refreshes.
    PresetList,
    /// Background settings refresh. Any load or save supersedes it.
    Refresh,
}

/// Errors of file transfers (preset import/export).
#[derive(Debug, Error)]
pub enum TransferError {
    /// Reading the file to import failed.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file name cannot name a preset.
    #[error("'{0}' is not a preset file name")]
    FileName(PathBuf),

    /// Writing the exported file failed.
    #[error(transparent)]
    Write(#[from] ConfigError),

    /// The backend request failed.
    #[error(transparent)]
    Backend(#[from] ClientError),
}

/// Result of a finished request.
#[derive(Debug)]
pub enum BridgeEvent {
    /// Catalog and settings loaded at startup or on reload.
    SessionLoaded {
        /// Registry from the catalog, or built-ins only when it failed.
        registry: EffectRegistry,
        /// Catalog failure, if any.
        catalog_error: Option<String>,
        /// Settings and the chain built from them.
        session: Result<(Settings, ChainModel), ClientError>,
    },
    /// Periodic settings refresh.
    SettingsRefreshed {
        /// Settings as stored on the backend.
        settings: Settings,
        /// The chain they describe.
        chain: ChainModel,
    },
    /// A periodic refresh failed.
    RefreshFailed(ClientError),
    /// Settings posted; carries what the backend stored.
    SettingsSaved(Result<Settings, ClientError>),
    /// Preset names.
    PresetsListed(Result<Vec<String>, ClientError>),
    /// A preset was loaded as a fresh chain.
    PresetLoaded {
        /// Preset name.
        name: String,
        /// The chain.
        chain: Result<ChainModel, ClientError>,
    },
    /// A preset was saved.
    PresetSaved {
        /// Preset name.
        name: String,
        /// Outcome.
        result: Result<(), ClientError>,
    },
    /// A preset was deleted.
    PresetDeleted {
        /// Preset name.
        name: String,
        /// Outcome.
        result: Result<(), ClientError>,
    },
    /// A preset file was uploaded; carries the stored name.
    PresetImported(Result<String, TransferError>),
    /// A preset was written to disk.
    PresetExported {
        /// Destination file.
        path: PathBuf,
        /// Outcome.
        result: Result<(), TransferError>,
    },
    /// Generation was paused (`true`) or resumed.
    GenerationToggled {
        /// Requested state.
        paused: bool,
        /// Outcome.
        result: Result<(), ClientError>,
    },
    /// A preview render was requested.
    PreviewRequested(Result<(), ClientError>),
}

struct Reply {
    token: Option<RequestToken<RequestKind>>,
    event: BridgeEvent,
}

/// Issues backend requests off the UI thread and hands back their results.
pub struct SettingsBridge {
    backend: Arc<dyn Backend>,
    tokens: RequestTokens<RequestKind>,
    tx: Sender<Reply>,
    rx: Receiver<Reply>,
    repaint: egui::Context,
    retry: RetryPolicy,
}

impl SettingsBridge {
    /// Bridge over `backend`; `repaint` is woken when a reply arrives.
    pub fn new(backend: Arc<dyn Backend>, repaint: egui::Context) -> Self {
        let (tx, rx) = unbounded();
        Self {
            backend,
            tokens: RequestTokens::new(),
            tx,
            rx,
            repaint,
            retry: RetryPolicy::default(),
        }
    }

    /// Overrides the settings-load retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The backend requests go to.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    fn spawn<F>(&mut self, what: &'static str, kind: Option<RequestKind>, work: F)
    where
        F: FnOnce(&dyn Backend) -> BridgeEvent + Send + 'static,
    {
        if matches!(kind, Some(RequestKind::Chain | RequestKind::Save)) {
            self.tokens.invalidate(RequestKind::Refresh);
        }
        let token = kind.map(|k| self.tokens.issue(k));
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("request-{what}"))
            .spawn(move || {
                let event = work(backend.as_ref());
                // Receiver gone means the app is shutting down.
                let _ = tx.send(Reply { token, event });
                repaint.request_repaint();
            });
        if let Err(e) = spawned {
            tracing::error!(request = what, "failed to spawn request thread: {e}");
        }
    }

    /// Loads the catalog, then settings with retry.
    pub fn load_session(&mut self) {
        let retry = self.retry;
        self.spawn("session", Some(RequestKind::Chain), move |backend| {
            let (registry, catalog_error) = match bridge::load_registry(backend) {
                Ok(registry) => (registry, None),
                Err(e) => {
                    tracing::warn!("effect catalog unavailable: {e}");
                    (EffectRegistry::new(), Some(e.to_string()))
                }
            };
            let session = bridge::load_chain(backend, &registry, retry);
            BridgeEvent::SessionLoaded {
                registry,
                catalog_error,
                session,
            }
        });
    }

    /// Re-reads settings without retry. Failures are only logged; the
    /// next refresh tries again.
    pub fn refresh_settings(&mut self, registry: EffectRegistry) {
        self.spawn("refresh", Some(RequestKind::Refresh), move |backend| {
            match backend.settings() {
                Ok(settings) => {
                    let chain = settings.chain(&registry);
                    BridgeEvent::SettingsRefreshed { settings, chain }
                }
                Err(e) => BridgeEvent::RefreshFailed(e),
            }
        });
    }

    /// Posts `settings`.
    pub fn save_settings(&mut self, settings: Settings) {
        self.spawn("save-settings", Some(RequestKind::Save), move |backend| {
            BridgeEvent::SettingsSaved(backend.save_settings(&settings))
        });
    }

    /// Refreshes the preset list.
    pub fn list_presets(&mut self) {
        self.spawn("presets", Some(RequestKind::PresetList), |backend| {
            BridgeEvent::PresetsListed(backend.presets())
        });
    }

    /// Loads preset `name` as the new chain.
    pub fn load_preset(&mut self, name: String, registry: EffectRegistry) {
        self.spawn("load-preset", Some(RequestKind::Chain), move |backend| {
            let chain = bridge::load_preset(backend, &registry, &name);
            BridgeEvent::PresetLoaded { name, chain }
        });
    }

    /// Saves `preset`.
    pub fn save_preset(&mut self, preset: Preset) {
        self.spawn("save-preset", None, move |backend| {
            let result = backend.save_preset(&preset);
            BridgeEvent::PresetSaved {
                name: preset.name,
                result,
            }
        });
    }

    /// Deletes preset `name`.
    pub fn delete_preset(&mut self, name: String) {
        self.spawn("delete-preset", None, move |backend| {
            let result = backend.delete_preset(&name);
            BridgeEvent::PresetDeleted { name, result }
        });
    }

    /// Uploads the preset file at `path`.
    pub fn import_preset(&mut self, path: PathBuf) {
        self.spawn("import-preset", None, move |backend| {
            BridgeEvent::PresetImported(import_file(backend, &path))
        });
    }

    /// Downloads preset `name` into `path`.
    pub fn export_preset(&mut self, name: String, path: PathBuf) {
        self.spawn("export-preset", None, move |backend| {
            let result = export_file(backend, &name, &path);
            BridgeEvent::PresetExported { path, result }
        });
    }

    /// Pauses or resumes generation.
    pub fn set_paused(&mut self, paused: bool) {
        self.spawn("generation", None, move |backend| {
            let result = if paused {
                backend.pause_generation()
            } else {
                backend.resume_generation()
            };
            BridgeEvent::GenerationToggled { paused, result }
        });
    }

    /// Asks the backend to render a preview clip.
    pub fn generate_preview(&mut self) {
        self.spawn("preview", None, |backend| {
            BridgeEvent::PreviewRequested(backend.generate_preview())
        });
    }

    fn accept(&self, reply: Reply) -> Option<BridgeEvent> {
        match &reply.token {
            Some(token) if !self.tokens.is_current(token) => {
                tracing::debug!(
                    channel = ?token.channel(),
                    generation = token.generation(),
                    "discarding stale response"
                );
                None
            }
            _ => Some(reply.event),
        }
    }

    /// Finished requests, oldest first. Superseded responses are dropped.
    pub fn poll(&mut self) -> Vec<BridgeEvent> {
        let replies: Vec<Reply> = self.rx.try_iter().collect();
        replies.into_iter().filter_map(|r| self.accept(r)).collect()
    }

    /// Blocks until the next accepted response or `timeout`.
    pub fn wait(&mut self, timeout: Duration) -> Option<BridgeEvent> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(std::time::Instant::now());
            let reply = self.rx.recv_timeout(left).ok()?;
            if let Some(event) = self.accept(reply) {
                return Some(event);
            }
        }
    }
}

fn import_file(backend: &dyn Backend, path: &Path) -> Result<String, TransferError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| TransferError::FileName(path.to_path_buf()))?;
    let contents = std::fs::read(path).map_err(|source| TransferError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(backend.import_preset(file_name, &contents)?)
}

fn export_file(backend: &dyn Backend, name: &str, path: &Path) -> Result<(), TransferError> {
    let contents = backend.export_preset(name)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        glitchlamp_config::paths::ensure_dir(parent)?;
    }
    std::fs::write(path, contents).map_err(|e| ConfigError::write_file(path, e))?;
    tracing::info!(preset = name, path = %path.display(), "preset exported");
    Ok(())
}
