//! The editor session: one chain being edited, and everything around it.
//!
//! All chain mutations from either view go through [`EditorSession`], which
//! turns rejected mutations into warnings. Both views read the same
//! [`ChainModel`]; neither keeps its own copy.

use egui::Vec2;

use glitchlamp_client::GenerationMonitor;
use glitchlamp_config::{ConfigError, PlaybackSettings, Settings};
use glitchlamp_core::{
    ChainError, ChainModel, EffectDescriptor, EffectRegistry, NodeId, OptionValue, Position,
};
use glitchlamp_gui_core::{Connection, InputCapabilityProfile, Toasts, Viewport, WiringState};

/// The chain state a save was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavePoint {
    epoch: u64,
    revision: u64,
}

/// State of one chain-editing session.
#[derive(Debug)]
pub struct EditorSession {
    /// Effect catalog plus built-in sources.
    pub registry: EffectRegistry,
    /// The chain being edited.
    pub chain: ChainModel,
    /// Backend settings the chain was loaded from and is saved into.
    pub settings: Settings,
    /// Canvas pan/zoom.
    pub viewport: Viewport,
    /// Click-to-connect gesture.
    pub wiring: WiringState,
    /// Notifications.
    pub toasts: Toasts,
    /// Gestures available on this display.
    pub capability: InputCapabilityProfile,
    /// Per-node generation activity.
    pub monitor: GenerationMonitor,
    stage_size: Option<Vec2>,
    dragging: Option<NodeId>,
    saved_revision: u64,
    /// Bumped whenever the chain is replaced wholesale.
    epoch: u64,
    playback_dirty: bool,
    now: f64,
}

impl EditorSession {
    /// Empty session over `registry`.
    pub fn new(registry: EffectRegistry, capability: InputCapabilityProfile) -> Self {
        let chain = ChainModel::new();
        let saved_revision = chain.revision();
        Self {
            registry,
            chain,
            settings: Settings::default(),
            viewport: Viewport::new(),
            wiring: WiringState::default(),
            toasts: Toasts::new(),
            capability,
            monitor: GenerationMonitor::new(),
            stage_size: None,
            dragging: None,
            saved_revision,
            epoch: 0,
            playback_dirty: false,
            now: 0.0,
        }
    }

    /// Sets the clock used to time toasts. Call once per frame.
    pub fn set_time(&mut self, now: f64) {
        self.now = now;
    }

    /// Current frame time.
    pub fn time(&self) -> f64 {
        self.now
    }

    /// Replaces the registry, e.g. after the catalog loaded.
    pub fn set_registry(&mut self, registry: EffectRegistry) {
        self.registry = registry;
    }

    /// Replaces the chain wholesale (settings or preset load).
    ///
    /// Transient gesture state is dropped; the viewport is kept. The new
    /// chain counts as unsaved until [`mark_saved`](Self::mark_saved).
    pub fn replace_chain(&mut self, chain: ChainModel) {
        self.chain = chain;
        self.epoch += 1;
        self.wiring.cancel();
        self.dragging = None;
        // Revisions restart with each model; force a mismatch.
        self.saved_revision = self.chain.revision().wrapping_sub(1);
    }

    /// Adopts settings loaded from the backend and the chain built from them.
    pub fn replace_settings(&mut self, settings: Settings, chain: ChainModel) {
        self.settings = settings;
        self.replace_chain(chain);
        self.mark_saved();
    }

    /// Settings with the current chain stored into them.
    pub fn settings_to_save(&self) -> Result<Settings, ConfigError> {
        let mut settings = self.settings.clone();
        settings.store_chain(&self.chain)?;
        Ok(settings)
    }

    /// Global playback settings being edited.
    pub fn playback(&self) -> PlaybackSettings {
        self.settings.playback()
    }

    /// Applies edited playback settings; they count as unsaved.
    pub fn apply_playback(&mut self, playback: &PlaybackSettings) {
        if self.settings.playback() != *playback {
            self.settings.apply_playback(playback);
            self.playback_dirty = true;
        }
    }

    /// Whether anything changed since the last load or save.
    pub fn is_dirty(&self) -> bool {
        self.playback_dirty || self.chain.revision() != self.saved_revision
    }

    /// Records the current state as saved.
    pub fn mark_saved(&mut self) {
        self.saved_revision = self.chain.revision();
        self.playback_dirty = false;
    }

    /// Where a save issued now would leave the chain.
    pub fn save_point(&self) -> SavePoint {
        SavePoint {
            epoch: self.epoch,
            revision: self.chain.revision(),
        }
    }

    /// Records the chain as saved at `point`, e.g. when a save issued
    /// earlier completes after further edits.
    ///
    /// Returns `false` and changes nothing if the chain was replaced since
    /// `point` was taken; the stored chain is then not the one being edited.
    pub fn mark_saved_at(&mut self, point: SavePoint) -> bool {
        if point.epoch != self.epoch {
            return false;
        }
        self.saved_revision = point.revision;
        self.playback_dirty = false;
        true
    }

    /// Records the canvas stage size, or `None` while the canvas is hidden.
    pub fn set_stage_size(&mut self, size: Option<Vec2>) {
        self.stage_size = size;
    }

    /// Resolved descriptor for an effect name.
    pub fn descriptor(&self, effect: &str) -> &EffectDescriptor {
        self.registry.resolve(effect)
    }

    /// Where new nodes land: the visible stage centre, or the grid when no
    /// canvas is showing.
    fn spawn_position(&self) -> Option<Position> {
        self.stage_size.map(|size| {
            let center = self.viewport.world_center(size);
            Position::new(center.x, center.y)
        })
    }

    /// Logs a rejected mutation and warns the user when it matters.
    fn check<T>(&mut self, result: Result<T, ChainError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) if e.is_user_visible() => {
                tracing::warn!("{e}");
                self.toasts.warn(capitalize(&e.to_string()), self.now);
                None
            }
            Err(e) => {
                tracing::debug!("ignored: {e}");
                None
            }
        }
    }

    /// Adds a node running `effect`.
    pub fn add_node(&mut self, effect: &str) -> Option<NodeId> {
        let position = self.spawn_position();
        let result = self.chain.add_node(effect, position);
        self.check(result)
    }

    /// Removes a node.
    pub fn remove_node(&mut self, id: &NodeId) {
        self.wiring.forget(id);
        if self.dragging.as_ref() == Some(id) {
            self.dragging = None;
        }
        let result = self.chain.remove_node(id);
        self.check(result);
    }

    /// Points a node at another effect.
    pub fn retarget(&mut self, id: &NodeId, effect: &str) {
        let result = self.chain.retarget(&self.registry, id, effect);
        self.check(result);
    }

    /// Applies a connection request from the wiring gesture.
    pub fn connect(&mut self, connection: &Connection) -> bool {
        let result = self
            .chain
            .connect(&self.registry, &connection.from, &connection.to, connection.port);
        self.check(result).is_some()
    }

    /// Clears one input port.
    pub fn disconnect(&mut self, to: &NodeId, port: usize) {
        let result = self.chain.disconnect(to, port);
        self.check(result);
    }

    /// Stores an option value.
    pub fn set_option(&mut self, id: &NodeId, option: &str, value: OptionValue) {
        let result = self.chain.set_option(id, option, value);
        self.check(result);
    }

    /// Sets a node's title.
    pub fn set_label(&mut self, id: &NodeId, label: &str) {
        let result = self.chain.set_label(id, label);
        self.check(result);
    }

    /// Swaps a node with its predecessor.
    pub fn move_up(&mut self, id: &NodeId) -> bool {
        self.chain.move_up(id)
    }

    /// Swaps a node with its successor.
    pub fn move_down(&mut self, id: &NodeId) -> bool {
        self.chain.move_down(id)
    }

    /// Starts dragging a card. Fixed sources and drag-less displays refuse.
    pub fn begin_drag(&mut self, id: &NodeId) -> bool {
        let allowed = self.capability.supports_drag
            && self
                .chain
                .node(id)
                .is_some_and(|n| !self.registry.is_fixed_source(&n.name));
        self.dragging = allowed.then(|| id.clone());
        allowed
    }

    /// Moves the dragged card by a screen-space pointer delta.
    pub fn drag_by(&mut self, screen_delta: Vec2) {
        let Some(id) = self.dragging.clone() else {
            return;
        };
        let delta = self.viewport.screen_delta_to_world(screen_delta);
        if delta != Vec2::ZERO {
            let result = self.chain.translate(&id, delta.x, delta.y);
            self.check(result);
        }
    }

    /// Ends a card drag.
    pub fn end_drag(&mut self) {
        self.dragging = None;
    }

    /// The card being dragged, if any.
    pub fn dragging(&self) -> Option<&NodeId> {
        self.dragging.as_ref()
    }

    /// Shows an info toast.
    pub fn notify(&mut self, message: impl Into<String>) {
        self.toasts.info(message, self.now);
    }

    /// Shows a warning toast.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.toasts.warn(message, self.now);
    }

    /// Shows an error toast.
    pub fn error(&mut self, message: impl Into<String>) {
        self.toasts.error(message, self.now);
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
