//! Per-node generation activity.
//!
//! The monitor reads polled [`GenerationStatus`] snapshots and answers
//! "what is node X doing right now" for the renderers. It holds node ids
//! only and never reads or writes the chain itself, so a status that names
//! nodes the editor no longer has is harmless.

use std::collections::HashSet;

use glitchlamp_core::NodeId;

use crate::status::{GenerationState, GenerationStatus, Progress};

/// What the generator is doing with one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeActivity {
    /// Not touched by the current clip.
    #[default]
    Idle,
    /// Being processed now.
    Processing,
    /// Already processed for the current clip.
    Processed,
}

/// Observer over generation status.
#[derive(Debug, Clone, Default)]
pub struct GenerationMonitor {
    status: GenerationStatus,
    processed: HashSet<NodeId>,
    progress: Option<Progress>,
}

impl GenerationMonitor {
    /// Monitor with no status yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a new status snapshot.
    ///
    /// Processed marks accumulate while a clip is in flight and reset when
    /// the generator goes back to idle or moves on to a new download.
    pub fn update(&mut self, status: GenerationStatus) {
        let restarted = matches!(
            status.state,
            GenerationState::Idle | GenerationState::Downloading
        ) && status.processed_nodes.is_empty();
        if restarted {
            self.processed.clear();
        }
        self.processed.extend(status.processed_nodes.iter().cloned());
        if let Some(current) = &status.current_node {
            self.processed.remove(current);
        }
        if status.state != self.status.state {
            tracing::debug!(state = %String::from(status.state.clone()), "generation state changed");
        }
        self.status = status;
    }

    /// Applies a progress snapshot.
    pub fn update_progress(&mut self, progress: Progress) {
        self.progress = Some(progress);
    }

    /// Activity of `id` under the latest status.
    pub fn activity(&self, id: &NodeId) -> NodeActivity {
        if self.status.state.is_busy() && self.status.current_node.as_ref() == Some(id) {
            NodeActivity::Processing
        } else if self.processed.contains(id) {
            NodeActivity::Processed
        } else {
            NodeActivity::Idle
        }
    }

    /// Whether any node is being processed.
    pub fn is_active(&self) -> bool {
        self.status.state.is_busy()
    }

    /// Whether generation is paused.
    pub fn is_paused(&self) -> bool {
        self.status.paused || self.status.state == GenerationState::Paused
    }

    /// Latest status.
    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    /// Latest progress, if any was polled.
    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    /// One-line description for a status bar.
    pub fn summary(&self) -> String {
        let state = String::from(self.status.state.clone());
        let mut line = match &self.status.stage {
            Some(stage) if !stage.is_empty() => format!("{state}: {stage}"),
            _ => state,
        };
        if let Some(progress) = &self.progress
            && self.status.state.is_busy()
        {
            line.push_str(&format!(" ({:.0}%)", progress.fraction() * 100.0));
        }
        if self.status.queue_length > 0 {
            line.push_str(&format!(", {} queued", self.status.queue_length));
        }
        if self.is_paused() && self.status.state != GenerationState::Paused {
            line.push_str(" [paused]");
        }
        line
    }

    /// Forgets all status.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
