//! Click-to-connect state machine.
//!
//! ```text
//!  Idle ──click output A──▶ OutputSelected(A)
//!   ▲                         │  click output B  → OutputSelected(B)
//!   │                         │  click output A  → Idle
//!   │                         │  click elsewhere → Idle
//!   └── click input (N≠A, p) ─┘  yields Connection { A → N, p }
//! ```
//!
//! The state machine never touches the chain. It hands back a
//! [`Connection`] request and the caller decides what to do with it.

use glitchlamp_core::NodeId;

/// A connection the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Upstream node (its output port was clicked).
    pub from: NodeId,
    /// Downstream node.
    pub to: NodeId,
    /// Input port index on `to`.
    pub port: usize,
}

/// Wiring gesture state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WiringState {
    /// Nothing selected.
    #[default]
    Idle,
    /// An output port is highlighted, waiting for an input click.
    OutputSelected(NodeId),
}

impl WiringState {
    /// Handles a click on `node`'s output port.
    ///
    /// Selects it, or deselects it if it was already selected. Any other
    /// selection is replaced.
    pub fn click_output(&mut self, node: &NodeId) {
        *self = match self {
            WiringState::OutputSelected(current) if current == node => WiringState::Idle,
            _ => WiringState::OutputSelected(node.clone()),
        };
    }

    /// Handles a click on input `port` of `node`.
    ///
    /// With an output selected on a different node this completes the
    /// gesture. Clicking an input of the selected node itself cancels.
    pub fn click_input(&mut self, node: &NodeId, port: usize) -> Option<Connection> {
        match std::mem::take(self) {
            WiringState::OutputSelected(from) if &from != node => Some(Connection {
                from,
                to: node.clone(),
                port,
            }),
            _ => None,
        }
    }

    /// Drops any selection.
    pub fn cancel(&mut self) {
        *self = WiringState::Idle;
    }

    /// Drops the selection if it refers to `node` (e.g. it was removed).
    pub fn forget(&mut self, node: &NodeId) {
        if self.selected() == Some(node) {
            self.cancel();
        }
    }

    /// The highlighted output, if any.
    pub fn selected(&self) -> Option<&NodeId> {
        match self {
            WiringState::Idle => None,
            WiringState::OutputSelected(id) => Some(id),
        }
    }

    /// Whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self, WiringState::OutputSelected(_))
    }
}
