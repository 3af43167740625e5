//! Chain node types.
//!
//! A [`ChainNode`] is one effect instance in the chain: which effect it runs,
//! the option values the user has set, which other nodes feed its input ports,
//! and where its card sits on the canvas stage.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::option::OptionMap;

/// Number of columns in the fallback placement grid.
pub const GRID_COLUMNS: usize = 4;
/// World-space origin of the fallback placement grid.
pub const GRID_ORIGIN: f32 = 40.0;
/// Horizontal distance between grid slots.
pub const GRID_SPACING_X: f32 = 260.0;
/// Vertical distance between grid rows.
pub const GRID_SPACING_Y: f32 = 220.0;

/// Stable identifier of a node within a chain.
///
/// Ids are strings on the wire so that chains written by other clients load
/// unchanged. Ids minted by this crate come from an [`IdAllocator`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// World-space position of a node card, independent of pan and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns this position moved by `(dx, dy)`.
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Deterministic fallback slot for the `index`-th node: 4 columns, fixed spacing.
pub fn grid_position(index: usize) -> Position {
    let col = index % GRID_COLUMNS;
    let row = index / GRID_COLUMNS;
    Position::new(
        GRID_ORIGIN + col as f32 * GRID_SPACING_X,
        GRID_ORIGIN + row as f32 * GRID_SPACING_Y,
    )
}

/// One effect instance in the chain.
///
/// Fields are public for reading; every mutation goes through
/// [`ChainModel`](crate::ChainModel) so referential integrity is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainNode {
    /// Stable identifier, unique within the chain.
    pub id: NodeId,
    /// Effect name, resolved through the [`EffectRegistry`](crate::EffectRegistry).
    pub name: String,
    /// Optional user-edited title shown instead of the effect name.
    pub label: Option<String>,
    /// Option values the user has set. Unset keys fall back to the schema default.
    pub options: OptionMap,
    /// Upstream node per input port; `None` marks an empty port.
    pub inputs: Vec<Option<NodeId>>,
    /// Card position on the canvas stage.
    pub position: Position,
}

impl ChainNode {
    /// Creates a node with no options and no inputs.
    pub fn new(id: NodeId, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            label: None,
            options: OptionMap::new(),
            inputs: Vec::new(),
            position,
        }
    }

    /// Title to display: the user label if set and non-empty, else the effect name.
    pub fn title(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.trim().is_empty() => label,
            _ => &self.name,
        }
    }

    /// Whether `id` feeds any of this node's ports.
    pub fn is_fed_by(&self, id: &NodeId) -> bool {
        self.inputs.iter().flatten().any(|input| input == id)
    }

    /// Iterates `(port, upstream)` over connected ports only.
    pub fn connected_inputs(&self) -> impl Iterator<Item = (usize, &NodeId)> {
        self.inputs
            .iter()
            .enumerate()
            .filter_map(|(port, input)| input.as_ref().map(|id| (port, id)))
    }
}

/// Mints node ids of the form `node-N`.
///
/// Counters only move forward, and ids already present in the chain are
/// skipped, so ids loaded from a preset never collide with fresh ones.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Creates an allocator starting at `node-1`.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next id for which `taken` is false.
    pub fn allocate(&mut self, taken: impl Fn(&str) -> bool) -> NodeId {
        loop {
            let candidate = format!("node-{}", self.next.max(1));
            self.next = self.next.max(1) + 1;
            if !taken(&candidate) {
                return NodeId(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_wraps_after_four_columns() {
        assert_eq!(grid_position(0), Position::new(40.0, 40.0));
        assert_eq!(grid_position(3), Position::new(40.0 + 3.0 * 260.0, 40.0));
        assert_eq!(grid_position(4), Position::new(40.0, 40.0 + 220.0));
        assert_eq!(grid_position(9), Position::new(40.0 + 260.0, 40.0 + 440.0));
    }

    #[test]
    fn allocator_skips_taken_ids() {
        let mut ids = IdAllocator::new();
        let taken = ["node-1", "node-2"];
        let id = ids.allocate(|c| taken.contains(&c));
        assert_eq!(id.as_str(), "node-3");
        let id = ids.allocate(|_| false);
        assert_eq!(id.as_str(), "node-4");
    }

    #[test]
    fn default_allocator_starts_at_one() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.allocate(|_| false).as_str(), "node-1");
    }

    #[test]
    fn title_prefers_non_blank_label() {
        let mut node = ChainNode::new(NodeId::from("n"), "glitch", Position::default());
        assert_eq!(node.title(), "glitch");
        node.label = Some("   ".into());
        assert_eq!(node.title(), "glitch");
        node.label = Some("Main glitch".into());
        assert_eq!(node.title(), "Main glitch");
    }

    #[test]
    fn connected_inputs_skips_empty_ports() {
        let mut node = ChainNode::new(NodeId::from("mix"), "mix", Position::default());
        node.inputs = vec![None, Some(NodeId::from("b"))];
        let connected: Vec<_> = node.connected_inputs().collect();
        assert_eq!(connected, vec![(1, &NodeId::from("b"))]);
        assert!(node.is_fed_by(&NodeId::from("b")));
        assert!(!node.is_fed_by(&NodeId::from("a")));
    }
}
