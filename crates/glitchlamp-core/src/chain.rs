//! The chain model: an ordered, positioned graph of effect nodes.
//!
//! [`ChainModel`] is the single source of truth shared by the canvas and list
//! views. Every mutation goes through a method here, so the integrity rules
//! hold after every call:
//!
//! - node ids are unique
//! - `inputs.len()` never exceeds the target effect's max-input count after
//!   [`connect`](ChainModel::connect) or [`retarget`](ChainModel::retarget)
//! - removing a node clears every reference to it, keeping port indices
//! - at most one `source-local` node is ever inserted
//! - a connection that would make the graph cyclic is refused
//!
//! Sequence order matters only for serialization and the list view; canvas
//! wiring is driven entirely by `inputs`.
//!
//! Each successful mutation bumps [`revision`](ChainModel::revision), which
//! the UI compares against its last drawn revision.

use crate::error::ChainError;
use crate::node::{ChainNode, GRID_SPACING_X, IdAllocator, NodeId, Position, grid_position};
use crate::option::OptionValue;
use crate::registry::{EffectRegistry, SOURCE, SOURCE_LOCAL};

/// Ordered collection of chain nodes with referential integrity.
#[derive(Debug, Clone, Default)]
pub struct ChainModel {
    pub(crate) nodes: Vec<ChainNode>,
    pub(crate) ids: IdAllocator,
    revision: u64,
}

impl PartialEq for ChainModel {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl ChainModel {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            ids: IdAllocator::new(),
            revision: 0,
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the chain has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in sequence order.
    pub fn nodes(&self) -> &[ChainNode] {
        &self.nodes
    }

    /// Iterates nodes in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &ChainNode> {
        self.nodes.iter()
    }

    /// Node by id.
    pub fn node(&self, id: &NodeId) -> Option<&ChainNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Sequence index of a node.
    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| &n.id == id)
    }

    /// Whether a node with this id exists.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.index_of(id).is_some()
    }

    /// Mutation counter. Changes whenever the chain changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether a `source-local` node already exists.
    pub fn has_source_local(&self) -> bool {
        self.nodes.iter().any(|n| n.name == SOURCE_LOCAL)
    }

    /// Whether the chain has any `source` or `source-local` node.
    pub fn has_source(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| n.name == SOURCE || n.name == SOURCE_LOCAL)
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut ChainNode, ChainError> {
        self.nodes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| ChainError::NodeNotFound(id.clone()))
    }

    fn allocate_id(&mut self) -> NodeId {
        let nodes = &self.nodes;
        self.ids
            .allocate(|candidate| nodes.iter().any(|n| n.id.as_str() == candidate))
    }

    /// Appends a node running `effect`.
    ///
    /// The node starts with empty options and inputs. Without an explicit
    /// position it lands in the next slot of the fallback grid.
    ///
    /// # Errors
    ///
    /// [`ChainError::DuplicateSourceLocal`] if `effect` is `source-local` and
    /// one already exists; the chain is unchanged.
    pub fn add_node(
        &mut self,
        effect: &str,
        position: Option<Position>,
    ) -> Result<NodeId, ChainError> {
        if effect == SOURCE_LOCAL && self.has_source_local() {
            tracing::warn!("refusing second source-local node");
            return Err(ChainError::DuplicateSourceLocal);
        }
        let id = self.allocate_id();
        let position = position.unwrap_or_else(|| grid_position(self.nodes.len()));
        self.nodes.push(ChainNode::new(id.clone(), effect, position));
        self.bump();
        tracing::debug!(%id, effect, "node added");
        Ok(id)
    }

    /// Removes a node and clears every input slot that referenced it.
    ///
    /// Surviving inputs keep their port index; vacated slots become `None`.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<ChainNode, ChainError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| ChainError::NodeNotFound(id.clone()))?;
        let removed = self.nodes.remove(index);
        for node in &mut self.nodes {
            for slot in &mut node.inputs {
                if slot.as_ref() == Some(id) {
                    *slot = None;
                }
            }
        }
        self.bump();
        tracing::debug!(%id, effect = %removed.name, "node removed");
        Ok(removed)
    }

    /// Points a node at a different effect.
    ///
    /// Options are cleared and inputs truncated to the new effect's
    /// max-input count.
    pub fn retarget(
        &mut self,
        registry: &EffectRegistry,
        id: &NodeId,
        effect: &str,
    ) -> Result<(), ChainError> {
        if effect == SOURCE_LOCAL
            && self
                .nodes
                .iter()
                .any(|n| n.name == SOURCE_LOCAL && &n.id != id)
        {
            return Err(ChainError::DuplicateSourceLocal);
        }
        let max = registry.max_inputs(effect);
        let node = self.node_mut(id)?;
        node.name = effect.to_owned();
        node.options.clear();
        node.inputs.truncate(max);
        self.bump();
        tracing::debug!(%id, effect, "node retargeted");
        Ok(())
    }

    /// Feeds `from`'s output into input `port` of `to`.
    ///
    /// The target's inputs are padded with empty slots up to `port`, and
    /// `from` is cleared from every other port of the same target so one
    /// output feeds a given consumer through at most one port.
    ///
    /// # Errors
    ///
    /// Rejected, leaving the chain unchanged, when either node is missing,
    /// `from == to`, the target accepts no inputs, `port` is past its
    /// max-input count, or the edge would close a cycle.
    pub fn connect(
        &mut self,
        registry: &EffectRegistry,
        from: &NodeId,
        to: &NodeId,
        port: usize,
    ) -> Result<(), ChainError> {
        if from == to {
            return Err(ChainError::SelfConnection(from.clone()));
        }
        if !self.contains(from) {
            return Err(ChainError::NodeNotFound(from.clone()));
        }
        let target = self
            .node(to)
            .ok_or_else(|| ChainError::NodeNotFound(to.clone()))?;
        let max = registry.max_inputs(&target.name);
        if max == 0 {
            return Err(ChainError::NoInputs {
                node: to.clone(),
                effect: target.name.clone(),
            });
        }
        if port >= max {
            return Err(ChainError::PortOutOfRange {
                node: to.clone(),
                port,
                max,
            });
        }
        if self.depends_on(from, to) {
            tracing::warn!(%from, %to, "connection refused: would create a cycle");
            return Err(ChainError::CycleDetected {
                from: from.clone(),
                to: to.clone(),
            });
        }

        let node = self.node_mut(to)?;
        if node.inputs.len() <= port {
            node.inputs.resize(port + 1, None);
        }
        for (i, slot) in node.inputs.iter_mut().enumerate() {
            if i != port && slot.as_ref() == Some(from) {
                *slot = None;
            }
        }
        node.inputs[port] = Some(from.clone());
        node.inputs.truncate(max);
        self.bump();
        tracing::debug!(%from, %to, port, "connected");
        Ok(())
    }

    /// Clears input `port` of `to`. Returns the node that was disconnected.
    pub fn disconnect(&mut self, to: &NodeId, port: usize) -> Result<Option<NodeId>, ChainError> {
        let node = self.node_mut(to)?;
        let previous = node.inputs.get_mut(port).and_then(Option::take);
        if previous.is_some() {
            self.bump();
        }
        Ok(previous)
    }

    /// Whether `node` transitively draws input from `ancestor`.
    ///
    /// DFS upstream through `inputs`. Adding an edge `ancestor → node` is safe
    /// only if `ancestor` does not already depend on `node`.
    pub fn depends_on(&self, node: &NodeId, ancestor: &NodeId) -> bool {
        let mut visited: Vec<&NodeId> = Vec::new();
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            if current == ancestor {
                return true;
            }
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);

            if let Some(n) = self.node(current) {
                stack.extend(n.inputs.iter().flatten());
            }
        }
        false
    }

    /// Moves the node at `from` to sequence index `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), ChainError> {
        let len = self.nodes.len();
        for index in [from, to] {
            if index >= len {
                return Err(ChainError::IndexOutOfRange { index, len });
            }
        }
        if from != to {
            let node = self.nodes.remove(from);
            self.nodes.insert(to, node);
            self.bump();
        }
        Ok(())
    }

    /// Swaps a node with its predecessor. Returns false at the top or if missing.
    pub fn move_up(&mut self, id: &NodeId) -> bool {
        match self.index_of(id) {
            Some(i) if i > 0 => {
                self.nodes.swap(i, i - 1);
                self.bump();
                true
            }
            _ => false,
        }
    }

    /// Swaps a node with its successor. Returns false at the bottom or if missing.
    pub fn move_down(&mut self, id: &NodeId) -> bool {
        match self.index_of(id) {
            Some(i) if i + 1 < self.nodes.len() => {
                self.nodes.swap(i, i + 1);
                self.bump();
                true
            }
            _ => false,
        }
    }

    /// Stores an option value.
    pub fn set_option(
        &mut self,
        id: &NodeId,
        name: &str,
        value: OptionValue,
    ) -> Result<(), ChainError> {
        let node = self.node_mut(id)?;
        if node.options.get(name) == Some(&value) {
            return Ok(());
        }
        node.options.insert(name.to_owned(), value);
        self.bump();
        Ok(())
    }

    /// Sets the user title. Blank text clears it.
    pub fn set_label(&mut self, id: &NodeId, label: &str) -> Result<(), ChainError> {
        let node = self.node_mut(id)?;
        let label = Some(label.trim()).filter(|l| !l.is_empty()).map(str::to_owned);
        if node.label != label {
            node.label = label;
            self.bump();
        }
        Ok(())
    }

    /// Moves a node card to a world-space position.
    pub fn set_position(&mut self, id: &NodeId, position: Position) -> Result<(), ChainError> {
        self.node_mut(id)?.position = position;
        self.bump();
        Ok(())
    }

    /// Moves a node card by a world-space delta.
    pub fn translate(&mut self, id: &NodeId, dx: f32, dy: f32) -> Result<(), ChainError> {
        let node = self.node_mut(id)?;
        node.position = node.position.offset(dx, dy);
        self.bump();
        Ok(())
    }

    /// Removes every node.
    pub fn clear(&mut self) {
        if !self.nodes.is_empty() {
            self.nodes.clear();
            self.bump();
        }
    }

    /// Prepends a default `source` node when the chain has no source.
    ///
    /// Applies only if there is neither a `source` nor a `source-local` node
    /// and the first node is not a self-contained generator. The new source
    /// feeds port 0 of the first node when that node has no inputs yet.
    /// Returns the id of the inserted node.
    pub fn ensure_source(&mut self, registry: &EffectRegistry) -> Option<NodeId> {
        if self.has_source() {
            return None;
        }
        if let Some(first) = self.nodes.first() {
            if registry.resolve(&first.name).is_origin() {
                return None;
            }
        }

        let id = self.allocate_id();
        let position = self.nodes.first().map_or_else(
            || grid_position(0),
            |first| first.position.offset(-GRID_SPACING_X, 0.0),
        );
        let source = ChainNode::new(id.clone(), SOURCE, position);

        if let Some(first) = self.nodes.first_mut() {
            let accepts = registry.max_inputs(&first.name) > 0;
            if accepts && first.inputs.iter().all(Option::is_none) {
                if first.inputs.is_empty() {
                    first.inputs.push(None);
                }
                first.inputs[0] = Some(id.clone());
            }
        }
        self.nodes.insert(0, source);
        self.bump();
        tracing::info!(%id, "prepended default source");
        Some(id)
    }
}
