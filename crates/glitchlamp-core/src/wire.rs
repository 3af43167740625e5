//! Persisted node shape and normalisation of loaded chains.
//!
//! Settings (`effect_chain`) and presets store nodes as:
//!
//! ```json
//! {"id": "node-2", "name": "glitch", "options": {"intensity": 40},
//!  "inputs": ["node-1"], "position": {"x": 300, "y": 40}}
//! ```
//!
//! [`WireNode`] is the strict serde form of that object. Data written by
//! older clients is not always that clean, so [`normalize`] accepts raw JSON
//! and fills gaps deterministically: bare strings are effect names, missing
//! ids are minted, missing positions take the next grid slot, and entries
//! without a usable name are skipped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::chain::ChainModel;
use crate::node::{ChainNode, IdAllocator, NodeId, Position, grid_position};
use crate::option::{OptionMap, OptionValue};

/// Serialized form of one chain node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    /// Node id. Empty ids are replaced on load.
    pub id: NodeId,
    /// Effect name.
    pub name: String,
    /// Option values.
    #[serde(default)]
    pub options: OptionMap,
    /// Upstream node per port.
    #[serde(default)]
    pub inputs: Vec<Option<NodeId>>,
    /// Canvas position.
    #[serde(default)]
    pub position: Position,
    /// User title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl From<&ChainNode> for WireNode {
    fn from(node: &ChainNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            options: node.options.clone(),
            inputs: node.inputs.clone(),
            position: node.position,
            label: node.label.clone(),
        }
    }
}

impl ChainModel {
    /// Serializable snapshot of the chain, in sequence order.
    pub fn to_wire(&self) -> Vec<WireNode> {
        self.nodes.iter().map(WireNode::from).collect()
    }

    /// Builds a chain from wire nodes.
    ///
    /// Empty or repeated ids get fresh `node-N` ids; inputs naming unknown
    /// nodes, or the node itself, become empty slots. Input lengths are kept
    /// as written so that a saved chain reloads unchanged.
    pub fn from_wire(nodes: Vec<WireNode>) -> Self {
        let mut taken: HashSet<String> = nodes
            .iter()
            .map(|n| n.id.as_str().to_owned())
            .filter(|id| !id.is_empty())
            .collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut ids = IdAllocator::new();

        let mut chain_nodes: Vec<ChainNode> = nodes
            .into_iter()
            .map(|wire| {
                let id = if wire.id.as_str().is_empty() || !seen.insert(wire.id.as_str().to_owned())
                {
                    let fresh = ids.allocate(|candidate| taken.contains(candidate));
                    taken.insert(fresh.as_str().to_owned());
                    if !wire.id.as_str().is_empty() {
                        tracing::warn!(duplicate = %wire.id, replacement = %fresh, "duplicate node id");
                    }
                    fresh
                } else {
                    wire.id
                };
                ChainNode {
                    id,
                    name: wire.name,
                    label: wire.label.filter(|l| !l.trim().is_empty()),
                    options: wire.options,
                    inputs: wire.inputs,
                    position: wire.position,
                }
            })
            .collect();

        let known: HashSet<NodeId> = chain_nodes.iter().map(|n| n.id.clone()).collect();
        for node in &mut chain_nodes {
            let own = node.id.clone();
            for slot in &mut node.inputs {
                let dangling = slot
                    .as_ref()
                    .is_some_and(|input| *input == own || !known.contains(input));
                if dangling {
                    tracing::warn!(node = %own, "dropping dangling input");
                    *slot = None;
                }
            }
        }

        let mut chain = ChainModel::new();
        chain.nodes = chain_nodes;
        chain.ids = ids;
        chain
    }
}

/// Normalizes a loaded chain into the canonical node shape.
///
/// Tolerates bare effect-name strings and objects with missing or mistyped
/// fields. Entries that yield no effect name are skipped.
pub fn normalize(raw: &[Value]) -> ChainModel {
    let mut nodes = Vec::with_capacity(raw.len());
    for (index, entry) in raw.iter().enumerate() {
        match normalize_entry(entry, nodes.len()) {
            Some(node) => nodes.push(node),
            None => tracing::warn!(index, "skipping chain entry without an effect name"),
        }
    }
    let chain = ChainModel::from_wire(nodes);
    tracing::debug!(nodes = chain.len(), "chain normalized");
    chain
}

/// Normalizes a whole JSON document. Anything but an array yields an empty chain.
pub fn normalize_value(raw: &Value) -> ChainModel {
    match raw {
        Value::Array(entries) => normalize(entries),
        Value::Null => ChainModel::new(),
        _ => {
            tracing::warn!("chain is not a JSON array; ignoring");
            ChainModel::new()
        }
    }
}

fn normalize_entry(entry: &Value, slot: usize) -> Option<WireNode> {
    match entry {
        Value::String(name) if !name.trim().is_empty() => Some(WireNode {
            id: NodeId::new(""),
            name: name.trim().to_owned(),
            options: OptionMap::new(),
            inputs: Vec::new(),
            position: grid_position(slot),
            label: None,
        }),
        Value::Object(map) => {
            let name = map.get("name")?.as_str()?.trim();
            if name.is_empty() {
                return None;
            }
            Some(WireNode {
                id: map.get("id").and_then(id_from_value).unwrap_or_else(|| NodeId::new("")),
                name: name.to_owned(),
                options: map.get("options").map(options_from_value).unwrap_or_default(),
                inputs: map.get("inputs").map(inputs_from_value).unwrap_or_default(),
                position: map
                    .get("position")
                    .and_then(position_from_value)
                    .unwrap_or_else(|| grid_position(slot)),
                label: map
                    .get("label")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            })
        }
        _ => None,
    }
}

fn id_from_value(value: &Value) -> Option<NodeId> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(NodeId::new(s.trim())),
        Value::Number(n) => Some(NodeId::new(n.to_string())),
        _ => None,
    }
}

fn options_from_value(value: &Value) -> OptionMap {
    let Value::Object(map) = value else {
        return OptionMap::new();
    };
    map.iter()
        .filter_map(|(key, v)| {
            let value = match v {
                Value::Bool(b) => OptionValue::Bool(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => OptionValue::Int(i),
                    None => OptionValue::Float(n.as_f64()?),
                },
                Value::String(s) => OptionValue::Text(s.clone()),
                _ => return None,
            };
            Some((key.clone(), value))
        })
        .collect()
}

fn inputs_from_value(value: &Value) -> Vec<Option<NodeId>> {
    match value {
        Value::Array(items) => items.iter().map(id_from_value).collect(),
        // A lone id is the primary input.
        Value::String(_) | Value::Number(_) => vec![id_from_value(value)],
        _ => Vec::new(),
    }
}

fn position_from_value(value: &Value) -> Option<Position> {
    let x = value.get("x")?.as_f64()?;
    let y = value.get("y")?.as_f64()?;
    (x.is_finite() && y.is_finite()).then(|| Position::new(x as f32, y as f32))
}
