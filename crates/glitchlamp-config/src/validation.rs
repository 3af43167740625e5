//! Chain and settings validation.
//!
//! The chain model keeps its own invariants for edits made through it, but
//! presets and settings arrive from disk or from another client and may
//! break any of them. These checks report every problem at once so a CLI
//! can print them and a UI can refuse to import.
//!
//! # Example
//!
//! ```rust
//! use glitchlamp_config::validation::validate_chain;
//! use glitchlamp_core::{ChainModel, EffectRegistry};
//!
//! let registry = EffectRegistry::new();
//! let mut chain = ChainModel::new();
//! chain.add_node("source", None).unwrap();
//!
//! assert!(validate_chain(&chain.to_wire(), &registry).is_empty());
//! ```

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use glitchlamp_core::{EffectRegistry, NodeId, SOURCE_LOCAL, WireNode};

use crate::settings::{PlaybackSettings, VIDEO_QUALITIES};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Effect name not in the catalog.
    #[error("unknown effect '{effect}' on node {node}")]
    UnknownEffect {
        /// Offending node.
        node: NodeId,
        /// Effect name.
        effect: String,
    },

    /// Two nodes share an id.
    #[error("duplicate node id {0}")]
    DuplicateId(NodeId),

    /// An input names a node that does not exist.
    #[error("node {node} port {port} references missing node {input}")]
    DanglingInput {
        /// Consumer node.
        node: NodeId,
        /// Port index.
        port: usize,
        /// Missing upstream id.
        input: NodeId,
    },

    /// More inputs than the effect accepts.
    #[error("node {node} has {count} inputs but '{effect}' accepts {max}")]
    TooManyInputs {
        /// Offending node.
        node: NodeId,
        /// Effect name.
        effect: String,
        /// Number of input slots present.
        count: usize,
        /// Max-input count of the effect.
        max: usize,
    },

    /// More than one `source-local` node.
    #[error("{0} source-local nodes; at most one is allowed")]
    DuplicateSourceLocal(usize),

    /// The input graph contains a cycle through this node.
    #[error("cycle through node {0}")]
    Cycle(NodeId),

    /// A playback field outside its accepted range.
    #[error("invalid value for '{field}': {reason}")]
    InvalidSetting {
        /// Settings field name.
        field: &'static str,
        /// Description of the problem.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Collapses a list of errors: `Ok` when empty, the error itself when
    /// single, [`ValidationError::Multiple`] otherwise.
    pub fn from_list(mut errors: Vec<ValidationError>) -> Result<(), ValidationError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Checks a node list against the registry. Returns every problem found.
pub fn validate_chain(nodes: &[WireNode], registry: &EffectRegistry) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for node in nodes {
        if !seen.insert(&node.id) {
            errors.push(ValidationError::DuplicateId(node.id.clone()));
        }
    }

    for node in nodes {
        if !registry.contains(&node.name) {
            errors.push(ValidationError::UnknownEffect {
                node: node.id.clone(),
                effect: node.name.clone(),
            });
        }
        let max = registry.max_inputs(&node.name);
        if node.inputs.len() > max {
            errors.push(ValidationError::TooManyInputs {
                node: node.id.clone(),
                effect: node.name.clone(),
                count: node.inputs.len(),
                max,
            });
        }
        for (port, input) in node.inputs.iter().enumerate() {
            if let Some(input) = input
                && !seen.contains(input)
            {
                errors.push(ValidationError::DanglingInput {
                    node: node.id.clone(),
                    port,
                    input: input.clone(),
                });
            }
        }
    }

    let locals = nodes.iter().filter(|n| n.name == SOURCE_LOCAL).count();
    if locals > 1 {
        errors.push(ValidationError::DuplicateSourceLocal(locals));
    }

    if let Some(id) = find_cycle(nodes) {
        errors.push(ValidationError::Cycle(id));
    }

    errors
}

/// Returns a node on a cycle, if the input graph has one.
///
/// Iterative three-colour DFS along input edges.
fn find_cycle(nodes: &[WireNode]) -> Option<NodeId> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Active,
        Done,
    }

    let index: HashMap<&NodeId, usize> = nodes.iter().enumerate().map(|(i, n)| (&n.id, i)).collect();
    let upstream: Vec<Vec<usize>> = nodes
        .iter()
        .map(|n| {
            n.inputs
                .iter()
                .flatten()
                .filter_map(|id| index.get(id).copied())
                .collect()
        })
        .collect();
    let mut marks = vec![Mark::Unvisited; nodes.len()];

    for start in 0..nodes.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // (node, next edge to explore)
        let mut stack = vec![(start, 0usize)];
        marks[start] = Mark::Active;
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(&next) = upstream[node].get(top.1) {
                top.1 += 1;
                match marks[next] {
                    Mark::Active => return Some(nodes[next].id.clone()),
                    Mark::Unvisited => {
                        marks[next] = Mark::Active;
                        stack.push((next, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }
    None
}

/// Checks the global playback fields.
pub fn validate_playback(playback: &PlaybackSettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if playback.duration == 0 {
        errors.push(ValidationError::InvalidSetting {
            field: "duration",
            reason: "must be at least 1 second".to_owned(),
        });
    }
    if !(playback.playback_speed.is_finite() && playback.playback_speed > 0.0) {
        errors.push(ValidationError::InvalidSetting {
            field: "playback_speed",
            reason: format!("{} is not a positive rate", playback.playback_speed),
        });
    }
    if !VIDEO_QUALITIES.contains(&playback.video_quality.as_str()) {
        errors.push(ValidationError::InvalidSetting {
            field: "video_quality",
            reason: format!("'{}' is not one of {}", playback.video_quality, VIDEO_QUALITIES.join(", ")),
        });
    }
    if playback.batch_mode && playback.batch_size == 0 {
        errors.push(ValidationError::InvalidSetting {
            field: "batch_size",
            reason: "batch mode needs at least one clip per batch".to_owned(),
        });
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use glitchlamp_core::{EffectDefinition, Position};

    fn node(id: &str, name: &str, inputs: &[Option<&str>]) -> WireNode {
        WireNode {
            id: NodeId::from(id),
            name: name.to_owned(),
            options: Default::default(),
            inputs: inputs.iter().map(|i| i.map(NodeId::from)).collect(),
            position: Position::default(),
            label: None,
        }
    }

    fn registry() -> EffectRegistry {
        EffectRegistry::from_catalog(vec![
            EffectDefinition::new("glitch", ""),
            EffectDefinition::new("mix", ""),
        ])
    }

    #[test]
    fn clean_chain_passes() {
        let nodes = [
            node("a", "source", &[]),
            node("b", "glitch", &[Some("a")]),
            node("c", "mix", &[Some("a"), Some("b")]),
        ];
        assert!(validate_chain(&nodes, &registry()).is_empty());
    }

    #[test]
    fn reports_every_problem() {
        let nodes = [
            node("a", "source-local", &[]),
            node("a", "source-local", &[]),
            node("b", "hologram", &[Some("zz")]),
            node("c", "glitch", &[Some("a"), None]),
        ];
        let errors = validate_chain(&nodes, &registry());
        assert!(errors.contains(&ValidationError::DuplicateId(NodeId::from("a"))));
        assert!(errors.contains(&ValidationError::DuplicateSourceLocal(2)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownEffect { effect, .. } if effect == "hologram")));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DanglingInput { port: 0, .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::TooManyInputs { count: 2, max: 1, .. })));
    }

    #[test]
    fn detects_cycles() {
        let nodes = [
            node("a", "glitch", &[Some("c")]),
            node("b", "glitch", &[Some("a")]),
            node("c", "glitch", &[Some("b")]),
        ];
        let errors = validate_chain(&nodes, &registry());
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Cycle(_))));

        let self_loop = [node("a", "glitch", &[Some("a")])];
        assert_eq!(
            validate_chain(&self_loop, &registry()),
            vec![ValidationError::Cycle(NodeId::from("a"))]
        );
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let nodes = [
            node("s", "source", &[]),
            node("l", "glitch", &[Some("s")]),
            node("r", "glitch", &[Some("s")]),
            node("m", "mix", &[Some("l"), Some("r")]),
        ];
        assert!(find_cycle(&nodes).is_none());
    }

    #[test]
    fn playback_checks() {
        let mut p = PlaybackSettings::default();
        assert!(validate_playback(&p).is_empty());
        p.duration = 0;
        p.playback_speed = -1.0;
        p.video_quality = "4k".into();
        p.batch_mode = true;
        p.batch_size = 0;
        assert_eq!(validate_playback(&p).len(), 4);
    }

    #[test]
    fn from_list_collapses() {
        assert_eq!(ValidationError::from_list(vec![]), Ok(()));
        let one = ValidationError::Cycle(NodeId::from("a"));
        assert_eq!(ValidationError::from_list(vec![one.clone()]), Err(one.clone()));
        let err = ValidationError::from_list(vec![one.clone(), one]).unwrap_err();
        assert!(err.to_string().starts_with("multiple validation errors"));
    }
}
