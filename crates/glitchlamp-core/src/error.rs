//! Error types for chain mutations.

use crate::node::NodeId;
use thiserror::Error;

/// Reasons a [`ChainModel`](crate::ChainModel) mutation was rejected.
///
/// A rejected mutation never leaves the model partially updated. Callers
/// decide whether a rejection is silent (e.g. a click that missed) or is
/// surfaced to the user as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// No node with this id exists in the chain.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// A node cannot feed one of its own inputs.
    #[error("node {0} cannot be connected to itself")]
    SelfConnection(NodeId),

    /// The target effect declares zero inputs (source-type effects).
    #[error("effect '{effect}' on node {node} accepts no inputs")]
    NoInputs {
        /// Target node.
        node: NodeId,
        /// Effect name of the target node.
        effect: String,
    },

    /// The port index is past the target effect's max-input count.
    #[error("port {port} out of range for node {node} (max {max} inputs)")]
    PortOutOfRange {
        /// Target node.
        node: NodeId,
        /// Requested port index.
        port: usize,
        /// Declared max-input count of the target effect.
        max: usize,
    },

    /// Adding the connection would make the graph cyclic.
    #[error("connecting {from} to {to} would create a cycle")]
    CycleDetected {
        /// Upstream node.
        from: NodeId,
        /// Downstream node.
        to: NodeId,
    },

    /// Only one `source-local` node may exist per chain.
    #[error("a local source already exists in this chain")]
    DuplicateSourceLocal,

    /// A sequence index passed to a reorder was out of range.
    #[error("index {index} out of range for chain of {len} nodes")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of nodes in the chain.
        len: usize,
    },
}

impl ChainError {
    /// Whether this rejection should be surfaced to the user.
    ///
    /// Missed clicks (unknown or identical ids, ports on source effects) are
    /// silent no-ops; structural refusals are worth a warning.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            ChainError::CycleDetected { .. }
                | ChainError::DuplicateSourceLocal
                | ChainError::PortOutOfRange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = ChainError::PortOutOfRange {
            node: NodeId::from("node-3"),
            port: 2,
            max: 1,
        };
        assert_eq!(
            err.to_string(),
            "port 2 out of range for node node-3 (max 1 inputs)"
        );
        assert_eq!(
            ChainError::DuplicateSourceLocal.to_string(),
            "a local source already exists in this chain"
        );
    }

    #[test]
    fn visibility_split() {
        assert!(ChainError::DuplicateSourceLocal.is_user_visible());
        assert!(
            ChainError::CycleDetected {
                from: NodeId::from("a"),
                to: NodeId::from("b"),
            }
            .is_user_visible()
        );
        assert!(!ChainError::NodeNotFound(NodeId::from("a")).is_user_visible());
        assert!(!ChainError::SelfConnection(NodeId::from("a")).is_user_visible());
    }
}
