//! Core model for the glitchlamp effect-chain editor.
//!
//! This crate owns everything the editor knows about an effect chain that is
//! independent of how it is drawn: the node graph, the declarative option
//! schema each effect publishes, and the registry that resolves an effect name
//! into its port layout and options.
//!
//! # Modules
//!
//! - [`option`] — Option schema (`bool`/`int`/`float`/`select`/`text`) and value coercion
//! - [`registry`] — [`EffectRegistry`]: catalog definitions plus built-in source descriptors
//! - [`node`] — [`ChainNode`], [`NodeId`], [`Position`] and id allocation
//! - [`chain`] — [`ChainModel`], the single source of truth for both editor views
//! - [`wire`] — Persisted node shape and tolerant normalisation of loaded chains
//!
//! # Example
//!
//! ```rust
//! use glitchlamp_core::{ChainModel, EffectRegistry};
//!
//! let registry = EffectRegistry::new();
//! let mut chain = ChainModel::new();
//!
//! let source = chain.add_node("source", None).unwrap();
//! let glitch = chain.add_node("glitch", None).unwrap();
//! chain.connect(&registry, &source, &glitch, 0).unwrap();
//!
//! assert_eq!(chain.node(&glitch).unwrap().inputs, vec![Some(source)]);
//! ```

pub mod chain;
mod error;
pub mod node;
pub mod option;
pub mod registry;
pub mod wire;

pub use chain::ChainModel;
pub use error::ChainError;
pub use node::{ChainNode, IdAllocator, NodeId, Position, grid_position};
pub use option::{OptionKind, OptionMap, OptionSpec, OptionValue};
pub use registry::{
    EffectDefinition, EffectDescriptor, EffectKind, EffectRegistry, NOISE, SOURCE, SOURCE_LOCAL,
};
pub use wire::{WireNode, normalize, normalize_value};
