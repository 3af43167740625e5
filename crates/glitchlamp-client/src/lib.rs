//! Backend bridge for the glitchlamp chain editor.
//!
//! This crate is everything between the editor and the appliance's REST API:
//!
//! - **Transport**: the object-safe [`Backend`] trait, a blocking
//!   [`HttpBackend`] and an in-process [`MemoryBackend`] for offline use
//! - **Bridge**: catalog → [`EffectRegistry`](glitchlamp_core::EffectRegistry),
//!   settings ↔ chain and presets ↔ chain ([`bridge`])
//! - **Ordering**: [`RequestTokens`] so the last request issued wins, not
//!   the last to resolve
//! - **Resilience**: bounded settings retry ([`RetryPolicy`])
//! - **Monitoring**: cancellable [`PollTask`]s and the [`GenerationMonitor`]
//!
//! # Example
//!
//! ```rust
//! use glitchlamp_client::{MemoryBackend, RetryPolicy, bridge};
//!
//! let backend = MemoryBackend::demo();
//! let registry = bridge::load_registry(&backend).unwrap();
//! let (_settings, chain) = bridge::load_chain(&backend, &registry, RetryPolicy::once()).unwrap();
//!
//! // A chain loaded from default settings always starts at a source.
//! assert_eq!(chain.nodes()[0].name, "source");
//! ```

mod backend;
mod error;
mod http;
mod monitor;
mod poll;
mod retry;
mod status;
mod tokens;

/// Settings and preset bridge.
pub mod bridge;

pub use backend::{Backend, MemoryBackend, demo_catalog};
pub use error::ClientError;
pub use http::HttpBackend;
pub use monitor::{GenerationMonitor, NodeActivity};
pub use poll::{Latest, PollTask};
pub use retry::{RetryPolicy, load_settings_with_retry};
pub use status::{
    GenerationState, GenerationStatus, LogEntry, Progress, WorkerInfo, parse_logs, parse_workers,
};
pub use tokens::{RequestToken, RequestTokens};
