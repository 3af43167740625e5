//! Glitchlamp GUI - node-graph effect chain editor.
//!
//! Edits the appliance's effect chain either as a reorderable list or as
//! a pan/zoom node canvas. Both views render the same
//! [`EditorSession`]; backend requests run off the UI thread through the
//! [`SettingsBridge`].

pub mod app;
pub mod canvas_view;
pub mod list_view;
pub mod monitor_panel;
pub mod preset_panel;
pub mod session;
pub mod settings_bridge;
pub mod view_coordinator;

pub use app::{AppOptions, GlitchlampApp};
pub use session::{EditorSession, SavePoint};
pub use settings_bridge::{BridgeEvent, RequestKind, SettingsBridge, TransferError};
pub use view_coordinator::{ActiveView, ViewCoordinator, initial_view};
