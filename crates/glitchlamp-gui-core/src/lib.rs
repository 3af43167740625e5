//! Renderer-agnostic pieces of the glitchlamp chain editor.
//!
//! Everything here is usable without a running editor: the canvas
//! [`Viewport`] transform and connection geometry, the click-to-connect
//! [`WiringState`] machine, the startup [`InputCapabilityProfile`], the
//! option widget factory, the toast slot, and the theme.
//!
//! # Modules
//!
//! - [`viewport`] — pan/zoom math and Bezier connection curves
//! - [`wiring`] — output → input connection gesture
//! - [`capability`] — touch/pointer capability decided once at startup
//! - [`widgets`] — option controls with soft-clamped numeric editing
//! - [`toast`] — most-recent-wins notifications
//! - [`theme`] — colors and egui style

pub mod capability;
pub mod theme;
pub mod toast;
pub mod viewport;
pub mod widgets;
pub mod wiring;

pub use capability::{DisplayHints, InputCapabilityProfile};
pub use theme::Theme;
pub use toast::{Toast, ToastLevel, Toasts};
pub use viewport::{MAX_SCALE, MIN_SCALE, Viewport, connection_curve};
pub use widgets::{OptionResponse, option_widget};
pub use wiring::{Connection, WiringState};
