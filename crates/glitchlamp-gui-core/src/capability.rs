//! Input capability profile.
//!
//! Platform heuristics are evaluated once, at startup, into an
//! [`InputCapabilityProfile`]. Renderers consult the profile and never
//! re-detect the platform themselves.

/// Viewport width below which the list view is preferred, in points.
pub const NARROW_WIDTH: f32 = 768.0;

/// What is known about the display at startup.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayHints {
    /// The primary input is a touch screen.
    pub touch: bool,
    /// Initial viewport width in points, if known.
    pub width: Option<f32>,
}

impl DisplayHints {
    /// Hints from an explicit touch setting and the initial width.
    pub fn new(touch: bool, width: Option<f32>) -> Self {
        Self { touch, width }
    }

    /// Whether the viewport is too narrow for the canvas.
    pub fn is_narrow(&self) -> bool {
        self.width.is_some_and(|w| w < NARROW_WIDTH)
    }

    /// Touch-capable or narrow displays start in the list view.
    pub fn prefers_list(&self) -> bool {
        self.touch || self.is_narrow()
    }
}

/// Which pointer gestures the renderer may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputCapabilityProfile {
    /// Card drag and stage pan.
    pub supports_drag: bool,
    /// Wheel zoom around the pointer.
    pub supports_wheel_zoom: bool,
    /// Press-and-hold as a secondary click.
    pub supports_long_press: bool,
}

impl Default for InputCapabilityProfile {
    fn default() -> Self {
        Self::pointer()
    }
}

impl InputCapabilityProfile {
    /// Mouse or trackpad.
    pub const fn pointer() -> Self {
        Self {
            supports_drag: true,
            supports_wheel_zoom: true,
            supports_long_press: false,
        }
    }

    /// Touch screen: no drag or wheel, long-press instead of right click.
    pub const fn touch() -> Self {
        Self {
            supports_drag: false,
            supports_wheel_zoom: false,
            supports_long_press: true,
        }
    }

    /// Decides the profile from startup hints.
    pub fn from_hints(hints: &DisplayHints) -> Self {
        let profile = if hints.touch {
            Self::touch()
        } else {
            Self::pointer()
        };
        tracing::debug!(?hints, ?profile, "input capability profile");
        profile
    }
}
