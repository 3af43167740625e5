//! Pan/zoom transform of the canvas stage.
//!
//! Node positions live in world space. The viewport maps them to
//! stage-local screen space (relative to the stage's top-left corner):
//!
//! ```text
//! screen = offset + world * scale
//! ```
//!
//! The viewport is never persisted; [`Viewport::reset`] returns to the
//! identity transform.

use egui::{Pos2, Vec2, pos2};

/// Smallest zoom factor.
pub const MIN_SCALE: f32 = 0.25;
/// Largest zoom factor.
pub const MAX_SCALE: f32 = 2.5;

/// Minimum horizontal control-point offset of a connection curve.
pub const MIN_CURVE_OFFSET: f32 = 90.0;

/// Pan offset and zoom factor of the canvas stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Stage-local screen position of the world origin.
    pub offset: Vec2,
    /// Zoom factor, within [`MIN_SCALE`]..=[`MAX_SCALE`].
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Viewport {
    /// Identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// World → stage-local screen.
    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        (self.offset + world.to_vec2() * self.scale).to_pos2()
    }

    /// Stage-local screen → world.
    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.offset) / self.scale).to_pos2()
    }

    /// Converts a screen-space drag delta to world space.
    pub fn screen_delta_to_world(&self, delta: Vec2) -> Vec2 {
        delta / self.scale
    }

    /// Translates the stage 1:1 with a pointer delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.offset += delta;
        }
    }

    /// Scales by `factor` around `pointer` (stage-local), keeping the world
    /// point under the pointer fixed. Returns whether the scale changed.
    pub fn zoom_at(&mut self, pointer: Pos2, factor: f32) -> bool {
        if !(factor.is_finite() && factor > 0.0) {
            return false;
        }
        self.zoom_to(pointer, self.scale * factor)
    }

    /// Sets the zoom to `percent` (100 = 1:1) around the stage centre.
    pub fn set_zoom_percent(&mut self, percent: f32, stage_center: Pos2) -> bool {
        if !percent.is_finite() {
            return false;
        }
        self.zoom_to(stage_center, percent / 100.0)
    }

    /// Zoom as a whole percentage, for the zoom slider.
    pub fn zoom_percent(&self) -> f32 {
        (self.scale * 100.0).round()
    }

    fn zoom_to(&mut self, anchor: Pos2, scale: f32) -> bool {
        let scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        if (scale - self.scale).abs() <= f32::EPSILON {
            return false;
        }
        let world = self.screen_to_world(anchor);
        self.scale = scale;
        self.offset = anchor.to_vec2() - world.to_vec2() * scale;
        true
    }

    /// World coordinate at the centre of a stage of `stage_size`.
    pub fn world_center(&self, stage_size: Vec2) -> Pos2 {
        self.screen_to_world((stage_size * 0.5).to_pos2())
    }

    /// Back to no pan, 100 % zoom.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Control points of the cubic Bezier from an output anchor to an input
/// anchor: `[from, c1, c2, to]`.
///
/// The horizontal control offset is half the horizontal distance between
/// the anchors, never less than [`MIN_CURVE_OFFSET`], so curves stay
/// readable when the target sits left of the source.
pub fn connection_curve(from: Pos2, to: Pos2) -> [Pos2; 4] {
    connection_curve_scaled(from, to, 1.0)
}

/// [`connection_curve`] with the minimum offset scaled by the zoom.
pub fn connection_curve_scaled(from: Pos2, to: Pos2, scale: f32) -> [Pos2; 4] {
    let dx = ((to.x - from.x).abs() * 0.5).max(MIN_CURVE_OFFSET * scale);
    [from, pos2(from.x + dx, from.y), pos2(to.x - dx, to.y), to]
}

/// Point on a cubic Bezier at `t` in 0..=1.
pub fn bezier_point(points: &[Pos2; 4], t: f32) -> Pos2 {
    let u = 1.0 - t;
    let [p0, p1, p2, p3] = points.map(Pos2::to_vec2);
    (p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t))
        .to_pos2()
}

/// Distance from `point` to the nearest of `samples` points along a curve.
/// Used for hit-testing connections.
pub fn distance_to_curve(points: &[Pos2; 4], point: Pos2, samples: usize) -> f32 {
    let samples = samples.max(2);
    (0..=samples)
        .map(|i| bezier_point(points, i as f32 / samples as f32))
        .map(|p| p.distance(point))
        .fold(f32::INFINITY, f32::min)
}

/// Zoom factor for a wheel/pinch scroll delta (positive = in).
pub fn wheel_zoom_factor(scroll_y: f32) -> f32 {
    (scroll_y * 0.0015).exp()
}
