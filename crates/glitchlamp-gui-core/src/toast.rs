//! Transient notifications.
//!
//! One toast is visible at a time. A new toast replaces the visible one
//! immediately and restarts the timer. Persistent toasts stay until the
//! user dismisses them or another toast replaces them.
//!
//! Timestamps are egui input time in seconds, passed in by the caller.

use egui::{Align2, Area, Color32, Context, Frame, Id, Margin, RichText, Sense, vec2};

use crate::theme::Theme;

/// How long a regular toast stays up, in seconds.
pub const TOAST_SECONDS: f64 = 2.0;

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    /// Confirmation of a completed action.
    Info,
    /// A refused or partially applied action.
    Warning,
    /// A failed request.
    Error,
}

/// A single notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    /// Severity.
    pub level: ToastLevel,
    /// Text shown to the user.
    pub message: String,
    shown_at: f64,
    persistent: bool,
}

impl Toast {
    /// Whether the toast has outlived its display time at `now`.
    pub fn expired(&self, now: f64) -> bool {
        !self.persistent && now - self.shown_at >= TOAST_SECONDS
    }

    /// Whether the toast stays until dismissed.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }
}

/// Most-recent-wins toast slot.
#[derive(Debug, Clone, Default)]
pub struct Toasts {
    current: Option<Toast>,
}

impl Toasts {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `message`, replacing whatever is visible.
    pub fn push(&mut self, level: ToastLevel, message: impl Into<String>, now: f64) {
        self.set(level, message.into(), now, false);
    }

    /// Shows an info toast.
    pub fn info(&mut self, message: impl Into<String>, now: f64) {
        self.push(ToastLevel::Info, message, now);
    }

    /// Shows a warning toast.
    pub fn warn(&mut self, message: impl Into<String>, now: f64) {
        self.push(ToastLevel::Warning, message, now);
    }

    /// Shows an error toast.
    pub fn error(&mut self, message: impl Into<String>, now: f64) {
        self.push(ToastLevel::Error, message, now);
    }

    /// Shows an error that stays until dismissed or replaced.
    pub fn persistent_error(&mut self, message: impl Into<String>, now: f64) {
        self.set(ToastLevel::Error, message.into(), now, true);
    }

    fn set(&mut self, level: ToastLevel, message: String, now: f64, persistent: bool) {
        tracing::debug!(?level, persistent, "toast: {message}");
        self.current = Some(Toast {
            level,
            message,
            shown_at: now,
            persistent,
        });
    }

    /// The visible toast at `now`, if any.
    pub fn current(&self, now: f64) -> Option<&Toast> {
        self.current.as_ref().filter(|t| !t.expired(now))
    }

    /// Drops the visible toast.
    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// Paints the visible toast at the bottom of the screen. Clicking it
    /// dismisses it.
    pub fn show(&mut self, ctx: &Context, theme: &Theme) {
        let now = ctx.input(|i| i.time);
        let Some(toast) = self.current(now) else {
            self.current = None;
            return;
        };

        let accent = match toast.level {
            ToastLevel::Info => theme.toast_info,
            ToastLevel::Warning => theme.toast_warning,
            ToastLevel::Error => theme.toast_error,
        };
        let text = toast.message.clone();
        let remaining = TOAST_SECONDS - (now - toast.shown_at);
        let persistent = toast.persistent;

        let clicked = Area::new(Id::new("glitchlamp_toast"))
            .anchor(Align2::CENTER_BOTTOM, vec2(0.0, -36.0))
            .interactable(true)
            .show(ctx, |ui| {
                Frame::new()
                    .fill(theme.panel_bg)
                    .stroke(egui::Stroke::new(1.5, accent))
                    .corner_radius(6.0)
                    .inner_margin(Margin::symmetric(14, 8))
                    .show(ui, |ui| {
                        ui.label(RichText::new(text).color(Color32::WHITE));
                    })
                    .response
                    .interact(Sense::click())
                    .clicked()
            })
            .inner;

        if clicked {
            self.dismiss();
        } else if !persistent {
            ctx.request_repaint_after(std::time::Duration::from_secs_f64(remaining.max(0.0)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_two_seconds() {
        let mut toasts = Toasts::new();
        toasts.info("saved", 10.0);
        assert!(toasts.current(11.9).is_some());
        assert!(toasts.current(12.0).is_none());
    }

    #[test]
    fn most_recent_wins_and_restarts_timer() {
        let mut toasts = Toasts::new();
        toasts.info("first", 0.0);
        toasts.warn("second", 1.5);
        let t = toasts.current(3.0).unwrap();
        assert_eq!(t.message, "second");
        assert_eq!(t.level, ToastLevel::Warning);
        assert!(toasts.current(3.6).is_none());
    }

    #[test]
    fn persistent_until_dismissed_or_replaced() {
        let mut toasts = Toasts::new();
        toasts.persistent_error("settings unavailable", 0.0);
        assert!(toasts.current(1000.0).unwrap().is_persistent());
        toasts.info("retrying", 1000.0);
        assert!(toasts.current(1003.0).is_none());

        toasts.persistent_error("again", 0.0);
        toasts.dismiss();
        assert!(toasts.current(0.0).is_none());
    }
}
