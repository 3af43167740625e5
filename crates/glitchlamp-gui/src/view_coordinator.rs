//! Switches between the list and canvas renderers.
//!
//! The initial view is decided once at startup from the configured
//! preference and the display; afterwards only the user toggles it.
//! Switching never touches the chain: the newly active view simply draws
//! the current model on its next frame.

use egui::Ui;

use glitchlamp_config::ViewPreference;
use glitchlamp_gui_core::{DisplayHints, Theme};

use crate::canvas_view::CanvasView;
use crate::list_view::ListView;
use crate::session::EditorSession;

/// Which renderer is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    /// Linear, reorderable list.
    List,
    /// Pan/zoom node canvas.
    Canvas,
}

impl ActiveView {
    /// The other view.
    pub fn toggled(self) -> Self {
        match self {
            ActiveView::List => ActiveView::Canvas,
            ActiveView::Canvas => ActiveView::List,
        }
    }

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            ActiveView::List => "List",
            ActiveView::Canvas => "Canvas",
        }
    }
}

/// Startup view: an explicit preference wins, otherwise touch or narrow
/// displays get the list.
pub fn initial_view(preference: ViewPreference, hints: &DisplayHints) -> ActiveView {
    match preference {
        ViewPreference::List => ActiveView::List,
        ViewPreference::Canvas => ActiveView::Canvas,
        ViewPreference::Auto if hints.prefers_list() => ActiveView::List,
        ViewPreference::Auto => ActiveView::Canvas,
    }
}

/// Owns both renderers and the switch between them.
pub struct ViewCoordinator {
    active: ActiveView,
    list: ListView,
    canvas: CanvasView,
}

impl ViewCoordinator {
    /// Coordinator starting in `active`.
    pub fn new(active: ActiveView) -> Self {
        tracing::info!(view = active.label(), "initial chain view");
        Self {
            active,
            list: ListView::new(),
            canvas: CanvasView::new(),
        }
    }

    /// Currently showing renderer.
    pub fn active(&self) -> ActiveView {
        self.active
    }

    /// Switches to the other renderer.
    pub fn toggle(&mut self, session: &mut EditorSession) {
        self.set_active(self.active.toggled(), session);
    }

    /// Switches to `view`.
    pub fn set_active(&mut self, view: ActiveView, session: &mut EditorSession) {
        if view == self.active {
            return;
        }
        self.active = view;
        // Canvas-only gestures must not survive into the list.
        session.wiring.cancel();
        session.end_drag();
        if view == ActiveView::List {
            session.set_stage_size(None);
        }
        tracing::debug!(view = view.label(), "switched chain view");
    }

    /// Draws the active renderer.
    pub fn show(&mut self, ui: &mut Ui, session: &mut EditorSession, theme: &Theme) {
        match self.active {
            ActiveView::List => self.list.show(ui, session, theme),
            ActiveView::Canvas => self.canvas.show(ui, session, theme),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glitchlamp_core::EffectRegistry;
    use glitchlamp_gui_core::InputCapabilityProfile;

    #[test]
    fn auto_follows_display() {
        let desktop = DisplayHints::new(false, Some(1280.0));
        let phone = DisplayHints::new(true, Some(390.0));
        let narrow = DisplayHints::new(false, Some(600.0));
        assert_eq!(initial_view(ViewPreference::Auto, &desktop), ActiveView::Canvas);
        assert_eq!(initial_view(ViewPreference::Auto, &phone), ActiveView::List);
        assert_eq!(initial_view(ViewPreference::Auto, &narrow), ActiveView::List);
    }

    #[test]
    fn explicit_preference_wins() {
        let phone = DisplayHints::new(true, Some(390.0));
        assert_eq!(initial_view(ViewPreference::Canvas, &phone), ActiveView::Canvas);
        let desktop = DisplayHints::new(false, Some(1280.0));
        assert_eq!(initial_view(ViewPreference::List, &desktop), ActiveView::List);
    }

    #[test]
    fn toggling_leaves_the_chain_alone() {
        let mut session = EditorSession::new(EffectRegistry::new(), InputCapabilityProfile::pointer());
        let a = session.add_node("source").unwrap();
        let revision = session.chain.revision();
        session.wiring.click_output(&a);

        let mut views = ViewCoordinator::new(ActiveView::Canvas);
        views.toggle(&mut session);
        assert_eq!(views.active(), ActiveView::List);
        assert_eq!(session.chain.revision(), revision);
        assert!(!session.wiring.is_active());

        views.toggle(&mut session);
        assert_eq!(views.active(), ActiveView::Canvas);
    }
}
