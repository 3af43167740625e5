//! Pan/zoom node canvas.
//!
//! Cards are child UIs placed at `stage.min + viewport.world_to_screen(pos)`
//! with a per-card style scaled by the zoom factor. Port anchors are taken
//! from where the port circles actually render each frame, and connection
//! curves are painted into a shape slot reserved before the cards so they
//! sit underneath them.

use egui::epaint::CubicBezierShape;
use egui::{
    Align, Color32, ComboBox, CursorIcon, Frame, Label, Layout, Margin, PointerButton, Pos2, Rect,
    Response, RichText, Sense, Shape, Slider, Stroke, StrokeKind, Ui, UiBuilder, Vec2, vec2,
};
use std::collections::HashMap;

use glitchlamp_client::NodeActivity;
use glitchlamp_core::{ChainNode, NodeId, OptionValue};
use glitchlamp_gui_core::viewport::{connection_curve_scaled, wheel_zoom_factor};
use glitchlamp_gui_core::{MAX_SCALE, MIN_SCALE, Theme, option_widget};

use crate::session::EditorSession;

/// Card width in world units.
pub const CARD_WIDTH: f32 = 220.0;

const PORT_SIZE: f32 = 14.0;
const PORT_RADIUS: f32 = 5.0;
const GRID_STEP: f32 = 40.0;

enum CanvasAction {
    OutputClicked(NodeId),
    InputClicked(NodeId, usize),
    Disconnect(NodeId, usize),
    Remove(NodeId),
    Retarget(NodeId, String),
    SetOption(NodeId, String, OptionValue),
    /// Card drag began; carries the pointer motion of that same frame.
    DragStart(NodeId, Vec2),
    DragBy(Vec2),
    DragEnd,
    CancelWiring,
}

/// Screen positions of the ports drawn this frame.
#[derive(Default)]
struct Anchors {
    outputs: HashMap<NodeId, Pos2>,
    inputs: HashMap<(NodeId, usize), Pos2>,
}

/// Canvas view of the chain.
#[derive(Debug, Default)]
pub struct CanvasView {
    /// Card sizes in world units, measured on the previous frame.
    card_sizes: HashMap<NodeId, Vec2>,
    /// A slider inside a card is being dragged; card drags are refused.
    slider_held: bool,
}

impl CanvasView {
    /// Creates a canvas view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the toolbar and the stage, and applies the user's edits.
    pub fn show(&mut self, ui: &mut Ui, session: &mut EditorSession, theme: &Theme) {
        let zoom_request = self.toolbar(ui, session, theme);

        let stage = ui.available_rect_before_wrap();
        let stage_response = ui.allocate_rect(stage, Sense::click_and_drag());
        session.set_stage_size(Some(stage.size()));

        if let Some(percent) = zoom_request {
            session
                .viewport
                .set_zoom_percent(percent, (stage.size() * 0.5).to_pos2());
        }
        self.stage_input(ui, session, stage, &stage_response);

        let painter = ui.painter_at(stage);
        painter.rect_filled(stage, 0.0, theme.background);
        draw_grid(&painter, session, stage, theme);
        let wires_slot = painter.add(Shape::Noop);

        let mut actions = Vec::new();
        let mut anchors = Anchors::default();
        let mut slider_held = false;
        let mut seen = Vec::with_capacity(session.chain.len());

        for node in session.chain.nodes() {
            let rect = self.card(ui, session, theme, stage, node, &mut anchors, &mut actions, &mut slider_held);
            self.card_sizes
                .insert(node.id.clone(), rect.size() / session.viewport.scale);
            seen.push(node.id.clone());
        }
        self.card_sizes.retain(|id, _| seen.contains(id));
        self.slider_held = slider_held;

        painter.set(wires_slot, Shape::Vec(wires(ui, session, theme, stage, &anchors)));

        if session.chain.is_empty() {
            painter.text(
                stage.center(),
                egui::Align2::CENTER_CENTER,
                "Add an effect to start a chain",
                egui::FontId::proportional(16.0),
                theme.text_secondary,
            );
        }

        self.apply(session, actions);
    }

    /// Zoom slider, reset, and the wiring hint. Returns a requested zoom in percent.
    fn toolbar(&mut self, ui: &mut Ui, session: &mut EditorSession, theme: &Theme) -> Option<f32> {
        let mut request = None;
        ui.horizontal(|ui| {
            ui.label("Zoom");
            let mut percent = session.viewport.zoom_percent();
            let slider = Slider::new(&mut percent, MIN_SCALE * 100.0..=MAX_SCALE * 100.0)
                .step_by(5.0)
                .suffix("%");
            if ui.add(slider).changed() {
                request = Some(percent);
            }
            if ui.button("Reset view").clicked() {
                session.viewport.reset();
            }
            if let Some(from) = session.wiring.selected() {
                ui.separator();
                let title = session.chain.node(from).map_or("?", ChainNode::title);
                ui.label(
                    RichText::new(format!("Connecting from {title}: click an input port (Esc cancels)"))
                        .color(theme.accent),
                );
            }
        });
        request
    }

    /// Pan, wheel/pinch zoom, and click-to-cancel on the empty stage.
    fn stage_input(&self, ui: &Ui, session: &mut EditorSession, stage: Rect, response: &Response) {
        if response.clicked() {
            session.wiring.cancel();
        }
        if session.capability.supports_drag
            && (response.dragged_by(PointerButton::Primary) || response.dragged_by(PointerButton::Middle))
        {
            session.viewport.pan_by(response.drag_delta());
        }

        if !session.capability.supports_wheel_zoom || !ui.rect_contains_pointer(stage) {
            return;
        }
        let Some(pointer) = ui.input(|i| i.pointer.hover_pos()) else {
            return;
        };
        let local = (pointer - stage.min).to_pos2();
        let (scroll, pinch) = ui.input(|i| (i.raw_scroll_delta.y, i.zoom_delta()));
        if pinch != 1.0 {
            session.viewport.zoom_at(local, pinch);
        } else if scroll != 0.0 {
            session.viewport.zoom_at(local, wheel_zoom_factor(scroll));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn card(
        &self,
        ui: &mut Ui,
        session: &EditorSession,
        theme: &Theme,
        stage: Rect,
        node: &ChainNode,
        anchors: &mut Anchors,
        actions: &mut Vec<CanvasAction>,
        slider_held: &mut bool,
    ) -> Rect {
        let scale = session.viewport.scale;
        let descriptor = session.descriptor(&node.name);
        let known = session.registry.contains(&node.name);
        let draggable = session.capability.supports_drag && !descriptor.is_fixed_source() && !self.slider_held;

        let world = Pos2::new(node.position.x, node.position.y);
        let origin = stage.min + session.viewport.world_to_screen(world).to_vec2();
        let width = CARD_WIDTH * scale;
        let max_rect = Rect::from_min_size(origin, vec2(width, f32::INFINITY));

        let mut child = ui.new_child(
            UiBuilder::new()
                .id_salt(("card", &node.id))
                .max_rect(max_rect)
                .layout(Layout::top_down(Align::LEFT)),
        );
        child.set_clip_rect(stage.intersect(ui.clip_rect()));
        scale_style(&mut child, scale);

        // The body swallows clicks and drags that miss the card's widgets,
        // so they neither pan the stage nor fall through to cards below.
        if let Some(size) = self.card_sizes.get(&node.id) {
            let body = child.interact(
                Rect::from_min_size(origin, *size * scale),
                child.id().with("body"),
                Sense::click_and_drag(),
            );
            if body.clicked() {
                actions.push(CanvasAction::CancelWiring);
            }
        }

        let activity = session.monitor.activity(&node.id);
        let border = match activity {
            NodeActivity::Processing => Stroke::new(2.5 * scale, theme.glow_processing),
            NodeActivity::Processed => Stroke::new(2.0 * scale, theme.glow_processed),
            NodeActivity::Idle => Stroke::new(1.0, theme.card_border),
        };
        let margin = (8.0 * scale).round().clamp(1.0, 127.0) as i8;

        let frame = Frame::new()
            .fill(theme.card_bg)
            .stroke(border)
            .corner_radius(6.0 * scale)
            .inner_margin(Margin::same(margin))
            .show(&mut child, |ui| {
                let inner = width - 2.0 * f32::from(margin);
                ui.set_min_width(inner);
                ui.set_max_width(inner);

                ui.horizontal(|ui| {
                    let title = RichText::new(node.title())
                        .strong()
                        .color(theme.kind_color(descriptor.kind));
                    let header = if draggable {
                        ui.add(Label::new(title).selectable(false).sense(Sense::drag()))
                            .on_hover_cursor(CursorIcon::Grab)
                    } else {
                        ui.add(Label::new(title).selectable(false))
                    };
                    if header.drag_started() {
                        actions.push(CanvasAction::DragStart(node.id.clone(), header.drag_delta()));
                    } else if header.dragged() && session.dragging() == Some(&node.id) {
                        actions.push(CanvasAction::DragBy(header.drag_delta()));
                    }
                    if header.drag_stopped() {
                        actions.push(CanvasAction::DragEnd);
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.small_button("✕").on_hover_text("Remove").clicked() {
                            actions.push(CanvasAction::Remove(node.id.clone()));
                        }
                    });
                });

                ui.add_enabled_ui(!descriptor.is_fixed_source(), |ui| {
                    let selected = if known {
                        node.name.clone()
                    } else {
                        format!("{} (unknown)", node.name)
                    };
                    let mut choice = None;
                    ComboBox::from_id_salt(("canvas-type", &node.id))
                        .selected_text(selected)
                        .width(inner_width(ui))
                        .show_ui(ui, |ui| {
                            for name in session.registry.selectable_names() {
                                if ui.selectable_label(name == node.name, name).clicked() && name != node.name {
                                    choice = Some(name.to_owned());
                                }
                            }
                        });
                    if let Some(effect) = choice {
                        actions.push(CanvasAction::Retarget(node.id.clone(), effect));
                    }
                });

                ui.add_space(4.0 * scale);
                ports(ui, session, theme, node, anchors, actions);
                ui.add_space(4.0 * scale);

                for spec in &descriptor.options {
                    let current = spec.resolve(&node.options);
                    let response = option_widget(ui, ("canvas-opt", &node.id, &spec.name), spec, &current);
                    *slider_held |= response.slider_active;
                    if let Some(value) = response.edit {
                        actions.push(CanvasAction::SetOption(node.id.clone(), spec.name.clone(), value));
                    }
                }
            });

        let rect = frame.response.rect;
        if activity == NodeActivity::Processing {
            ui.painter_at(stage).rect_stroke(
                rect.expand(3.0 * scale),
                8.0 * scale,
                Stroke::new(3.0 * scale, theme.glow_processing.gamma_multiply(0.4)),
                StrokeKind::Outside,
            );
        }
        rect
    }

    fn apply(&mut self, session: &mut EditorSession, actions: Vec<CanvasAction>) {
        for action in actions {
            match action {
                CanvasAction::OutputClicked(id) => session.wiring.click_output(&id),
                CanvasAction::InputClicked(id, port) => {
                    if let Some(connection) = session.wiring.click_input(&id, port) {
                        session.connect(&connection);
                    }
                }
                CanvasAction::Disconnect(id, port) => session.disconnect(&id, port),
                CanvasAction::Remove(id) => {
                    session.remove_node(&id);
                    self.card_sizes.remove(&id);
                }
                CanvasAction::Retarget(id, effect) => session.retarget(&id, &effect),
                CanvasAction::SetOption(id, name, value) => session.set_option(&id, &name, value),
                CanvasAction::DragStart(id, delta) => {
                    if !self.slider_held && session.begin_drag(&id) {
                        session.drag_by(delta);
                    }
                }
                CanvasAction::DragBy(delta) => session.drag_by(delta),
                CanvasAction::DragEnd => session.end_drag(),
                CanvasAction::CancelWiring => session.wiring.cancel(),
            }
        }
    }
}

fn inner_width(ui: &Ui) -> f32 {
    ui.available_width().max(40.0)
}

/// Scales fonts and spacing of a card to the zoom factor.
fn scale_style(ui: &mut Ui, scale: f32) {
    let style = ui.style_mut();
    for font in style.text_styles.values_mut() {
        font.size *= scale;
    }
    style.spacing.item_spacing *= scale;
    style.spacing.button_padding *= scale;
    style.spacing.interact_size *= scale;
    style.spacing.slider_width *= scale;
    style.spacing.icon_width *= scale;
    style.spacing.icon_width_inner *= scale;
    style.spacing.icon_spacing *= scale;
}

/// Input column on the left, output port on the right.
fn ports(
    ui: &mut Ui,
    session: &EditorSession,
    theme: &Theme,
    node: &ChainNode,
    anchors: &mut Anchors,
    actions: &mut Vec<CanvasAction>,
) {
    let scale = session.viewport.scale;
    let descriptor = session.descriptor(&node.name);
    let port_size = Vec2::splat(PORT_SIZE * scale);

    ui.horizontal_top(|ui| {
        ui.vertical(|ui| {
            if !descriptor.accepts_inputs() {
                // Hidden but still laid out, so every card keeps the same height.
                ui.allocate_exact_size(port_size, Sense::hover());
                return;
            }
            for port in 0..descriptor.max_inputs {
                let upstream = node.inputs.get(port).and_then(Option::as_ref);
                ui.horizontal(|ui| {
                    let (rect, response) = ui.allocate_exact_size(port_size, Sense::click());
                    let fill = if upstream.is_some() { theme.port_connected } else { theme.port };
                    paint_port(ui, rect, fill, response.hovered().then_some(theme.accent));
                    anchors.inputs.insert((node.id.clone(), port), rect.center());

                    let response = match upstream.and_then(|id| session.chain.node(id)) {
                        Some(from) => response.on_hover_text(format!(
                            "{} ← {}. Right-click or long-press to disconnect.",
                            descriptor.port_label(port),
                            from.title()
                        )),
                        None => response,
                    };
                    if response.clicked() {
                        actions.push(CanvasAction::InputClicked(node.id.clone(), port));
                    }
                    let long_press = session.capability.supports_long_press && response.long_touched();
                    if upstream.is_some() && (response.secondary_clicked() || long_press) {
                        actions.push(CanvasAction::Disconnect(node.id.clone(), port));
                    }
                    ui.label(RichText::new(descriptor.port_label(port)).small().color(theme.text_secondary));
                });
            }
        });

        ui.with_layout(Layout::right_to_left(Align::Min), |ui| {
            let (rect, response) = ui.allocate_exact_size(port_size, Sense::click());
            let selected = session.wiring.selected() == Some(&node.id);
            let fed = session.chain.iter().any(|n| n.is_fed_by(&node.id));
            let fill = if fed { theme.port_connected } else { theme.port };
            let ring = (selected || response.hovered()).then_some(theme.accent);
            paint_port(ui, rect, fill, ring);
            anchors.outputs.insert(node.id.clone(), rect.center());
            if response.on_hover_text("Output: click, then click an input").clicked() {
                actions.push(CanvasAction::OutputClicked(node.id.clone()));
            }
            ui.label(RichText::new("Out").small().color(theme.text_secondary));
        });
    });
}

fn paint_port(ui: &Ui, rect: Rect, fill: Color32, ring: Option<Color32>) {
    let radius = PORT_RADIUS * rect.width() / PORT_SIZE;
    let painter = ui.painter();
    painter.circle_filled(rect.center(), radius, fill);
    if let Some(color) = ring {
        painter.circle_stroke(rect.center(), radius + 1.5, Stroke::new(1.5, color));
    }
}

/// One curve per connected input, plus the pending wire while connecting.
fn wires(ui: &Ui, session: &EditorSession, theme: &Theme, stage: Rect, anchors: &Anchors) -> Vec<Shape> {
    let scale = session.viewport.scale;
    let stroke = Stroke::new((2.0 * scale).max(1.0), theme.connection);
    let mut shapes = Vec::new();

    for node in session.chain.iter() {
        for (port, from) in node.connected_inputs() {
            let (Some(&start), Some(&end)) = (
                anchors.outputs.get(from),
                anchors.inputs.get(&(node.id.clone(), port)),
            ) else {
                continue;
            };
            shapes.push(curve(start, end, scale, stroke));
        }
    }

    if let Some(from) = session.wiring.selected()
        && let Some(&start) = anchors.outputs.get(from)
        && let Some(pointer) = ui.input(|i| i.pointer.hover_pos())
        && stage.contains(pointer)
    {
        shapes.push(curve(start, pointer, scale, Stroke::new(stroke.width, theme.accent)));
    }
    shapes
}

fn curve(from: Pos2, to: Pos2, scale: f32, stroke: Stroke) -> Shape {
    let points = connection_curve_scaled(from, to, scale);
    CubicBezierShape::from_points_stroke(points, false, Color32::TRANSPARENT, stroke).into()
}

fn draw_grid(painter: &egui::Painter, session: &EditorSession, stage: Rect, theme: &Theme) {
    let step = GRID_STEP * session.viewport.scale;
    if step < 12.0 {
        return;
    }
    let offset = session.viewport.offset;
    let start_x = stage.min.x + offset.x.rem_euclid(step);
    let start_y = stage.min.y + offset.y.rem_euclid(step);
    let mut y = start_y;
    while y < stage.max.y {
        let mut x = start_x;
        while x < stage.max.x {
            painter.circle_filled(Pos2::new(x, y), 1.0, theme.grid);
            x += step;
        }
        y += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glitchlamp_core::{EffectDefinition, EffectRegistry};
    use glitchlamp_gui_core::InputCapabilityProfile;

    fn session() -> EditorSession {
        let registry = EffectRegistry::from_catalog(vec![
            EffectDefinition::new("glitch", ""),
            EffectDefinition::new("mix", "").file_level(),
        ]);
        EditorSession::new(registry, InputCapabilityProfile::pointer())
    }

    fn frame(ctx: &egui::Context, view: &mut CanvasView, session: &mut EditorSession) {
        let theme = Theme::default();
        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, vec2(1200.0, 800.0))),
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| view.show(ui, session, &theme));
        });
    }

    #[test]
    fn drawing_records_stage_and_leaves_chain() {
        let mut session = session();
        let src = session.add_node("source").unwrap();
        let mix = session.add_node("mix").unwrap();
        session.chain.connect(&session.registry, &src, &mix, 1).unwrap();
        session.add_node("unheard-of");
        let revision = session.chain.revision();

        let ctx = egui::Context::default();
        let mut view = CanvasView::new();
        frame(&ctx, &mut view, &mut session);
        frame(&ctx, &mut view, &mut session);

        assert_eq!(session.chain.revision(), revision);
        assert_eq!(view.card_sizes.len(), 3);
        assert!(view.card_sizes.values().all(|s| s.x > 0.0 && s.y > 0.0));
    }

    #[test]
    fn removed_nodes_drop_their_cached_size() {
        let mut session = session();
        let a = session.add_node("glitch").unwrap();
        session.add_node("glitch").unwrap();
        let ctx = egui::Context::default();
        let mut view = CanvasView::new();
        frame(&ctx, &mut view, &mut session);
        session.remove_node(&a);
        frame(&ctx, &mut view, &mut session);
        assert_eq!(view.card_sizes.len(), 1);
        assert!(!view.card_sizes.contains_key(&a));
    }

    #[test]
    fn apply_routes_wiring_through_the_session() {
        let mut session = session();
        let src = session.add_node("source").unwrap();
        let fx = session.add_node("glitch").unwrap();
        let mut view = CanvasView::new();
        view.apply(
            &mut session,
            vec![
                CanvasAction::OutputClicked(src.clone()),
                CanvasAction::InputClicked(fx.clone(), 0),
            ],
        );
        assert_eq!(session.chain.node(&fx).unwrap().inputs, vec![Some(src)]);
        assert!(!session.wiring.is_active());

        view.apply(&mut session, vec![CanvasAction::Disconnect(fx.clone(), 0)]);
        assert_eq!(session.chain.node(&fx).unwrap().inputs, vec![None]);
    }

    #[test]
    fn held_slider_blocks_card_drag() {
        let mut session = session();
        let fx = session.add_node("glitch").unwrap();
        let mut view = CanvasView::new();
        view.slider_held = true;
        view.apply(&mut session, vec![CanvasAction::DragStart(fx.clone(), Vec2::ZERO)]);
        assert!(session.dragging().is_none());
        view.slider_held = false;
        view.apply(&mut session, vec![CanvasAction::DragStart(fx.clone(), Vec2::ZERO)]);
        assert_eq!(session.dragging(), Some(&fx));
    }

    #[test]
    fn first_frame_of_a_card_drag_moves_the_card() {
        let mut session = session();
        let fx = session.add_node("glitch").unwrap();
        let before = session.chain.node(&fx).unwrap().position;
        let mut view = CanvasView::new();
        view.apply(&mut session, vec![CanvasAction::DragStart(fx.clone(), vec2(30.0, -10.0))]);

        let after = session.chain.node(&fx).unwrap().position;
        assert_eq!(session.dragging(), Some(&fx));
        assert!((after.x - before.x - 30.0).abs() < 1e-3);
        assert!((after.y - before.y + 10.0).abs() < 1e-3);
    }
}
