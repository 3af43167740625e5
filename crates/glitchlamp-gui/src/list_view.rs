//! Linear list renderer.
//!
//! Shows the same chain as the canvas as a vertical list of cards with
//! adjacent-swap reordering. Wiring is canvas-only; the list never shows
//! or edits ports.

use egui::{
    Align, Button, CollapsingHeader, ComboBox, Frame, Key, Layout, Margin, RichText, ScrollArea,
    Stroke, TextEdit, Ui,
};

use glitchlamp_core::{ChainNode, NodeId, OptionValue};
use glitchlamp_gui_core::{Theme, option_widget};

use crate::session::EditorSession;

/// Edits collected while drawing, applied once the chain is no longer borrowed.
enum ListAction {
    MoveUp(NodeId),
    MoveDown(NodeId),
    Remove(NodeId),
    Retarget(NodeId, String),
    Rename(NodeId, String),
    SetOption(NodeId, String, OptionValue),
}

/// List view of the chain.
#[derive(Debug, Default)]
pub struct ListView;

impl ListView {
    /// Creates a list view.
    pub fn new() -> Self {
        Self
    }

    /// Draws the list and applies the user's edits to `session`.
    pub fn show(&mut self, ui: &mut Ui, session: &mut EditorSession, theme: &Theme) {
        let mut actions = Vec::new();

        if session.chain.is_empty() {
            ui.add_space(24.0);
            ui.vertical_centered(|ui| {
                ui.label(
                    RichText::new("No effects yet. Use \"Add effect\" to start a chain.")
                        .color(theme.text_secondary)
                        .italics(),
                );
            });
            return;
        }

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let last = session.chain.len() - 1;
                for (index, node) in session.chain.nodes().iter().enumerate() {
                    entry(ui, session, theme, node, index, last, &mut actions);
                    ui.add_space(6.0);
                }
            });

        for action in actions {
            match action {
                ListAction::MoveUp(id) => {
                    session.move_up(&id);
                }
                ListAction::MoveDown(id) => {
                    session.move_down(&id);
                }
                ListAction::Remove(id) => session.remove_node(&id),
                ListAction::Retarget(id, effect) => session.retarget(&id, &effect),
                ListAction::Rename(id, label) => session.set_label(&id, &label),
                ListAction::SetOption(id, name, value) => session.set_option(&id, &name, value),
            }
        }
    }
}

fn entry(
    ui: &mut Ui,
    session: &EditorSession,
    theme: &Theme,
    node: &ChainNode,
    index: usize,
    last: usize,
    actions: &mut Vec<ListAction>,
) {
    let descriptor = session.descriptor(&node.name);
    let known = session.registry.contains(&node.name);

    Frame::new()
        .fill(theme.card_bg)
        .stroke(Stroke::new(1.0, theme.card_border))
        .corner_radius(6.0)
        .inner_margin(Margin::same(8))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                if ui.add_enabled(index > 0, Button::new("⬆").small()).clicked() {
                    actions.push(ListAction::MoveUp(node.id.clone()));
                }
                if ui.add_enabled(index < last, Button::new("⬇").small()).clicked() {
                    actions.push(ListAction::MoveDown(node.id.clone()));
                }

                ui.label(RichText::new("●").color(theme.kind_color(descriptor.kind)));
                title_editor(ui, node, actions);

                ui.add_enabled_ui(!descriptor.is_fixed_source(), |ui| {
                    let selected = if known {
                        node.name.clone()
                    } else {
                        format!("{} (unknown)", node.name)
                    };
                    let mut choice = None;
                    ComboBox::from_id_salt(("list-type", &node.id))
                        .selected_text(selected)
                        .width(140.0)
                        .show_ui(ui, |ui| {
                            for name in session.registry.selectable_names() {
                                if ui.selectable_label(name == node.name, name).clicked()
                                    && name != node.name
                                {
                                    choice = Some(name.to_owned());
                                }
                            }
                        });
                    if let Some(effect) = choice {
                        actions.push(ListAction::Retarget(node.id.clone(), effect));
                    }
                });

                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.small_button("✕").on_hover_text("Remove").clicked() {
                        actions.push(ListAction::Remove(node.id.clone()));
                    }
                });
            });

            if !known {
                ui.label(
                    RichText::new("Effect not in the catalog; kept as-is.")
                        .color(theme.toast_warning)
                        .small(),
                );
            } else if !descriptor.description.is_empty() {
                ui.label(RichText::new(&descriptor.description).color(theme.text_secondary).small());
            }

            if descriptor.options.is_empty() {
                return;
            }
            CollapsingHeader::new("Options")
                .id_salt(("list-options", &node.id))
                .show(ui, |ui| {
                    for spec in &descriptor.options {
                        let current = spec.resolve(&node.options);
                        let response =
                            option_widget(ui, ("list-opt", &node.id, &spec.name), spec, &current);
                        if let Some(value) = response.edit {
                            actions.push(ListAction::SetOption(
                                node.id.clone(),
                                spec.name.clone(),
                                value,
                            ));
                        }
                    }
                });
        });
}

/// Editable title. The text is buffered while focused and committed on
/// Enter or blur, so trimming never fights the cursor.
fn title_editor(ui: &mut Ui, node: &ChainNode, actions: &mut Vec<ListAction>) {
    let buffer_id = ui.make_persistent_id(("list-title", &node.id));
    let mut text = ui
        .data(|d| d.get_temp::<String>(buffer_id))
        .unwrap_or_else(|| node.title().to_owned());
    let response = ui.add(TextEdit::singleline(&mut text).desired_width(140.0));
    if response.has_focus() {
        ui.data_mut(|d| d.insert_temp(buffer_id, text));
    } else {
        if response.lost_focus() && !ui.input(|i| i.key_pressed(Key::Escape)) && text != node.title() {
            // Typing the effect name back clears the custom label.
            let label = if text.trim() == node.name { "" } else { text.as_str() };
            actions.push(ListAction::Rename(node.id.clone(), label.to_owned()));
        }
        ui.data_mut(|d| d.remove::<String>(buffer_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glitchlamp_core::{EffectDefinition, EffectRegistry};
    use glitchlamp_gui_core::InputCapabilityProfile;

    fn render(session: &mut EditorSession) {
        let ctx = egui::Context::default();
        let mut view = ListView::new();
        let theme = Theme::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| view.show(ui, session, &theme));
        });
    }

    #[test]
    fn drawing_does_not_mutate() {
        let registry = EffectRegistry::from_catalog(vec![EffectDefinition::new("glitch", "")]);
        let mut session = EditorSession::new(registry, InputCapabilityProfile::touch());
        session.add_node("source");
        session.add_node("glitch");
        session.add_node("mystery");
        let revision = session.chain.revision();
        render(&mut session);
        render(&mut session);
        assert_eq!(session.chain.revision(), revision);
    }

    #[test]
    fn empty_chain_renders() {
        let mut session = EditorSession::new(EffectRegistry::new(), InputCapabilityProfile::touch());
        render(&mut session);
        assert!(session.chain.is_empty());
    }
}
