//! Preset browser window.
//!
//! The panel only collects what the user asked for; the app turns each
//! [`PresetRequest`] into a backend request and feeds the results back.

use egui::{Color32, Context, RichText, ScrollArea, TextEdit};
use std::path::PathBuf;

use glitchlamp_config::{PRESET_EXTENSION, paths, validate_name};

/// A preset operation requested from the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PresetRequest {
    /// Reload the preset list.
    Refresh,
    /// Replace the chain with a preset.
    Load(String),
    /// Save the current chain under a name.
    Save(String),
    /// Delete a preset.
    Delete(String),
    /// Upload a preset file.
    Import(PathBuf),
    /// Download a preset into a file.
    Export(String, PathBuf),
}

/// State of the preset window.
#[derive(Debug, Default)]
pub struct PresetPanel {
    open: bool,
    names: Vec<String>,
    loading: bool,
    error: Option<String>,
    save_name: String,
    confirm_delete: Option<String>,
}

impl PresetPanel {
    /// Closed panel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the window is showing.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opens or closes the window. Opening asks for a fresh list.
    pub fn toggle(&mut self) -> Option<PresetRequest> {
        self.open = !self.open;
        self.confirm_delete = None;
        self.open.then(|| self.refresh())
    }

    fn refresh(&mut self) -> PresetRequest {
        self.loading = true;
        PresetRequest::Refresh
    }

    /// Preset names as last listed.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Stores a listing result.
    pub fn set_listing(&mut self, listing: Result<Vec<String>, String>) {
        self.loading = false;
        match listing {
            Ok(mut names) => {
                names.sort_by_key(|n| n.to_lowercase());
                self.names = names;
                self.error = None;
            }
            Err(e) => self.error = Some(e),
        }
    }

    /// Draws the window. Returns the user's requests in click order.
    pub fn show(&mut self, ctx: &Context) -> Vec<PresetRequest> {
        let mut requests = Vec::new();
        if !self.open {
            return requests;
        }

        let mut open = self.open;
        egui::Window::new("Presets")
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("Refresh").clicked() {
                        requests.push(self.refresh());
                    }
                    if ui.button("Import…").clicked()
                        && let Some(path) = rfd::FileDialog::new()
                            .add_filter("Preset", &[PRESET_EXTENSION])
                            .set_directory(paths::export_dir())
                            .pick_file()
                    {
                        requests.push(PresetRequest::Import(path));
                    }
                    if self.loading {
                        ui.spinner();
                    }
                });

                if let Some(error) = &self.error {
                    ui.label(RichText::new(error).color(Color32::from_rgb(220, 100, 100)).small());
                }
                ui.separator();

                ScrollArea::vertical().max_height(280.0).show(ui, |ui| {
                    if self.names.is_empty() && !self.loading {
                        ui.label(RichText::new("No presets saved yet").italics());
                    }
                    for name in &self.names {
                        ui.horizontal(|ui| {
                            ui.label(name);
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                if ui.small_button("Delete").clicked() {
                                    self.confirm_delete = Some(name.clone());
                                }
                                if ui.small_button("Export…").clicked()
                                    && let Some(path) = rfd::FileDialog::new()
                                        .add_filter("Preset", &[PRESET_EXTENSION])
                                        .set_directory(paths::export_dir())
                                        .set_file_name(format!("{name}.{PRESET_EXTENSION}"))
                                        .save_file()
                                {
                                    requests.push(PresetRequest::Export(name.clone(), path));
                                }
                                if ui.small_button("Load").clicked() {
                                    requests.push(PresetRequest::Load(name.clone()));
                                }
                            });
                        });
                    }
                });

                if let Some(name) = self.confirm_delete.clone() {
                    ui.separator();
                    ui.horizontal(|ui| {
                        ui.label(format!("Delete '{name}'?"));
                        if ui.button("Delete").clicked() {
                            requests.push(PresetRequest::Delete(name));
                            self.confirm_delete = None;
                        }
                        if ui.button("Cancel").clicked() {
                            self.confirm_delete = None;
                        }
                    });
                }

                ui.separator();
                ui.horizontal(|ui| {
                    ui.label("Save as:");
                    ui.add(TextEdit::singleline(&mut self.save_name).desired_width(160.0));
                    let name = self.save_name.trim();
                    let valid = validate_name(name);
                    if ui.add_enabled(valid.is_ok(), egui::Button::new("Save")).clicked() {
                        requests.push(PresetRequest::Save(name.to_owned()));
                    }
                    if let Err(e) = valid
                        && !name.is_empty()
                    {
                        ui.label(RichText::new(e.to_string()).small().color(Color32::from_rgb(220, 160, 80)));
                    } else if self.names.iter().any(|n| n == name) {
                        ui.label(RichText::new("overwrites").small());
                    }
                });
            });

        if !open {
            self.open = false;
            self.confirm_delete = None;
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_requests_a_listing() {
        let mut panel = PresetPanel::new();
        assert_eq!(panel.toggle(), Some(PresetRequest::Refresh));
        assert!(panel.is_open());
        assert_eq!(panel.toggle(), None);
        assert!(!panel.is_open());
    }

    #[test]
    fn listing_is_sorted_and_errors_keep_old_names() {
        let mut panel = PresetPanel::new();
        panel.set_listing(Ok(vec!["b".into(), "A".into(), "c".into()]));
        assert_eq!(panel.names(), ["A", "b", "c"]);
        panel.set_listing(Err("offline".into()));
        assert_eq!(panel.names().len(), 3);
        assert_eq!(panel.error.as_deref(), Some("offline"));
    }

    #[test]
    fn closed_panel_draws_nothing() {
        let ctx = Context::default();
        let mut panel = PresetPanel::new();
        let mut requests = Vec::new();
        let _ = ctx.run(egui::RawInput::default(), |ctx| requests = panel.show(ctx));
        assert!(requests.is_empty());
    }
}
