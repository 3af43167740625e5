//! Option widget factory.
//!
//! [`option_widget`] builds one control for an [`OptionSpec`] and reports
//! what the user changed. Building a control from a stored value never
//! produces an edit; only interaction does.
//!
//! | Kind            | Control                                              |
//! |-----------------|------------------------------------------------------|
//! | `bool`          | checkbox                                             |
//! | `int` / `float` | slider plus value chip; label or chip opens an editor |
//! | `select`        | combo box over the declared choices                  |
//! | anything else   | single-line text field                               |
//!
//! Numeric editors soft-clamp: typing a value outside the declared range
//! widens the slider's range to include it instead of rejecting it. The
//! widened range is kept in egui's temp memory under the widget id.

use egui::{Button, ComboBox, Id, Key, Label, RichText, Sense, Slider, TextEdit, Ui};
use std::hash::Hash;

use glitchlamp_core::{OptionKind, OptionSpec, OptionValue};

/// What a control reported this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionResponse {
    /// New value entered by the user, already coerced to the option's kind.
    pub edit: Option<OptionValue>,
    /// A slider is being dragged; card drags must stay off meanwhile.
    pub slider_active: bool,
}

/// Slider range that grows to admit out-of-range entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl SoftRange {
    /// Declared range of `spec`.
    pub fn from_spec(spec: &OptionSpec) -> Self {
        let (min, max) = spec.numeric_range();
        Self { min, max }
    }

    /// Extends the range to include `v`. Returns whether it grew.
    pub fn widen_to(&mut self, v: f64) -> bool {
        if !v.is_finite() {
            return false;
        }
        if v < self.min {
            self.min = v;
            true
        } else if v > self.max {
            self.max = v;
            true
        } else {
            false
        }
    }

    /// Whether `v` lies inside the range.
    pub fn contains(&self, v: f64) -> bool {
        (self.min..=self.max).contains(&v)
    }
}

/// Commits inline editor text: coerces it and widens `range` to fit.
pub fn commit_inline(spec: &OptionSpec, text: &str, range: &mut SoftRange) -> OptionValue {
    let value = spec.coerce(text);
    if let Some(v) = value.as_f64() {
        range.widen_to(v);
    }
    value
}

/// Text of the value chip: integers plain, floats with as many decimals as
/// the step needs (at most four).
pub fn format_number(spec: &OptionSpec, value: &OptionValue) -> String {
    let v = value.as_f64().unwrap_or(0.0);
    if spec.kind == OptionKind::Int {
        return format!("{}", v.trunc() as i64);
    }
    let decimals = (-spec.step_or_default().log10() - 1e-9).ceil().clamp(0.0, 4.0) as usize;
    format!("{v:.decimals$}")
}

/// Renders the control for `spec` showing `current`.
pub fn option_widget(
    ui: &mut Ui,
    id_salt: impl Hash,
    spec: &OptionSpec,
    current: &OptionValue,
) -> OptionResponse {
    let id = ui.make_persistent_id(id_salt);
    let response = match spec.kind {
        OptionKind::Bool => bool_control(ui, spec, current),
        OptionKind::Int | OptionKind::Float => numeric_control(ui, id, spec, current),
        OptionKind::Select => select_control(ui, id, spec, current),
        OptionKind::Text => text_control(ui, spec, current),
    };
    if let Some(value) = &response.edit {
        tracing::trace!(option = %spec.name, %value, "option edited");
    }
    response
}

fn label(ui: &mut Ui, spec: &OptionSpec, sense: Sense) -> egui::Response {
    let response = ui.add(Label::new(spec.display_label()).sense(sense));
    match &spec.tooltip {
        Some(tip) => response.on_hover_text(tip),
        None => response,
    }
}

fn bool_control(ui: &mut Ui, spec: &OptionSpec, current: &OptionValue) -> OptionResponse {
    let mut checked = current.as_bool();
    let mut response = ui.checkbox(&mut checked, spec.display_label());
    if let Some(tip) = &spec.tooltip {
        response = response.on_hover_text(tip);
    }
    OptionResponse {
        edit: response.changed().then_some(OptionValue::Bool(checked)),
        slider_active: false,
    }
}

fn numeric_control(ui: &mut Ui, id: Id, spec: &OptionSpec, current: &OptionValue) -> OptionResponse {
    let range_id = id.with("range");
    let editor_id = id.with("editor");
    let field_id = id.with("field");

    let mut range = ui
        .data(|d| d.get_temp::<SoftRange>(range_id))
        .unwrap_or_else(|| SoftRange::from_spec(spec));
    let mut value = current.as_f64().unwrap_or(0.0);
    range.widen_to(value);

    let mut out = OptionResponse::default();
    ui.horizontal(|ui| {
        let mut open_editor = label(ui, spec, Sense::click()).clicked();

        let slider = ui.add(
            Slider::new(&mut value, range.min..=range.max)
                .step_by(spec.step_or_default())
                .show_value(false),
        );
        if slider.changed() {
            out.edit = Some(spec.value_from_f64(value));
        }
        out.slider_active = slider.dragged() || slider.is_pointer_button_down_on();

        match ui.data(|d| d.get_temp::<String>(editor_id)) {
            Some(mut text) => {
                let field = ui.add(TextEdit::singleline(&mut text).id(field_id).desired_width(56.0));
                if field.lost_focus() {
                    // Enter and blur commit; Escape also drops focus, so check it first.
                    if !ui.input(|i| i.key_pressed(Key::Escape)) {
                        out.edit = Some(commit_inline(spec, &text, &mut range));
                    }
                    ui.data_mut(|d| d.remove::<String>(editor_id));
                } else {
                    ui.data_mut(|d| d.insert_temp(editor_id, text));
                }
            }
            None => {
                let shown = out.edit.as_ref().unwrap_or(current);
                let chip = ui.add(Button::new(RichText::new(format_number(spec, shown)).monospace()).small());
                open_editor |= chip.clicked();
                if open_editor {
                    ui.data_mut(|d| d.insert_temp(editor_id, format_number(spec, current)));
                    ui.memory_mut(|m| m.request_focus(field_id));
                }
            }
        }
    });

    ui.data_mut(|d| d.insert_temp(range_id, range));
    out
}

fn select_control(ui: &mut Ui, id: Id, spec: &OptionSpec, current: &OptionValue) -> OptionResponse {
    let selected = current.as_text();
    let mut edit = None;
    ui.horizontal(|ui| {
        label(ui, spec, Sense::hover());
        ComboBox::from_id_salt(id)
            .selected_text(selected.as_str())
            .show_ui(ui, |ui| {
                for choice in &spec.options {
                    if ui.selectable_label(*choice == selected, choice).clicked() && *choice != selected {
                        edit = Some(OptionValue::Text(choice.clone()));
                    }
                }
            });
    });
    OptionResponse {
        edit,
        slider_active: false,
    }
}

fn text_control(ui: &mut Ui, spec: &OptionSpec, current: &OptionValue) -> OptionResponse {
    let mut text = current.as_text();
    let mut edit = None;
    ui.horizontal(|ui| {
        label(ui, spec, Sense::hover());
        if ui.text_edit_singleline(&mut text).changed() {
            edit = Some(spec.coerce(&text));
        }
    });
    OptionResponse {
        edit,
        slider_active: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_spec() -> OptionSpec {
        OptionSpec::new("intensity", OptionKind::Int).with_range(1.0, 100.0)
    }

    #[test]
    fn soft_clamp_widens_instead_of_rejecting() {
        let spec = int_spec();
        let mut range = SoftRange::from_spec(&spec);
        assert_eq!(commit_inline(&spec, "250", &mut range), OptionValue::Int(250));
        assert_eq!(range, SoftRange { min: 1.0, max: 250.0 });
        assert_eq!(commit_inline(&spec, "-4.9", &mut range), OptionValue::Int(-4));
        assert_eq!(range.min, -4.0);
    }

    #[test]
    fn garbage_commits_zero() {
        let spec = OptionSpec::new("blur", OptionKind::Float).with_range(0.5, 2.0);
        let mut range = SoftRange::from_spec(&spec);
        assert_eq!(commit_inline(&spec, "abc", &mut range), OptionValue::Float(0.0));
        assert!(range.contains(0.0));
    }

    #[test]
    fn widen_ignores_non_finite() {
        let mut range = SoftRange { min: 0.0, max: 1.0 };
        assert!(!range.widen_to(f64::NAN));
        assert!(!range.widen_to(0.5));
        assert_eq!(range, SoftRange { min: 0.0, max: 1.0 });
    }

    #[test]
    fn chip_formatting_follows_step() {
        assert_eq!(format_number(&int_spec(), &OptionValue::Float(12.9)), "12");
        let f = OptionSpec::new("amount", OptionKind::Float);
        assert_eq!(format_number(&f, &OptionValue::Float(0.5)), "0.50");
        let f = f.with_step(0.5);
        assert_eq!(format_number(&f, &OptionValue::Float(1.5)), "1.5");
        let f = OptionSpec::new("frames", OptionKind::Float).with_step(5.0);
        assert_eq!(format_number(&f, &OptionValue::Int(10)), "10");
    }

    #[test]
    fn rendering_without_input_never_edits() {
        let ctx = egui::Context::default();
        let specs = [
            int_spec(),
            OptionSpec::new("on", OptionKind::Bool),
            OptionSpec::new("mode", OptionKind::Select).with_choices(["a", "b"]),
            OptionSpec::new("caption", OptionKind::Text),
        ];
        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    for spec in &specs {
                        let r = option_widget(ui, &spec.name, spec, &spec.resolve(&Default::default()));
                        assert_eq!(r, OptionResponse::default());
                    }
                });
            });
        }
    }
}
