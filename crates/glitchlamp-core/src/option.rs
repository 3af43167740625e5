//! Declarative option schema published by each effect.
//!
//! The backend describes every effect option as a small JSON object:
//!
//! ```json
//! {"name": "intensity", "type": "int", "default": 20, "min": 1, "max": 100, "label": "Intensity"}
//! ```
//!
//! [`OptionSpec`] mirrors that shape. [`OptionValue`] is the value stored in a
//! node's option map and matches the wire union `bool | number | string`.
//! [`OptionSpec::coerce`] turns raw user text into a typed value with the
//! editor's fallback rules (unparseable numbers become `0`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Option values of one node, keyed by option name.
pub type OptionMap = BTreeMap<String, OptionValue>;

/// The control type an option asks for.
///
/// Unrecognised type strings map to [`OptionKind::Text`] so that a newer
/// backend never breaks the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OptionKind {
    /// Toggle.
    Bool,
    /// Integer slider.
    Int,
    /// Floating-point slider.
    Float,
    /// Closed set of strings.
    Select,
    /// Free text (also the fallback for unknown types).
    #[default]
    Text,
}

impl OptionKind {
    /// Wire name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            OptionKind::Bool => "bool",
            OptionKind::Int => "int",
            OptionKind::Float => "float",
            OptionKind::Select => "select",
            OptionKind::Text => "text",
        }
    }

    /// Whether the kind is edited with a slider.
    pub const fn is_numeric(self) -> bool {
        matches!(self, OptionKind::Int | OptionKind::Float)
    }
}

impl From<String> for OptionKind {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => OptionKind::Bool,
            "int" | "integer" => OptionKind::Int,
            "float" | "number" => OptionKind::Float,
            "select" => OptionKind::Select,
            _ => OptionKind::Text,
        }
    }
}

impl From<OptionKind> for String {
    fn from(kind: OptionKind) -> Self {
        kind.as_str().to_owned()
    }
}

/// A value stored in a node's option map.
///
/// Untagged so it reads and writes the plain JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value (select choices and free text).
    Text(String),
}

impl OptionValue {
    /// Numeric view of the value. Text is parsed leniently; failures give `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            OptionValue::Int(i) => Some(*i as f64),
            OptionValue::Float(f) => Some(*f),
            OptionValue::Text(s) => parse_leading_float(s),
        }
    }

    /// Truthiness of the value.
    pub fn as_bool(&self) -> bool {
        match self {
            OptionValue::Bool(b) => *b,
            OptionValue::Int(i) => *i != 0,
            OptionValue::Float(f) => *f != 0.0,
            OptionValue::Text(s) => parse_bool(s),
        }
    }

    /// String view of the value, as shown in a text control.
    pub fn as_text(&self) -> String {
        match self {
            OptionValue::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Float(v) => write!(f, "{v}"),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Int(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        OptionValue::Float(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::Text(v.to_owned())
    }
}

/// Schema entry for one effect option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Key in the node's option map.
    pub name: String,
    /// Human-readable label. Falls back to `name` when absent.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    /// Control type.
    #[serde(rename = "type", default)]
    pub kind: OptionKind,
    /// Default value used when the node has no value for this option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<OptionValue>,
    /// Lower bound for numeric options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound for numeric options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Slider step for numeric options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// Choices for select options.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Hover help.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

impl OptionSpec {
    /// Creates a spec with no default and no constraints.
    pub fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            kind,
            default: None,
            min: None,
            max: None,
            step: None,
            options: Vec::new(),
            tooltip: None,
        }
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<OptionValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the numeric range.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Sets the slider step.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    /// Sets the select choices.
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Label to display.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    /// Declared step, else 1 for int and 0.01 for float.
    pub fn step_or_default(&self) -> f64 {
        match self.step {
            Some(step) if step > 0.0 => step,
            _ if self.kind == OptionKind::Int => 1.0,
            _ => 0.01,
        }
    }

    /// Declared numeric range, defaulting to `0..=100` for int and `0..=1` for float.
    pub fn numeric_range(&self) -> (f64, f64) {
        let fallback_max = if self.kind == OptionKind::Int { 100.0 } else { 1.0 };
        let min = self.min.unwrap_or(0.0);
        let max = self.max.unwrap_or(fallback_max).max(min);
        (min, max)
    }

    /// Value the control starts from: the stored value, else the default,
    /// else the kind's zero value. Never writes back.
    pub fn resolve(&self, options: &OptionMap) -> OptionValue {
        options
            .get(&self.name)
            .or(self.default.as_ref())
            .cloned()
            .unwrap_or_else(|| self.zero())
    }

    /// Zero value for this option's kind.
    pub fn zero(&self) -> OptionValue {
        match self.kind {
            OptionKind::Bool => OptionValue::Bool(false),
            OptionKind::Int => OptionValue::Int(0),
            OptionKind::Float => OptionValue::Float(0.0),
            OptionKind::Select => OptionValue::Text(self.options.first().cloned().unwrap_or_default()),
            OptionKind::Text => OptionValue::Text(String::new()),
        }
    }

    /// Coerces raw control text into a typed value.
    ///
    /// - bool: truthy strings (`true`, `1`, `on`, `yes`, `checked`)
    /// - int: leading number truncated toward zero, unparseable → `0`
    /// - float: leading number, unparseable → `0.0`
    /// - select and text: the raw string
    pub fn coerce(&self, raw: &str) -> OptionValue {
        match self.kind {
            OptionKind::Bool => OptionValue::Bool(parse_bool(raw)),
            OptionKind::Int => OptionValue::Int(parse_leading_float(raw).map_or(0, |v| v.trunc() as i64)),
            OptionKind::Float => OptionValue::Float(parse_leading_float(raw).unwrap_or(0.0)),
            OptionKind::Select | OptionKind::Text => OptionValue::Text(raw.to_owned()),
        }
    }

    /// Typed value for a slider position: truncated for int, as-is for float.
    pub fn value_from_f64(&self, v: f64) -> OptionValue {
        let v = if v.is_finite() { v } else { 0.0 };
        match self.kind {
            OptionKind::Int => OptionValue::Int(v.trunc() as i64),
            _ => OptionValue::Float(v),
        }
    }
}

/// Truthiness of control text.
fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes" | "checked"
    )
}

/// Parses the longest numeric prefix of `raw` (`"12.5px"` → 12.5).
///
/// Returns `None` when no digits lead the string or the result is not finite.
pub fn parse_leading_float(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mantissa_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if !bytes[mantissa_start..end].iter().any(u8::is_ascii_digit) {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        let digits = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > digits {
            end = exp;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
