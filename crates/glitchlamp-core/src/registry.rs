//! Effect registry: effect name → ports and option schema.
//!
//! The backend catalog lists every effect plugin with a typed option schema.
//! The registry resolves each name once into an [`EffectDescriptor`] carrying
//! the port layout the editor needs (how many inputs, what each port is
//! called) and adds the two synthetic sources the backend never lists.
//!
//! # Port layout
//!
//! | Effect | Inputs | Ports |
//! |--------|--------|-------|
//! | `source`, `source-local`, `noise` | 0 | — |
//! | `mix` | 2 | A, B |
//! | `transfer-motion` | 2 | Source, Motion |
//! | `chopper` | 4 | 1, 2, 3, 4 |
//! | everything else | 1 | In |
//!
//! Names missing from the catalog resolve to an inert fallback (one input, no
//! options), so a preset written against a different backend still loads.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::option::OptionSpec;

/// YouTube-backed source effect.
pub const SOURCE: &str = "source";
/// Uploaded-file source effect. At most one per chain.
pub const SOURCE_LOCAL: &str = "source-local";
/// Self-contained noise generator; needs no upstream source.
pub const NOISE: &str = "noise";

/// One entry of the backend effect catalog (`GET /effects`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    /// Unique effect name.
    pub name: String,
    /// One-line description.
    #[serde(default)]
    pub description: String,
    /// Processing type reported by the backend (`frame` or `file`).
    #[serde(rename = "type", default)]
    pub processing: String,
    /// Ordered option schema.
    #[serde(default)]
    pub options: Vec<OptionSpec>,
}

impl EffectDefinition {
    /// Creates a frame effect definition with no options.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            processing: "frame".to_owned(),
            options: Vec::new(),
        }
    }

    /// Adds an option to the schema.
    pub fn with_option(mut self, spec: OptionSpec) -> Self {
        self.options.push(spec);
        self
    }

    /// Marks the effect as file-level.
    pub fn file_level(mut self) -> Self {
        self.processing = "file".to_owned();
        self
    }
}

/// Broad category of an effect, as far as the editor cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Originates media from outside the chain. Fixed in place.
    Source,
    /// Originates media by itself; takes no input but is freely editable.
    Generator,
    /// Per-frame effect.
    Frame,
    /// Whole-file effect.
    File,
}

/// Resolved view of one effect: ports plus option schema.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectDescriptor {
    /// Effect name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Category.
    pub kind: EffectKind,
    /// Number of input ports.
    pub max_inputs: usize,
    /// Label per input port; `port_labels.len() == max_inputs`.
    pub port_labels: Vec<String>,
    /// Ordered option schema.
    pub options: Vec<OptionSpec>,
}

impl EffectDescriptor {
    fn from_definition(def: &EffectDefinition) -> Self {
        let kind = match def.name.as_str() {
            SOURCE | SOURCE_LOCAL => EffectKind::Source,
            NOISE => EffectKind::Generator,
            _ if def.processing.eq_ignore_ascii_case("file") => EffectKind::File,
            _ => EffectKind::Frame,
        };
        let port_labels = port_labels_for(&def.name);
        Self {
            name: def.name.clone(),
            description: def.description.clone(),
            kind,
            max_inputs: port_labels.len(),
            port_labels,
            options: def.options.clone(),
        }
    }

    fn fallback() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            kind: EffectKind::Frame,
            max_inputs: 1,
            port_labels: vec!["In".to_owned()],
            options: Vec::new(),
        }
    }

    /// Whether the node is a fixed source: type locked, not draggable.
    pub fn is_fixed_source(&self) -> bool {
        self.kind == EffectKind::Source
    }

    /// Whether the effect originates media (source or generator).
    pub fn is_origin(&self) -> bool {
        matches!(self.kind, EffectKind::Source | EffectKind::Generator)
    }

    /// Whether any input port exists.
    pub fn accepts_inputs(&self) -> bool {
        self.max_inputs > 0
    }

    /// Label of input port `port`, or `""` if out of range.
    pub fn port_label(&self, port: usize) -> &str {
        self.port_labels.get(port).map_or("", String::as_str)
    }

    /// Option schema entry by name.
    pub fn option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|spec| spec.name == name)
    }
}

fn port_labels_for(name: &str) -> Vec<String> {
    let labels: &[&str] = match name {
        SOURCE | SOURCE_LOCAL | NOISE => &[],
        "mix" => &["A", "B"],
        "transfer-motion" => &["Source", "Motion"],
        "chopper" => &["1", "2", "3", "4"],
        _ => &["In"],
    };
    labels.iter().map(|&l| l.to_owned()).collect()
}

fn builtin_sources() -> [EffectDefinition; 2] {
    [
        EffectDefinition::new(SOURCE, "Video fetched from YouTube by keyword or playlist"),
        EffectDefinition::new(SOURCE_LOCAL, "Uploaded local video file"),
    ]
}

/// Catalog of effects known to the editor, in display order.
///
/// Built-in sources come first, followed by the backend catalog in the order
/// it was received. A catalog entry named like a built-in replaces it.
#[derive(Debug, Clone)]
pub struct EffectRegistry {
    descriptors: Vec<EffectDescriptor>,
    index: HashMap<String, usize>,
    fallback: EffectDescriptor,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    /// Registry with only the built-in sources.
    pub fn new() -> Self {
        Self::from_catalog(Vec::new())
    }

    /// Registry from a backend catalog plus the built-in sources.
    pub fn from_catalog(catalog: Vec<EffectDefinition>) -> Self {
        let mut registry = Self {
            descriptors: Vec::new(),
            index: HashMap::new(),
            fallback: EffectDescriptor::fallback(),
        };
        for def in builtin_sources().iter().chain(catalog.iter()) {
            registry.insert(EffectDescriptor::from_definition(def));
        }
        tracing::debug!(effects = registry.descriptors.len(), "effect registry built");
        registry
    }

    fn insert(&mut self, descriptor: EffectDescriptor) {
        if let Some(&slot) = self.index.get(&descriptor.name) {
            self.descriptors[slot] = descriptor;
        } else {
            self.index
                .insert(descriptor.name.clone(), self.descriptors.len());
            self.descriptors.push(descriptor);
        }
    }

    /// Descriptor for `name`, if the effect is known.
    pub fn get(&self, name: &str) -> Option<&EffectDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    /// Descriptor for `name`, or the inert fallback for unknown names.
    ///
    /// The fallback has an empty `name`; callers display the node's own name.
    pub fn resolve(&self, name: &str) -> &EffectDescriptor {
        self.get(name).unwrap_or(&self.fallback)
    }

    /// Whether `name` is in the catalog or a built-in.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Max input count for `name`.
    pub fn max_inputs(&self, name: &str) -> usize {
        self.resolve(name).max_inputs
    }

    /// Whether `name` is a fixed source effect.
    pub fn is_fixed_source(&self, name: &str) -> bool {
        self.resolve(name).is_fixed_source()
    }

    /// All descriptors in display order.
    pub fn iter(&self) -> impl Iterator<Item = &EffectDescriptor> {
        self.descriptors.iter()
    }

    /// Effect names a non-source node may be retargeted to.
    pub fn selectable_names(&self) -> impl Iterator<Item = &str> {
        self.descriptors
            .iter()
            .filter(|d| !d.is_fixed_source())
            .map(|d| d.name.as_str())
    }

    /// Number of known effects.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the registry is empty. Never true in practice; sources are built in.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
