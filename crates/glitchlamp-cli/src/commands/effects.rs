//! Effect catalog listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;

use glitchlamp_client::Backend;
use glitchlamp_core::{EffectDescriptor, EffectKind, OptionKind, OptionSpec};

use super::common;

#[derive(Args)]
pub struct EffectsArgs {
    /// Show details for a specific effect
    #[arg(value_name = "EFFECT")]
    effect: Option<String>,
}

pub fn run(backend: &dyn Backend, args: EffectsArgs) -> anyhow::Result<()> {
    let registry = common::registry(backend)?;

    if let Some(name) = &args.effect {
        let effect = registry
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow::anyhow!("Unknown effect: {}", name))?;
        describe(effect);
        return Ok(());
    }

    println!("Available Effects:");
    println!();
    println!("  {:18}  {:10}  {:6}  {}", "Name", "Kind", "Inputs", "Description");
    println!("  {:18}  {:10}  {:6}  {}", "----", "----", "------", "-----------");
    for effect in registry.iter() {
        println!(
            "  {:18}  {:10}  {:6}  {}",
            effect.name,
            kind_name(effect.kind),
            effect.max_inputs,
            effect.description
        );
    }
    println!();
    println!("Use 'glitchlamp effects <EFFECT>' for its options.");
    Ok(())
}

fn describe(effect: &EffectDescriptor) {
    println!("{}", effect.name);
    println!("{}", "=".repeat(effect.name.len()));
    println!();
    if !effect.description.is_empty() {
        println!("{}", effect.description);
        println!();
    }
    println!("Kind: {}", kind_name(effect.kind));
    if effect.accepts_inputs() {
        let ports: Vec<&str> = (0..effect.max_inputs).map(|p| effect.port_label(p)).collect();
        println!("Inputs: {}", ports.join(", "));
    } else {
        println!("Inputs: none");
    }
    println!();

    if effect.options.is_empty() {
        println!("No options.");
        return;
    }
    println!("Options:");
    println!();
    println!("  {:20}  {:7}  {:10}  {}", "Name", "Type", "Default", "Range");
    println!("  {:20}  {:7}  {:10}  {}", "----", "----", "-------", "-----");
    for option in &effect.options {
        let default = option.default.as_ref().map(ToString::to_string).unwrap_or_default();
        println!(
            "  {:20}  {:7}  {:10}  {}",
            option.name,
            option.kind.as_str(),
            default,
            range(option)
        );
    }
}

fn kind_name(kind: EffectKind) -> &'static str {
    match kind {
        EffectKind::Source => "source",
        EffectKind::Generator => "generator",
        EffectKind::Frame => "frame",
        EffectKind::File => "file",
    }
}

fn range(option: &OptionSpec) -> String {
    match option.kind {
        OptionKind::Select => option.options.join(" | "),
        OptionKind::Int | OptionKind::Float => match (option.min, option.max) {
            (Some(min), Some(max)) => format!("{min} to {max}"),
            (Some(min), None) => format!(">= {min}"),
            (None, Some(max)) => format!("<= {max}"),
            (None, None) => String::new(),
        },
        OptionKind::Bool | OptionKind::Text => String::new(),
    }
}
