//! Integration tests for the chain model.
//!
//! Covers the editor scenarios end to end: building a chain, wiring named
//! ports, removing shared upstream nodes, loading presets that reference
//! unknown effects, and the source-local insertion rule.

use glitchlamp_core::{
    ChainError, ChainModel, EffectDefinition, EffectRegistry, NodeId, OptionKind, OptionSpec,
    OptionValue, SOURCE, SOURCE_LOCAL, normalize,
};
use serde_json::json;

fn registry() -> EffectRegistry {
    EffectRegistry::from_catalog(vec![
        EffectDefinition::new("glitch", "Random block glitches").with_option(
            OptionSpec::new("intensity", OptionKind::Int)
                .with_default(20_i64)
                .with_range(1.0, 100.0),
        ),
        EffectDefinition::new("blur", "Gaussian blur"),
        EffectDefinition::new("mix", "Blend two inputs")
            .file_level()
            .with_option(
                OptionSpec::new("mode", OptionKind::Select)
                    .with_default("normal")
                    .with_choices(["normal", "add", "screen"]),
            ),
        EffectDefinition::new("noise", "Noise generator").file_level(),
    ])
}

// ============================================================================
// Building chains
// ============================================================================

#[test]
fn source_then_glitch() {
    let registry = registry();
    let mut chain = ChainModel::new();
    let source = chain.add_node(SOURCE, None).unwrap();
    let glitch = chain.add_node("glitch", None).unwrap();
    chain.connect(&registry, &source, &glitch, 0).unwrap();

    assert_eq!(chain.node(&glitch).unwrap().inputs, vec![Some(source)]);
}

#[test]
fn mix_ports_hold_one_slot_per_upstream() {
    let registry = registry();
    let mut chain = ChainModel::new();
    let source = chain.add_node(SOURCE, None).unwrap();
    let mix = chain.add_node("mix", None).unwrap();

    chain.connect(&registry, &source, &mix, 0).unwrap();
    chain.connect(&registry, &source, &mix, 1).unwrap();
    assert_eq!(chain.node(&mix).unwrap().inputs, vec![None, Some(source.clone())]);

    // A second upstream fills the other port.
    let blur = chain.add_node("blur", None).unwrap();
    chain.connect(&registry, &source, &blur, 0).unwrap();
    chain.connect(&registry, &blur, &mix, 0).unwrap();
    assert_eq!(
        chain.node(&mix).unwrap().inputs,
        vec![Some(blur), Some(source)]
    );
}

#[test]
fn removing_shared_upstream_clears_both_consumers() {
    let registry = registry();
    let mut chain = ChainModel::new();
    let source = chain.add_node(SOURCE, None).unwrap();
    let a = chain.add_node("glitch", None).unwrap();
    let b = chain.add_node("blur", None).unwrap();
    chain.connect(&registry, &source, &a, 0).unwrap();
    chain.connect(&registry, &source, &b, 0).unwrap();

    chain.remove_node(&source).unwrap();

    assert_eq!(chain.node(&a).unwrap().inputs, vec![None]);
    assert_eq!(chain.node(&b).unwrap().inputs, vec![None]);
}

#[test]
fn second_source_local_leaves_chain_unchanged() {
    let mut chain = ChainModel::new();
    chain.add_node(SOURCE_LOCAL, None).unwrap();
    chain.add_node("glitch", None).unwrap();
    let snapshot = chain.to_wire();

    let err = chain.add_node(SOURCE_LOCAL, None).unwrap_err();
    assert_eq!(err, ChainError::DuplicateSourceLocal);
    assert!(err.is_user_visible());
    assert_eq!(chain.to_wire(), snapshot);
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn unknown_effect_in_preset_is_preserved_inertly() {
    let registry = registry();
    let mut chain = normalize(&[
        json!({"id": "node-1", "name": "source", "inputs": []}),
        json!({"id": "node-2", "name": "hologram", "options": {"depth": 3}, "inputs": ["node-1"]}),
    ]);
    chain.ensure_source(&registry);

    let node = chain.node(&NodeId::from("node-2")).unwrap();
    assert_eq!(node.name, "hologram");
    assert_eq!(node.options["depth"], OptionValue::Int(3));

    let descriptor = registry.resolve(&node.name);
    assert_eq!(descriptor.max_inputs, 1);
    assert!(descriptor.options.is_empty());

    // Still editable: it can be retargeted to a real effect.
    chain
        .retarget(&registry, &NodeId::from("node-2"), "glitch")
        .unwrap();
    assert!(chain.node(&NodeId::from("node-2")).unwrap().options.is_empty());
}

#[test]
fn sourceless_chain_gets_default_source() {
    let registry = registry();
    let mut chain = normalize(&[json!("glitch"), json!("blur")]);
    let source = chain.ensure_source(&registry).unwrap();

    assert_eq!(chain.len(), 3);
    assert_eq!(chain.nodes()[0].name, SOURCE);
    assert_eq!(chain.nodes()[1].inputs, vec![Some(source)]);
}

#[test]
fn generator_first_chain_needs_no_source() {
    let registry = registry();
    let mut chain = normalize(&[json!("noise"), json!("glitch")]);
    assert_eq!(chain.ensure_source(&registry), None);
    assert_eq!(chain.len(), 2);
}

#[test]
fn option_edits_resolve_through_schema() {
    let registry = registry();
    let mut chain = ChainModel::new();
    let glitch = chain.add_node("glitch", None).unwrap();
    let spec = registry.resolve("glitch").option("intensity").unwrap().clone();

    assert_eq!(spec.resolve(&chain.node(&glitch).unwrap().options), OptionValue::Int(20));
    // Building a control from the default never writes back.
    assert!(chain.node(&glitch).unwrap().options.is_empty());

    chain
        .set_option(&glitch, &spec.name, spec.coerce("65.9"))
        .unwrap();
    assert_eq!(spec.resolve(&chain.node(&glitch).unwrap().options), OptionValue::Int(65));
}

#[test]
fn cycle_is_refused_and_reported() {
    let registry = registry();
    let mut chain = ChainModel::new();
    let a = chain.add_node("glitch", None).unwrap();
    let b = chain.add_node("blur", None).unwrap();
    chain.connect(&registry, &a, &b, 0).unwrap();

    let err = chain.connect(&registry, &b, &a, 0).unwrap_err();
    assert!(err.is_user_visible());
    assert!(chain.node(&a).unwrap().inputs.is_empty());
}
