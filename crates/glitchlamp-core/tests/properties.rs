//! Property-based tests for chain model integrity.
//!
//! Random sequences of editor operations are applied to a chain, and the
//! structural rules are checked after every step.

use glitchlamp_core::{ChainModel, EffectDefinition, EffectRegistry, NodeId, OptionValue, Position};
use proptest::prelude::*;

const EFFECTS: [&str; 9] = [
    "source",
    "source-local",
    "glitch",
    "blur",
    "mix",
    "chopper",
    "noise",
    "transfer-motion",
    "not-in-catalog",
];

fn registry() -> EffectRegistry {
    EffectRegistry::from_catalog(
        ["glitch", "blur", "mix", "chopper", "noise", "transfer-motion"]
            .into_iter()
            .map(|name| EffectDefinition::new(name, ""))
            .collect(),
    )
}

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Remove(usize),
    Connect(usize, usize, usize),
    Disconnect(usize, usize),
    Retarget(usize, usize),
    MoveUp(usize),
    SetOption(usize, i64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..EFFECTS.len()).prop_map(Op::Add),
        1 => any::<usize>().prop_map(Op::Remove),
        4 => (any::<usize>(), any::<usize>(), 0usize..5).prop_map(|(a, b, p)| Op::Connect(a, b, p)),
        1 => (any::<usize>(), 0usize..4).prop_map(|(a, p)| Op::Disconnect(a, p)),
        1 => (any::<usize>(), 0..EFFECTS.len()).prop_map(|(a, e)| Op::Retarget(a, e)),
        1 => any::<usize>().prop_map(Op::MoveUp),
        1 => (any::<usize>(), -50i64..50).prop_map(|(a, v)| Op::SetOption(a, v)),
    ]
}

fn pick(chain: &ChainModel, i: usize) -> Option<NodeId> {
    if chain.is_empty() {
        None
    } else {
        Some(chain.nodes()[i % chain.len()].id.clone())
    }
}

fn apply(chain: &mut ChainModel, registry: &EffectRegistry, op: &Op) {
    // Rejections are expected; only the resulting state matters.
    match *op {
        Op::Add(e) => {
            let _ = chain.add_node(EFFECTS[e], Some(Position::new(e as f32, 0.0)));
        }
        Op::Remove(i) => {
            if let Some(id) = pick(chain, i) {
                let _ = chain.remove_node(&id);
            }
        }
        Op::Connect(a, b, port) => {
            if let (Some(from), Some(to)) = (pick(chain, a), pick(chain, b)) {
                let _ = chain.connect(registry, &from, &to, port);
            }
        }
        Op::Disconnect(a, port) => {
            if let Some(id) = pick(chain, a) {
                let _ = chain.disconnect(&id, port);
            }
        }
        Op::Retarget(a, e) => {
            if let Some(id) = pick(chain, a) {
                let _ = chain.retarget(registry, &id, EFFECTS[e]);
            }
        }
        Op::MoveUp(a) => {
            if let Some(id) = pick(chain, a) {
                chain.move_up(&id);
            }
        }
        Op::SetOption(a, v) => {
            if let Some(id) = pick(chain, a) {
                let _ = chain.set_option(&id, "amount", OptionValue::Int(v));
            }
        }
    }
}

fn assert_integrity(chain: &ChainModel, registry: &EffectRegistry) -> Result<(), TestCaseError> {
    let ids: Vec<_> = chain.iter().map(|n| n.id.clone()).collect();
    for (i, id) in ids.iter().enumerate() {
        prop_assert!(!ids[i + 1..].contains(id), "duplicate id {}", id);
    }
    let locals = chain.iter().filter(|n| n.name == "source-local").count();
    prop_assert!(locals <= 1, "{} source-local nodes", locals);

    for node in chain.iter() {
        let max = registry.max_inputs(&node.name);
        prop_assert!(
            node.inputs.len() <= max,
            "{} ({}) has {} inputs, max {}",
            node.id, node.name, node.inputs.len(), max
        );
        for input in node.inputs.iter().flatten() {
            prop_assert!(ids.contains(input), "dangling input {} on {}", input, node.id);
            prop_assert!(input != &node.id, "self input on {}", node.id);
            prop_assert!(!chain.depends_on(input, &node.id), "cycle through {}", node.id);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// After any operation sequence the chain keeps unique ids, bounded
    /// inputs, no dangling references, no cycles and one source-local at most.
    #[test]
    fn integrity_holds_under_random_edits(ops in prop::collection::vec(op(), 1..60)) {
        let registry = registry();
        let mut chain = ChainModel::new();
        for op in &ops {
            apply(&mut chain, &registry, op);
            assert_integrity(&chain, &registry)?;
        }
    }

    /// Removing a node leaves no reference to it anywhere.
    #[test]
    fn remove_purges_every_reference(ops in prop::collection::vec(op(), 1..40), victim in any::<usize>()) {
        let registry = registry();
        let mut chain = ChainModel::new();
        for op in &ops {
            apply(&mut chain, &registry, op);
        }
        if let Some(id) = pick(&chain, victim) {
            chain.remove_node(&id).unwrap();
            for node in chain.iter() {
                prop_assert!(!node.is_fed_by(&id));
            }
        }
    }

    /// Connecting the same output to two ports of one target keeps exactly one slot.
    #[test]
    fn output_feeds_one_port_per_target(first in 0usize..4, second in 0usize..4) {
        let registry = registry();
        let mut chain = ChainModel::new();
        let src = chain.add_node("source", None).unwrap();
        let chopper = chain.add_node("chopper", None).unwrap();
        chain.connect(&registry, &src, &chopper, first).unwrap();
        chain.connect(&registry, &src, &chopper, second).unwrap();

        let node = chain.node(&chopper).unwrap();
        let slots = node.inputs.iter().filter(|i| i.as_ref() == Some(&src)).count();
        prop_assert_eq!(slots, 1);
        prop_assert_eq!(node.inputs[second].as_ref(), Some(&src));
    }

    /// Serializing and reloading reproduces the chain exactly.
    #[test]
    fn wire_roundtrip_is_identity(ops in prop::collection::vec(op(), 0..40)) {
        let registry = registry();
        let mut chain = ChainModel::new();
        for op in &ops {
            apply(&mut chain, &registry, op);
        }
        let json = serde_json::to_value(chain.to_wire()).unwrap();
        let reloaded = glitchlamp_core::normalize_value(&json);
        prop_assert_eq!(reloaded, chain);
    }
}
