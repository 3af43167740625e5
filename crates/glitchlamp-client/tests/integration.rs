//! End-to-end bridge behaviour against the in-memory backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glitchlamp_client::{
    Backend, GenerationMonitor, GenerationState, GenerationStatus, Latest, MemoryBackend,
    NodeActivity, PollTask, RequestTokens, RetryPolicy, bridge, load_settings_with_retry,
};
use glitchlamp_config::Preset;
use glitchlamp_core::{ChainModel, NodeId};
use proptest::prelude::*;

fn fast(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempts,
        delay: Duration::ZERO,
    }
}

#[test]
fn settings_load_survives_two_failures() {
    let backend = MemoryBackend::demo();
    backend.fail_next(2);
    let settings = load_settings_with_retry(&backend, fast(3)).unwrap();
    assert_eq!(settings.duration, 5);
}

#[test]
fn settings_load_gives_up_after_three() {
    let backend = MemoryBackend::demo();
    backend.fail_next(5);
    let err = load_settings_with_retry(&backend, fast(3)).unwrap_err();
    assert!(err.is_transient());
}

#[test]
fn chain_round_trips_through_settings() {
    let backend = MemoryBackend::demo();
    let registry = bridge::load_registry(&backend).unwrap();
    let (mut settings, mut chain) = bridge::load_chain(&backend, &registry, fast(1)).unwrap();

    let source = chain.nodes()[0].id.clone();
    let a = chain.add_node("blur", None).unwrap();
    let b = chain.add_node("bloom", None).unwrap();
    let mix = chain.add_node("mix", None).unwrap();
    chain.connect(&registry, &source, &a, 0).unwrap();
    chain.connect(&registry, &source, &b, 0).unwrap();
    chain.connect(&registry, &a, &mix, 0).unwrap();
    chain.connect(&registry, &b, &mix, 1).unwrap();
    bridge::save_chain(&backend, &mut settings, &chain).unwrap();

    let (_, reloaded) = bridge::load_chain(&backend, &registry, fast(1)).unwrap();
    assert_eq!(reloaded.to_wire(), chain.to_wire());
    assert_eq!(
        reloaded.node(&mix).unwrap().inputs,
        vec![Some(a.clone()), Some(b.clone())]
    );
}

#[test]
fn presets_import_export_delete() {
    let backend = MemoryBackend::demo();
    let mut chain = ChainModel::new();
    chain.add_node("source", None).unwrap();
    chain.add_node("ascii", None).unwrap();
    bridge::save_preset(&backend, "terminal", &chain).unwrap();

    let exported = backend.export_preset("terminal").unwrap();
    let imported = backend
        .import_preset("terminal-copy.json", exported.as_bytes())
        .unwrap();
    assert_eq!(imported, "terminal-copy");
    assert_eq!(
        backend.preset("terminal-copy").unwrap().nodes,
        Preset::from_chain("x", &chain).nodes
    );

    backend.delete_preset("terminal").unwrap();
    assert_eq!(backend.presets().unwrap(), vec!["terminal-copy"]);
}

#[test]
fn poller_feeds_monitor_and_stops() {
    let backend = Arc::new(MemoryBackend::demo());
    backend.set_status(GenerationStatus {
        state: GenerationState::Processing,
        current_node: Some(NodeId::from("node-2")),
        processed_nodes: vec![NodeId::from("node-1")],
        ..GenerationStatus::default()
    });

    let latest = Latest::new();
    let polled = Arc::clone(&backend);
    let mut task = PollTask::spawn_fetch(
        "status",
        Duration::from_millis(10),
        latest.clone(),
        move || polled.generation_status(),
    );
    let deadline = Instant::now() + Duration::from_secs(5);
    while latest.get().is_none() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    task.stop();
    assert!(!task.is_running());

    let mut monitor = GenerationMonitor::new();
    monitor.update(latest.get().unwrap());
    assert_eq!(monitor.activity(&NodeId::from("node-2")), NodeActivity::Processing);
    assert_eq!(monitor.activity(&NodeId::from("node-1")), NodeActivity::Processed);
}

#[test]
fn pause_resume_reflects_in_monitor() {
    let backend = MemoryBackend::demo();
    let mut monitor = GenerationMonitor::new();
    backend.pause_generation().unwrap();
    monitor.update(backend.generation_status().unwrap());
    assert!(monitor.is_paused());
    backend.resume_generation().unwrap();
    monitor.update(backend.generation_status().unwrap());
    assert!(!monitor.is_paused());
}

proptest! {
    /// Whatever order responses resolve in, exactly the last issued
    /// request per channel is accepted.
    #[test]
    fn only_last_issued_token_is_current(
        issues in proptest::collection::vec(0u8..3, 1..40),
        seed in any::<u64>(),
    ) {
        let mut tokens = RequestTokens::new();
        let mut issued: Vec<_> = issues.iter().map(|&c| tokens.issue(c)).collect();

        // Resolve in a scrambled order.
        let len = issued.len();
        for i in 0..len {
            let j = (seed as usize).wrapping_add(i * 7) % len;
            issued.swap(i, j);
        }

        for channel in 0u8..3 {
            let accepted: Vec<_> = issued
                .iter()
                .filter(|t| t.channel() == channel && tokens.is_current(t))
                .collect();
            let expected = usize::from(issues.contains(&channel));
            prop_assert_eq!(accepted.len(), expected);
            if let Some(t) = accepted.first() {
                let max = issued
                    .iter()
                    .filter(|t| t.channel() == channel)
                    .map(|t| t.generation())
                    .max();
                prop_assert_eq!(Some(t.generation()), max);
            }
        }
    }
}
