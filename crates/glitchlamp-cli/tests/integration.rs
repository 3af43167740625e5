//! Integration tests for glitchlamp-cli.
//!
//! Every invocation runs with `--offline`, so each process talks to a fresh
//! in-memory demo backend and nothing persists between commands.

use std::process::{Command, Output};

/// Helper to get the path to the `glitchlamp` binary built by cargo.
fn glitchlamp_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_glitchlamp"));
    cmd.arg("--offline");
    cmd
}

fn run(args: &[&str]) -> Output {
    glitchlamp_bin()
        .args(args)
        .output()
        .expect("failed to run glitchlamp")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ---------------------------------------------------------------------------
// glitchlamp effects
// ---------------------------------------------------------------------------

#[test]
fn cli_effects_lists_catalog_and_sources() {
    let output = run(&["effects"]);
    assert!(output.status.success(), "glitchlamp effects failed");
    let stdout = stdout(&output);
    assert!(stdout.contains("Available Effects"));
    for effect in ["source", "source-local", "glitch", "mix"] {
        assert!(stdout.contains(effect), "listing should contain '{effect}'");
    }
}

#[test]
fn cli_effect_details_show_options_and_ports() {
    let output = run(&["effects", "mix"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Inputs: A, B"), "mix has two labelled ports:\n{stdout}");

    let output = run(&["effects", "GLITCH"]);
    assert!(output.status.success(), "lookup is case-insensitive");
    assert!(crate::stdout(&output).contains("probability"));
}

#[test]
fn cli_unknown_effect_fails() {
    let output = run(&["effects", "no-such-effect"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown effect"));
}

// ---------------------------------------------------------------------------
// glitchlamp settings
// ---------------------------------------------------------------------------

#[test]
fn cli_settings_chain_starts_at_a_source() {
    let output = run(&["settings", "chain"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Chain ("));
    assert!(stdout.contains("1. ["), "first node is listed:\n{stdout}");
    assert!(stdout.contains("source"));
}

#[test]
fn cli_settings_show_prints_json() {
    let output = run(&["settings", "show"]);
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("settings output is JSON");
    assert!(value.get("duration").is_some());
}

// ---------------------------------------------------------------------------
// glitchlamp presets
// ---------------------------------------------------------------------------

#[test]
fn cli_validate_accepts_good_file_and_rejects_bad_one() {
    let dir = tempfile::tempdir().expect("tempdir");

    let good = dir.path().join("good.json");
    std::fs::write(
        &good,
        r#"[{"id":"a","name":"source"},{"id":"b","name":"glitch","inputs":["a"]}]"#,
    )
    .expect("write good preset");
    let output = run(&["presets", "validate", good.to_str().expect("utf-8 path")]);
    assert!(output.status.success(), "{}", stdout(&output));
    assert!(stdout(&output).contains("is valid"));

    let bad = dir.path().join("bad.json");
    std::fs::write(
        &bad,
        r#"[{"id":"a","name":"source"},{"id":"b","name":"glitch","inputs":["zzz"]}]"#,
    )
    .expect("write bad preset");
    let output = run(&["presets", "validate", bad.to_str().expect("utf-8 path")]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("missing node"));
}

#[test]
fn cli_export_writes_requested_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("demo.json");

    // The offline backend starts without presets.
    let output = run(&["presets", "list"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("(none)"));

    let output = run(&[
        "presets",
        "export",
        "missing",
        "--output",
        file.to_str().expect("utf-8 path"),
    ]);
    assert!(!output.status.success());
    assert!(!file.exists());
}

#[test]
fn cli_save_rejects_bad_names() {
    let output = run(&["presets", "save", " padded "]);
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// glitchlamp status
// ---------------------------------------------------------------------------

#[test]
fn cli_status_pause_reports_paused() {
    let output = run(&["status", "--pause"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Generation paused"));
    assert!(stdout.contains("Status:"));
}

#[test]
fn cli_pause_and_resume_conflict() {
    let output = run(&["status", "--pause", "--resume"]);
    assert!(!output.status.success());
}
