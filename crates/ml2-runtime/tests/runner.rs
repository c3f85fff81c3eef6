//! Integration tests running generated trees through [`StageRunner`].
//!
//! Stage scripts need a Python environment with scikit-learn, so the
//! process-level tests swap the generated script for a shell stand-in that
//! speaks the same stdout protocol.

use ml2_codegen::{DataAnalyticsSpec, Generator, GeneratorConfig, Stage, contract};
use ml2_runtime::{
    CancellationToken, HostValue, RunnerConfig, RuntimeError, StageRunner, StageStatus,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Helper Functions
// ============================================================================

fn spec() -> DataAnalyticsSpec {
    serde_json::from_value(json!({
        "name": "heating",
        "features": [
            {"name": "temperature", "type": "double"},
            {"name": "occupied", "type": "boolean"},
            {"name": "readings", "type": "int", "is_array": true}
        ],
        "prediction_results": [
            {"name": "mode", "type": "string"},
            {"name": "alarm", "type": "boolean"},
            {"name": "levels", "type": "int", "is_array": true}
        ],
        "labels": "ON",
        "algorithm": {"kind": "random_forest_classifier"},
        "dataset": "data/heating.csv",
        "training_results": "training_results.txt"
    }))
    .expect("Failed to parse spec")
}

/// Generate the tree under `root` and build a runner over it.
fn generate_and_runner(root: &Path, config: RunnerConfig) -> StageRunner {
    let generator_config = GeneratorConfig::builder()
        .output_root(root)
        .build()
        .expect("Failed to build generator config");
    let generator = Generator::builder()
        .config(generator_config.clone())
        .build()
        .expect("Failed to build generator");
    let outcome = generator.generate(&mut spec()).expect("Generation failed");
    let plan = outcome.plan.expect("Spec should be generable");

    StageRunner::new(plan, generator_config.layout(), config).expect("Failed to build runner")
}

fn create_required(runner: &StageRunner, root: &Path, stage: Stage) {
    let layout = GeneratorConfig::builder()
        .output_root(root)
        .build()
        .unwrap()
        .layout();
    for path in contract::invocation(runner.plan(), &layout, stage)
        .unwrap()
        .required
    {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }
}

#[cfg(unix)]
fn replace_script(root: &Path, stage: Stage, body: &str) {
    let path = root.join("python-scripts").join(stage.script_name());
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
}

fn features() -> Vec<HostValue> {
    vec![
        HostValue::from(19.5),
        HostValue::from(false),
        HostValue::from(vec![3, 4, 5]),
    ]
}

// ============================================================================
// Gating
// ============================================================================

#[test]
fn test_fresh_tree_skips_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let runner = generate_and_runner(dir.path(), RunnerConfig::default());

    let statuses = runner.run_training().unwrap();
    assert!(statuses.iter().all(|(_, status)| status.is_skipped()));

    match runner.predict(&features()).unwrap() {
        StageStatus::Skipped { missing } => {
            assert!(missing.iter().any(|p| p.ends_with("train_model_rfc.pickle")));
        }
        other => panic!("expected skip, got {other:?}"),
    }
}

// ============================================================================
// Process-level runs
// ============================================================================

#[cfg(unix)]
#[test]
fn test_predict_decodes_script_output() {
    let dir = tempfile::tempdir().unwrap();
    let runner = generate_and_runner(dir.path(), RunnerConfig::default());
    create_required(&runner, dir.path(), Stage::Predict);
    // Echo the array argument back so the test sees what crossed the boundary.
    replace_script(
        dir.path(),
        Stage::Predict,
        "echo eco\necho True\necho \"$5\" | tr -d \"'\"",
    );

    let status = runner.predict(&features()).unwrap();
    let output = status.output().expect("stage should have run");
    assert!(output.succeeded());
    assert_eq!(
        output.results,
        vec![
            ("mode".to_string(), HostValue::Text("eco".to_string())),
            ("alarm".to_string(), HostValue::Bool(true)),
            (
                "levels".to_string(),
                HostValue::Array(vec![
                    HostValue::Int(3),
                    HostValue::Int(4),
                    HostValue::Int(5)
                ])
            ),
        ]
    );
}

#[cfg(unix)]
#[test]
fn test_failing_stage_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let runner = generate_and_runner(dir.path(), RunnerConfig::default());
    create_required(&runner, dir.path(), Stage::Predict);
    replace_script(dir.path(), Stage::Predict, "exit 1");

    let status = runner.predict(&features()).unwrap();
    let output = status.output().unwrap();
    assert_eq!(output.exit_code, Some(1));
    assert!(output.results.is_empty());
}

#[cfg(unix)]
#[test]
fn test_training_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunnerConfig::builder()
        .timeout(Duration::from_millis(100))
        .poll_interval(Duration::from_millis(10))
        .build()
        .unwrap();
    let runner = generate_and_runner(dir.path(), config);
    create_required(&runner, dir.path(), Stage::Train);
    replace_script(dir.path(), Stage::Train, "exec sleep 5");

    let err = runner.run(Stage::Train, &[]).unwrap_err();
    assert!(matches!(err, RuntimeError::Timeout { .. }));
}

#[cfg(unix)]
#[test]
fn test_cancel_from_another_thread() {
    let dir = tempfile::tempdir().unwrap();
    let token = CancellationToken::new();
    let runner = generate_and_runner(dir.path(), RunnerConfig::default())
        .cancellation_token(token.clone());
    create_required(&runner, dir.path(), Stage::Train);
    replace_script(dir.path(), Stage::Train, "exec sleep 5");

    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        token.cancel();
    });
    let err = runner.run(Stage::Train, &[]).unwrap_err();
    canceller.join().unwrap();
    assert_eq!(err.error_code(), "CANCELLED");
}
