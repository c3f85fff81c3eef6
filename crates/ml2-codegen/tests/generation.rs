//! Integration tests for script and glue generation.
//!
//! These tests drive the public facade with spec documents from
//! `tests/fixtures` and inspect the generated tree on disk.

use ml2_codegen::{
    DataAnalyticsSpec, DiagnosticKind, GenerationOutcome, Generator, GeneratorConfig, Severity,
    Stage,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_spec(filename: &str) -> DataAnalyticsSpec {
    let path = fixtures_path().join(filename);
    let content = fs::read_to_string(&path).expect("Failed to read fixture");
    serde_json::from_str(&content).expect("Failed to parse fixture")
}

fn generator(root: &Path) -> Generator {
    let config = GeneratorConfig::builder()
        .output_root(root)
        .random_state(7)
        .build()
        .expect("Failed to build config");
    Generator::builder()
        .config(config)
        .build()
        .expect("Failed to build generator")
}

fn script(root: &Path, stage: Stage) -> String {
    fs::read_to_string(root.join("python-scripts").join(stage.script_name()))
        .expect("Failed to read generated script")
}

fn glue(outcome: &GenerationOutcome, stage: Stage) -> &str {
    &outcome
        .glue
        .iter()
        .find(|fragment| fragment.stage == stage)
        .expect("Missing glue fragment")
        .body
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn test_decision_tree_classifier_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut spec = load_spec("dtc_region.json");
    let outcome = generator(dir.path()).generate(&mut spec).unwrap();

    assert!(!outcome.is_abandoned());
    assert!(!outcome.diagnostics.has_fatal());
    assert_eq!(outcome.written.len(), 3);
    assert!(!dir.path().join("python-scripts/pre_trained_predict.py").exists());
    assert!(dir.path().join("python-scripts/pickles").is_dir());
    assert!(dir.path().join("python-scripts/plots").is_dir());

    let train = script(dir.path(), Stage::Train);
    assert!(train.starts_with("#!/usr/bin/env python3\n"));
    assert!(train.contains("MODEL_FILE = 'train_model_dtc.pickle'\n"));
    assert!(train.contains("model = DecisionTreeClassifier(criterion='entropy', max_depth=6)\n"));
    assert!(train.contains("dump(model, MODEL_FILE)"));
    assert!(train.contains("failed to produce metric"));

    let preprocess = script(dir.path(), Stage::Preprocess);
    assert!(preprocess.contains("RANDOM_STATE = 7"));
    assert!(preprocess.contains("dump(label_encoders, 'preprocess_label_encoder.pickle')"));

    let predict = script(dir.path(), Stage::Predict);
    assert!(predict.contains("label_encoders = load('preprocess_label_encoder.pickle')"));

    let report = outcome.report();
    assert_eq!(report.algorithm.as_deref(), Some("DecisionTreeClassifier"));
    assert!(report.artifacts.iter().any(|a| a == "train_model_dtc.pickle"));
}

#[test]
fn test_decision_tree_glue_follows_argument_contract() {
    let dir = tempfile::tempdir().unwrap();
    let mut spec = load_spec("dtc_region.json");
    let outcome = generator(dir.path()).generate(&mut spec).unwrap();

    let preprocess = glue(&outcome, Stage::Preprocess);
    assert!(preprocess.contains("if (!new File(\"data/heating.csv\").exists()) {\n    return;\n}"));
    assert!(preprocess.contains(
        "command.add(\"data/heating.csv\");\n\
         command.add(\"false\");\n\
         command.add(\"false\");\n\
         command.add(\"temperature,occupied,zone\");\n\
         command.add(\"double,boolean,string\");\n\
         command.add(\"mode\");\n"
    ));

    let predict = glue(&outcome, Stage::Predict);
    assert!(predict.contains("train_model_dtc.pickle\").exists()"));
    assert!(predict.contains("command.add(String.valueOf(occupied));"));
    assert!(predict.contains("mode = line.trim();"));
}

#[test]
fn test_kmeans_automl_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut spec = load_spec("kmeans_automl.json");
    let outcome = generator(dir.path()).generate(&mut spec).unwrap();

    assert!(!outcome.is_abandoned());
    assert!(outcome.automl_upgraded);
    assert!(spec.automl_applied);
    assert_eq!(outcome.diagnostics.count(Severity::Fatal), 0);

    let suggestions: Vec<_> = outcome
        .diagnostics
        .of_kind(DiagnosticKind::Suggestion)
        .collect();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].severity, Severity::Info);
    assert!(suggestions[0].message.contains("MiniBatchKMeans"));

    let train = script(dir.path(), Stage::Train);
    assert!(train.contains("    model = KMeans()\n"));
    assert!(!train.contains("n_clusters"));
    assert!(train.contains("MODEL_FILE = 'train_model_kmeans.pickle'\n"));
    assert!(!train.contains("train_test_split"));
}

// ============================================================================
// Regeneration and failure behaviour
// ============================================================================

#[test]
fn test_regeneration_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let generator = generator(dir.path());

    for fixture in ["dtc_region.json", "kmeans_automl.json"] {
        let mut spec = load_spec(fixture);
        let first = generator.generate(&mut spec).unwrap();
        let before: Vec<Vec<u8>> = first
            .written
            .iter()
            .map(|path| fs::read(path).unwrap())
            .collect();

        let second = generator.generate(&mut spec).unwrap();
        assert!(!second.automl_upgraded);
        assert_eq!(first.written, second.written);
        let after: Vec<Vec<u8>> = second
            .written
            .iter()
            .map(|path| fs::read(path).unwrap())
            .collect();
        assert_eq!(before, after);
        assert_eq!(first.report().artifacts, second.report().artifacts);
    }
}

#[test]
fn test_fatal_spec_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut spec = load_spec("conflicting_region.json");
    let outcome = generator(dir.path()).generate(&mut spec).unwrap();

    assert!(outcome.is_abandoned());
    assert!(outcome.diagnostics.has_fatal());
    assert!(outcome.glue.is_empty());
    assert!(!dir.path().join("python-scripts").exists());
}

#[test]
fn test_glue_uses_host_root() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig::builder()
        .output_root(dir.path())
        .host_root("runtime")
        .build()
        .unwrap();
    let generator = Generator::builder().config(config).build().unwrap();
    let outcome = generator
        .generate(&mut load_spec("dtc_region.json"))
        .unwrap();

    assert!(glue(&outcome, Stage::Train).contains("new File(\"runtime/python-scripts/train.py\")"));
    assert!(outcome.written[0].starts_with(dir.path()));
}

#[cfg(unix)]
#[test]
fn test_scripts_are_executable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let outcome = generator(dir.path())
        .generate(&mut load_spec("dtc_region.json"))
        .unwrap();
    for path in &outcome.written {
        let mode = fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111, "{} is not executable", path.display());
    }
}
