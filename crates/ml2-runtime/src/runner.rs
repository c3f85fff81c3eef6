//! Running generated stages for a resolved plan.
//!
//! A stage whose inputs are missing is skipped without spawning anything,
//! mirroring the early return of the generated host glue. Predict stages
//! get one argument per feature and print one line per result.

use ml2_codegen::contract::{self, Arg};
use ml2_codegen::{GenerationPlan, ScriptLayout, Stage};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::cancellation::CancellationToken;
use crate::config::RunnerConfig;
use crate::error::{Result, RuntimeError};
use crate::launcher::{LaunchRequest, ProcessLauncher, SubprocessLauncher};
use crate::values::HostValue;

/// Decoded stdout of a finished stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput {
    pub exit_code: Option<i32>,
    /// Results in declaration order. Results the script did not print are
    /// absent.
    pub results: Vec<(String, HostValue)>,
}

impl StageOutput {
    pub fn get(&self, name: &str) -> Option<&HostValue> {
        self.results
            .iter()
            .find(|(result, _)| result == name)
            .map(|(_, value)| value)
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// How a stage run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StageStatus {
    /// Required inputs were missing; nothing ran.
    Skipped { missing: Vec<PathBuf> },
    Completed(StageOutput),
}

impl StageStatus {
    pub fn is_skipped(&self) -> bool {
        matches!(self, StageStatus::Skipped { .. })
    }

    pub fn output(&self) -> Option<&StageOutput> {
        match self {
            StageStatus::Completed(output) => Some(output),
            StageStatus::Skipped { .. } => None,
        }
    }
}

/// Runs the stage scripts of one generated plan.
pub struct StageRunner<L: ProcessLauncher = SubprocessLauncher> {
    plan: GenerationPlan,
    layout: ScriptLayout,
    config: RunnerConfig,
    launcher: L,
    cancellation: CancellationToken,
}

// Runners are shared with worker threads driving statechart regions.
static_assertions::assert_impl_all!(StageRunner<SubprocessLauncher>: Send, Sync);

impl StageRunner<SubprocessLauncher> {
    pub fn new(plan: GenerationPlan, layout: ScriptLayout, config: RunnerConfig) -> Result<Self> {
        Self::with_launcher(plan, layout, config, SubprocessLauncher)
    }
}

impl<L: ProcessLauncher> StageRunner<L> {
    /// Build a runner that starts processes through `launcher`.
    pub fn with_launcher(
        plan: GenerationPlan,
        layout: ScriptLayout,
        config: RunnerConfig,
        launcher: L,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            plan,
            layout,
            config,
            launcher,
            cancellation: CancellationToken::new(),
        })
    }

    /// Use `token` to cancel running stages from another thread.
    #[must_use]
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn plan(&self) -> &GenerationPlan {
        &self.plan
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `stage`. `features` is only read by predict stages and must hold
    /// one value per declared feature, in order.
    pub fn run(&self, stage: Stage, features: &[HostValue]) -> Result<StageStatus> {
        let invocation = contract::invocation(&self.plan, &self.layout, stage)?;

        let missing: Vec<PathBuf> = invocation
            .required
            .iter()
            .filter(|path| !self.resolve(path).exists())
            .cloned()
            .collect();
        if !missing.is_empty() {
            info!(
                stage = %stage,
                missing = missing.len(),
                "Skipping stage, inputs not available yet"
            );
            return Ok(StageStatus::Skipped { missing });
        }

        if stage.is_predict() {
            self.check_features(features)?;
        }
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let args: Vec<String> = invocation
            .args
            .iter()
            .map(|arg| match arg {
                Arg::Constant(value) => value.clone(),
                Arg::Feature(index) => features[*index].encode_arg(),
                Arg::Timestamp => timestamp.to_string(),
            })
            .collect();

        let script = self.resolve(&invocation.script);
        debug!(stage = %stage, script = %script.display(), "Running stage");
        let output = self.launcher.launch(
            &LaunchRequest {
                script: &script,
                args: &args,
                capture_stdout: !invocation.results.is_empty(),
            },
            &self.config,
            &self.cancellation,
        )?;

        if output.exit_code != Some(0) {
            warn!(stage = %stage, code = ?output.exit_code, "Stage exited unsuccessfully");
        }

        let mut results = Vec::new();
        for (result, line) in invocation.results.iter().zip(output.stdout.lines()) {
            if !result.is_array && line.trim().is_empty() {
                continue;
            }
            results.push((result.name.clone(), HostValue::decode(line, result)?));
        }

        Ok(StageStatus::Completed(StageOutput {
            exit_code: output.exit_code,
            results,
        }))
    }

    /// Preprocess the dataset, then train on it.
    pub fn run_training(&self) -> Result<Vec<(Stage, StageStatus)>> {
        let mut statuses = Vec::with_capacity(2);
        for stage in [Stage::Preprocess, Stage::Train] {
            let status = self.run(stage, &[])?;
            statuses.push((stage, status));
        }
        Ok(statuses)
    }

    pub fn predict(&self, features: &[HostValue]) -> Result<StageStatus> {
        self.run(Stage::Predict, features)
    }

    /// Predict with the externally trained model.
    pub fn predict_pre_trained(&self, features: &[HostValue]) -> Result<StageStatus> {
        self.run(Stage::PreTrainedPredict, features)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.config.working_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn check_features(&self, features: &[HostValue]) -> Result<()> {
        let declared = &self.plan.spec.features;
        if features.len() != declared.len() {
            return Err(RuntimeError::InvalidInput(format!(
                "expected {} feature values, got {}",
                declared.len(),
                features.len()
            )));
        }
        for (feature, value) in declared.iter().zip(features) {
            if feature.is_array != matches!(value, HostValue::Array(_)) {
                return Err(RuntimeError::InvalidInput(format!(
                    "feature '{}' expects {}",
                    feature.name,
                    if feature.is_array { "an array" } else { "a scalar" }
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::ProcessOutput;
    use ml2_codegen::{DataAnalyticsSpec, Diagnostics, resolve};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use std::sync::Mutex;

    /// Records launches and answers with canned stdout.
    #[derive(Default)]
    struct RecordingLauncher {
        stdout: String,
        launches: Mutex<Vec<(PathBuf, Vec<String>, bool)>>,
    }

    impl ProcessLauncher for RecordingLauncher {
        fn launch(
            &self,
            request: &LaunchRequest<'_>,
            _config: &RunnerConfig,
            _cancellation: &CancellationToken,
        ) -> Result<ProcessOutput> {
            self.launches.lock().unwrap().push((
                request.script.to_path_buf(),
                request.args.to_vec(),
                request.capture_stdout,
            ));
            Ok(ProcessOutput {
                exit_code: Some(0),
                stdout: self.stdout.clone(),
            })
        }
    }

    fn plan() -> GenerationPlan {
        let spec: DataAnalyticsSpec = serde_json::from_value(json!({
            "name": "heating",
            "features": [
                {"name": "temperature", "type": "double"},
                {"name": "history", "type": "double", "is_array": true}
            ],
            "prediction_results": [
                {"name": "mode", "type": "string"},
                {"name": "level", "type": "int"}
            ],
            "labels": "ON",
            "timestamps": true,
            "algorithm": {"kind": "decision_tree_classifier"},
            "dataset": "data/heating.csv",
            "training_results": "results.txt"
        }))
        .unwrap();
        resolve(&spec, &mut Diagnostics::new()).unwrap()
    }

    fn layout() -> ScriptLayout {
        ScriptLayout::new("python-scripts", "pickles", "plots")
    }

    fn runner(dir: &Path, stdout: &str) -> StageRunner<RecordingLauncher> {
        let config = RunnerConfig::builder().working_dir(dir).build().unwrap();
        let launcher = RecordingLauncher {
            stdout: stdout.to_string(),
            ..Default::default()
        };
        StageRunner::with_launcher(plan(), layout(), config, launcher).unwrap()
    }

    fn create_required(dir: &Path, stage: Stage) {
        let invocation = contract::invocation(&plan(), &layout(), stage).unwrap();
        for path in invocation.required {
            let path = dir.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"").unwrap();
        }
    }

    fn features() -> Vec<HostValue> {
        vec![HostValue::from(21.5), HostValue::from(vec![1.0, 2.5])]
    }

    #[test]
    fn test_missing_inputs_skip_without_launch() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path(), "");

        let status = runner.predict(&features()).unwrap();
        match status {
            StageStatus::Skipped { missing } => assert!(!missing.is_empty()),
            other => panic!("expected skip, got {other:?}"),
        }
        assert!(runner.launcher.launches.lock().unwrap().is_empty());
    }

    #[test]
    fn test_predict_arguments_and_results() {
        let dir = tempfile::tempdir().unwrap();
        create_required(dir.path(), Stage::Predict);
        let runner = runner(dir.path(), "heat\n2.0\n");

        let status = runner.predict(&features()).unwrap();
        let output = status.output().unwrap();
        assert!(output.succeeded());
        assert_eq!(output.get("mode"), Some(&HostValue::Text("heat".to_string())));
        assert_eq!(output.get("level"), Some(&HostValue::Int(2)));

        let launches = runner.launcher.launches.lock().unwrap();
        let (script, args, captured) = &launches[0];
        assert_eq!(script, &dir.path().join("python-scripts/predict.py"));
        assert!(*captured);
        assert_eq!(
            args[..4],
            [
                "temperature,history".to_string(),
                "double,double[]".to_string(),
                "21.5".to_string(),
                "'[1 2.5]'".to_string(),
            ]
        );
        assert_eq!(args.len(), 5);
        assert!(args[4].parse::<u64>().is_ok());
    }

    #[test]
    fn test_missing_result_lines_are_left_out() {
        let dir = tempfile::tempdir().unwrap();
        create_required(dir.path(), Stage::Predict);
        let runner = runner(dir.path(), "cool\n");

        let status = runner.predict(&features()).unwrap();
        let output = status.output().unwrap();
        assert_eq!(output.results.len(), 1);
        assert!(output.get("level").is_none());
    }

    #[test]
    fn test_feature_count_checked() {
        let dir = tempfile::tempdir().unwrap();
        create_required(dir.path(), Stage::Predict);
        let runner = runner(dir.path(), "");

        let err = runner.predict(&[HostValue::from(1.0)]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let err = runner
            .predict(&[HostValue::from(1.0), HostValue::from(2.0)])
            .unwrap_err();
        assert!(err.to_string().contains("'history' expects an array"));
        assert!(runner.launcher.launches.lock().unwrap().is_empty());
    }

    #[test]
    fn test_training_passes_dataset_contract() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/heating.csv"), "temperature\n").unwrap();
        let runner = runner(dir.path(), "");

        let statuses = runner.run_training().unwrap();
        assert_eq!(statuses[0].0, Stage::Preprocess);
        assert!(!statuses[0].1.is_skipped());
        // Preprocess was mocked, so its pickles never appeared.
        assert!(statuses[1].1.is_skipped());

        let launches = runner.launcher.launches.lock().unwrap();
        assert_eq!(launches.len(), 1);
        assert_eq!(
            launches[0].1,
            vec![
                "data/heating.csv",
                "false",
                "true",
                "temperature,history",
                "double,double[]",
                "mode,level",
            ]
        );
        assert!(!launches[0].2);
    }

    #[test]
    fn test_pre_trained_stage_unavailable_without_blackbox() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner(dir.path(), "")
            .predict_pre_trained(&features())
            .unwrap_err();
        assert_eq!(err.error_code(), "STAGE_UNAVAILABLE");
    }
}
