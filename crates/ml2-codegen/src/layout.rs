//! Pipeline stages and where their files live.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One stage of the generated numeric pipeline.
///
/// Stages run strictly in order (preprocess, train, predict) and hand off
/// state only through artifact files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Preprocess,
    Train,
    Predict,
    PreTrainedPredict,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Preprocess,
        Stage::Train,
        Stage::Predict,
        Stage::PreTrainedPredict,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Preprocess => "preprocess",
            Stage::Train => "train",
            Stage::Predict => "predict",
            Stage::PreTrainedPredict => "pre_trained_predict",
        }
    }

    /// File name of the stage script.
    pub fn script_name(&self) -> String {
        format!("{}.py", self.as_str())
    }

    /// Whether the stage prints prediction results on stdout.
    pub fn is_predict(&self) -> bool {
        matches!(self, Stage::Predict | Stage::PreTrainedPredict)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved directory layout of a generated script tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLayout {
    root: PathBuf,
    pickles: String,
    plots: String,
}

impl ScriptLayout {
    pub fn new(root: impl Into<PathBuf>, pickles: &str, plots: &str) -> Self {
        Self {
            root: root.into(),
            pickles: pickles.to_string(),
            plots: plots.to_string(),
        }
    }

    /// The scripts directory (`<root>/python-scripts`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn script(&self, stage: Stage) -> PathBuf {
        self.root.join(stage.script_name())
    }

    pub fn pickles_dir(&self) -> PathBuf {
        self.root.join(&self.pickles)
    }

    pub fn pickle(&self, file_name: &str) -> PathBuf {
        self.pickles_dir().join(file_name)
    }

    pub fn plots_dir(&self) -> PathBuf {
        self.root.join(&self.plots)
    }

    pub fn report(&self) -> PathBuf {
        self.root.join("html_report.html")
    }

    pub fn pickles_name(&self) -> &str {
        &self.pickles
    }

    pub fn plots_name(&self) -> &str {
        &self.plots
    }
}
