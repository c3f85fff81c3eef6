//! Machine-readable summary of a generation run.
//!
//! The same [`GenerationReport`] backs both `--json` output and the
//! `generation_report.json` file written by `--emit-report`.

use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::catalog::Task;
use crate::diagnostics::{Diagnostic, Severity};
use crate::error::{Result, ResultExt};
use crate::layout::Stage;
use crate::model::Backend;

use super::GenerationOutcome;

/// File name of the report written next to the scripts.
pub const REPORT_FILE_NAME: &str = "generation_report.json";

/// Summary of one generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Name of the spec the run was for
    pub spec: String,
    /// Resolved algorithm, absent when fatal diagnostics stopped the run
    pub algorithm: Option<String>,
    pub backend: Option<Backend>,
    pub task: Option<Task>,
    /// Whether the AutoML upgrade changed the spec during this run
    pub automl_upgraded: bool,
    /// Scripts rendered, with their paths when written
    pub scripts: Vec<ScriptEntry>,
    /// Artifact file names the pipeline will produce
    pub artifacts: Vec<String>,
    pub diagnostic_counts: DiagnosticCounts,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptEntry {
    pub stage: Stage,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticCounts {
    pub info: usize,
    pub warning: usize,
    pub fatal: usize,
}

impl GenerationReport {
    pub fn from_outcome(outcome: &GenerationOutcome) -> Self {
        let plan = outcome.plan.as_ref();
        let scripts = outcome
            .scripts
            .iter()
            .map(|script| ScriptEntry {
                stage: script.stage,
                file_name: script.file_name.clone(),
                path: outcome
                    .written
                    .iter()
                    .find(|path| path.file_name().is_some_and(|name| name == script.file_name.as_str()))
                    .map(|path| path.display().to_string()),
            })
            .collect();

        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            spec: outcome.spec_name.clone(),
            algorithm: plan.map(|p| p.algorithm.to_string()),
            backend: plan.map(|p| p.backend),
            task: plan.map(|p| p.task),
            automl_upgraded: outcome.automl_upgraded,
            scripts,
            artifacts: plan
                .map(|p| p.artifacts.file_names().into_iter().map(String::from).collect())
                .unwrap_or_default(),
            diagnostic_counts: DiagnosticCounts {
                info: outcome.diagnostics.count(Severity::Info),
                warning: outcome.diagnostics.count(Severity::Warning),
                fatal: outcome.diagnostics.count(Severity::Fatal),
            },
            diagnostics: outcome.diagnostics.entries().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as `generation_report.json` inside `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).context(format!("creating '{}'", dir.display()))?;
        let path = dir.join(REPORT_FILE_NAME);
        fs::write(&path, self.to_json()?).context(format!("writing '{}'", path.display()))?;
        info!("Report saved: {}", path.display());
        Ok(path)
    }
}
