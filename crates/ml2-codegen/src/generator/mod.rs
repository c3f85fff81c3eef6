//! Generation facade.
//!
//! [`Generator`] runs the whole flow for one spec: AutoML upgrade, plan
//! resolution, script rendering, atomic writes and host glue. Fatal
//! diagnostics are not errors: the outcome simply carries no plan.

mod progress;
mod report;

pub use progress::{ClosureProgressReporter, GenerationStep, ProgressReporter, ProgressUpdate};
pub use report::{DiagnosticCounts, GenerationReport, REPORT_FILE_NAME, ScriptEntry};

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{self, GenerationPlan};
use crate::config::GeneratorConfig;
use crate::diagnostics::Diagnostics;
use crate::emitter::{ScriptEmitter, ScriptText, write_script};
use crate::error::{Result, ResultExt};
use crate::model::DataAnalyticsSpec;
use crate::orchestrator::{self, HostFragment};

/// Result of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub spec_name: String,
    /// Absent when fatal diagnostics abandoned the run.
    pub plan: Option<GenerationPlan>,
    pub scripts: Vec<ScriptText>,
    /// Paths written, empty for a dry run.
    pub written: Vec<PathBuf>,
    pub glue: Vec<HostFragment>,
    pub diagnostics: Diagnostics,
    pub automl_upgraded: bool,
}

impl GenerationOutcome {
    /// Fatal diagnostics stopped generation.
    pub fn is_abandoned(&self) -> bool {
        self.plan.is_none()
    }

    pub fn report(&self) -> GenerationReport {
        GenerationReport::from_outcome(self)
    }

    /// All glue fragments as one listing, in stage order.
    pub fn glue_source(&self) -> String {
        self.glue
            .iter()
            .map(HostFragment::to_source)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Turns data-analytics specs into stage scripts and host glue.
///
/// Use [`Generator::builder()`] to create a generator with custom
/// configuration.
///
/// # Example
///
/// ```rust,ignore
/// use ml2_codegen::{Generator, GeneratorConfig};
///
/// let generator = Generator::builder()
///     .config(GeneratorConfig::builder().output_root("gen").build()?)
///     .build()?;
/// let outcome = generator.generate(&mut spec)?;
/// for diagnostic in outcome.diagnostics.iter() {
///     println!("{diagnostic}");
/// }
/// ```
pub struct Generator {
    config: GeneratorConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// A generator holds no per-run state, so one instance can serve many threads.
static_assertions::assert_impl_all!(Generator: Send, Sync);

impl Generator {
    /// Create a new generator builder.
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::default()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    /// Generate and write every stage script for `spec`.
    ///
    /// The AutoML upgrade is persisted into `spec`, so running twice
    /// produces byte-identical scripts.
    pub fn generate(&self, spec: &mut DataAnalyticsSpec) -> Result<GenerationOutcome> {
        let mut outcome = self.render(spec)?;
        let Some(plan) = &outcome.plan else {
            return Ok(outcome);
        };

        let layout = self.config.layout();
        let total = outcome.scripts.len();
        for (i, script) in outcome.scripts.iter().enumerate() {
            self.report_progress(ProgressUpdate::for_stage(
                GenerationStep::Writing,
                script.stage,
                i,
                total,
                format!("Writing {}", script.file_name),
            ));
            let path = write_script(&layout, script)
                .context(format!("generating '{}'", plan.spec.name))?;
            outcome.written.push(path);
        }

        info!(
            spec = %plan.spec.name,
            scripts = outcome.written.len(),
            root = %layout.root().display(),
            "Generated pipeline scripts"
        );
        self.report_progress(ProgressUpdate::complete(format!(
            "Generated {} scripts for '{}'",
            outcome.written.len(),
            plan.spec.name
        )));
        Ok(outcome)
    }

    /// Resolve and render without touching the filesystem or `spec`.
    pub fn dry_run(&self, spec: &DataAnalyticsSpec) -> Result<GenerationOutcome> {
        let mut scratch = spec.clone();
        let outcome = self.render(&mut scratch)?;
        if !outcome.is_abandoned() {
            self.report_progress(ProgressUpdate::complete("Dry run complete"));
        }
        Ok(outcome)
    }

    /// Upgrade, resolve, render scripts and glue. Writes nothing.
    fn render(&self, spec: &mut DataAnalyticsSpec) -> Result<GenerationOutcome> {
        self.report_progress(ProgressUpdate::new(
            GenerationStep::Upgrading,
            0.0,
            format!("Preparing '{}'", spec.name),
        ));
        let automl_upgraded = catalog::apply_automl_upgrade(spec);

        self.report_progress(ProgressUpdate::new(
            GenerationStep::Resolving,
            0.0,
            format!("Resolving {}", spec.algorithm.name()),
        ));
        let mut diagnostics = Diagnostics::new();
        let plan = catalog::resolve(spec, &mut diagnostics);

        let mut outcome = GenerationOutcome {
            spec_name: spec.name.clone(),
            plan: None,
            scripts: Vec::new(),
            written: Vec::new(),
            glue: Vec::new(),
            diagnostics,
            automl_upgraded,
        };
        let Some(plan) = plan else {
            warn!(
                spec = %spec.name,
                fatal = outcome.diagnostics.count(crate::diagnostics::Severity::Fatal),
                "Generation abandoned"
            );
            self.report_progress(ProgressUpdate::abandoned(format!(
                "'{}' has fatal diagnostics",
                spec.name
            )));
            return Ok(outcome);
        };

        let emitter = ScriptEmitter::new(&plan, &self.config);
        let stages = emitter.stages();
        let host_layout = self.config.host_layout();
        for (i, stage) in stages.iter().copied().enumerate() {
            self.report_progress(ProgressUpdate::for_stage(
                GenerationStep::Emitting,
                stage,
                i,
                stages.len(),
                format!("Rendering {stage}"),
            ));
            outcome.scripts.push(emitter.emit(stage)?);
        }
        for (i, stage) in stages.iter().copied().enumerate() {
            self.report_progress(ProgressUpdate::for_stage(
                GenerationStep::Glue,
                stage,
                i,
                stages.len(),
                format!("Building {stage} glue"),
            ));
            outcome
                .glue
                .push(orchestrator::emit_glue(&plan, &host_layout, stage)?);
        }

        debug!(
            spec = %spec.name,
            algorithm = plan.algorithm,
            backend = %plan.backend,
            task = %plan.task,
            "Rendered plan"
        );
        outcome.plan = Some(plan);
        Ok(outcome)
    }
}

/// Builder for [`Generator`].
#[derive(Default)]
pub struct GeneratorBuilder {
    config: Option<GeneratorConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl GeneratorBuilder {
    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a closure to receive progress updates.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the generator, validating its configuration.
    pub fn build(self) -> Result<Generator> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(Generator {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
