//! Progress reporting for a generation run.
//!
//! A run is short, but hosts embedding the generator (an editor plugin, a
//! build step) still want to show where it is. Updates are delivered
//! synchronously on the generating thread.
//!
//! # Example
//!
//! ```rust,ignore
//! use ml2_codegen::Generator;
//!
//! let outcome = Generator::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .generate(&mut spec)?;
//! ```

use serde::Serialize;

use crate::layout::Stage;

/// Steps of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStep {
    /// Filling AutoML values derivable from the spec
    Upgrading,
    /// Binding hyperparameters and resolving the plan
    Resolving,
    /// Rendering stage scripts
    Emitting,
    /// Writing scripts to the output tree
    Writing,
    /// Building host glue fragments
    Glue,
    /// Run finished
    Complete,
    /// Fatal diagnostics stopped the run
    Abandoned,
}

impl GenerationStep {
    /// Returns a human-readable name for the step.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Upgrading => "Applying AutoML",
            Self::Resolving => "Resolving Plan",
            Self::Emitting => "Rendering Scripts",
            Self::Writing => "Writing Scripts",
            Self::Glue => "Building Host Glue",
            Self::Complete => "Complete",
            Self::Abandoned => "Abandoned",
        }
    }

    /// Share of the whole run this step accounts for.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Upgrading => 0.05,
            Self::Resolving => 0.25,
            Self::Emitting => 0.35,
            Self::Writing => 0.20,
            Self::Glue => 0.15,
            Self::Complete | Self::Abandoned => 0.0,
        }
    }

    /// Cumulative progress at the start of this step.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Upgrading => 0.0,
            Self::Resolving => 0.05,
            Self::Emitting => 0.30,
            Self::Writing => 0.65,
            Self::Glue => 0.85,
            Self::Complete => 1.0,
            Self::Abandoned => 0.0,
        }
    }
}

/// One progress notification.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub step: GenerationStep,

    /// Pipeline stage being worked on, for per-stage steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    pub message: String,
}

impl ProgressUpdate {
    pub fn new(step: GenerationStep, step_progress: f32, message: impl Into<String>) -> Self {
        let progress = step.base_progress() + step.weight() * step_progress.clamp(0.0, 1.0);
        Self {
            step,
            stage: None,
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Update for the `current`-th of `total` stages within `step`.
    pub fn for_stage(
        step: GenerationStep,
        stage: Stage,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let step_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            stage: Some(stage),
            ..Self::new(step, step_progress, message)
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(GenerationStep::Complete, 1.0, message)
    }

    pub fn abandoned(message: impl Into<String>) -> Self {
        Self::new(GenerationStep::Abandoned, 0.0, message)
    }
}

/// Receives progress updates during generation.
///
/// Implementations must be `Send + Sync` so a generator can be shared
/// across threads.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
