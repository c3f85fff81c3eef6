//! ML2 Code Generator Library
//!
//! Turns a declarative data-analytics spec (features, learning paradigm,
//! algorithm and hyperparameters, target library, metrics and plots) into
//! a four-stage numeric pipeline of Python scripts plus the Java glue that
//! drives them from a generated statechart program.
//!
//! # Overview
//!
//! - **Parameter binding**: every hyperparameter is checked against the
//!   algorithm's compatibility rules; illegal values are dropped with a
//!   diagnostic instead of failing generation
//! - **Algorithm catalog**: 21 algorithms across scikit-learn and Keras,
//!   with backend selection, task inference and artifact planning
//! - **Script emission**: `preprocess.py`, `train.py`, `predict.py` and
//!   `pre_trained_predict.py` rendered from embedded templates
//! - **Reports and plots**: an HTML training report and up to nine
//!   matplotlib plots, each independently guarded
//! - **Host glue**: Java fragments gating each stage on its input
//!   artifacts and decoding predictions from stdout
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ml2_codegen::{DataAnalyticsSpec, Generator, GeneratorConfig};
//!
//! let mut spec: DataAnalyticsSpec = serde_json::from_str(&json)?;
//!
//! let generator = Generator::builder()
//!     .config(
//!         GeneratorConfig::builder()
//!             .output_root("generated/region")
//!             .random_state(42)
//!             .build()?,
//!     )
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?;
//!
//! let outcome = generator.generate(&mut spec)?;
//! for diagnostic in outcome.diagnostics.iter() {
//!     println!("{diagnostic}");
//! }
//! println!("{}", outcome.glue_source());
//! ```
//!
//! # Diagnostics
//!
//! Authoring mistakes never surface as `Err`. They are collected in
//! [`Diagnostics`]; a fatal entry leaves [`GenerationOutcome::plan`] empty
//! and nothing is written. [`CodegenError`] is reserved for program-level
//! failures such as an unwritable output directory.
//!
//! # Lower-level access
//!
//! The facade is a thin loop over public pieces that can be used directly:
//!
//! ```rust,ignore
//! use ml2_codegen::{catalog, Diagnostics, ScriptEmitter, Stage, GeneratorConfig};
//!
//! let mut diagnostics = Diagnostics::new();
//! if let Some(plan) = catalog::resolve(&spec, &mut diagnostics) {
//!     let config = GeneratorConfig::default();
//!     let train = ScriptEmitter::new(&plan, &config).emit(Stage::Train)?;
//!     let glue = ml2_codegen::orchestrator::emit_glue(&plan, &config.host_layout(), Stage::Train)?;
//! }
//! ```

pub mod binder;
pub mod catalog;
pub mod config;
pub mod contract;
pub mod diagnostics;
pub mod emitter;
pub mod error;
pub mod generator;
pub mod layout;
pub mod model;
pub mod orchestrator;
pub mod render;
pub mod template;

// Re-exports for convenient access
pub use catalog::{GenerationPlan, Task, apply_automl_upgrade, resolve};
pub use config::{ConfigValidationError, GeneratorConfig, GeneratorConfigBuilder};
pub use contract::{Arg, Invocation};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use emitter::{ScriptEmitter, ScriptText, write_script};
pub use error::{CodegenError, Result as CodegenResult, ResultExt};
pub use generator::{
    ClosureProgressReporter, GenerationOutcome, GenerationReport, GenerationStep, Generator,
    GeneratorBuilder, ProgressReporter, ProgressUpdate,
};
pub use layout::{ScriptLayout, Stage};
pub use model::{Backend, DataAnalyticsSpec, Feature, ModelAlgorithm, NativeType, Paradigm};
pub use orchestrator::{HostFragment, emit_glue};
