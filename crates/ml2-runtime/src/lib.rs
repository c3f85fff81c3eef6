//! ml2-runtime: run generated ML2 pipeline stages from Rust.
//!
//! `ml2-codegen` writes the stage scripts and Java glue for a statechart
//! region. This crate is the Rust counterpart of that glue: it checks that a
//! stage's inputs exist, launches the script with the positional argument
//! contract, and decodes the prediction results printed on stdout.
//!
//! # Features
//!
//! - **Input gating**: stages whose dataset or pickles are missing are
//!   skipped without starting a process
//! - **Typed results**: stdout lines decode into [`HostValue`]s following
//!   the declared result types
//! - **Timeouts and cancellation**: long-running training can be bounded
//!   or stopped from another thread
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ml2_codegen::{Diagnostics, GeneratorConfig, resolve};
//! use ml2_runtime::{HostValue, RunnerConfig, StageRunner, StageStatus};
//!
//! let plan = resolve(&spec, &mut Diagnostics::new()).expect("generable spec");
//! let layout = GeneratorConfig::default().layout();
//!
//! let runner = StageRunner::new(plan, layout, RunnerConfig::default())?;
//! runner.run_training()?;
//!
//! match runner.predict(&[HostValue::from(21.5), HostValue::from(true)])? {
//!     StageStatus::Completed(output) => println!("mode = {:?}", output.get("mode")),
//!     StageStatus::Skipped { missing } => println!("not trained yet: {missing:?}"),
//! }
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return [`Result<T, RuntimeError>`](Result). Missing
//! inputs are not an error, see [`StageStatus::Skipped`]. A stage that exits
//! with a non-zero code still completes; check
//! [`StageOutput::succeeded`].

mod cancellation;
mod config;
mod error;
mod launcher;
mod runner;
mod values;

// Re-export public API
//
// Configuration types
pub use config::{RunnerConfig, RunnerConfigBuilder};
// Cancellation token
pub use cancellation::CancellationToken;
// Error types
pub use error::{Result, RuntimeError};
// Process launching
pub use launcher::{LaunchRequest, ProcessLauncher, ProcessOutput, SubprocessLauncher};
// Stage execution
pub use runner::{StageOutput, StageRunner, StageStatus};
// Values crossing the argument contract
pub use values::HostValue;
