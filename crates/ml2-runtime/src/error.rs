//! Error types for the ml2-runtime crate.
//!
//! A stage whose input artifacts are missing is *not* an error: the runner
//! reports it as [`StageStatus::Skipped`](crate::StageStatus::Skipped), the
//! same early return the generated host glue performs. [`RuntimeError`]
//! covers failures to run a stage that should have run.
//!
//! # Example
//!
//! ```rust,ignore
//! use ml2_runtime::{RunnerConfig, RuntimeError};
//!
//! fn config() -> Result<RunnerConfig, RuntimeError> {
//!     RunnerConfig::builder()
//!         .timeout(std::time::Duration::from_secs(600))
//!         .build()
//! }
//! ```

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::time::Duration;
use thiserror::Error;

/// The main error type for running pipeline stages.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RuntimeError {
    /// Invalid runner configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The host values do not fit the stage's argument contract.
    ///
    /// Predict stages need exactly one value per declared feature.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The stage script could not be started.
    ///
    /// Common causes:
    /// - The script was never generated
    /// - The shebang names an interpreter that is not installed
    #[error("Failed to launch '{script}': {reason}")]
    Launch {
        /// Path of the script that failed to start.
        script: String,
        reason: String,
    },

    /// The stage ran longer than the configured timeout and was killed.
    #[error("Stage script '{script}' timed out after {:.1}s", .after.as_secs_f64())]
    Timeout { script: String, after: Duration },

    /// The stage was cancelled through its [`CancellationToken`](crate::CancellationToken).
    #[error("Stage cancelled")]
    Cancelled,

    /// A stdout line could not be decoded into the declared result type.
    #[error("Cannot decode result '{result}' from '{line}': {reason}")]
    Decode {
        result: String,
        line: String,
        reason: String,
    },

    /// The plan cannot produce the requested stage.
    #[error("Generation error: {0}")]
    Codegen(#[from] ml2_codegen::CodegenError),

    /// I/O error while preparing or supervising the stage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Launch { .. } => "LAUNCH_FAILED",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Decode { .. } => "DECODE_FAILED",
            Self::Codegen(err) => err.error_code(),
            Self::Io(_) => "IO_ERROR",
        }
    }
}

/// Serialized as `{code, message}` for hosts reporting over JSON.
impl Serialize for RuntimeError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("RuntimeError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
