//! Error types for the code generator.
//!
//! Expected authoring mistakes (an illegal hyperparameter, a classifier bound
//! to a continuous target) are *not* errors: they are reported through
//! [`crate::diagnostics::Diagnostics`] and generation carries on. The
//! [`CodegenError`] type covers program-level failures only: a broken
//! template, an unwritable output directory, malformed input JSON.
//!
//! Errors are serializable so the CLI can emit them in `--json` mode.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for script and glue generation.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CodegenError {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A template references a placeholder nobody supplied a value for.
    #[error("Template '{template}' has no value for placeholder '{placeholder}'")]
    MissingPlaceholder {
        template: String,
        placeholder: String,
    },

    /// A stage script could not be written to its final location.
    #[error("Failed to write script '{path}': {reason}")]
    ScriptWriteFailed { path: String, reason: String },

    /// The requested stage cannot be produced for this plan.
    #[error("Stage '{stage}' is not available: {reason}")]
    StageUnavailable { stage: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CodegenError>,
    },
}

impl CodegenError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CodegenError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::MissingPlaceholder { .. } => "MISSING_PLACEHOLDER",
            Self::ScriptWriteFailed { .. } => "SCRIPT_WRITE_FAILED",
            Self::StageUnavailable { .. } => "STAGE_UNAVAILABLE",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the caller can fix this by changing its inputs.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidConfig(_) | Self::StageUnavailable { .. } | Self::Json(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for CodegenError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CodegenError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CodegenError::Io(e).with_context(context))
    }
}
