//! Diagnostics for expected configuration problems.
//!
//! Incompatible hyperparameters are a normal authoring mistake, so they are
//! accumulated here instead of being raised as errors. A [`Severity::Fatal`]
//! entry abandons generation for the current action only; warnings and
//! infos never stop generation.

use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Fatal => "fatal",
        })
    }
}

/// Machine-readable category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum DiagnosticKind {
    /// A parameter conflicts with another parameter's value.
    IncompatibleParameter,
    /// A parameter value is outside its legal range.
    OutOfRange,
    /// A parameter has no equivalent in the selected backend.
    UnsupportedByBackend,
    /// The algorithm does not support the declared learning paradigm.
    ParadigmMismatch,
    /// The prediction result type does not fit the algorithm's task.
    TargetTypeMismatch,
    /// The library does not implement the algorithm.
    UnsupportedBackend,
    /// Required spec content is missing (e.g. no prediction result).
    MissingDeclaration,
    /// Two preprocessing choices cannot be combined.
    ConflictingPreprocessing,
    /// An array feature or result holds labels; arrays are numeric only.
    UnsupportedArrayType,
    /// A plot or metric is not meaningful for the resolved task.
    InapplicableOutput,
    /// Advice that does not change the generated code.
    Suggestion,
    /// A value was substituted because none was given.
    DefaultApplied,
}

impl DiagnosticKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::IncompatibleParameter => "INCOMPATIBLE_PARAMETER",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::UnsupportedByBackend => "UNSUPPORTED_BY_BACKEND",
            Self::ParadigmMismatch => "PARADIGM_MISMATCH",
            Self::TargetTypeMismatch => "TARGET_TYPE_MISMATCH",
            Self::UnsupportedBackend => "UNSUPPORTED_BACKEND",
            Self::MissingDeclaration => "MISSING_DECLARATION",
            Self::ConflictingPreprocessing => "CONFLICTING_PREPROCESSING",
            Self::UnsupportedArrayType => "UNSUPPORTED_ARRAY_TYPE",
            Self::InapplicableOutput => "INAPPLICABLE_OUTPUT",
            Self::Suggestion => "SUGGESTION",
            Self::DefaultApplied => "DEFAULT_APPLIED",
        }
    }
}

/// One reported finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Algorithm or spec the finding is about.
    pub subject: String,
    /// Offending field, when the finding concerns one parameter.
    pub field: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            subject: subject.into(),
            field: None,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(
                f,
                "[{}] {}.{}: {}",
                self.severity, self.subject, field, self.message
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.subject, self.message),
        }
    }
}

/// Per-invocation diagnostic accumulator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        let code = diagnostic.kind.code();
        match diagnostic.severity {
            Severity::Info => info!(code, "{}", diagnostic),
            Severity::Warning => warn!(code, "{}", diagnostic),
            Severity::Fatal => error!(code, "{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    pub fn info(&mut self, kind: DiagnosticKind, subject: &str, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Info, kind, subject, message));
    }

    /// Non-fatal: generation proceeds.
    pub fn warn(&mut self, kind: DiagnosticKind, subject: &str, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Warning, kind, subject, message));
    }

    /// Fatal for the current action only.
    pub fn fail(&mut self, kind: DiagnosticKind, subject: &str, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Fatal, kind, subject, message));
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_fatal(&self) -> bool {
        self.entries.iter().any(Diagnostic::is_fatal)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Entries concerning one field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.entries
            .iter()
            .filter(move |d| d.field.as_deref() == Some(field))
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
