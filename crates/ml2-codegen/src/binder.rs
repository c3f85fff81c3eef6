//! Hyperparameter binding.
//!
//! [`Binder::bind`] turns one raw field into a constructor argument using a
//! fixed policy, applied in order:
//!
//! 1. unset, AutoML on, default rule present: synthesize the default (often
//!    a run-time branch on sample count),
//! 2. unset otherwise: omit, the library default applies,
//! 3. set but breaking a cross-field or range rule: warn and omit,
//! 4. otherwise: render the value as a literal.
//!
//! The accumulated [`ParamList`] keeps declaration order.

use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
use crate::render::{Binding, Dialect, Fragment, Literal, ParamList, Validity};

/// One field awaiting binding, with its rules attached.
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    raw: Option<Literal>,
    default: Option<Fragment>,
    violation: Option<(DiagnosticKind, String)>,
}

impl Field {
    pub fn new<V: Into<Literal>>(name: &'static str, raw: Option<V>) -> Self {
        Self {
            name,
            raw: raw.map(Into::into),
            default: None,
            violation: None,
        }
    }

    /// AutoML default used when the field is unset.
    pub fn automl(mut self, default: impl Into<Fragment>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Cross-field rule: the value is only legal when `holds`.
    pub fn require(self, holds: bool, reason: impl Into<String>) -> Self {
        self.violate(!holds, DiagnosticKind::IncompatibleParameter, reason)
    }

    /// Range rule: the value is only legal when `holds`.
    pub fn range(self, holds: bool, reason: impl Into<String>) -> Self {
        self.violate(!holds, DiagnosticKind::OutOfRange, reason)
    }

    /// The selected backend has no equivalent for this field.
    pub fn unsupported(self, reason: impl Into<String>) -> Self {
        self.violate(true, DiagnosticKind::UnsupportedByBackend, reason)
    }

    fn violate(mut self, violated: bool, kind: DiagnosticKind, reason: impl Into<String>) -> Self {
        // First failing rule wins so each field reports at most once.
        if violated && self.violation.is_none() && self.raw.is_some() {
            self.violation = Some((kind, reason.into()));
        }
        self
    }
}

/// Binds the fields of one algorithm, in declaration order.
pub struct Binder<'d> {
    subject: &'static str,
    automl: bool,
    params: ParamList,
    diagnostics: &'d mut Diagnostics,
}

impl<'d> Binder<'d> {
    pub fn new(subject: &'static str, automl: bool, diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            subject,
            automl,
            params: ParamList::new(),
            diagnostics,
        }
    }

    pub fn subject(&self) -> &'static str {
        self.subject
    }

    pub fn automl(&self) -> bool {
        self.automl
    }

    /// Apply the binding policy to one field. Returns the bound fragment.
    pub fn bind(&mut self, field: Field) -> Option<Fragment> {
        let Field {
            name,
            raw,
            default,
            violation,
        } = field;
        let raw_text = raw.as_ref().map(Literal::describe);

        let (validity, fragment) = match (raw, violation) {
            (None, _) => match default {
                Some(default) if self.automl => {
                    debug!(
                        subject = self.subject,
                        field = name,
                        value = %default.render(Dialect::Python),
                        "AutoML default applied"
                    );
                    (Validity::AutoMl, Some(default))
                }
                _ => (Validity::Unset, None),
            },
            (Some(_), Some((kind, reason))) => {
                self.diagnostics.push(
                    Diagnostic::new(
                        Severity::Warning,
                        kind,
                        self.subject,
                        format!(
                            "{}={} dropped: {}",
                            name,
                            raw_text.as_deref().unwrap_or("?"),
                            reason
                        ),
                    )
                    .with_field(name),
                );
                (Validity::Rejected, None)
            }
            (Some(literal), None) => (Validity::Valid, Some(Fragment::Literal(literal))),
        };

        self.params.push(Binding {
            name: name.to_string(),
            raw: raw_text,
            validity,
            fragment: fragment.clone(),
        });
        fragment
    }

    /// Bind a value that does not come from the spec (e.g. a configured seed).
    pub fn bind_fixed(&mut self, name: &'static str, value: impl Into<Literal>) {
        self.params.set(name, value);
    }

    /// Already-bound sibling parameter.
    pub fn sibling(&self, name: &str) -> Option<&Fragment> {
        self.params.get(name)
    }

    pub fn info(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.diagnostics.info(kind, self.subject, message);
    }

    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.diagnostics.warn(kind, self.subject, message);
    }

    pub fn warn_field(&mut self, kind: DiagnosticKind, field: &str, message: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::new(Severity::Warning, kind, self.subject, message).with_field(field),
        );
    }

    pub fn finish(self) -> ParamList {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_without_rule_is_omitted_silently() {
        let mut diagnostics = Diagnostics::new();
        let mut binder = Binder::new("Test", true, &mut diagnostics);
        assert!(binder.bind(Field::new::<i64>("max_depth", None)).is_none());
        let params = binder.finish();
        assert!(params.is_empty());
        assert_eq!(params.bindings()[0].validity, Validity::Unset);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_automl_default_only_when_enabled() {
        let mut diagnostics = Diagnostics::new();
        let mut binder = Binder::new("Test", true, &mut diagnostics);
        let fragment = binder.bind(Field::new::<i64>("max_iter", None).automl(Literal::Int(1000)));
        assert_eq!(fragment, Some(Fragment::Literal(Literal::Int(1000))));
        assert_eq!(binder.finish().bindings()[0].validity, Validity::AutoMl);

        let mut binder = Binder::new("Test", false, &mut diagnostics);
        assert!(
            binder
                .bind(Field::new::<i64>("max_iter", None).automl(Literal::Int(1000)))
                .is_none()
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_violation_warns_and_omits() {
        let mut diagnostics = Diagnostics::new();
        let mut binder = Binder::new("LogisticRegression", false, &mut diagnostics);
        binder.bind(Field::new("C", Some(0.5)));
        binder.bind(Field::new("dual", Some(true)).require(false, "needs liblinear"));
        binder.bind(Field::new("tol", Some(0.001)));
        let params = binder.finish();

        assert_eq!(params.names(), vec!["C", "tol"]);
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics.entries()[0];
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.field.as_deref(), Some("dual"));
        assert!(d.message.contains("dual=True"));
    }

    #[test]
    fn test_first_violation_wins() {
        let mut diagnostics = Diagnostics::new();
        let mut binder = Binder::new("Test", false, &mut diagnostics);
        binder.bind(
            Field::new("alpha", Some(-1.0))
                .range(false, "must be non-negative")
                .require(false, "other rule"),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.entries()[0].kind, DiagnosticKind::OutOfRange);
    }

    #[test]
    fn test_rules_ignored_for_unset_fields() {
        let mut diagnostics = Diagnostics::new();
        let mut binder = Binder::new("Test", false, &mut diagnostics);
        binder.bind(Field::new::<bool>("dual", None).require(false, "never"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_sibling_lookup() {
        let mut diagnostics = Diagnostics::new();
        let mut binder = Binder::new("Test", false, &mut diagnostics);
        binder.bind(Field::new("solver", Some(Literal::str("saga"))));
        assert_eq!(
            binder.sibling("solver").map(|f| f.render(Dialect::Python)),
            Some("'saga'".to_string())
        );
        assert!(binder.sibling("penalty").is_none());
    }
}
