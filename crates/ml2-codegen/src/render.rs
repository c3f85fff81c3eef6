//! Literal rendering for generated source.
//!
//! All target-language literal rules live here: boolean casing, string
//! quoting, float formatting. Numeric output is locale-independent and a
//! float always carries a decimal point or exponent so it stays a float
//! once spliced into script source.

use serde::Serialize;

/// Target language of a rendered fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Python,
    Java,
}

/// A value that can be rendered in either dialect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Source text copied verbatim (identifiers, expressions, `None`).
    Raw(String),
    Tuple(Vec<Literal>),
    List(Vec<Literal>),
}

impl Literal {
    pub fn str(value: impl Into<String>) -> Self {
        Literal::Str(value.into())
    }

    pub fn raw(value: impl Into<String>) -> Self {
        Literal::Raw(value.into())
    }

    pub fn render(&self, dialect: Dialect) -> String {
        match self {
            Literal::Bool(value) => render_bool(*value, dialect).to_string(),
            Literal::Int(value) => value.to_string(),
            Literal::Float(value) => render_float(*value, dialect),
            Literal::Str(value) => quote(value, dialect),
            Literal::Raw(value) => value.clone(),
            Literal::Tuple(items) => match dialect {
                Dialect::Python if items.len() == 1 => {
                    format!("({},)", items[0].render(dialect))
                }
                Dialect::Python => format!("({})", join(items, dialect)),
                Dialect::Java => format!("{{{}}}", join(items, dialect)),
            },
            Literal::List(items) => match dialect {
                Dialect::Python => format!("[{}]", join(items, dialect)),
                Dialect::Java => format!("{{{}}}", join(items, dialect)),
            },
        }
    }

    /// Short human-readable form used in diagnostics.
    pub fn describe(&self) -> String {
        self.render(Dialect::Python)
    }
}

fn join(items: &[Literal], dialect: Dialect) -> String {
    items
        .iter()
        .map(|item| item.render(dialect))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_bool(value: bool, dialect: Dialect) -> &'static str {
    match (dialect, value) {
        (Dialect::Python, true) => "True",
        (Dialect::Python, false) => "False",
        (Dialect::Java, true) => "true",
        (Dialect::Java, false) => "false",
    }
}

pub fn render_float(value: f64, dialect: Dialect) -> String {
    if value.is_nan() {
        return match dialect {
            Dialect::Python => "float('nan')".to_string(),
            Dialect::Java => "Double.NaN".to_string(),
        };
    }
    if value.is_infinite() {
        return match (dialect, value.is_sign_positive()) {
            (Dialect::Python, true) => "float('inf')".to_string(),
            (Dialect::Python, false) => "float('-inf')".to_string(),
            (Dialect::Java, true) => "Double.POSITIVE_INFINITY".to_string(),
            (Dialect::Java, false) => "Double.NEGATIVE_INFINITY".to_string(),
        };
    }
    // Debug formatting is shortest round-trip and always keeps ".0" or an
    // exponent, which both dialects parse as a floating literal.
    format!("{value:?}")
}

/// Quote a string for the target dialect.
pub fn quote(value: &str, dialect: Dialect) -> String {
    let delimiter = match dialect {
        Dialect::Python => '\'',
        Dialect::Java => '"',
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(delimiter);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<Vec<f64>> for Literal {
    fn from(values: Vec<f64>) -> Self {
        Literal::List(values.into_iter().map(Literal::Float).collect())
    }
}

impl From<Vec<i64>> for Literal {
    fn from(values: Vec<i64>) -> Self {
        Literal::List(values.into_iter().map(Literal::Int).collect())
    }
}

impl From<crate::model::Number> for Literal {
    fn from(value: crate::model::Number) -> Self {
        match value {
            crate::model::Number::Int(v) => Literal::Int(v),
            crate::model::Number::Float(v) => Literal::Float(v),
        }
    }
}

impl From<crate::model::FreeForm> for Literal {
    fn from(value: crate::model::FreeForm) -> Self {
        match value {
            crate::model::FreeForm::Symbol(s) => Literal::Raw(s),
            crate::model::FreeForm::Text(s) => Literal::Str(s),
        }
    }
}

/// A rendered hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Fragment {
    Literal(Literal),
    /// Chosen at script run time from the number of training samples, since
    /// that count is unknown at generation time.
    BySampleCount {
        threshold: u64,
        below: Literal,
        otherwise: Literal,
    },
}

impl Fragment {
    pub fn by_sample_count(
        threshold: u64,
        below: impl Into<Literal>,
        otherwise: impl Into<Literal>,
    ) -> Self {
        Fragment::BySampleCount {
            threshold,
            below: below.into(),
            otherwise: otherwise.into(),
        }
    }

    pub fn render(&self, dialect: Dialect) -> String {
        match self {
            Fragment::Literal(literal) => literal.render(dialect),
            Fragment::BySampleCount {
                threshold,
                below,
                otherwise,
            } => match dialect {
                Dialect::Python => format!(
                    "({} if n_samples < {} else {})",
                    below.render(dialect),
                    threshold,
                    otherwise.render(dialect)
                ),
                Dialect::Java => format!(
                    "(n_samples < {} ? {} : {})",
                    threshold,
                    below.render(dialect),
                    otherwise.render(dialect)
                ),
            },
        }
    }

    /// The literal, when the value is fixed at generation time.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Fragment::Literal(literal) => Some(literal),
            Fragment::BySampleCount { .. } => None,
        }
    }
}

impl From<Literal> for Fragment {
    fn from(literal: Literal) -> Self {
        Fragment::Literal(literal)
    }
}

/// How a binding was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    /// Unset, library default applies.
    Unset,
    /// Set by the author and accepted.
    Valid,
    /// Unset, filled by an AutoML default rule.
    AutoMl,
    /// Set by the author but rejected by a cross-field or range rule.
    Rejected,
}

/// One hyperparameter as seen by the binder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub name: String,
    pub raw: Option<String>,
    pub validity: Validity,
    pub fragment: Option<Fragment>,
}

/// Ordered list of bindings for one constructor call.
///
/// Unbound entries are kept so the full decision trail is inspectable, but
/// only bound ones render.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParamList {
    bindings: Vec<Binding>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    /// Append a bound value directly, bypassing the binder rules.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Literal>) {
        self.set_fragment(name, Fragment::Literal(value.into()));
    }

    pub fn set_fragment(&mut self, name: impl Into<String>, fragment: Fragment) {
        self.bindings.push(Binding {
            name: name.into(),
            raw: None,
            validity: Validity::Valid,
            fragment: Some(fragment),
        });
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Fragment of the first bound parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&Fragment> {
        self.bound()
            .find(|b| b.name == name)
            .and_then(|b| b.fragment.as_ref())
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of bound parameters, in order.
    pub fn names(&self) -> Vec<&str> {
        self.bound().map(|b| b.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.bound().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bound(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter().filter(|b| b.fragment.is_some())
    }

    /// Projection without the named parameters.
    pub fn without(&self, names: &[&str]) -> ParamList {
        ParamList {
            bindings: self
                .bindings
                .iter()
                .filter(|b| !names.contains(&b.name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Projection keeping only the named parameters.
    pub fn only(&self, names: &[&str]) -> ParamList {
        ParamList {
            bindings: self
                .bindings
                .iter()
                .filter(|b| names.contains(&b.name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Render as a keyword argument list: `a=1, b='x'`.
    pub fn render(&self, dialect: Dialect) -> String {
        self.bound()
            .filter_map(|b| {
                b.fragment
                    .as_ref()
                    .map(|f| format!("{}={}", b.name, f.render(dialect)))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `(name, rendered value)` pairs for reports.
    pub fn rendered_pairs(&self, dialect: Dialect) -> Vec<(String, String)> {
        self.bound()
            .filter_map(|b| {
                b.fragment
                    .as_ref()
                    .map(|f| (b.name.clone(), f.render(dialect)))
            })
            .collect()
    }
}
