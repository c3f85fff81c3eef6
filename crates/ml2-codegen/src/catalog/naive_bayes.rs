//! Naive Bayes classifiers.

use crate::binder::{Binder, Field};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{
    BernoulliNbParams, CategoricalNbParams, ComplementNbParams, DataAnalyticsSpec,
    GaussianNbParams, MixedNbParams, MultinomialNbParams,
};
use crate::render::{Dialect, Literal};

use super::EstimatorCall;

fn valid_distribution(values: &Option<Vec<f64>>) -> bool {
    values.as_ref().is_none_or(|v| {
        !v.is_empty() && v.iter().all(|p| *p >= 0.0) && (v.iter().sum::<f64>() - 1.0).abs() < 1e-6
    })
}

fn non_negative(alpha: Option<f64>) -> bool {
    alpha.is_none_or(|a| a >= 0.0)
}

/// Multinomial, complement and categorical NB reject negative inputs, which
/// centring scalers produce.
fn warn_on_negative_inputs(subject: &'static str, spec: &DataAnalyticsSpec, b: &mut Binder<'_>) {
    let Some(scaler) = spec.feature_scaler else {
        return;
    };
    if scaler.may_produce_negatives() {
        b.warn(
            DiagnosticKind::ConflictingPreprocessing,
            format!(
                "{} requires non-negative features but {} can produce negative values",
                subject,
                scaler.class_name()
            ),
        );
    }
}

pub(super) fn gaussian(
    spec: &DataAnalyticsSpec,
    p: &GaussianNbParams,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let mut b = Binder::new("GaussianNB", spec.automl, diagnostics);
    b.bind(Field::new("priors", p.priors.clone()).range(
        valid_distribution(&p.priors),
        "priors must be non-negative and sum to 1",
    ));
    b.bind(Field::new("var_smoothing", p.var_smoothing).range(
        p.var_smoothing.is_none_or(|v| v > 0.0),
        "var_smoothing must be positive",
    ));
    EstimatorCall::new("sklearn.naive_bayes", "GaussianNB", b.finish())
}

pub(super) fn multinomial(
    spec: &DataAnalyticsSpec,
    p: &MultinomialNbParams,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let mut b = Binder::new("MultinomialNB", spec.automl, diagnostics);
    warn_on_negative_inputs("MultinomialNB", spec, &mut b);
    b.bind(Field::new("alpha", p.alpha).range(non_negative(p.alpha), "alpha must be non-negative"));
    b.bind(Field::new("force_alpha", p.force_alpha));
    b.bind(Field::new("fit_prior", p.fit_prior).require(
        p.class_prior.is_none(),
        "fit_prior is ignored when class_prior is given",
    ));
    b.bind(Field::new("class_prior", p.class_prior.clone()).range(
        valid_distribution(&p.class_prior),
        "class_prior must be non-negative and sum to 1",
    ));
    EstimatorCall::new("sklearn.naive_bayes", "MultinomialNB", b.finish())
}

pub(super) fn complement(
    spec: &DataAnalyticsSpec,
    p: &ComplementNbParams,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let mut b = Binder::new("ComplementNB", spec.automl, diagnostics);
    warn_on_negative_inputs("ComplementNB", spec, &mut b);
    b.bind(Field::new("alpha", p.alpha).range(non_negative(p.alpha), "alpha must be non-negative"));
    b.bind(Field::new("force_alpha", p.force_alpha));
    b.bind(Field::new("fit_prior", p.fit_prior).require(
        p.class_prior.is_none(),
        "fit_prior is ignored when class_prior is given",
    ));
    b.bind(Field::new("class_prior", p.class_prior.clone()).range(
        valid_distribution(&p.class_prior),
        "class_prior must be non-negative and sum to 1",
    ));
    b.bind(Field::new("norm", p.norm));
    EstimatorCall::new("sklearn.naive_bayes", "ComplementNB", b.finish())
}

pub(super) fn bernoulli(
    spec: &DataAnalyticsSpec,
    p: &BernoulliNbParams,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let mut b = Binder::new("BernoulliNB", spec.automl, diagnostics);
    b.bind(Field::new("alpha", p.alpha).range(non_negative(p.alpha), "alpha must be non-negative"));
    b.bind(Field::new("force_alpha", p.force_alpha));
    b.bind(Field::new("binarize", p.binarize));
    b.bind(Field::new("fit_prior", p.fit_prior).require(
        p.class_prior.is_none(),
        "fit_prior is ignored when class_prior is given",
    ));
    b.bind(Field::new("class_prior", p.class_prior.clone()).range(
        valid_distribution(&p.class_prior),
        "class_prior must be non-negative and sum to 1",
    ));
    EstimatorCall::new("sklearn.naive_bayes", "BernoulliNB", b.finish())
}

pub(super) fn categorical(
    spec: &DataAnalyticsSpec,
    p: &CategoricalNbParams,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let mut b = Binder::new("CategoricalNB", spec.automl, diagnostics);
    warn_on_negative_inputs("CategoricalNB", spec, &mut b);
    b.bind(Field::new("alpha", p.alpha).range(non_negative(p.alpha), "alpha must be non-negative"));
    b.bind(Field::new("force_alpha", p.force_alpha));
    b.bind(Field::new("fit_prior", p.fit_prior).require(
        p.class_prior.is_none(),
        "fit_prior is ignored when class_prior is given",
    ));
    b.bind(Field::new("class_prior", p.class_prior.clone()).range(
        valid_distribution(&p.class_prior),
        "class_prior must be non-negative and sum to 1",
    ));
    b.bind(Field::new("min_categories", p.min_categories).range(
        p.min_categories.is_none_or(|m| m >= 1),
        "min_categories must be at least 1",
    ));
    EstimatorCall::new("sklearn.naive_bayes", "CategoricalNB", b.finish())
}

pub(super) fn mixed(
    spec: &DataAnalyticsSpec,
    p: &MixedNbParams,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let categorical = spec.categorical_features();
    let width = (!spec.has_array_features()).then_some(spec.features.len() as i64);
    let indices_ok = p.categorical_features.as_ref().is_none_or(|indices| {
        indices
            .iter()
            .all(|i| *i >= 0 && width.is_none_or(|w| *i < w))
    });

    let mut b = Binder::new("MixedNB", spec.automl, diagnostics);
    let features = Field::new("categorical_features", p.categorical_features.clone())
        .range(indices_ok, "categorical feature index out of bounds");
    let features = if categorical.is_empty() {
        features
    } else {
        // Resolved against the preprocessed column order at run time, since
        // array features shift positions.
        let names = Literal::List(categorical.iter().map(|n| Literal::str(*n)).collect());
        features.automl(Literal::raw(format!(
            "[COLUMNS.index(name) for name in {}]",
            names.render(Dialect::Python)
        )))
    };
    b.bind(features);
    b.bind(Field::new("max_categories", p.max_categories.clone()).require(
        p.categorical_features.is_some() || (spec.automl && !categorical.is_empty()),
        "max_categories only applies to categorical features",
    ));
    b.bind(Field::new("alpha", p.alpha).range(non_negative(p.alpha), "alpha must be non-negative"));
    b.bind(Field::new("priors", p.priors.clone()).range(
        valid_distribution(&p.priors),
        "priors must be non-negative and sum to 1",
    ));
    b.bind(Field::new("var_smoothing", p.var_smoothing).range(
        p.var_smoothing.is_none_or(|v| v > 0.0),
        "var_smoothing must be positive",
    ));
    EstimatorCall::new("mixed_naive_bayes", "MixedNB", b.finish())
}
