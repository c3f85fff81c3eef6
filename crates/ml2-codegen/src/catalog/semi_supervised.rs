//! Semi-supervised classifiers. Unlabeled training rows carry the label -1.

use crate::binder::{Binder, Field};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{
    BaseEstimator, LabelKernel, LabelPropagationParams, LabelSpreadingParams,
    SelfTrainingCriterion, SelfTrainingParams,
};
use crate::render::{Fragment, Literal};

use super::EstimatorCall;

/// Above this many rows SVC gets too slow to wrap.
const BASE_ESTIMATOR_THRESHOLD: u64 = 10_000;

pub(super) fn self_training(
    p: &SelfTrainingParams,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let criterion = p.criterion.unwrap_or(SelfTrainingCriterion::Threshold);
    let mut imports = Vec::new();

    let mut b = Binder::new("SelfTrainingClassifier", automl, diagnostics);
    let estimator = Field::new(
        "estimator",
        p.base_estimator.map(|e| Literal::raw(e.python().1)),
    )
    .automl(Fragment::by_sample_count(
        BASE_ESTIMATOR_THRESHOLD,
        Literal::raw(BaseEstimator::Svc.python().1),
        Literal::raw(BaseEstimator::GaussianNb.python().1),
    ));
    match (p.base_estimator, b.bind(estimator)) {
        (Some(chosen), _) => imports.push(chosen.python().0),
        (None, Some(_)) => {
            imports.push(BaseEstimator::Svc.python().0);
            imports.push(BaseEstimator::GaussianNb.python().0);
        }
        (None, None) => {
            let (import, ctor) = BaseEstimator::Svc.python();
            b.bind_fixed("estimator", Literal::raw(ctor));
            b.info(
                DiagnosticKind::DefaultApplied,
                format!("no base estimator given; using {ctor}"),
            );
            imports.push(import);
        }
    }

    b.bind(
        Field::new("threshold", p.threshold)
            .require(
                criterion == SelfTrainingCriterion::Threshold,
                "threshold only applies to criterion 'threshold'",
            )
            .range(
                p.threshold.is_none_or(|t| (0.0..1.0).contains(&t)),
                "threshold must be in [0, 1)",
            ),
    );
    b.bind(Field::new("criterion", p.criterion));
    b.bind(
        Field::new("k_best", p.k_best)
            .require(
                criterion == SelfTrainingCriterion::KBest,
                "k_best only applies to criterion 'k_best'",
            )
            .range(p.k_best.is_none_or(|k| k >= 1), "k_best must be at least 1"),
    );
    b.bind(
        Field::new("max_iter", p.max_iter)
            .range(p.max_iter.is_none_or(|m| m >= 1), "max_iter must be at least 1"),
    );
    b.bind(Field::new("verbose", p.verbose));

    imports.into_iter().fold(
        EstimatorCall::new("sklearn.semi_supervised", "SelfTrainingClassifier", b.finish()),
        |call, line| call.with_import(line),
    )
}

/// Shared kernel rules of label propagation and label spreading.
fn bind_kernel(
    b: &mut Binder<'_>,
    kernel: Option<LabelKernel>,
    gamma: Option<f64>,
    n_neighbors: Option<i64>,
) {
    let effective = kernel.unwrap_or(LabelKernel::Rbf);
    b.bind(Field::new("kernel", kernel));
    b.bind(
        Field::new("gamma", gamma)
            .require(effective == LabelKernel::Rbf, "gamma only applies to kernel 'rbf'")
            .range(gamma.is_none_or(|g| g > 0.0), "gamma must be positive"),
    );
    b.bind(
        Field::new("n_neighbors", n_neighbors)
            .require(effective == LabelKernel::Knn, "n_neighbors only applies to kernel 'knn'")
            .range(n_neighbors.is_none_or(|n| n >= 1), "n_neighbors must be at least 1"),
    );
}

fn bind_iteration(b: &mut Binder<'_>, max_iter: Option<i64>, tol: Option<f64>, n_jobs: Option<i64>) {
    b.bind(
        Field::new("max_iter", max_iter)
            .range(max_iter.is_none_or(|m| m >= 1), "max_iter must be at least 1"),
    );
    b.bind(Field::new("tol", tol).range(tol.is_none_or(|t| t >= 0.0), "tol must be non-negative"));
    b.bind(Field::new("n_jobs", n_jobs));
}

pub(super) fn label_propagation(
    p: &LabelPropagationParams,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let mut b = Binder::new("LabelPropagation", automl, diagnostics);
    bind_kernel(&mut b, p.kernel, p.gamma, p.n_neighbors);
    bind_iteration(&mut b, p.max_iter, p.tol, p.n_jobs);
    EstimatorCall::new("sklearn.semi_supervised", "LabelPropagation", b.finish())
}

pub(super) fn label_spreading(
    p: &LabelSpreadingParams,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let mut b = Binder::new("LabelSpreading", automl, diagnostics);
    bind_kernel(&mut b, p.kernel, p.gamma, p.n_neighbors);
    b.bind(
        Field::new("alpha", p.alpha).range(
            p.alpha.is_none_or(|a| a > 0.0 && a < 1.0),
            "alpha must be in (0, 1)",
        ),
    );
    bind_iteration(&mut b, p.max_iter, p.tol, p.n_jobs);
    EstimatorCall::new("sklearn.semi_supervised", "LabelSpreading", b.finish())
}
