//! Linear and logistic regression.

use crate::binder::{Binder, Field};
use crate::diagnostics::Diagnostics;
use crate::model::{
    ClassWeight, LinearRegressionParams, LogisticRegressionParams, LogisticSolver, MultiClass,
    Penalty,
};
use crate::render::{Fragment, Literal};

use super::EstimatorCall;

pub(super) fn linear_regression(
    p: &LinearRegressionParams,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let mut b = Binder::new("LinearRegression", automl, diagnostics);
    b.bind(Field::new("fit_intercept", p.fit_intercept));
    b.bind(Field::new("copy_X", p.copy_x));
    b.bind(Field::new("n_jobs", p.n_jobs));
    b.bind(Field::new("positive", p.positive));
    EstimatorCall::new("sklearn.linear_model", "LinearRegression", b.finish())
}

fn supports(solver: LogisticSolver, penalty: Penalty) -> bool {
    use LogisticSolver::*;
    match solver {
        Lbfgs | NewtonCg | NewtonCholesky | Sag => {
            matches!(penalty, Penalty::L2 | Penalty::Unpenalized)
        }
        Liblinear => matches!(penalty, Penalty::L1 | Penalty::L2),
        Saga => true,
    }
}

fn penalty_literal(penalty: Penalty) -> Literal {
    match penalty {
        Penalty::Unpenalized => Literal::raw("None"),
        other => other.into(),
    }
}

/// Solver choice when none was given.
enum SolverDefault {
    Library,
    Fixed(LogisticSolver),
    BySampleCount,
}

fn solver_default(p: &LogisticRegressionParams, automl: bool) -> SolverDefault {
    if !automl {
        return SolverDefault::Library;
    }
    if p.dual == Some(true) {
        SolverDefault::Fixed(LogisticSolver::Liblinear)
    } else if matches!(p.penalty, Some(Penalty::ElasticNet | Penalty::Unpenalized))
        || p.multi_class == Some(MultiClass::Multinomial)
    {
        SolverDefault::Fixed(LogisticSolver::Saga)
    } else {
        SolverDefault::BySampleCount
    }
}

/// Small datasets converge fastest with liblinear, large ones with saga.
const SOLVER_THRESHOLD: u64 = 1000;

pub(super) fn logistic_regression(
    p: &LogisticRegressionParams,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let default = solver_default(p, automl);
    let candidates: Vec<LogisticSolver> = match (p.solver, &default) {
        (Some(solver), _) => vec![solver],
        (None, SolverDefault::Library) => vec![LogisticSolver::Lbfgs],
        (None, SolverDefault::Fixed(solver)) => vec![*solver],
        (None, SolverDefault::BySampleCount) => {
            vec![LogisticSolver::Liblinear, LogisticSolver::Saga]
        }
    };
    let all = |pred: &dyn Fn(LogisticSolver) -> bool| candidates.iter().all(|s| pred(*s));
    let any_liblinear = candidates.contains(&LogisticSolver::Liblinear);
    let only_liblinear = all(&|s| s == LogisticSolver::Liblinear);
    let solver_text = candidates
        .iter()
        .map(LogisticSolver::as_str)
        .collect::<Vec<_>>()
        .join("/");

    let penalty_ok = p.penalty.is_none_or(|pen| all(&|s| supports(s, pen)));
    let needs_ratio = p.penalty == Some(Penalty::ElasticNet);
    let ratio_ok = !needs_ratio || p.l1_ratio.is_some() || automl;
    let penalty = if penalty_ok && ratio_ok {
        p.penalty.unwrap_or(Penalty::L2)
    } else {
        Penalty::L2
    };
    let fit_intercept = p.fit_intercept.unwrap_or(true);

    let mut b = Binder::new("LogisticRegression", automl, diagnostics);
    b.bind(
        Field::new("penalty", p.penalty.map(penalty_literal))
            .require(
                penalty_ok,
                format!(
                    "solver '{}' does not support penalty '{}'",
                    solver_text,
                    p.penalty.map(|x| x.as_str()).unwrap_or("l2")
                ),
            )
            .require(ratio_ok, "penalty 'elasticnet' requires l1_ratio"),
    );
    b.bind(Field::new("dual", p.dual).require(
        p.dual != Some(true) || (penalty == Penalty::L2 && only_liblinear),
        format!(
            "dual formulation is only implemented for penalty='l2' with solver='liblinear' (solver is '{solver_text}')"
        ),
    ));
    b.bind(Field::new("tol", p.tol).range(p.tol.is_none_or(|t| t > 0.0), "tol must be positive"));
    b.bind(Field::new("C", p.c).range(p.c.is_none_or(|c| c > 0.0), "C must be positive"));
    b.bind(Field::new("fit_intercept", p.fit_intercept));
    b.bind(Field::new("intercept_scaling", p.intercept_scaling).require(
        fit_intercept && only_liblinear,
        "intercept_scaling is only used with fit_intercept=True and solver='liblinear'",
    ));
    b.bind(Field::new("class_weight", p.class_weight).require(
        p.class_weight != Some(ClassWeight::BalancedSubsample),
        "'balanced_subsample' is only available for random forests",
    ));
    b.bind(Field::new("random_state", p.random_state));

    let solver_field = Field::new("solver", p.solver);
    let solver_field = match default {
        SolverDefault::Library => solver_field,
        SolverDefault::Fixed(solver) => solver_field.automl(Literal::from(solver)),
        SolverDefault::BySampleCount => solver_field.automl(Fragment::by_sample_count(
            SOLVER_THRESHOLD,
            LogisticSolver::Liblinear,
            LogisticSolver::Saga,
        )),
    };
    b.bind(solver_field);

    b.bind(
        Field::new("max_iter", p.max_iter)
            .automl(Literal::Int(1000))
            .range(p.max_iter.is_none_or(|m| m > 0), "max_iter must be positive"),
    );
    b.bind(Field::new("multi_class", p.multi_class).require(
        !(p.multi_class == Some(MultiClass::Multinomial) && any_liblinear),
        "solver 'liblinear' does not support a multinomial backend",
    ));
    b.bind(Field::new("verbose", p.verbose));
    b.bind(Field::new("warm_start", p.warm_start).require(
        !(p.warm_start == Some(true) && only_liblinear),
        "warm_start is useless for solver 'liblinear'",
    ));
    b.bind(Field::new("n_jobs", p.n_jobs).require(
        !any_liblinear,
        "n_jobs is ignored when solver is 'liblinear'",
    ));

    let l1_ratio = Field::new("l1_ratio", p.l1_ratio)
        .require(
            penalty == Penalty::ElasticNet,
            "l1_ratio is only used with penalty='elasticnet'",
        )
        .range(
            p.l1_ratio.is_none_or(|r| (0.0..=1.0).contains(&r)),
            "l1_ratio must be in [0, 1]",
        );
    let l1_ratio = if penalty == Penalty::ElasticNet {
        l1_ratio.automl(Literal::Float(0.5))
    } else {
        l1_ratio
    };
    b.bind(l1_ratio);

    EstimatorCall::new("sklearn.linear_model", "LogisticRegression", b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::render::Dialect;
    use pretty_assertions::assert_eq;

    fn fully_specified() -> LogisticRegressionParams {
        LogisticRegressionParams {
            penalty: Some(Penalty::L2),
            dual: Some(true),
            tol: Some(0.0001),
            c: Some(1.0),
            fit_intercept: Some(true),
            intercept_scaling: Some(1.0),
            class_weight: Some(ClassWeight::Balanced),
            random_state: Some(0),
            solver: Some(LogisticSolver::Liblinear),
            max_iter: Some(100),
            multi_class: Some(MultiClass::Ovr),
            verbose: Some(0),
            warm_start: Some(false),
            n_jobs: None,
            l1_ratio: None,
        }
    }

    #[test]
    fn test_compatible_logistic_regression_binds_every_field() {
        let mut diagnostics = Diagnostics::new();
        let call = logistic_regression(&fully_specified(), false, &mut diagnostics);
        assert!(diagnostics.is_empty());
        assert_eq!(
            call.params.names(),
            vec![
                "penalty",
                "dual",
                "tol",
                "C",
                "fit_intercept",
                "intercept_scaling",
                "class_weight",
                "random_state",
                "solver",
                "max_iter",
                "multi_class",
                "verbose",
                "warm_start"
            ]
        );
    }

    #[test]
    fn test_dual_with_lbfgs_is_dropped() {
        let params = LogisticRegressionParams {
            dual: Some(true),
            solver: Some(LogisticSolver::Lbfgs),
            c: Some(0.5),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = logistic_regression(&params, false, &mut diagnostics);
        assert_eq!(call.params.names(), vec!["C", "solver"]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.entries()[0].field.as_deref(), Some("dual"));
        assert_eq!(diagnostics.entries()[0].severity, Severity::Warning);
    }

    #[test]
    fn test_intercept_scaling_needs_liblinear() {
        let params = LogisticRegressionParams {
            intercept_scaling: Some(2.0),
            solver: Some(LogisticSolver::Saga),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = logistic_regression(&params, false, &mut diagnostics);
        assert_eq!(call.params.names(), vec!["solver"]);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_penalty_incompatible_with_solver() {
        let params = LogisticRegressionParams {
            penalty: Some(Penalty::L1),
            solver: Some(LogisticSolver::Lbfgs),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = logistic_regression(&params, false, &mut diagnostics);
        assert_eq!(call.params.names(), vec!["solver"]);
        assert_eq!(diagnostics.for_field("penalty").count(), 1);
    }

    #[test]
    fn test_l1_ratio_requires_elasticnet() {
        let params = LogisticRegressionParams {
            solver: Some(LogisticSolver::Saga),
            l1_ratio: Some(0.3),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = logistic_regression(&params, false, &mut diagnostics);
        assert!(!call.params.is_bound("l1_ratio"));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_automl_solver_branches_on_sample_count() {
        let mut diagnostics = Diagnostics::new();
        let call = logistic_regression(&LogisticRegressionParams::default(), true, &mut diagnostics);
        assert_eq!(
            call.params.render(Dialect::Python),
            "solver=('liblinear' if n_samples < 1000 else 'saga'), max_iter=1000"
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_automl_solver_forced_by_penalty() {
        let params = LogisticRegressionParams {
            penalty: Some(Penalty::ElasticNet),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = logistic_regression(&params, true, &mut diagnostics);
        assert_eq!(
            call.params.render(Dialect::Python),
            "penalty='elasticnet', solver='saga', max_iter=1000, l1_ratio=0.5"
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_automl_solver_forced_by_dual() {
        let params = LogisticRegressionParams {
            dual: Some(true),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = logistic_regression(&params, true, &mut diagnostics);
        assert_eq!(
            call.params.render(Dialect::Python),
            "dual=True, solver='liblinear', max_iter=1000"
        );
    }

    #[test]
    fn test_unpenalized_renders_none() {
        let params = LogisticRegressionParams {
            penalty: Some(Penalty::Unpenalized),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = logistic_regression(&params, false, &mut diagnostics);
        assert_eq!(call.params.render(Dialect::Python), "penalty=None");
    }

    #[test]
    fn test_linear_regression_fields() {
        let params = LinearRegressionParams {
            fit_intercept: Some(false),
            copy_x: Some(true),
            n_jobs: Some(2),
            positive: Some(true),
        };
        let mut diagnostics = Diagnostics::new();
        let call = linear_regression(&params, false, &mut diagnostics);
        assert_eq!(
            call.params.render(Dialect::Python),
            "fit_intercept=False, copy_X=True, n_jobs=2, positive=True"
        );
        assert_eq!(call.constructor(), "LinearRegression(fit_intercept=False, copy_X=True, n_jobs=2, positive=True)");
    }
}
