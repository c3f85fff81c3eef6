//! Decision trees and random forests.

use crate::binder::{Binder, Field};
use crate::diagnostics::Diagnostics;
use crate::model::{
    ClassWeight, DecisionTreeParams, FreeForm, Number, RandomForestParams, TreeCriterion,
};
use crate::render::{Fragment, Literal};

use super::{EstimatorCall, Task};

/// Below this many rows a leaf may hold a single sample.
const LEAF_THRESHOLD: u64 = 1000;
/// Above this many rows forests get more trees.
const FOREST_THRESHOLD: u64 = 10_000;

fn criterion_rule(task: Task) -> (&'static str, impl Fn(TreeCriterion) -> bool) {
    let classification = task == Task::Classification;
    let reason = if classification {
        "criterion is for regression trees"
    } else {
        "criterion is for classification trees"
    };
    (reason, move |c: TreeCriterion| {
        c.is_classification() == classification
    })
}

/// Integer counts must reach `min`; fractions must lie in `(0, max_fraction]`.
fn count_or_fraction(value: Option<Number>, min: i64, max_fraction: f64) -> bool {
    match value {
        None => true,
        Some(Number::Int(n)) => n >= min,
        Some(Number::Float(f)) => f > 0.0 && f <= max_fraction,
    }
}

fn valid_max_features(value: &Option<FreeForm>) -> bool {
    match value {
        Some(FreeForm::Text(text)) => matches!(text.as_str(), "sqrt" | "log2"),
        Some(FreeForm::Symbol(_)) | None => true,
    }
}

fn class_weight_field(weight: Option<ClassWeight>, task: Task, forest: bool) -> Field {
    Field::new("class_weight", weight)
        .require(
            task == Task::Classification,
            "class_weight only applies to classifiers",
        )
        .require(
            forest || weight != Some(ClassWeight::BalancedSubsample),
            "'balanced_subsample' is only available for random forests",
        )
}

pub(super) fn decision_tree(
    p: &DecisionTreeParams,
    task: Task,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let class = match task {
        Task::Regression => "DecisionTreeRegressor",
        _ => "DecisionTreeClassifier",
    };
    let (criterion_reason, criterion_fits) = criterion_rule(task);

    let mut b = Binder::new(class, automl, diagnostics);
    b.bind(
        Field::new("criterion", p.criterion)
            .require(p.criterion.is_none_or(&criterion_fits), criterion_reason),
    );
    b.bind(Field::new("splitter", p.splitter));
    b.bind(
        Field::new("max_depth", p.max_depth)
            .range(p.max_depth.is_none_or(|d| d >= 1), "max_depth must be at least 1"),
    );
    b.bind(Field::new("min_samples_split", p.min_samples_split).range(
        count_or_fraction(p.min_samples_split, 2, 1.0),
        "min_samples_split must be an integer >= 2 or a fraction in (0, 1]",
    ));
    b.bind(
        Field::new("min_samples_leaf", p.min_samples_leaf)
            .automl(Fragment::by_sample_count(
                LEAF_THRESHOLD,
                Literal::Int(1),
                Literal::Int(5),
            ))
            .range(
                count_or_fraction(p.min_samples_leaf, 1, 0.5),
                "min_samples_leaf must be an integer >= 1 or a fraction in (0, 0.5]",
            ),
    );
    b.bind(
        Field::new("min_weight_fraction_leaf", p.min_weight_fraction_leaf).range(
            p.min_weight_fraction_leaf
                .is_none_or(|f| (0.0..=0.5).contains(&f)),
            "min_weight_fraction_leaf must be in [0, 0.5]",
        ),
    );
    b.bind(Field::new("max_features", p.max_features.clone()).range(
        valid_max_features(&p.max_features),
        "max_features must be 'sqrt', 'log2', a number or None",
    ));
    b.bind(Field::new("random_state", p.random_state));
    b.bind(
        Field::new("max_leaf_nodes", p.max_leaf_nodes).range(
            p.max_leaf_nodes.is_none_or(|n| n >= 2),
            "max_leaf_nodes must be at least 2",
        ),
    );
    b.bind(
        Field::new("min_impurity_decrease", p.min_impurity_decrease).range(
            p.min_impurity_decrease.is_none_or(|v| v >= 0.0),
            "min_impurity_decrease must be non-negative",
        ),
    );
    b.bind(class_weight_field(p.class_weight, task, false));
    b.bind(
        Field::new("ccp_alpha", p.ccp_alpha)
            .range(p.ccp_alpha.is_none_or(|v| v >= 0.0), "ccp_alpha must be non-negative"),
    );
    EstimatorCall::new("sklearn.tree", class, b.finish())
}

pub(super) fn random_forest(
    p: &RandomForestParams,
    task: Task,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let class = match task {
        Task::Regression => "RandomForestRegressor",
        _ => "RandomForestClassifier",
    };
    let (criterion_reason, criterion_fits) = criterion_rule(task);
    let bootstrap = p.bootstrap.unwrap_or(true);

    let mut b = Binder::new(class, automl, diagnostics);
    b.bind(
        Field::new("n_estimators", p.n_estimators)
            .automl(Fragment::by_sample_count(
                FOREST_THRESHOLD,
                Literal::Int(100),
                Literal::Int(300),
            ))
            .range(
                p.n_estimators.is_none_or(|n| n >= 1),
                "n_estimators must be at least 1",
            ),
    );
    b.bind(
        Field::new("criterion", p.criterion)
            .require(p.criterion.is_none_or(&criterion_fits), criterion_reason),
    );
    b.bind(
        Field::new("max_depth", p.max_depth)
            .range(p.max_depth.is_none_or(|d| d >= 1), "max_depth must be at least 1"),
    );
    b.bind(Field::new("min_samples_split", p.min_samples_split).range(
        count_or_fraction(p.min_samples_split, 2, 1.0),
        "min_samples_split must be an integer >= 2 or a fraction in (0, 1]",
    ));
    b.bind(Field::new("min_samples_leaf", p.min_samples_leaf).range(
        count_or_fraction(p.min_samples_leaf, 1, 0.5),
        "min_samples_leaf must be an integer >= 1 or a fraction in (0, 0.5]",
    ));
    b.bind(
        Field::new("min_weight_fraction_leaf", p.min_weight_fraction_leaf).range(
            p.min_weight_fraction_leaf
                .is_none_or(|f| (0.0..=0.5).contains(&f)),
            "min_weight_fraction_leaf must be in [0, 0.5]",
        ),
    );
    b.bind(Field::new("max_features", p.max_features.clone()).range(
        valid_max_features(&p.max_features),
        "max_features must be 'sqrt', 'log2', a number or None",
    ));
    b.bind(
        Field::new("max_leaf_nodes", p.max_leaf_nodes).range(
            p.max_leaf_nodes.is_none_or(|n| n >= 2),
            "max_leaf_nodes must be at least 2",
        ),
    );
    b.bind(
        Field::new("min_impurity_decrease", p.min_impurity_decrease).range(
            p.min_impurity_decrease.is_none_or(|v| v >= 0.0),
            "min_impurity_decrease must be non-negative",
        ),
    );
    b.bind(Field::new("bootstrap", p.bootstrap));
    b.bind(Field::new("oob_score", p.oob_score).require(
        p.oob_score != Some(true) || bootstrap,
        "out-of-bag estimation requires bootstrap=True",
    ));
    b.bind(Field::new("n_jobs", p.n_jobs));
    b.bind(Field::new("random_state", p.random_state));
    b.bind(Field::new("verbose", p.verbose));
    b.bind(Field::new("warm_start", p.warm_start));
    b.bind(class_weight_field(p.class_weight, task, true));
    b.bind(
        Field::new("ccp_alpha", p.ccp_alpha)
            .range(p.ccp_alpha.is_none_or(|v| v >= 0.0), "ccp_alpha must be non-negative"),
    );
    b.bind(
        Field::new("max_samples", p.max_samples)
            .require(bootstrap, "max_samples requires bootstrap=True")
            .range(
                count_or_fraction(p.max_samples, 1, 1.0),
                "max_samples must be an integer >= 1 or a fraction in (0, 1]",
            ),
    );
    EstimatorCall::new("sklearn.ensemble", class, b.finish())
}
