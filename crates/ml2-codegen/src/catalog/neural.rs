//! Multilayer perceptrons, for scikit-learn and Keras.
//!
//! Parameters are declared once (see [`MlpParams`]). The scikit-learn
//! rendering binds them as-is; the Keras rendering maps each one onto the
//! layer, optimizer or `fit` call that expresses it and drops the rest.

use serde::Serialize;

use crate::binder::{Binder, Field};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{Activation, LearningRateSchedule, MlpParams, MlpSolver};
use crate::render::{Dialect, Fragment, Literal, ParamList};

use super::{EstimatorCall, Task};

/// Small datasets converge fastest with the quasi-Newton solver.
const SOLVER_THRESHOLD: u64 = 1000;
/// Batch size step for Keras training.
const BATCH_THRESHOLD: u64 = 10_000;
const KERAS_EPOCHS: i64 = 200;
/// scikit-learn's default topology.
const DEFAULT_HIDDEN_LAYERS: [i64; 1] = [100];

fn solver_default(p: &MlpParams) -> Fragment {
    let sgd_only = p.learning_rate.is_some()
        || p.power_t.is_some()
        || p.momentum.is_some()
        || p.nesterovs_momentum.is_some();
    let adam_only = p.beta_1.is_some() || p.beta_2.is_some() || p.epsilon.is_some();
    let stochastic = p.early_stopping.is_some()
        || p.shuffle.is_some()
        || p.batch_size.is_some()
        || p.learning_rate_init.is_some()
        || p.n_iter_no_change.is_some();

    if sgd_only {
        Literal::from(MlpSolver::Sgd).into()
    } else if adam_only || stochastic {
        Literal::from(MlpSolver::Adam).into()
    } else if p.max_fun.is_some() {
        Literal::from(MlpSolver::Lbfgs).into()
    } else {
        Fragment::by_sample_count(SOLVER_THRESHOLD, MlpSolver::Lbfgs, MlpSolver::Adam)
    }
}

/// Solvers the generated script may end up using.
fn solver_candidates(p: &MlpParams, automl: bool) -> Vec<MlpSolver> {
    match (p.solver, automl) {
        (Some(solver), _) => vec![solver],
        (None, false) => vec![MlpSolver::Adam],
        (None, true) => match solver_default(p) {
            Fragment::BySampleCount { .. } => vec![MlpSolver::Lbfgs, MlpSolver::Adam],
            Fragment::Literal(literal) => match literal {
                Literal::Str(s) if s == "sgd" => vec![MlpSolver::Sgd],
                Literal::Str(s) if s == "lbfgs" => vec![MlpSolver::Lbfgs],
                _ => vec![MlpSolver::Adam],
            },
        },
    }
}

fn positive_layers(layers: &Option<Vec<i64>>) -> bool {
    layers
        .as_ref()
        .is_none_or(|sizes| !sizes.is_empty() && sizes.iter().all(|n| *n > 0))
}

fn layer_tuple(layers: &Option<Vec<i64>>) -> Option<Literal> {
    layers
        .as_ref()
        .map(|sizes| Literal::Tuple(sizes.iter().map(|n| Literal::Int(*n)).collect()))
}

pub(super) fn mlp(
    p: &MlpParams,
    task: Task,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> EstimatorCall {
    let class = match task {
        Task::Regression => "MLPRegressor",
        _ => "MLPClassifier",
    };
    let candidates = solver_candidates(p, automl);
    let only = |solver: MlpSolver| candidates.iter().all(|s| *s == solver);
    let stochastic = candidates.iter().all(|s| *s != MlpSolver::Lbfgs);
    let early_stopping = p.early_stopping == Some(true) && stochastic;
    let schedule = p.learning_rate.unwrap_or(LearningRateSchedule::Constant);

    let mut b = Binder::new(class, automl, diagnostics);
    b.bind(
        Field::new("hidden_layer_sizes", layer_tuple(&p.hidden_layer_sizes)).range(
            positive_layers(&p.hidden_layer_sizes),
            "hidden_layer_sizes must list positive layer widths",
        ),
    );
    b.bind(Field::new("activation", p.activation));
    let solver = Field::new("solver", p.solver);
    let solver = if p.solver.is_none() {
        solver.automl(solver_default(p))
    } else {
        solver
    };
    b.bind(solver);
    b.bind(Field::new("alpha", p.alpha).range(p.alpha.is_none_or(|a| a >= 0.0), "alpha must be non-negative"));
    b.bind(
        Field::new("batch_size", p.batch_size)
            .require(stochastic, "batch_size is not used by solver 'lbfgs'")
            .range(p.batch_size.is_none_or(|n| n >= 1), "batch_size must be at least 1"),
    );
    b.bind(Field::new("learning_rate", p.learning_rate).require(
        only(MlpSolver::Sgd),
        "learning_rate schedules only apply to solver 'sgd'",
    ));
    b.bind(
        Field::new("learning_rate_init", p.learning_rate_init)
            .require(stochastic, "learning_rate_init only applies to solvers 'sgd' and 'adam'")
            .range(
                p.learning_rate_init.is_none_or(|r| r > 0.0),
                "learning_rate_init must be positive",
            ),
    );
    b.bind(
        Field::new("power_t", p.power_t)
            .require(only(MlpSolver::Sgd), "power_t only applies to solver 'sgd'")
            .require(
                schedule == LearningRateSchedule::InvScaling,
                "power_t only applies to learning_rate='invscaling'",
            ),
    );
    b.bind(
        Field::new("max_iter", p.max_iter)
            .range(p.max_iter.is_none_or(|m| m >= 1), "max_iter must be at least 1"),
    );
    b.bind(
        Field::new("shuffle", p.shuffle)
            .require(stochastic, "shuffle only applies to solvers 'sgd' and 'adam'"),
    );
    b.bind(Field::new("random_state", p.random_state));
    b.bind(Field::new("tol", p.tol).range(p.tol.is_none_or(|t| t > 0.0), "tol must be positive"));
    b.bind(Field::new("verbose", p.verbose));
    b.bind(Field::new("warm_start", p.warm_start));
    b.bind(
        Field::new("momentum", p.momentum)
            .require(only(MlpSolver::Sgd), "momentum only applies to solver 'sgd'")
            .range(
                p.momentum.is_none_or(|m| (0.0..=1.0).contains(&m)),
                "momentum must be in [0, 1]",
            ),
    );
    b.bind(
        Field::new("nesterovs_momentum", p.nesterovs_momentum)
            .require(only(MlpSolver::Sgd), "nesterovs_momentum only applies to solver 'sgd'"),
    );
    b.bind(
        Field::new("early_stopping", p.early_stopping)
            .require(stochastic, "early_stopping only applies to solvers 'sgd' and 'adam'"),
    );
    b.bind(
        Field::new("validation_fraction", p.validation_fraction)
            .require(early_stopping, "validation_fraction is only used with early_stopping=True")
            .range(
                p.validation_fraction.is_none_or(|f| f > 0.0 && f < 1.0),
                "validation_fraction must be in (0, 1)",
            ),
    );
    for (name, value) in [("beta_1", p.beta_1), ("beta_2", p.beta_2)] {
        b.bind(
            Field::new(name, value)
                .require(only(MlpSolver::Adam), format!("{name} only applies to solver 'adam'"))
                .range(
                    value.is_none_or(|v| (0.0..1.0).contains(&v)),
                    format!("{name} must be in [0, 1)"),
                ),
        );
    }
    b.bind(
        Field::new("epsilon", p.epsilon)
            .require(only(MlpSolver::Adam), "epsilon only applies to solver 'adam'")
            .range(p.epsilon.is_none_or(|e| e > 0.0), "epsilon must be positive"),
    );
    b.bind(
        Field::new("n_iter_no_change", p.n_iter_no_change)
            .require(stochastic, "n_iter_no_change only applies to solvers 'sgd' and 'adam'")
            .range(
                p.n_iter_no_change.is_none_or(|n| n >= 1),
                "n_iter_no_change must be at least 1",
            ),
    );
    b.bind(
        Field::new("max_fun", p.max_fun)
            .require(only(MlpSolver::Lbfgs), "max_fun only applies to solver 'lbfgs'")
            .range(p.max_fun.is_none_or(|n| n >= 1), "max_fun must be at least 1"),
    );
    EstimatorCall::new("sklearn.neural_network", class, b.finish())
}

/// A Keras `Sequential` network and how to train it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KerasNetwork {
    pub hidden_layers: Vec<i64>,
    /// Keras name of the hidden activation.
    pub activation: &'static str,
    pub task: Task,
    /// `Adam` or `SGD`.
    pub optimizer: &'static str,
    /// Every bound parameter under its Keras name. Projections of it feed
    /// the optimizer, the regularizer and `fit`.
    pub params: ParamList,
    pub early_stopping: bool,
}

const OPTIMIZER_PARAMS: [&str; 6] = [
    "learning_rate",
    "momentum",
    "nesterov",
    "beta_1",
    "beta_2",
    "epsilon",
];
const FIT_PARAMS: [&str; 5] = ["epochs", "batch_size", "shuffle", "verbose", "validation_split"];

impl KerasNetwork {
    pub fn imports(&self) -> Vec<String> {
        vec!["from tensorflow import keras".to_string()]
    }

    fn output_layer(&self) -> (&'static str, &'static str, &'static str) {
        // (units expression, activation, loss)
        match self.task {
            Task::Regression => (
                "(y_train.shape[1] if y_train.ndim > 1 else 1)",
                "linear",
                "mse",
            ),
            _ => ("n_classes", "softmax", "sparse_categorical_crossentropy"),
        }
    }

    /// Python statements that build and compile `model`. Expects
    /// `n_features`, `n_samples` and `y_train` in scope, plus `n_classes`
    /// for classifiers.
    pub fn build_lines(&self) -> String {
        let mut lines = Vec::new();
        if let Some(seed) = self.params.get("seed") {
            lines.push(format!("keras.utils.set_random_seed({})", seed.render(Dialect::Python)));
        }
        let regularizer = self
            .params
            .get("l2")
            .map(|alpha| {
                format!(
                    ", kernel_regularizer=keras.regularizers.l2({})",
                    alpha.render(Dialect::Python)
                )
            })
            .unwrap_or_default();
        let (units, output_activation, loss) = self.output_layer();

        lines.push("model = keras.Sequential()".to_string());
        lines.push("model.add(keras.Input(shape=(n_features,)))".to_string());
        for width in &self.hidden_layers {
            lines.push(format!(
                "model.add(keras.layers.Dense({width}, activation='{}'{regularizer}))",
                self.activation
            ));
        }
        lines.push(format!(
            "model.add(keras.layers.Dense({units}, activation='{output_activation}'))"
        ));
        let metrics = if self.task == Task::Regression {
            ""
        } else {
            ", metrics=['accuracy']"
        };
        lines.push(format!(
            "model.compile(optimizer=keras.optimizers.{}({}), loss='{loss}'{metrics})",
            self.optimizer,
            self.params
                .only(&OPTIMIZER_PARAMS)
                .render(Dialect::Python)
        ));
        lines.join("\n")
    }

    /// Keyword arguments of `model.fit`, after the data arguments.
    pub fn fit_arguments(&self) -> String {
        let mut args = self.params.only(&FIT_PARAMS).render(Dialect::Python);
        if self.early_stopping {
            let monitor = if self.params.is_bound("validation_split") {
                "val_loss"
            } else {
                "loss"
            };
            let patience = self
                .params
                .get("patience")
                .map(|p| format!(", patience={}", p.render(Dialect::Python)))
                .unwrap_or_default();
            if !args.is_empty() {
                args.push_str(", ");
            }
            args.push_str(&format!(
                "callbacks=[keras.callbacks.EarlyStopping(monitor='{monitor}'{patience})]"
            ));
        }
        args
    }
}

fn keras_activation(activation: Activation) -> &'static str {
    match activation {
        Activation::Identity => "linear",
        Activation::Logistic => "sigmoid",
        Activation::Tanh => "tanh",
        Activation::Relu => "relu",
    }
}

pub(super) fn keras_network(
    p: &MlpParams,
    task: Task,
    automl: bool,
    diagnostics: &mut Diagnostics,
) -> KerasNetwork {
    let mut b = Binder::new("MultilayerPerceptron", automl, diagnostics);

    let optimizer = match p.solver {
        Some(MlpSolver::Sgd) => MlpSolver::Sgd,
        Some(MlpSolver::Lbfgs) => {
            b.warn_field(
                DiagnosticKind::UnsupportedByBackend,
                "solver",
                "keras has no 'lbfgs' optimizer; Adam is used instead",
            );
            MlpSolver::Adam
        }
        Some(MlpSolver::Adam) | None => MlpSolver::Adam,
    };
    let sgd = optimizer == MlpSolver::Sgd;
    let early_stopping = p.early_stopping == Some(true);

    let unsupported: [(&'static str, Option<Literal>); 5] = [
        ("power_t", p.power_t.map(Literal::from)),
        ("learning_rate", p.learning_rate.map(Literal::from)),
        ("max_fun", p.max_fun.map(Literal::from)),
        ("warm_start", p.warm_start.map(Literal::from)),
        ("tol", p.tol.map(Literal::from)),
    ];
    for (name, value) in unsupported {
        b.bind(Field::new(name, value).unsupported("keras has no equivalent"));
    }

    if !positive_layers(&p.hidden_layer_sizes) {
        b.warn_field(
            DiagnosticKind::OutOfRange,
            "hidden_layer_sizes",
            "hidden_layer_sizes must list positive layer widths; the default topology is used",
        );
    }
    let hidden_layers = match &p.hidden_layer_sizes {
        Some(sizes) if positive_layers(&p.hidden_layer_sizes) => sizes.clone(),
        _ => DEFAULT_HIDDEN_LAYERS.to_vec(),
    };

    b.bind(Field::new("seed", p.random_state));
    b.bind(
        Field::new("l2", p.alpha)
            .range(p.alpha.is_none_or(|a| a >= 0.0), "alpha must be non-negative"),
    );
    b.bind(
        Field::new("learning_rate", p.learning_rate_init).range(
            p.learning_rate_init.is_none_or(|r| r > 0.0),
            "learning_rate_init must be positive",
        ),
    );
    b.bind(
        Field::new("momentum", p.momentum)
            .require(sgd, "momentum only applies to the SGD optimizer")
            .range(
                p.momentum.is_none_or(|m| (0.0..=1.0).contains(&m)),
                "momentum must be in [0, 1]",
            ),
    );
    b.bind(
        Field::new("nesterov", p.nesterovs_momentum)
            .require(sgd, "nesterov momentum only applies to the SGD optimizer"),
    );
    for (name, value) in [("beta_1", p.beta_1), ("beta_2", p.beta_2)] {
        b.bind(
            Field::new(name, value)
                .require(!sgd, format!("{name} only applies to the Adam optimizer"))
                .range(
                    value.is_none_or(|v| (0.0..1.0).contains(&v)),
                    format!("{name} must be in [0, 1)"),
                ),
        );
    }
    b.bind(
        Field::new("epsilon", p.epsilon)
            .require(!sgd, "epsilon only applies to the Adam optimizer")
            .range(p.epsilon.is_none_or(|e| e > 0.0), "epsilon must be positive"),
    );

    b.bind(
        Field::new("epochs", p.max_iter)
            .automl(Literal::Int(KERAS_EPOCHS))
            .range(p.max_iter.is_none_or(|m| m >= 1), "max_iter must be at least 1"),
    );
    b.bind(
        Field::new("batch_size", p.batch_size)
            .automl(Fragment::by_sample_count(
                BATCH_THRESHOLD,
                Literal::Int(32),
                Literal::Int(256),
            ))
            .range(p.batch_size.is_none_or(|n| n >= 1), "batch_size must be at least 1"),
    );
    b.bind(Field::new("shuffle", p.shuffle));
    b.bind(Field::new("verbose", p.verbose.map(i64::from)));
    b.bind(
        Field::new("validation_split", p.validation_fraction)
            .require(early_stopping, "validation_fraction is only used with early_stopping=True")
            .range(
                p.validation_fraction.is_none_or(|f| f > 0.0 && f < 1.0),
                "validation_fraction must be in (0, 1)",
            ),
    );
    b.bind(
        Field::new("patience", p.n_iter_no_change)
            .require(early_stopping, "n_iter_no_change is only used with early_stopping=True")
            .range(
                p.n_iter_no_change.is_none_or(|n| n >= 1),
                "n_iter_no_change must be at least 1",
            ),
    );

    KerasNetwork {
        hidden_layers,
        activation: keras_activation(p.activation.unwrap_or(Activation::Relu)),
        task,
        optimizer: if sgd { "SGD" } else { "Adam" },
        params: b.finish(),
        early_stopping,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sklearn_solver_scoped_params() {
        let params = MlpParams {
            solver: Some(MlpSolver::Adam),
            momentum: Some(0.9),
            beta_1: Some(0.8),
            max_fun: Some(1000),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = mlp(&params, Task::Classification, false, &mut diagnostics);
        assert_eq!(call.params.names(), vec!["solver", "beta_1"]);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.for_field("momentum").count(), 1);
        assert_eq!(diagnostics.for_field("max_fun").count(), 1);
    }

    #[test]
    fn test_validation_fraction_needs_early_stopping() {
        let params = MlpParams {
            solver: Some(MlpSolver::Sgd),
            validation_fraction: Some(0.2),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = mlp(&params, Task::Regression, false, &mut diagnostics);
        assert_eq!(call.params.names(), vec!["solver"]);
        assert_eq!(diagnostics.len(), 1);

        let params = MlpParams {
            early_stopping: Some(true),
            validation_fraction: Some(0.2),
            ..params
        };
        let mut diagnostics = Diagnostics::new();
        let call = mlp(&params, Task::Regression, false, &mut diagnostics);
        assert_eq!(
            call.params.names(),
            vec!["solver", "early_stopping", "validation_fraction"]
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_automl_solver_by_sample_count() {
        let params = MlpParams {
            hidden_layer_sizes: Some(vec![64, 32]),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = mlp(&params, Task::Classification, true, &mut diagnostics);
        assert_eq!(
            call.constructor(),
            "MLPClassifier(hidden_layer_sizes=(64, 32), solver=('lbfgs' if n_samples < 1000 else 'adam'))"
        );
    }

    #[test]
    fn test_automl_solver_forced_by_siblings() {
        let params = MlpParams {
            momentum: Some(0.5),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let call = mlp(&params, Task::Regression, true, &mut diagnostics);
        assert_eq!(
            call.params.render(Dialect::Python),
            "solver='sgd', momentum=0.5"
        );
        assert!(diagnostics.is_empty());

        let params = MlpParams {
            batch_size: Some(64),
            ..Default::default()
        };
        let call = mlp(&params, Task::Regression, true, &mut diagnostics);
        assert_eq!(
            call.params.render(Dialect::Python),
            "solver='adam', batch_size=64"
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_keras_drops_unsupported() {
        let params = MlpParams {
            power_t: Some(0.5),
            tol: Some(0.001),
            max_iter: Some(50),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let network = keras_network(&params, Task::Regression, false, &mut diagnostics);
        assert_eq!(
            diagnostics
                .of_kind(DiagnosticKind::UnsupportedByBackend)
                .count(),
            2
        );
        assert_eq!(network.params.names(), vec!["epochs"]);
        assert_eq!(network.fit_arguments(), "epochs=50");
    }

    #[test]
    fn test_keras_automl_training_defaults() {
        let mut diagnostics = Diagnostics::new();
        let network = keras_network(
            &MlpParams::default(),
            Task::Classification,
            true,
            &mut diagnostics,
        );
        assert_eq!(
            network.fit_arguments(),
            "epochs=200, batch_size=(32 if n_samples < 10000 else 256)"
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_keras_build_lines() {
        let params = MlpParams {
            hidden_layer_sizes: Some(vec![16]),
            activation: Some(Activation::Logistic),
            alpha: Some(0.001),
            learning_rate_init: Some(0.01),
            solver: Some(MlpSolver::Lbfgs),
            early_stopping: Some(true),
            validation_fraction: Some(0.1),
            n_iter_no_change: Some(5),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let network = keras_network(&params, Task::Classification, false, &mut diagnostics);
        assert_eq!(diagnostics.for_field("solver").count(), 1);
        assert_eq!(
            network.build_lines(),
            "model = keras.Sequential()\n\
             model.add(keras.Input(shape=(n_features,)))\n\
             model.add(keras.layers.Dense(16, activation='sigmoid', kernel_regularizer=keras.regularizers.l2(0.001)))\n\
             model.add(keras.layers.Dense(n_classes, activation='softmax'))\n\
             model.compile(optimizer=keras.optimizers.Adam(learning_rate=0.01), loss='sparse_categorical_crossentropy', metrics=['accuracy'])"
        );
        assert_eq!(
            network.fit_arguments(),
            "validation_split=0.1, callbacks=[keras.callbacks.EarlyStopping(monitor='val_loss', patience=5)]"
        );
    }

    #[test]
    fn test_keras_full_binding() {
        let params = MlpParams {
            hidden_layer_sizes: Some(vec![32, 16]),
            activation: Some(Activation::Tanh),
            solver: Some(MlpSolver::Adam),
            alpha: Some(0.01),
            batch_size: Some(64),
            learning_rate: Some(LearningRateSchedule::InvScaling),
            learning_rate_init: Some(0.005),
            power_t: Some(0.5),
            max_iter: Some(100),
            shuffle: Some(true),
            random_state: Some(7),
            tol: Some(0.001),
            verbose: Some(false),
            warm_start: Some(false),
            momentum: Some(0.9),
            nesterovs_momentum: Some(true),
            early_stopping: Some(true),
            validation_fraction: Some(0.2),
            beta_1: Some(0.9),
            beta_2: Some(0.999),
            epsilon: Some(0.001),
            n_iter_no_change: Some(10),
            max_fun: Some(15000),
        };
        let mut diagnostics = Diagnostics::new();
        let network = keras_network(&params, Task::Classification, false, &mut diagnostics);

        assert_eq!(
            network.params.names(),
            vec![
                "seed",
                "l2",
                "learning_rate",
                "beta_1",
                "beta_2",
                "epsilon",
                "epochs",
                "batch_size",
                "shuffle",
                "verbose",
                "validation_split",
                "patience",
            ]
        );
        assert_eq!(
            network.build_lines(),
            "keras.utils.set_random_seed(7)\n\
             model = keras.Sequential()\n\
             model.add(keras.Input(shape=(n_features,)))\n\
             model.add(keras.layers.Dense(32, activation='tanh', kernel_regularizer=keras.regularizers.l2(0.01)))\n\
             model.add(keras.layers.Dense(16, activation='tanh', kernel_regularizer=keras.regularizers.l2(0.01)))\n\
             model.add(keras.layers.Dense(n_classes, activation='softmax'))\n\
             model.compile(optimizer=keras.optimizers.Adam(learning_rate=0.005, beta_1=0.9, beta_2=0.999, epsilon=0.001), \
             loss='sparse_categorical_crossentropy', metrics=['accuracy'])"
        );
        assert_eq!(
            network.fit_arguments(),
            "epochs=100, batch_size=64, shuffle=True, verbose=0, validation_split=0.2, \
             callbacks=[keras.callbacks.EarlyStopping(monitor='val_loss', patience=10)]"
        );

        let unsupported = diagnostics
            .of_kind(DiagnosticKind::UnsupportedByBackend)
            .filter_map(|d| d.field.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(
            unsupported,
            vec!["power_t", "learning_rate", "max_fun", "warm_start", "tol"]
        );
        assert_eq!(diagnostics.for_field("momentum").count(), 1);
        assert_eq!(diagnostics.for_field("nesterov").count(), 1);
        assert_eq!(diagnostics.len(), 7);
    }

    #[test]
    fn test_keras_sgd_only_params() {
        let params = MlpParams {
            beta_1: Some(0.9),
            momentum: Some(0.9),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let network = keras_network(&params, Task::Regression, false, &mut diagnostics);
        assert_eq!(network.optimizer, "Adam");
        assert!(!network.params.is_bound("momentum"));
        assert!(network.params.is_bound("beta_1"));
    }
}
