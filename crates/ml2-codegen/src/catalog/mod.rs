//! Algorithm catalog.
//!
//! [`resolve`] turns a [`DataAnalyticsSpec`] into a [`GenerationPlan`]: it
//! checks the (paradigm, algorithm, target type) triple, picks the backend,
//! binds every hyperparameter through the per-family rule sets and derives
//! the artifact names the pipeline stages hand to each other.
//!
//! A mismatch that makes generation meaningless is reported as a fatal
//! diagnostic and `None` is returned. An algorithm is never substituted.

mod clustering;
mod linear;
mod naive_bayes;
mod neural;
mod semi_supervised;
mod trees;

pub(crate) use clustering::MINI_BATCH_HINT_ROWS;
pub use neural::KerasNetwork;

use serde::Serialize;
use std::fmt;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::layout::Stage;
use crate::model::{
    Backend, DataAnalyticsSpec, Feature, FeatureScaler, Library, MetricKind, ModelAlgorithm,
    Paradigm, PlotKind, SampleNormalizer,
};
use crate::render::{Dialect, ParamList};

/// A scikit-learn style constructor call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimatorCall {
    pub module: String,
    pub class: String,
    pub params: ParamList,
    /// Imports needed by parameter values (e.g. a wrapped base estimator).
    pub extra_imports: Vec<String>,
}

impl EstimatorCall {
    pub fn new(module: impl Into<String>, class: impl Into<String>, params: ParamList) -> Self {
        Self {
            module: module.into(),
            class: class.into(),
            params,
            extra_imports: Vec::new(),
        }
    }

    pub fn with_import(mut self, line: impl Into<String>) -> Self {
        self.extra_imports.push(line.into());
        self
    }

    pub fn import_line(&self) -> String {
        format!("from {} import {}", self.module, self.class)
    }

    /// `Class(a=1, b='x')`
    pub fn constructor(&self) -> String {
        format!("{}({})", self.class, self.params.render(Dialect::Python))
    }
}

/// The model-building code of a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelCode {
    Estimator(EstimatorCall),
    Keras(KerasNetwork),
}

impl ModelCode {
    pub fn imports(&self) -> Vec<String> {
        match self {
            ModelCode::Estimator(call) => {
                let mut lines = vec![call.import_line()];
                lines.extend(call.extra_imports.iter().cloned());
                lines
            }
            ModelCode::Keras(network) => network.imports(),
        }
    }

    /// Every bound hyperparameter, for reports.
    pub fn params(&self) -> &ParamList {
        match self {
            ModelCode::Estimator(call) => &call.params,
            ModelCode::Keras(network) => &network.params,
        }
    }
}

/// What the fitted model is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Regression,
    Classification,
    Clustering,
    SemiSupervised,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Regression => "regression",
            Task::Classification => "classification",
            Task::Clustering => "clustering",
            Task::SemiSupervised => "semi_supervised",
        }
    }

    /// Predictions are class labels.
    pub fn predicts_classes(&self) -> bool {
        matches!(self, Task::Classification | Task::SemiSupervised)
    }

    pub fn metric_applies(&self, metric: MetricKind) -> bool {
        match self {
            Task::Regression => metric.is_regression_metric(),
            Task::Classification | Task::SemiSupervised => !metric.is_regression_metric(),
            Task::Clustering => false,
        }
    }

    pub fn plot_applies(&self, plot: PlotKind) -> bool {
        match plot {
            PlotKind::Heatmap | PlotKind::BoxPlot | PlotKind::PairPlot => true,
            PlotKind::ClassImbalance
            | PlotKind::ConfusionMatrix
            | PlotKind::PrecisionRecallCurve
            | PlotKind::RocCurve => self.predicts_classes(),
            PlotKind::LearningCurve => matches!(self, Task::Regression | Task::Classification),
            PlotKind::ClusteringScatter => *self == Task::Clustering,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a file handed from one stage to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    XTrain,
    XTest,
    YTrain,
    YTest,
    FeatureEncoders,
    LabelEncoder,
    Scaler,
    Columns,
    Model,
}

impl ArtifactRole {
    fn preprocess_name(&self) -> &'static str {
        match self {
            ArtifactRole::XTrain => "X_train",
            ArtifactRole::XTest => "X_test",
            ArtifactRole::YTrain => "y_train",
            ArtifactRole::YTest => "y_test",
            ArtifactRole::FeatureEncoders => "feature_encoders",
            ArtifactRole::LabelEncoder => "label_encoder",
            ArtifactRole::Scaler => "scaler",
            ArtifactRole::Columns => "columns",
            ArtifactRole::Model => "model",
        }
    }
}

/// A pipeline artifact with its deterministic file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub role: ArtifactRole,
    pub file_name: String,
}

/// Every artifact the pipeline of one plan produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSet {
    pub preprocess: Vec<Artifact>,
    pub model: Artifact,
}

impl ArtifactSet {
    fn for_plan(
        spec: &DataAnalyticsSpec,
        task: Task,
        backend: Backend,
        abbrev: &str,
        scaled: bool,
    ) -> Self {
        let mut roles = vec![ArtifactRole::XTrain];
        if spec.paradigm.needs_split() {
            roles.push(ArtifactRole::XTest);
        }
        if spec.paradigm.uses_labels() {
            roles.push(ArtifactRole::YTrain);
        }
        if spec.paradigm.needs_split() && spec.paradigm.uses_labels() {
            roles.push(ArtifactRole::YTest);
        }
        roles.push(ArtifactRole::FeatureEncoders);
        if needs_label_encoder(spec, task, backend) {
            roles.push(ArtifactRole::LabelEncoder);
        }
        if scaled {
            roles.push(ArtifactRole::Scaler);
        }
        roles.push(ArtifactRole::Columns);

        Self {
            preprocess: roles
                .into_iter()
                .map(|role| Artifact {
                    role,
                    file_name: format!("preprocess_{}.pickle", role.preprocess_name()),
                })
                .collect(),
            model: Artifact {
                role: ArtifactRole::Model,
                file_name: format!("train_model_{}.{}", abbrev, backend.model_extension()),
            },
        }
    }

    pub fn get(&self, role: ArtifactRole) -> Option<&Artifact> {
        if role == ArtifactRole::Model {
            return Some(&self.model);
        }
        self.preprocess.iter().find(|a| a.role == role)
    }

    pub fn has(&self, role: ArtifactRole) -> bool {
        self.get(role).is_some()
    }

    pub fn file_name(&self, role: ArtifactRole) -> Option<&str> {
        self.get(role).map(|a| a.file_name.as_str())
    }

    pub fn produced_by(&self, stage: Stage) -> Vec<&Artifact> {
        match stage {
            Stage::Preprocess => self.preprocess.iter().collect(),
            Stage::Train => vec![&self.model],
            Stage::Predict | Stage::PreTrainedPredict => Vec::new(),
        }
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.preprocess
            .iter()
            .chain(std::iter::once(&self.model))
            .map(|a| a.file_name.as_str())
            .collect()
    }
}

/// Keras classifiers are trained on class indices, so any target needs an
/// encoder to map argmax positions back to labels.
fn needs_label_encoder(spec: &DataAnalyticsSpec, task: Task, backend: Backend) -> bool {
    spec.paradigm.uses_labels()
        && (spec.has_categorical_target()
            || (backend == Backend::Keras && task == Task::Classification))
}

/// Everything the emitters need, resolved once per spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationPlan {
    pub spec: DataAnalyticsSpec,
    pub algorithm: &'static str,
    pub abbrev: String,
    pub backend: Backend,
    pub task: Task,
    pub model: ModelCode,
    pub scaler: Option<FeatureScaler>,
    /// Dropped when a scaler is also configured.
    pub normalizer: Option<SampleNormalizer>,
    pub artifacts: ArtifactSet,
}

impl GenerationPlan {
    /// Clusterers without `predict` label new rows through a 1-nearest
    /// neighbour lookup over the training rows.
    pub fn uses_neighbor_lookup(&self) -> bool {
        matches!(
            self.spec.algorithm,
            ModelAlgorithm::Dbscan(_) | ModelAlgorithm::SpectralClustering(_)
        )
    }

    /// Artifacts that must exist before `stage` may run. Pre-trained
    /// prediction reads the blackbox paths instead, see
    /// [`crate::contract::required_inputs`].
    pub fn required_artifacts(&self, stage: Stage) -> Vec<&Artifact> {
        let keep: &[ArtifactRole] = match stage {
            Stage::Preprocess | Stage::PreTrainedPredict => &[],
            Stage::Train => &[
                ArtifactRole::XTrain,
                ArtifactRole::XTest,
                ArtifactRole::YTrain,
                ArtifactRole::YTest,
                ArtifactRole::Columns,
            ],
            Stage::Predict => &[
                ArtifactRole::FeatureEncoders,
                ArtifactRole::LabelEncoder,
                ArtifactRole::Scaler,
                ArtifactRole::Columns,
                ArtifactRole::Model,
            ],
        };
        let mut required: Vec<&Artifact> = keep
            .iter()
            .filter_map(|role| self.artifacts.get(*role))
            .collect();
        if stage == Stage::Predict && self.uses_neighbor_lookup() {
            required.extend(self.artifacts.get(ArtifactRole::XTrain));
        }
        // Keras classifiers size their output layer from the label encoder.
        if stage == Stage::Train && self.backend == Backend::Keras && self.task == Task::Classification {
            required.extend(self.artifacts.get(ArtifactRole::LabelEncoder));
        }
        required
    }

    pub fn metrics(&self) -> impl Iterator<Item = MetricKind> + '_ {
        self.spec.metrics.iter().copied()
    }

    pub fn plots(&self) -> impl Iterator<Item = PlotKind> + '_ {
        self.spec.plots.iter().copied()
    }
}

/// Resolve `spec` into a plan, or report why it cannot be generated.
pub fn resolve(spec: &DataAnalyticsSpec, diagnostics: &mut Diagnostics) -> Option<GenerationPlan> {
    let subject = spec.algorithm.name();
    if spec.features.is_empty() {
        diagnostics.fail(
            DiagnosticKind::MissingDeclaration,
            &spec.name,
            "no features declared",
        );
        return None;
    }
    if spec.prediction_results.is_empty() {
        diagnostics.fail(
            DiagnosticKind::MissingDeclaration,
            &spec.name,
            "no prediction result declared",
        );
        return None;
    }

    // Array columns are parsed as numbers on both sides of the split.
    let label_arrays: Vec<&Feature> = spec
        .features
        .iter()
        .chain(&spec.prediction_results)
        .filter(|f| f.is_array && f.ty.is_categorical())
        .collect();
    if !label_arrays.is_empty() {
        for feature in label_arrays {
            diagnostics.fail(
                DiagnosticKind::UnsupportedArrayType,
                &feature.name,
                format!(
                    "arrays of {} are not supported, use a numeric element type",
                    feature.ty
                ),
            );
        }
        return None;
    }

    let task = resolve_task(spec, diagnostics)?;
    let backend = select_backend(spec, diagnostics)?;
    if backend == Backend::Keras && task == Task::Classification && spec.prediction_results.len() > 1
    {
        diagnostics.fail(
            DiagnosticKind::UnsupportedBackend,
            subject,
            "a Keras classifier predicts a single result",
        );
        return None;
    }

    let automl = spec.automl;
    let model = match &spec.algorithm {
        ModelAlgorithm::LinearRegression(p) => {
            ModelCode::Estimator(linear::linear_regression(p, automl, diagnostics))
        }
        ModelAlgorithm::LogisticRegression(p) => {
            ModelCode::Estimator(linear::logistic_regression(p, automl, diagnostics))
        }
        ModelAlgorithm::GaussianNb(p) => {
            ModelCode::Estimator(naive_bayes::gaussian(spec, p, diagnostics))
        }
        ModelAlgorithm::MultinomialNb(p) => {
            ModelCode::Estimator(naive_bayes::multinomial(spec, p, diagnostics))
        }
        ModelAlgorithm::ComplementNb(p) => {
            ModelCode::Estimator(naive_bayes::complement(spec, p, diagnostics))
        }
        ModelAlgorithm::BernoulliNb(p) => {
            ModelCode::Estimator(naive_bayes::bernoulli(spec, p, diagnostics))
        }
        ModelAlgorithm::CategoricalNb(p) => {
            ModelCode::Estimator(naive_bayes::categorical(spec, p, diagnostics))
        }
        ModelAlgorithm::MixedNb(p) => ModelCode::Estimator(naive_bayes::mixed(spec, p, diagnostics)),
        ModelAlgorithm::DecisionTreeRegressor(p) | ModelAlgorithm::DecisionTreeClassifier(p) => {
            ModelCode::Estimator(trees::decision_tree(p, task, automl, diagnostics))
        }
        ModelAlgorithm::RandomForestRegressor(p) | ModelAlgorithm::RandomForestClassifier(p) => {
            ModelCode::Estimator(trees::random_forest(p, task, automl, diagnostics))
        }
        ModelAlgorithm::MultilayerPerceptron(p) => match backend {
            Backend::ScikitLearn => ModelCode::Estimator(neural::mlp(p, task, automl, diagnostics)),
            Backend::Keras => {
                ModelCode::Keras(neural::keras_network(p, task, automl, diagnostics))
            }
        },
        ModelAlgorithm::KMeans(p) => {
            ModelCode::Estimator(clustering::kmeans(p, automl, diagnostics))
        }
        ModelAlgorithm::MiniBatchKMeans(p) => {
            ModelCode::Estimator(clustering::mini_batch_kmeans(p, automl, diagnostics))
        }
        ModelAlgorithm::Dbscan(p) => ModelCode::Estimator(clustering::dbscan(p, automl, diagnostics)),
        ModelAlgorithm::SpectralClustering(p) => {
            ModelCode::Estimator(clustering::spectral(p, automl, diagnostics))
        }
        ModelAlgorithm::GaussianMixture(p) => {
            ModelCode::Estimator(clustering::gaussian_mixture(p, automl, diagnostics))
        }
        ModelAlgorithm::SelfTraining(p) => {
            ModelCode::Estimator(semi_supervised::self_training(p, automl, diagnostics))
        }
        ModelAlgorithm::LabelPropagation(p) => {
            ModelCode::Estimator(semi_supervised::label_propagation(p, automl, diagnostics))
        }
        ModelAlgorithm::LabelSpreading(p) => {
            ModelCode::Estimator(semi_supervised::label_spreading(p, automl, diagnostics))
        }
    };

    let mut normalizer = spec.sample_normalizer;
    if let (Some(scaler), Some(norm)) = (spec.feature_scaler, normalizer) {
        diagnostics.warn(
            DiagnosticKind::ConflictingPreprocessing,
            &spec.name,
            format!(
                "{} and the '{}' sample normalizer are mutually exclusive; the normalizer is dropped",
                scaler.class_name(),
                norm.norm()
            ),
        );
        normalizer = None;
    }

    check_outputs(spec, task, diagnostics);

    let abbrev = abbreviation(&spec.algorithm, task, backend);
    let scaled = spec.feature_scaler.is_some() || normalizer.is_some();
    let artifacts = ArtifactSet::for_plan(spec, task, backend, &abbrev, scaled);

    Some(GenerationPlan {
        spec: spec.clone(),
        algorithm: subject,
        abbrev,
        backend,
        task,
        model,
        scaler: spec.feature_scaler,
        normalizer,
        artifacts,
    })
}

fn required_paradigm(algorithm: &ModelAlgorithm) -> Paradigm {
    if algorithm.is_clustering() {
        Paradigm::Unsupervised
    } else if algorithm.is_semi_supervised() {
        Paradigm::SemiSupervised
    } else {
        Paradigm::Supervised
    }
}

fn resolve_task(spec: &DataAnalyticsSpec, diagnostics: &mut Diagnostics) -> Option<Task> {
    let algorithm = &spec.algorithm;
    let subject = algorithm.name();
    let expected = required_paradigm(algorithm);
    if spec.paradigm != expected {
        diagnostics.fail(
            DiagnosticKind::ParadigmMismatch,
            subject,
            format!(
                "{} is {} (labels={}) but the spec declares labels={}",
                subject,
                expected,
                expected.label_token(),
                spec.paradigm.label_token()
            ),
        );
        return None;
    }

    let categorical = spec.has_categorical_target();
    let continuous = spec.has_continuous_target();
    let (task, mismatch) = match algorithm {
        ModelAlgorithm::KMeans(_)
        | ModelAlgorithm::MiniBatchKMeans(_)
        | ModelAlgorithm::Dbscan(_)
        | ModelAlgorithm::SpectralClustering(_)
        | ModelAlgorithm::GaussianMixture(_) => (
            Task::Clustering,
            categorical.then_some("cluster ids are numeric, the prediction result is not"),
        ),
        ModelAlgorithm::SelfTraining(_)
        | ModelAlgorithm::LabelPropagation(_)
        | ModelAlgorithm::LabelSpreading(_) => (
            Task::SemiSupervised,
            continuous.then_some("a classifier cannot predict a continuous result"),
        ),
        ModelAlgorithm::LinearRegression(_)
        | ModelAlgorithm::DecisionTreeRegressor(_)
        | ModelAlgorithm::RandomForestRegressor(_) => (
            Task::Regression,
            categorical.then_some("a regressor cannot predict a categorical result"),
        ),
        ModelAlgorithm::MultilayerPerceptron(_) if continuous => (
            Task::Regression,
            categorical.then_some("results mix continuous and categorical types"),
        ),
        _ => (
            Task::Classification,
            continuous.then_some("a classifier cannot predict a continuous result"),
        ),
    };

    if let Some(reason) = mismatch {
        let types = spec
            .prediction_results
            .iter()
            .map(|f| format!("{}: {}", f.name, f.type_name()))
            .collect::<Vec<_>>()
            .join(", ");
        diagnostics.fail(
            DiagnosticKind::TargetTypeMismatch,
            subject,
            format!("{reason} ({types})"),
        );
        return None;
    }
    Some(task)
}

fn select_backend(spec: &DataAnalyticsSpec, diagnostics: &mut Diagnostics) -> Option<Backend> {
    let is_mlp = matches!(spec.algorithm, ModelAlgorithm::MultilayerPerceptron(_));
    match spec.library {
        Library::Auto if is_mlp => Some(Backend::Keras),
        Library::Auto | Library::ScikitLearn => Some(Backend::ScikitLearn),
        Library::Keras if is_mlp => Some(Backend::Keras),
        Library::Keras => {
            diagnostics.fail(
                DiagnosticKind::UnsupportedBackend,
                spec.algorithm.name(),
                format!(
                    "({}, keras) is not supported; keras only provides MultilayerPerceptron",
                    spec.algorithm.name()
                ),
            );
            None
        }
    }
}

/// Inapplicable outputs are still emitted; each is guarded at run time.
fn check_outputs(spec: &DataAnalyticsSpec, task: Task, diagnostics: &mut Diagnostics) {
    let subject = spec.algorithm.name();
    for metric in spec.metrics.iter().filter(|m| !task.metric_applies(**m)) {
        diagnostics.warn(
            DiagnosticKind::InapplicableOutput,
            subject,
            format!("metric '{}' is not meaningful for {}", metric.label(), task),
        );
    }
    for plot in spec.plots.iter().filter(|p| !task.plot_applies(**p)) {
        diagnostics.warn(
            DiagnosticKind::InapplicableOutput,
            subject,
            format!("plot '{}' is not meaningful for {}", plot.as_str(), task),
        );
    }
}

/// Short token used in artifact file names.
pub fn abbreviation(algorithm: &ModelAlgorithm, task: Task, backend: Backend) -> String {
    let base = match algorithm {
        ModelAlgorithm::LinearRegression(_) => "linreg",
        ModelAlgorithm::LogisticRegression(_) => "logreg",
        ModelAlgorithm::GaussianNb(_) => "gnb",
        ModelAlgorithm::MultinomialNb(_) => "mnb",
        ModelAlgorithm::ComplementNb(_) => "cnb",
        ModelAlgorithm::BernoulliNb(_) => "bnb",
        ModelAlgorithm::CategoricalNb(_) => "catnb",
        ModelAlgorithm::MixedNb(_) => "mixnb",
        ModelAlgorithm::DecisionTreeRegressor(_) => "dtr",
        ModelAlgorithm::DecisionTreeClassifier(_) => "dtc",
        ModelAlgorithm::RandomForestRegressor(_) => "rfr",
        ModelAlgorithm::RandomForestClassifier(_) => "rfc",
        ModelAlgorithm::MultilayerPerceptron(_) if task == Task::Regression => "mlpr",
        ModelAlgorithm::MultilayerPerceptron(_) => "mlpc",
        ModelAlgorithm::KMeans(_) => "kmeans",
        ModelAlgorithm::MiniBatchKMeans(_) => "mbkmeans",
        ModelAlgorithm::Dbscan(_) => "dbscan",
        ModelAlgorithm::SpectralClustering(_) => "spectral",
        ModelAlgorithm::GaussianMixture(_) => "gmm",
        ModelAlgorithm::SelfTraining(_) => "selftraining",
        ModelAlgorithm::LabelPropagation(_) => "labelprop",
        ModelAlgorithm::LabelSpreading(_) => "labelspread",
    };
    match backend {
        Backend::Keras => format!("{base}_keras"),
        Backend::ScikitLearn => base.to_string(),
    }
}

/// Fill AutoML values that can be derived from the spec itself.
///
/// Runs at most once per spec: the `automl_applied` marker makes repeated
/// generation leave the spec untouched. Values that depend on the dataset
/// size are not filled here; the binder renders them as run-time branches.
/// Returns whether the spec changed.
pub fn apply_automl_upgrade(spec: &mut DataAnalyticsSpec) -> bool {
    if !spec.automl || spec.automl_applied {
        return false;
    }

    // Column positions are only known statically when no array feature is
    // flattened into extra columns.
    let width = (!spec.has_array_features()).then_some(spec.features.len() as i64);
    let categorical: Vec<i64> = spec
        .features
        .iter()
        .enumerate()
        .filter(|(_, f)| f.ty.is_categorical())
        .map(|(i, _)| i as i64)
        .collect();

    let wants_scaler = matches!(
        spec.algorithm,
        ModelAlgorithm::MultilayerPerceptron(_) | ModelAlgorithm::LogisticRegression(_)
    );
    match &mut spec.algorithm {
        ModelAlgorithm::Dbscan(p) if p.min_samples.is_none() => {
            p.min_samples = width.map(|n| 2 * n);
        }
        ModelAlgorithm::MixedNb(p) if p.categorical_features.is_none() => {
            if width.is_some() && !categorical.is_empty() {
                p.categorical_features = Some(categorical);
            }
        }
        _ => {}
    }
    if wants_scaler && spec.feature_scaler.is_none() && spec.sample_normalizer.is_none() {
        spec.feature_scaler = Some(FeatureScaler::Standard);
    }

    spec.automl_applied = true;
    tracing::debug!(spec = %spec.name, "AutoML upgrade applied");
    true
}
