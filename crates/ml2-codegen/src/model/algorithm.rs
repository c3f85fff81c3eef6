//! Algorithm variants and their hyperparameter fields.
//!
//! Every field is optional: `None` means "unset", which is distinct from any
//! legal value and lets the library default apply. Fields are declared in the
//! same order the estimator constructor lists them, which is also the order
//! they are rendered in.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::render::Literal;

/// Declares a closed enum of library tokens with `as_str()` and literal
/// conversion.
macro_rules! token_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $token)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for Literal {
            fn from(value: $name) -> Self {
                Literal::Str(value.as_str().to_string())
            }
        }
    };
}

/// A numeric hyperparameter that accepts either a count or a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(v) => *v as f64,
            Number::Float(v) => *v,
        }
    }
}

/// A free-form value: symbols are copied verbatim, text is quoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeForm {
    Symbol(String),
    Text(String),
}

token_enum!(
    /// Logistic regression regularization.
    Penalty {
        L1 => "l1",
        L2 => "l2",
        ElasticNet => "elasticnet",
        Unpenalized => "none",
    }
);

token_enum!(
    LogisticSolver {
        Lbfgs => "lbfgs",
        Liblinear => "liblinear",
        NewtonCg => "newton-cg",
        NewtonCholesky => "newton-cholesky",
        Sag => "sag",
        Saga => "saga",
    }
);

token_enum!(
    MultiClass {
        Auto => "auto",
        Ovr => "ovr",
        Multinomial => "multinomial",
    }
);

token_enum!(
    ClassWeight {
        Balanced => "balanced",
        BalancedSubsample => "balanced_subsample",
    }
);

token_enum!(
    /// Split quality measure. The first three are for classifiers, the rest
    /// for regressors.
    TreeCriterion {
        Gini => "gini",
        Entropy => "entropy",
        LogLoss => "log_loss",
        SquaredError => "squared_error",
        FriedmanMse => "friedman_mse",
        AbsoluteError => "absolute_error",
        Poisson => "poisson",
    }
);

impl TreeCriterion {
    pub fn is_classification(&self) -> bool {
        matches!(
            self,
            TreeCriterion::Gini | TreeCriterion::Entropy | TreeCriterion::LogLoss
        )
    }
}

token_enum!(
    Splitter {
        Best => "best",
        Random => "random",
    }
);

token_enum!(
    Activation {
        Identity => "identity",
        Logistic => "logistic",
        Tanh => "tanh",
        Relu => "relu",
    }
);

token_enum!(
    MlpSolver {
        Lbfgs => "lbfgs",
        Sgd => "sgd",
        Adam => "adam",
    }
);

token_enum!(
    LearningRateSchedule {
        Constant => "constant",
        InvScaling => "invscaling",
        Adaptive => "adaptive",
    }
);

token_enum!(
    KMeansInit {
        KMeansPlusPlus => "k-means++",
        Random => "random",
    }
);

token_enum!(
    KMeansAlgorithm {
        Lloyd => "lloyd",
        Elkan => "elkan",
    }
);

token_enum!(
    DistanceMetric {
        Euclidean => "euclidean",
        Manhattan => "manhattan",
        Chebyshev => "chebyshev",
        Minkowski => "minkowski",
        Cosine => "cosine",
    }
);

token_enum!(
    NeighborAlgorithm {
        Auto => "auto",
        BallTree => "ball_tree",
        KdTree => "kd_tree",
        Brute => "brute",
    }
);

token_enum!(
    Affinity {
        Rbf => "rbf",
        NearestNeighbors => "nearest_neighbors",
        Poly => "poly",
        Sigmoid => "sigmoid",
        Laplacian => "laplacian",
        Linear => "linear",
    }
);

token_enum!(
    EigenSolver {
        Arpack => "arpack",
        Lobpcg => "lobpcg",
        Amg => "amg",
    }
);

token_enum!(
    AssignLabels {
        Kmeans => "kmeans",
        Discretize => "discretize",
        ClusterQr => "cluster_qr",
    }
);

token_enum!(
    CovarianceType {
        Full => "full",
        Tied => "tied",
        Diag => "diag",
        Spherical => "spherical",
    }
);

token_enum!(
    MixtureInit {
        Kmeans => "kmeans",
        KMeansPlusPlus => "k-means++",
        Random => "random",
        RandomFromData => "random_from_data",
    }
);

token_enum!(
    SelfTrainingCriterion {
        Threshold => "threshold",
        KBest => "k_best",
    }
);

token_enum!(
    LabelKernel {
        Rbf => "rbf",
        Knn => "knn",
    }
);

/// Probabilistic classifier wrapped by self-training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseEstimator {
    Svc,
    GaussianNb,
    DecisionTree,
    RandomForest,
    LogisticRegression,
    KNeighbors,
}

impl BaseEstimator {
    /// Import line and constructor expression.
    pub fn python(&self) -> (&'static str, &'static str) {
        match self {
            BaseEstimator::Svc => ("from sklearn.svm import SVC", "SVC(probability=True)"),
            BaseEstimator::GaussianNb => {
                ("from sklearn.naive_bayes import GaussianNB", "GaussianNB()")
            }
            BaseEstimator::DecisionTree => (
                "from sklearn.tree import DecisionTreeClassifier",
                "DecisionTreeClassifier()",
            ),
            BaseEstimator::RandomForest => (
                "from sklearn.ensemble import RandomForestClassifier",
                "RandomForestClassifier()",
            ),
            BaseEstimator::LogisticRegression => (
                "from sklearn.linear_model import LogisticRegression",
                "LogisticRegression(max_iter=1000)",
            ),
            BaseEstimator::KNeighbors => (
                "from sklearn.neighbors import KNeighborsClassifier",
                "KNeighborsClassifier()",
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearRegressionParams {
    pub fit_intercept: Option<bool>,
    pub copy_x: Option<bool>,
    pub n_jobs: Option<i64>,
    pub positive: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticRegressionParams {
    pub penalty: Option<Penalty>,
    pub dual: Option<bool>,
    pub tol: Option<f64>,
    pub c: Option<f64>,
    pub fit_intercept: Option<bool>,
    pub intercept_scaling: Option<f64>,
    pub class_weight: Option<ClassWeight>,
    pub random_state: Option<i64>,
    pub solver: Option<LogisticSolver>,
    pub max_iter: Option<i64>,
    pub multi_class: Option<MultiClass>,
    pub verbose: Option<i64>,
    pub warm_start: Option<bool>,
    pub n_jobs: Option<i64>,
    pub l1_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianNbParams {
    pub priors: Option<Vec<f64>>,
    pub var_smoothing: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultinomialNbParams {
    pub alpha: Option<f64>,
    pub force_alpha: Option<bool>,
    pub fit_prior: Option<bool>,
    pub class_prior: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplementNbParams {
    pub alpha: Option<f64>,
    pub force_alpha: Option<bool>,
    pub fit_prior: Option<bool>,
    pub class_prior: Option<Vec<f64>>,
    pub norm: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BernoulliNbParams {
    pub alpha: Option<f64>,
    pub force_alpha: Option<bool>,
    pub binarize: Option<f64>,
    pub fit_prior: Option<bool>,
    pub class_prior: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoricalNbParams {
    pub alpha: Option<f64>,
    pub force_alpha: Option<bool>,
    pub fit_prior: Option<bool>,
    pub class_prior: Option<Vec<f64>>,
    pub min_categories: Option<i64>,
}

/// Parameters of `mixed_naive_bayes.MixedNB`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixedNbParams {
    pub categorical_features: Option<Vec<i64>>,
    pub max_categories: Option<Vec<i64>>,
    pub alpha: Option<f64>,
    pub priors: Option<Vec<f64>>,
    pub var_smoothing: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionTreeParams {
    pub criterion: Option<TreeCriterion>,
    pub splitter: Option<Splitter>,
    pub max_depth: Option<i64>,
    pub min_samples_split: Option<Number>,
    pub min_samples_leaf: Option<Number>,
    pub min_weight_fraction_leaf: Option<f64>,
    pub max_features: Option<FreeForm>,
    pub random_state: Option<i64>,
    pub max_leaf_nodes: Option<i64>,
    pub min_impurity_decrease: Option<f64>,
    pub class_weight: Option<ClassWeight>,
    pub ccp_alpha: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestParams {
    pub n_estimators: Option<i64>,
    pub criterion: Option<TreeCriterion>,
    pub max_depth: Option<i64>,
    pub min_samples_split: Option<Number>,
    pub min_samples_leaf: Option<Number>,
    pub min_weight_fraction_leaf: Option<f64>,
    pub max_features: Option<FreeForm>,
    pub max_leaf_nodes: Option<i64>,
    pub min_impurity_decrease: Option<f64>,
    pub bootstrap: Option<bool>,
    pub oob_score: Option<bool>,
    pub n_jobs: Option<i64>,
    pub random_state: Option<i64>,
    pub verbose: Option<i64>,
    pub warm_start: Option<bool>,
    pub class_weight: Option<ClassWeight>,
    pub ccp_alpha: Option<f64>,
    pub max_samples: Option<Number>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpParams {
    pub hidden_layer_sizes: Option<Vec<i64>>,
    pub activation: Option<Activation>,
    pub solver: Option<MlpSolver>,
    pub alpha: Option<f64>,
    pub batch_size: Option<i64>,
    pub learning_rate: Option<LearningRateSchedule>,
    pub learning_rate_init: Option<f64>,
    pub power_t: Option<f64>,
    pub max_iter: Option<i64>,
    pub shuffle: Option<bool>,
    pub random_state: Option<i64>,
    pub tol: Option<f64>,
    pub verbose: Option<bool>,
    pub warm_start: Option<bool>,
    pub momentum: Option<f64>,
    pub nesterovs_momentum: Option<bool>,
    pub early_stopping: Option<bool>,
    pub validation_fraction: Option<f64>,
    pub beta_1: Option<f64>,
    pub beta_2: Option<f64>,
    pub epsilon: Option<f64>,
    pub n_iter_no_change: Option<i64>,
    pub max_fun: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansParams {
    pub n_clusters: Option<i64>,
    pub init: Option<KMeansInit>,
    pub n_init: Option<i64>,
    pub max_iter: Option<i64>,
    pub tol: Option<f64>,
    pub verbose: Option<i64>,
    pub random_state: Option<i64>,
    pub copy_x: Option<bool>,
    pub algorithm: Option<KMeansAlgorithm>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiniBatchKMeansParams {
    pub n_clusters: Option<i64>,
    pub init: Option<KMeansInit>,
    pub max_iter: Option<i64>,
    pub batch_size: Option<i64>,
    pub verbose: Option<i64>,
    pub compute_labels: Option<bool>,
    pub random_state: Option<i64>,
    pub tol: Option<f64>,
    pub max_no_improvement: Option<i64>,
    pub init_size: Option<i64>,
    pub n_init: Option<i64>,
    pub reassignment_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbscanParams {
    pub eps: Option<f64>,
    pub min_samples: Option<i64>,
    pub metric: Option<DistanceMetric>,
    pub algorithm: Option<NeighborAlgorithm>,
    pub leaf_size: Option<i64>,
    pub p: Option<f64>,
    pub n_jobs: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralClusteringParams {
    pub n_clusters: Option<i64>,
    pub eigen_solver: Option<EigenSolver>,
    pub n_components: Option<i64>,
    pub random_state: Option<i64>,
    pub n_init: Option<i64>,
    pub gamma: Option<f64>,
    pub affinity: Option<Affinity>,
    pub n_neighbors: Option<i64>,
    pub eigen_tol: Option<f64>,
    pub assign_labels: Option<AssignLabels>,
    pub degree: Option<f64>,
    pub coef0: Option<f64>,
    pub n_jobs: Option<i64>,
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianMixtureParams {
    pub n_components: Option<i64>,
    pub covariance_type: Option<CovarianceType>,
    pub tol: Option<f64>,
    pub reg_covar: Option<f64>,
    pub max_iter: Option<i64>,
    pub n_init: Option<i64>,
    pub init_params: Option<MixtureInit>,
    pub random_state: Option<i64>,
    pub warm_start: Option<bool>,
    pub verbose: Option<i64>,
    pub verbose_interval: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfTrainingParams {
    pub base_estimator: Option<BaseEstimator>,
    pub threshold: Option<f64>,
    pub criterion: Option<SelfTrainingCriterion>,
    pub k_best: Option<i64>,
    pub max_iter: Option<i64>,
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelPropagationParams {
    pub kernel: Option<LabelKernel>,
    pub gamma: Option<f64>,
    pub n_neighbors: Option<i64>,
    pub max_iter: Option<i64>,
    pub tol: Option<f64>,
    pub n_jobs: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSpreadingParams {
    pub kernel: Option<LabelKernel>,
    pub gamma: Option<f64>,
    pub n_neighbors: Option<i64>,
    pub alpha: Option<f64>,
    pub max_iter: Option<i64>,
    pub tol: Option<f64>,
    pub n_jobs: Option<i64>,
}

/// The algorithm bound to a spec, with its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelAlgorithm {
    LinearRegression(LinearRegressionParams),
    LogisticRegression(LogisticRegressionParams),
    GaussianNb(GaussianNbParams),
    MultinomialNb(MultinomialNbParams),
    ComplementNb(ComplementNbParams),
    BernoulliNb(BernoulliNbParams),
    CategoricalNb(CategoricalNbParams),
    MixedNb(MixedNbParams),
    DecisionTreeRegressor(DecisionTreeParams),
    DecisionTreeClassifier(DecisionTreeParams),
    RandomForestRegressor(RandomForestParams),
    RandomForestClassifier(RandomForestParams),
    MultilayerPerceptron(MlpParams),
    #[serde(rename = "kmeans")]
    KMeans(KMeansParams),
    #[serde(rename = "mini_batch_kmeans")]
    MiniBatchKMeans(MiniBatchKMeansParams),
    Dbscan(DbscanParams),
    SpectralClustering(SpectralClusteringParams),
    GaussianMixture(GaussianMixtureParams),
    SelfTraining(SelfTrainingParams),
    LabelPropagation(LabelPropagationParams),
    LabelSpreading(LabelSpreadingParams),
}

impl ModelAlgorithm {
    /// Human-readable name used in diagnostics and reports.
    pub fn name(&self) -> &'static str {
        match self {
            ModelAlgorithm::LinearRegression(_) => "LinearRegression",
            ModelAlgorithm::LogisticRegression(_) => "LogisticRegression",
            ModelAlgorithm::GaussianNb(_) => "GaussianNB",
            ModelAlgorithm::MultinomialNb(_) => "MultinomialNB",
            ModelAlgorithm::ComplementNb(_) => "ComplementNB",
            ModelAlgorithm::BernoulliNb(_) => "BernoulliNB",
            ModelAlgorithm::CategoricalNb(_) => "CategoricalNB",
            ModelAlgorithm::MixedNb(_) => "MixedNB",
            ModelAlgorithm::DecisionTreeRegressor(_) => "DecisionTreeRegressor",
            ModelAlgorithm::DecisionTreeClassifier(_) => "DecisionTreeClassifier",
            ModelAlgorithm::RandomForestRegressor(_) => "RandomForestRegressor",
            ModelAlgorithm::RandomForestClassifier(_) => "RandomForestClassifier",
            ModelAlgorithm::MultilayerPerceptron(_) => "MultilayerPerceptron",
            ModelAlgorithm::KMeans(_) => "KMeans",
            ModelAlgorithm::MiniBatchKMeans(_) => "MiniBatchKMeans",
            ModelAlgorithm::Dbscan(_) => "DBSCAN",
            ModelAlgorithm::SpectralClustering(_) => "SpectralClustering",
            ModelAlgorithm::GaussianMixture(_) => "GaussianMixture",
            ModelAlgorithm::SelfTraining(_) => "SelfTrainingClassifier",
            ModelAlgorithm::LabelPropagation(_) => "LabelPropagation",
            ModelAlgorithm::LabelSpreading(_) => "LabelSpreading",
        }
    }

    pub fn is_clustering(&self) -> bool {
        matches!(
            self,
            ModelAlgorithm::KMeans(_)
                | ModelAlgorithm::MiniBatchKMeans(_)
                | ModelAlgorithm::Dbscan(_)
                | ModelAlgorithm::SpectralClustering(_)
                | ModelAlgorithm::GaussianMixture(_)
        )
    }

    pub fn is_semi_supervised(&self) -> bool {
        matches!(
            self,
            ModelAlgorithm::SelfTraining(_)
                | ModelAlgorithm::LabelPropagation(_)
                | ModelAlgorithm::LabelSpreading(_)
        )
    }
}
