//! The data-analytics domain model consumed by the generator.
//!
//! A [`DataAnalyticsSpec`] is the already validated, well-typed description
//! of one statechart region's ML behaviour. The generator only reads it,
//! except for the one-time AutoML upgrade that fills unset hyperparameters
//! (see [`crate::catalog::apply_automl_upgrade`]).

mod algorithm;

pub use algorithm::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Native (host-side) type of a feature or prediction result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeType {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
}

impl NativeType {
    /// Type token used on the argument contract (`int`, `double`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            NativeType::Boolean => "boolean",
            NativeType::Char => "char",
            NativeType::Byte => "byte",
            NativeType::Short => "short",
            NativeType::Int => "int",
            NativeType::Long => "long",
            NativeType::Float => "float",
            NativeType::Double => "double",
            NativeType::String => "string",
        }
    }

    /// Java spelling of the type.
    pub fn java_type(&self) -> &'static str {
        match self {
            NativeType::String => "String",
            other => other.as_str(),
        }
    }

    /// Values are labels rather than quantities.
    pub fn is_categorical(&self) -> bool {
        matches!(
            self,
            NativeType::Boolean | NativeType::Char | NativeType::String
        )
    }

    /// Values are real-valued quantities.
    pub fn is_continuous(&self) -> bool {
        matches!(self, NativeType::Float | NativeType::Double)
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            NativeType::Byte | NativeType::Short | NativeType::Int | NativeType::Long
        )
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed column: either an input feature or a prediction result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: NativeType,
    #[serde(default)]
    pub is_array: bool,
}

impl Feature {
    pub fn scalar(name: impl Into<String>, ty: NativeType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_array: false,
        }
    }

    pub fn array(name: impl Into<String>, ty: NativeType) -> Self {
        Self {
            name: name.into(),
            ty,
            is_array: true,
        }
    }

    /// Type name as passed to the scripts; arrays carry a `[]` suffix.
    pub fn type_name(&self) -> String {
        if self.is_array {
            format!("{}[]", self.ty.as_str())
        } else {
            self.ty.as_str().to_string()
        }
    }
}

/// Learning paradigm, carried in the model as the `labels` tri-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Paradigm {
    #[serde(rename = "ON", alias = "supervised")]
    Supervised,
    #[serde(rename = "OFF", alias = "unsupervised")]
    Unsupervised,
    #[serde(rename = "SEMI", alias = "semi_supervised")]
    SemiSupervised,
}

impl Paradigm {
    pub fn label_token(&self) -> &'static str {
        match self {
            Paradigm::Supervised => "ON",
            Paradigm::Unsupervised => "OFF",
            Paradigm::SemiSupervised => "SEMI",
        }
    }

    /// Whether the preprocess stage holds out a test split.
    pub fn needs_split(&self) -> bool {
        !matches!(self, Paradigm::Unsupervised)
    }

    pub fn uses_labels(&self) -> bool {
        !matches!(self, Paradigm::Unsupervised)
    }
}

impl fmt::Display for Paradigm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Paradigm::Supervised => "supervised",
            Paradigm::Unsupervised => "unsupervised",
            Paradigm::SemiSupervised => "semi-supervised",
        })
    }
}

/// Column-wise feature scaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureScaler {
    Standard,
    MinMax,
    MaxAbs,
    Robust,
}

impl FeatureScaler {
    pub fn class_name(&self) -> &'static str {
        match self {
            FeatureScaler::Standard => "StandardScaler",
            FeatureScaler::MinMax => "MinMaxScaler",
            FeatureScaler::MaxAbs => "MaxAbsScaler",
            FeatureScaler::Robust => "RobustScaler",
        }
    }

    /// Scaled output may contain negative values.
    pub fn may_produce_negatives(&self) -> bool {
        matches!(self, FeatureScaler::Standard | FeatureScaler::Robust)
    }
}

/// Row-wise sample normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleNormalizer {
    L1,
    L2,
    Max,
}

impl SampleNormalizer {
    pub fn norm(&self) -> &'static str {
        match self {
            SampleNormalizer::L1 => "l1",
            SampleNormalizer::L2 => "l2",
            SampleNormalizer::Max => "max",
        }
    }
}

/// Library preference declared on the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Library {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "scikit-learn", alias = "sklearn")]
    ScikitLearn,
    #[serde(rename = "keras")]
    Keras,
}

/// Concrete numeric library a generated script targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    ScikitLearn,
    Keras,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::ScikitLearn => "scikit-learn",
            Backend::Keras => "keras",
        }
    }

    /// Extension of the persisted model artifact.
    pub fn model_extension(&self) -> &'static str {
        match self {
            Backend::ScikitLearn => "pickle",
            Backend::Keras => "h5",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics the HTML report can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Rmse,
    Mae,
    Mse,
    R2,
    Accuracy,
    ClassificationReport,
}

impl MetricKind {
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Rmse => "RMSE",
            MetricKind::Mae => "MAE",
            MetricKind::Mse => "MSE",
            MetricKind::R2 => "R2",
            MetricKind::Accuracy => "accuracy",
            MetricKind::ClassificationReport => "classification report",
        }
    }

    pub fn is_regression_metric(&self) -> bool {
        matches!(
            self,
            MetricKind::Rmse | MetricKind::Mae | MetricKind::Mse | MetricKind::R2
        )
    }
}

/// Plots the train stage can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    Heatmap,
    BoxPlot,
    ClassImbalance,
    PairPlot,
    ConfusionMatrix,
    PrecisionRecallCurve,
    RocCurve,
    LearningCurve,
    ClusteringScatter,
}

impl PlotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlotKind::Heatmap => "heatmap",
            PlotKind::BoxPlot => "box_plot",
            PlotKind::ClassImbalance => "class_imbalance",
            PlotKind::PairPlot => "pair_plot",
            PlotKind::ConfusionMatrix => "confusion_matrix",
            PlotKind::PrecisionRecallCurve => "precision_recall_curve",
            PlotKind::RocCurve => "roc_curve",
            PlotKind::LearningCurve => "learning_curve",
            PlotKind::ClusteringScatter => "clustering_scatter",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.png", self.as_str())
    }
}

/// Pre-trained artifacts used by the blackbox (pre-trained predict) mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackboxConfig {
    /// Path to a pickled estimator or a Keras `.h5` file.
    pub model: String,
    #[serde(default)]
    pub label_encoder: Option<String>,
    #[serde(default)]
    pub scaler: Option<String>,
    #[serde(default)]
    pub feature_encoders: Option<String>,
}

impl BlackboxConfig {
    pub fn is_keras_model(&self) -> bool {
        self.model.to_ascii_lowercase().ends_with(".h5")
    }
}

/// Root configuration for one statechart region's ML behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataAnalyticsSpec {
    pub name: String,
    pub features: Vec<Feature>,
    pub prediction_results: Vec<Feature>,
    #[serde(rename = "labels")]
    pub paradigm: Paradigm,
    #[serde(default)]
    pub sequential: bool,
    #[serde(default)]
    pub timestamps: bool,
    #[serde(default)]
    pub automl: bool,
    #[serde(default)]
    pub feature_scaler: Option<FeatureScaler>,
    #[serde(default)]
    pub sample_normalizer: Option<SampleNormalizer>,
    pub algorithm: ModelAlgorithm,
    #[serde(default)]
    pub library: Library,
    pub dataset: String,
    pub training_results: String,
    #[serde(default)]
    pub metrics: BTreeSet<MetricKind>,
    #[serde(default)]
    pub plots: BTreeSet<PlotKind>,
    #[serde(default)]
    pub blackbox: Option<BlackboxConfig>,
    /// Set once the AutoML upgrade has filled unset hyperparameters.
    #[serde(default)]
    pub automl_applied: bool,
}

impl DataAnalyticsSpec {
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn label_names(&self) -> Vec<&str> {
        self.prediction_results
            .iter()
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Feature names that must be label-encoded before fitting.
    pub fn categorical_features(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter(|f| f.ty.is_categorical() && !f.is_array)
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn has_array_features(&self) -> bool {
        self.features.iter().any(|f| f.is_array)
    }

    pub fn is_blackbox(&self) -> bool {
        self.blackbox.is_some()
    }

    /// The target is a label (string, char, boolean) rather than a number.
    pub fn has_categorical_target(&self) -> bool {
        self.prediction_results.iter().any(|f| f.ty.is_categorical())
    }

    /// The target is real-valued.
    pub fn has_continuous_target(&self) -> bool {
        self.prediction_results.iter().any(|f| f.ty.is_continuous())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_feature_type_names() {
        assert_eq!(Feature::scalar("age", NativeType::Int).type_name(), "int");
        assert_eq!(
            Feature::array("readings", NativeType::Double).type_name(),
            "double[]"
        );
    }

    #[test]
    fn test_native_type_classes() {
        assert!(NativeType::String.is_categorical());
        assert!(NativeType::Boolean.is_categorical());
        assert!(NativeType::Double.is_continuous());
        assert!(NativeType::Long.is_integral());
        assert!(!NativeType::Int.is_categorical());
        assert_eq!(NativeType::String.java_type(), "String");
        assert_eq!(NativeType::Short.java_type(), "short");
    }

    #[test]
    fn test_spec_from_json() {
        let json = r#"{
            "name": "churn",
            "features": [
                {"name": "age", "type": "int"},
                {"name": "income", "type": "double"},
                {"name": "history", "type": "double", "is_array": true}
            ],
            "prediction_results": [{"name": "category", "type": "string"}],
            "labels": "ON",
            "automl": true,
            "feature_scaler": "min_max",
            "algorithm": {"kind": "decision_tree_classifier", "criterion": "gini"},
            "library": "scikit-learn",
            "dataset": "data/churn.csv",
            "training_results": "results.txt",
            "metrics": ["accuracy", "classification_report"],
            "plots": ["confusion_matrix"]
        }"#;

        let spec: DataAnalyticsSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.paradigm, Paradigm::Supervised);
        assert_eq!(spec.library, Library::ScikitLearn);
        assert_eq!(spec.feature_scaler, Some(FeatureScaler::MinMax));
        assert_eq!(spec.feature_names(), vec!["age", "income", "history"]);
        assert_eq!(spec.label_names(), vec!["category"]);
        assert!(spec.has_array_features());
        assert!(spec.has_categorical_target());
        assert!(!spec.automl_applied);
        assert!(matches!(
            spec.algorithm,
            ModelAlgorithm::DecisionTreeClassifier(DecisionTreeParams {
                criterion: Some(TreeCriterion::Gini),
                ..
            })
        ));
    }

    #[test]
    fn test_paradigm_aliases() {
        let p: Paradigm = serde_json::from_str("\"unsupervised\"").unwrap();
        assert_eq!(p, Paradigm::Unsupervised);
        let p: Paradigm = serde_json::from_str("\"SEMI\"").unwrap();
        assert_eq!(p.label_token(), "SEMI");
        assert!(!Paradigm::Unsupervised.needs_split());
    }

    #[test]
    fn test_blackbox_keras_detection() {
        let config = BlackboxConfig {
            model: "models/net.H5".to_string(),
            label_encoder: None,
            scaler: None,
            feature_encoders: None,
        };
        assert!(config.is_keras_model());
    }
}
