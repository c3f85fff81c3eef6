//! Preprocess stage: load, encode, split, scale and persist.

use crate::catalog::{ArtifactRole, GenerationPlan, Task};
use crate::config::GeneratorConfig;
use crate::model::{Backend, Paradigm};
use crate::render::{Dialect, render_float};
use crate::template::{Vars, indent};

use super::{Imports, lines, py_str, py_str_list};

pub(super) fn fill(
    plan: &GenerationPlan,
    config: &GeneratorConfig,
    imports: &mut Imports,
    vars: &mut Vars,
) {
    let spec = &plan.spec;
    let label_arrays: Vec<&str> = spec
        .prediction_results
        .iter()
        .filter(|f| f.is_array)
        .map(|f| f.name.as_str())
        .collect();

    imports.add("from sklearn.preprocessing import LabelEncoder");
    if spec.paradigm.needs_split() {
        imports.add("from sklearn.model_selection import train_test_split");
    }

    vars.set("label_arrays", py_str_list(&label_arrays))
        .set("encoded_labels", py_str_list(&encoded_labels(plan)))
        .set("test_size", render_float(config.test_size, Dialect::Python))
        .set(
            "random_state",
            config
                .random_state
                .map_or_else(|| "None".to_string(), |seed| seed.to_string()),
        )
        .set("timestamp_block", indent(&timestamp_block(plan), 1))
        .set("select_block", indent(&select_block(plan), 1))
        .set("encode_block", indent(&encode_block(plan), 1))
        .set("split_block", indent(&split_block(plan), 1))
        .set("scale_block", indent(&scale_block(plan, imports), 1))
        .set("dump_block", indent(&dump_block(plan), 1));
}

/// Labels turned into class indices by the label encoder artifact.
fn encoded_labels(plan: &GenerationPlan) -> Vec<&str> {
    if !plan.artifacts.has(ArtifactRole::LabelEncoder) {
        return Vec::new();
    }
    let keras_classifier = plan.backend == Backend::Keras && plan.task == Task::Classification;
    plan.spec
        .prediction_results
        .iter()
        .filter(|f| !f.is_array && (keras_classifier || f.ty.is_categorical()))
        .map(|f| f.name.as_str())
        .collect()
}

fn timestamp_block(plan: &GenerationPlan) -> String {
    if !plan.spec.timestamps {
        return String::new();
    }
    "\
if timestamps:
    if not pd.api.types.is_numeric_dtype(data['timestamp']):
        data['timestamp'] = pd.to_datetime(data['timestamp']).astype('int64') // 10**9
    features = features + ['timestamp']
    types = types + ['long']"
        .to_string()
}

fn select_block(plan: &GenerationPlan) -> String {
    let arrays = "array_features = [name for name, type_name in zip(features, types) if type_name.endswith('[]')]";
    match plan.spec.paradigm {
        Paradigm::Unsupervised => lines([
            "data = data.dropna(subset=features)",
            arrays,
            "X = flatten_arrays(data[features].copy(), array_features)",
        ]),
        Paradigm::Supervised => lines([
            "data = data.dropna(subset=features + labels)",
            arrays,
            "X = flatten_arrays(data[features].copy(), array_features)",
            "y = flatten_arrays(data[labels].copy(), LABEL_ARRAYS)",
        ]),
        // Rows without a label stay; they are the unlabeled part.
        Paradigm::SemiSupervised => lines([
            "data = data.dropna(subset=features)",
            arrays,
            "X = flatten_arrays(data[features].copy(), array_features)",
            "y = flatten_arrays(data[labels].copy(), LABEL_ARRAYS)",
        ]),
    }
}

fn encode_block(plan: &GenerationPlan) -> String {
    let mut block = vec![
        "feature_encoders = {}".to_string(),
        "for name, type_name in zip(features, types):".to_string(),
        "    if type_name in CATEGORICAL_TYPES:".to_string(),
        "        encoder = LabelEncoder()".to_string(),
        "        X[name] = encoder.fit_transform(X[name].map(lambda value: canonical(value, type_name)))"
            .to_string(),
        "        feature_encoders[name] = encoder".to_string(),
    ];
    if plan.artifacts.has(ArtifactRole::LabelEncoder) {
        block.push(
            "\
label_encoders = {}
for name in ENCODED_LABELS:
    known = y[name].notna().to_numpy()
    encoder = LabelEncoder().fit(y.loc[known, name].astype(str))
    encoded = np.full(len(y), -1, dtype=int)
    encoded[known] = encoder.transform(y.loc[known, name].astype(str))
    y[name] = encoded
    label_encoders[name] = encoder"
                .to_string(),
        );
    }
    if plan.spec.paradigm == Paradigm::SemiSupervised {
        block.push("y = y.fillna(-1)".to_string());
    }
    lines(block)
}

fn split_block(plan: &GenerationPlan) -> String {
    if !plan.spec.paradigm.needs_split() {
        return lines([
            "columns = {'features': list(X.columns), 'labels': []}",
            "X_train = X",
        ]);
    }
    "\
columns = {'features': list(X.columns), 'labels': list(y.columns)}
X_train, X_test, y_train, y_test = train_test_split(
    X, y, test_size=TEST_SIZE, shuffle=not sequential, random_state=RANDOM_STATE)"
        .to_string()
}

fn scale_block(plan: &GenerationPlan, imports: &mut Imports) -> String {
    let constructor = match (plan.scaler, plan.normalizer) {
        (Some(scaler), _) => {
            imports.add(format!("from sklearn.preprocessing import {}", scaler.class_name()));
            format!("{}()", scaler.class_name())
        }
        (None, Some(normalizer)) => {
            imports.add("from sklearn.preprocessing import Normalizer");
            format!("Normalizer(norm={})", py_str(normalizer.norm()))
        }
        (None, None) => return String::new(),
    };
    let mut block = vec![
        format!("scaler = {constructor}.fit(X_train)"),
        "X_train = pd.DataFrame(scaler.transform(X_train), columns=X_train.columns, index=X_train.index)"
            .to_string(),
    ];
    if plan.spec.paradigm.needs_split() {
        block.push(
            "X_test = pd.DataFrame(scaler.transform(X_test), columns=X_test.columns, index=X_test.index)"
                .to_string(),
        );
    }
    lines(block)
}

fn dump_block(plan: &GenerationPlan) -> String {
    lines(plan.artifacts.preprocess.iter().map(|artifact| {
        let variable = match artifact.role {
            ArtifactRole::XTrain => "X_train",
            ArtifactRole::XTest => "X_test",
            ArtifactRole::YTrain => "y_train",
            ArtifactRole::YTest => "y_test",
            ArtifactRole::FeatureEncoders => "feature_encoders",
            ArtifactRole::LabelEncoder => "label_encoders",
            ArtifactRole::Scaler => "scaler",
            ArtifactRole::Columns => "columns",
            ArtifactRole::Model => "model",
        };
        format!("dump({variable}, {})", py_str(&artifact.file_name))
    }))
}
