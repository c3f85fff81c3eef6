//! Predict and pre-trained predict stages.
//!
//! Both share one skeleton: build a single-row frame from the arguments,
//! apply the fitted encoders and scaler, predict, decode labels and print
//! one result per line. They differ in where the fitted objects come from.

use crate::catalog::{ArtifactRole, GenerationPlan};
use crate::model::{Backend, BlackboxConfig};
use crate::render::{Dialect, Literal};
use crate::template::{Vars, indent};

use super::{Imports, lines, py_str};

fn results_literal(plan: &GenerationPlan) -> String {
    Literal::List(
        plan.spec
            .prediction_results
            .iter()
            .map(|f| Literal::Tuple(vec![Literal::str(&f.name), Literal::Bool(f.is_array)]))
            .collect(),
    )
    .render(Dialect::Python)
}

fn timestamp_block(plan: &GenerationPlan) -> String {
    if !plan.spec.timestamps {
        return String::new();
    }
    lines([
        "if len(argv) > 3 + len(features):",
        "    row['timestamp'] = float(argv[3 + len(features)])",
    ])
}

/// Keras output rows become class indices or stay raw values.
fn keras_prediction(plan: &GenerationPlan) -> &'static str {
    if plan.task.predicts_classes() {
        "prediction = np.argmax(raw, axis=1)"
    } else {
        "prediction = raw"
    }
}

pub(super) fn fill(plan: &GenerationPlan, imports: &mut Imports, vars: &mut Vars) {
    let artifacts = &plan.artifacts;

    let load = lines([
        "columns = load('preprocess_columns.pickle')",
        "frame = pd.DataFrame([row]).reindex(columns=columns['features'])",
        "label_columns = columns['labels']",
        "feature_encoders = load('preprocess_feature_encoders.pickle')",
    ]);

    let scale = if artifacts.has(ArtifactRole::Scaler) {
        lines([
            "scaler = load('preprocess_scaler.pickle')",
            "frame = pd.DataFrame(scaler.transform(frame), columns=frame.columns)",
        ])
    } else {
        String::new()
    };

    let predict = match plan.backend {
        Backend::Keras => {
            imports.extend(plan.model.imports());
            lines([
                "model = keras.models.load_model(os.path.join(PICKLES_DIR, MODEL_FILE))",
                "raw = model.predict(frame.to_numpy(dtype=float), verbose=0)",
                keras_prediction(plan),
            ])
        }
        Backend::ScikitLearn if plan.uses_neighbor_lookup() => {
            imports.add("from sklearn.neighbors import KNeighborsClassifier");
            lines([
                "model = load(MODEL_FILE)",
                "neighbors = KNeighborsClassifier(n_neighbors=1)",
                "neighbors.fit(load('preprocess_X_train.pickle'), model.labels_)",
                "prediction = neighbors.predict(frame)",
            ])
        }
        Backend::ScikitLearn => lines(["model = load(MODEL_FILE)", "prediction = model.predict(frame)"]),
    };

    let decode = if artifacts.has(ArtifactRole::LabelEncoder) {
        lines([
            "label_encoders = load('preprocess_label_encoder.pickle')",
            "for name, encoder in label_encoders.items():",
            "    outputs[name] = encoder.inverse_transform([int(outputs[name])])[0]",
        ])
    } else {
        String::new()
    };

    vars.set("results", results_literal(plan))
        .set(
            "timestamp_block",
            indent(&timestamp_block(plan), 1),
        )
        .set(
            "load_block",
            indent(
                &lines([
                    format!("MODEL_FILE = {}", py_str(&artifacts.model.file_name)),
                    load,
                ]),
                1,
            ),
        )
        .set("scale_block", indent(&scale, 1))
        .set("predict_block", indent(&predict, 1))
        .set("decode_block", indent(&decode, 1));
}

/// Pre-trained prediction reads the blackbox paths as given. Without a
/// feature encoder, categorical features reach the model unencoded.
pub(super) fn fill_pre_trained(
    plan: &GenerationPlan,
    blackbox: &BlackboxConfig,
    imports: &mut Imports,
    vars: &mut Vars,
) {
    let load = lines([
        "frame = pd.DataFrame([row])".to_string(),
        "label_columns = []".to_string(),
        match &blackbox.feature_encoders {
            Some(path) => format!("feature_encoders = load_path({})", py_str(path)),
            None => "feature_encoders = {}".to_string(),
        },
    ]);

    let scale = match &blackbox.scaler {
        Some(path) => lines([
            format!("scaler = load_path({})", py_str(path)),
            "frame = pd.DataFrame(scaler.transform(frame), columns=frame.columns)".to_string(),
        ]),
        None => String::new(),
    };

    let predict = if blackbox.is_keras_model() {
        imports.add("from tensorflow import keras");
        lines([
            format!("model = keras.models.load_model({})", py_str(&blackbox.model)),
            "raw = model.predict(frame.to_numpy(dtype=float), verbose=0)".to_string(),
            keras_prediction(plan).to_string(),
        ])
    } else {
        lines([
            format!("model = load_path({})", py_str(&blackbox.model)),
            "prediction = model.predict(frame)".to_string(),
        ])
    };

    // A bare encoder applies to the first result.
    let decode = match &blackbox.label_encoder {
        Some(path) => lines([
            format!("label_encoders = load_path({})", py_str(path)),
            "if not isinstance(label_encoders, dict):".to_string(),
            "    label_encoders = {RESULTS[0][0]: label_encoders}".to_string(),
            "for name, encoder in label_encoders.items():".to_string(),
            "    outputs[name] = encoder.inverse_transform([int(outputs[name])])[0]".to_string(),
        ]),
        None => String::new(),
    };

    vars.set("results", results_literal(plan))
        .set("timestamp_block", indent(&timestamp_block(plan), 1))
        .set("load_block", indent(&load, 1))
        .set("scale_block", indent(&scale, 1))
        .set("predict_block", indent(&predict, 1))
        .set("decode_block", indent(&decode, 1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::resolve;
    use crate::catalog::test_support::{spec_for, supervised_spec};
    use crate::config::GeneratorConfig;
    use crate::diagnostics::Diagnostics;
    use crate::emitter::ScriptEmitter;
    use crate::layout::Stage;
    use crate::model::{Feature, ModelAlgorithm, NativeType};

    fn source(plan: &GenerationPlan, stage: Stage) -> String {
        let config = GeneratorConfig::default();
        ScriptEmitter::new(plan, &config).emit(stage).unwrap().source
    }

    #[test]
    fn test_classifier_predict_decodes_labels() {
        let mut spec = supervised_spec(NativeType::String);
        spec.prediction_results.push(Feature::array("scores", NativeType::Double));
        spec.timestamps = true;
        let plan = resolve(&spec, &mut Diagnostics::new()).unwrap();
        let source = source(&plan, Stage::Predict);
        assert!(source.contains("RESULTS = [('category', False), ('scores', True)]\n"));
        assert!(source.contains("    MODEL_FILE = 'train_model_dtc.pickle'\n"));
        assert!(source.contains("    label_encoders = load('preprocess_label_encoder.pickle')\n"));
        assert!(source.contains("        row['timestamp'] = float(argv[3 + len(features)])\n"));
        assert!(!source.contains("scaler"));
    }

    #[test]
    fn test_array_results_take_only_their_indexed_columns() {
        let mut spec = supervised_spec(NativeType::Double);
        spec.algorithm = ModelAlgorithm::DecisionTreeRegressor(Default::default());
        spec.prediction_results = vec![
            Feature::array("a", NativeType::Double),
            Feature::array("a_b", NativeType::Double),
        ];
        let plan = resolve(&spec, &mut Diagnostics::new()).unwrap();
        let source = source(&plan, Stage::Predict);
        assert!(source.contains("RESULTS = [('a', True), ('a_b', True)]\n"));
        // `a_b_0` belongs to `a_b`, not to `a`.
        assert!(source.contains(
            "            if column.startswith(prefix) and column[len(prefix):].isdigit()\n"
        ));
        assert!(source.contains(
            "            parts = [outputs[column] for column in array_columns(name, names)]\n"
        ));
        assert!(!source.contains("column.startswith(name + '_')"));
    }

    #[test]
    fn test_dbscan_predict_uses_neighbor_lookup() {
        let spec = spec_for(ModelAlgorithm::Dbscan(Default::default()), NativeType::Int);
        let plan = resolve(&spec, &mut Diagnostics::new()).unwrap();
        let source = source(&plan, Stage::Predict);
        assert!(source.contains("from sklearn.neighbors import KNeighborsClassifier\n"));
        assert!(source.contains("    neighbors.fit(load('preprocess_X_train.pickle'), model.labels_)\n"));
        assert!(!source.contains("label_encoders"));
    }

    #[test]
    fn test_pre_trained_predict_reads_blackbox_paths() {
        let mut spec = supervised_spec(NativeType::String);
        spec.blackbox = Some(BlackboxConfig {
            model: "models/net.h5".to_string(),
            label_encoder: Some("models/labels.pickle".to_string()),
            scaler: Some("models/scaler.pickle".to_string()),
            feature_encoders: None,
        });
        let plan = resolve(&spec, &mut Diagnostics::new()).unwrap();
        let source = source(&plan, Stage::PreTrainedPredict);
        assert!(source.starts_with("#!/usr/bin/env python3\n# pre_trained_predict stage"));
        assert!(source.contains("    model = keras.models.load_model('models/net.h5')\n"));
        assert!(source.contains("    scaler = load_path('models/scaler.pickle')\n"));
        assert!(source.contains("    feature_encoders = {}\n"));
        assert!(source.contains("    prediction = np.argmax(raw, axis=1)\n"));
        assert!(!source.contains("preprocess_"));
    }
}
