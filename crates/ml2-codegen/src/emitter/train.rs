//! Train stage: fit, score, persist, then plots and the HTML report.

use crate::catalog::{GenerationPlan, MINI_BATCH_HINT_ROWS, ModelCode, Task};
use crate::model::{Backend, ModelAlgorithm};
use crate::template::{Vars, indent};

use super::{Imports, lines, py_str, report};

pub(super) fn fill(plan: &GenerationPlan, imports: &mut Imports, vars: &mut Vars) {
    imports.add("from datetime import datetime");
    imports.extend(plan.model.imports());

    vars.set("backend", plan.backend.as_str())
        .set("model_file", py_str(&plan.artifacts.model.file_name))
        .set("training_results", py_str(&plan.spec.training_results))
        .set("dataset", py_str(&plan.spec.dataset))
        .set("load_block", indent(&load_block(plan), 1))
        .set("hint_block", indent(&hint_block(plan), 1))
        .set("model_block", indent(&model_block(plan), 1))
        .set("fit_block", indent(&fit_block(plan), 1))
        .set("evaluate_block", indent(&evaluate_block(plan, imports), 1))
        .set("persist_block", indent(&persist_block(plan), 1))
        .set("plots_block", indent(&report::plots_block(plan, imports), 1))
        .set("report_block", indent(&report::report_block(plan, imports), 1));
}

fn load_block(plan: &GenerationPlan) -> String {
    if !plan.spec.paradigm.needs_split() {
        return "y_train = None".to_string();
    }
    let mut block = vec![
        "X_test = load('preprocess_X_test.pickle')",
        "y_train = as_target(load('preprocess_y_train.pickle'))",
        "y_test = as_target(load('preprocess_y_test.pickle'))",
    ];
    // The encoder saw every label before the split, so classes present
    // only in the test rows still get an output unit.
    if matches!(plan.model, ModelCode::Keras(_)) && plan.task == Task::Classification {
        block.push(
            "n_classes = len(next(iter(load('preprocess_label_encoder.pickle').values())).classes_)",
        );
    }
    lines(block)
}

fn hint_block(plan: &GenerationPlan) -> String {
    if !matches!(plan.spec.algorithm, ModelAlgorithm::KMeans(_)) {
        return String::new();
    }
    format!(
        "\
if n_samples > {MINI_BATCH_HINT_ROWS}:
    print('hint: {{}} rows; MiniBatchKMeans trains much faster at this size'.format(n_samples),
          file=sys.stderr)"
    )
}

fn model_block(plan: &GenerationPlan) -> String {
    match &plan.model {
        ModelCode::Estimator(call) => format!("model = {}", call.constructor()),
        ModelCode::Keras(network) => network.build_lines(),
    }
}

fn fit_block(plan: &GenerationPlan) -> String {
    match (&plan.model, plan.task) {
        (ModelCode::Keras(network), _) => {
            let extra = network.fit_arguments();
            let separator = if extra.is_empty() { "" } else { ", " };
            format!(
                "history = model.fit(X_train.to_numpy(dtype=float), np.asarray(y_train){separator}{extra})"
            )
        }
        (ModelCode::Estimator(_), Task::Clustering) => lines([
            "model.fit(X_train)",
            "cluster_labels = model.labels_ if hasattr(model, 'labels_') else model.predict(X_train)",
        ]),
        (ModelCode::Estimator(_), _) => "model.fit(X_train, y_train)".to_string(),
    }
}

fn evaluate_block(plan: &GenerationPlan, imports: &mut Imports) -> String {
    let predict = match (plan.backend, plan.task) {
        (_, Task::Clustering) => "X_eval, y_eval, y_pred = X_train, None, cluster_labels".to_string(),
        (Backend::Keras, task) => lines([
            "X_eval, y_eval = X_test, y_test".to_string(),
            "raw = model.predict(X_eval.to_numpy(dtype=float), verbose=0)".to_string(),
            if task == Task::Regression {
                "y_pred = raw.ravel() if raw.shape[1] == 1 else raw".to_string()
            } else {
                "y_pred = np.argmax(raw, axis=1)".to_string()
            },
        ]),
        (Backend::ScikitLearn, Task::SemiSupervised) => lines([
            "labeled = (np.asarray(y_test).reshape(len(y_test), -1) != -1).all(axis=1)",
            "X_eval, y_eval = X_test[labeled], y_test[labeled]",
            "y_pred = model.predict(X_eval) if len(y_eval) else np.array([])",
        ]),
        (Backend::ScikitLearn, _) => lines([
            "X_eval, y_eval = X_test, y_test",
            "y_pred = model.predict(X_eval)",
        ]),
    };

    let score = match plan.task {
        Task::Regression => {
            imports.add("from sklearn.metrics import r2_score");
            "score = r2_score(y_eval, y_pred)"
        }
        Task::Classification | Task::SemiSupervised => {
            imports.add("from sklearn.metrics import accuracy_score");
            "score = accuracy_score(y_eval, y_pred) if len(y_eval) else float('nan')"
        }
        Task::Clustering => {
            imports.add("from sklearn.metrics import silhouette_score");
            "score = silhouette_score(X_train, cluster_labels) \
             if 1 < len(set(cluster_labels)) < n_samples else float('nan')"
        }
    };
    // The model is already persisted; a score the metric cannot compute
    // (multi-output targets) must not fail the stage.
    format!(
        "{predict}\n\
         try:\n    \
         {score}\n\
         except Exception as error:\n    \
         print('failed to score the model: {{}}'.format(error), file=sys.stderr)\n    \
         score = float('nan')"
    )
}

fn persist_block(plan: &GenerationPlan) -> String {
    match plan.backend {
        Backend::ScikitLearn => "dump(model, MODEL_FILE)".to_string(),
        Backend::Keras => "model.save(os.path.join(PICKLES_DIR, MODEL_FILE))".to_string(),
    }
}
