//! Plots and the HTML report of the train stage.
//!
//! Static sections (model, parameters, features) are rendered here and
//! embedded as string literals. Metrics and plots depend on the fitted
//! model, so they are computed by the script, each inside its own guard: a
//! metric or plot that cannot be produced is reported and the rest of the
//! report is still written.

use crate::catalog::GenerationPlan;
use crate::model::{Backend, Feature, MetricKind, PlotKind};
use crate::render::Dialect;

use super::{Imports, lines, py_str, py_str_list};

pub(crate) fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn table(title: &str, header: [&str; 2], rows: &[(String, String)]) -> String {
    let mut html = format!(
        "<h2>{}</h2><table><tr><th>{}</th><th>{}</th></tr>",
        html_escape(title),
        html_escape(header[0]),
        html_escape(header[1])
    );
    for (key, value) in rows {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            html_escape(key),
            html_escape(value)
        ));
    }
    html.push_str("</table>");
    html
}

fn model_section(plan: &GenerationPlan) -> String {
    let rows = [
        ("Algorithm", plan.algorithm.to_string()),
        ("Library", plan.backend.to_string()),
        ("Task", plan.task.to_string()),
        ("Paradigm", plan.spec.paradigm.to_string()),
        ("AutoML", plan.spec.automl.to_string()),
        ("Model file", plan.artifacts.model.file_name.clone()),
    ]
    .map(|(k, v)| (k.to_string(), v));
    table("Model", ["Property", "Value"], &rows)
}

fn params_section(plan: &GenerationPlan) -> String {
    let rows = plan.model.params().rendered_pairs(Dialect::Python);
    if rows.is_empty() {
        return "<h2>Hyperparameters</h2><p>library defaults</p>".to_string();
    }
    table("Hyperparameters", ["Parameter", "Value"], &rows)
}

fn features_section(plan: &GenerationPlan) -> String {
    let describe = |features: &[Feature]| -> Vec<(String, String)> {
        features
            .iter()
            .map(|f| (f.name.clone(), f.type_name()))
            .collect()
    };
    format!(
        "{}{}",
        table("Features", ["Name", "Type"], &describe(&plan.spec.features)),
        table(
            "Prediction results",
            ["Name", "Type"],
            &describe(&plan.spec.prediction_results)
        )
    )
}

/// Python expression producing the metric's HTML.
fn metric_expression(metric: MetricKind, imports: &mut Imports) -> String {
    let (function, expression) = match metric {
        MetricKind::Rmse => (
            "mean_squared_error",
            "'<p>RMSE: {:.4f}</p>'.format(np.sqrt(mean_squared_error(y_eval, y_pred)))",
        ),
        MetricKind::Mae => (
            "mean_absolute_error",
            "'<p>MAE: {:.4f}</p>'.format(mean_absolute_error(y_eval, y_pred))",
        ),
        MetricKind::Mse => (
            "mean_squared_error",
            "'<p>MSE: {:.4f}</p>'.format(mean_squared_error(y_eval, y_pred))",
        ),
        MetricKind::R2 => ("r2_score", "'<p>R2: {:.4f}</p>'.format(r2_score(y_eval, y_pred))"),
        MetricKind::Accuracy => (
            "accuracy_score",
            "'<p>Accuracy: {:.4f}</p>'.format(accuracy_score(y_eval, y_pred))",
        ),
        MetricKind::ClassificationReport => (
            "classification_report",
            "'<pre>{}</pre>'.format(html.escape(classification_report(y_eval, y_pred)))",
        ),
    };
    imports.add(format!("from sklearn.metrics import {function}"));
    expression.to_string()
}

pub(super) fn report_block(plan: &GenerationPlan, imports: &mut Imports) -> String {
    imports.add("import html");
    let mut block = vec![
        "sections = []".to_string(),
        format!("sections.append({})", py_str(&model_section(plan))),
        "sections.append('<h2>Dataset</h2><p>{} ({} training rows, {} columns)</p>'.format(\
         html.escape(dataset), n_samples, n_features))"
            .to_string(),
        format!("sections.append({})", py_str(&features_section(plan))),
        format!("sections.append({})", py_str(&params_section(plan))),
    ];
    let metrics: Vec<MetricKind> = plan.metrics().collect();
    if !metrics.is_empty() {
        block.push("sections.append('<h2>Metrics</h2>')".to_string());
    }
    for metric in metrics {
        let expression = metric_expression(metric, imports);
        block.push(format!(
            "\
try:
    sections.append({expression})
except Exception:
    sections.append({})",
            py_str(&format!("<p>failed to produce metric {}</p>", metric.label()))
        ));
    }

    let plots: Vec<String> = plan.plots().map(|p| p.file_name()).collect();
    if !plots.is_empty() {
        block.push(format!(
            "\
sections.append('<h2>Plots</h2>')
for name in {}:
    path = os.path.join(PLOTS_DIR, name)
    if os.path.exists(path):
        sections.append('<img src=\"{{}}\" alt=\"{{}}\">'.format(os.path.relpath(path, SCRIPT_DIR), name))",
            py_str_list(&plots)
        ));
    }

    block.push(format!(
        "\
with open(REPORT_PATH, 'w') as handle:
    handle.write('<!DOCTYPE html>\\n<html><head><meta charset=\"utf-8\"><title>{{}}</title></head>'
                 '<body>{{}}</body></html>\\n'.format(html.escape({}), '\\n'.join(sections)))",
        py_str(&plan.spec.name)
    ));
    lines(block)
}

/// Python statements drawing `plot` on a fresh figure saved as `fig`.
fn plot_body(plot: PlotKind, backend: Backend, imports: &mut Imports) -> String {
    let axes = "fig, ax = plt.subplots(figsize=(8, 6))";
    match plot {
        PlotKind::Heatmap => lines([
            axes,
            "corr = X_train.corr()",
            "image = ax.imshow(corr, cmap='coolwarm', vmin=-1, vmax=1)",
            "ax.set_xticks(range(len(corr.columns)))",
            "ax.set_xticklabels(corr.columns, rotation=90)",
            "ax.set_yticks(range(len(corr.columns)))",
            "ax.set_yticklabels(corr.columns)",
            "fig.colorbar(image, ax=ax)",
        ]),
        PlotKind::BoxPlot => lines([axes, "X_train.plot(kind='box', ax=ax, rot=90)"]),
        PlotKind::ClassImbalance => lines([
            axes,
            "pd.Series(np.ravel(y_train)).value_counts().sort_index().plot(kind='bar', ax=ax)",
            "ax.set_ylabel('rows')",
        ]),
        PlotKind::PairPlot => lines([
            "grid = pd.plotting.scatter_matrix(X_train, figsize=(10, 10))",
            "fig = np.ravel(grid)[0].get_figure()",
        ]),
        PlotKind::ConfusionMatrix => {
            imports.add("from sklearn.metrics import ConfusionMatrixDisplay");
            lines([axes, "ConfusionMatrixDisplay.from_predictions(y_eval, y_pred, ax=ax)"])
        }
        PlotKind::PrecisionRecallCurve | PlotKind::RocCurve => {
            let display = if plot == PlotKind::RocCurve {
                "RocCurveDisplay"
            } else {
                "PrecisionRecallDisplay"
            };
            imports.add(format!("from sklearn.metrics import {display}"));
            let scores = match backend {
                Backend::ScikitLearn => "scores = model.predict_proba(X_eval)[:, 1]",
                Backend::Keras => "scores = raw[:, 1]",
            };
            lines([
                axes.to_string(),
                scores.to_string(),
                format!("{display}.from_predictions(y_eval, scores, ax=ax)"),
            ])
        }
        PlotKind::LearningCurve => match backend {
            Backend::ScikitLearn => {
                imports
                    .add("from sklearn.base import clone")
                    .add("from sklearn.model_selection import learning_curve");
                lines([
                    axes,
                    "sizes, train_scores, test_scores = learning_curve(clone(model), X_train, y_train, cv=3)",
                    "ax.plot(sizes, train_scores.mean(axis=1), label='train')",
                    "ax.plot(sizes, test_scores.mean(axis=1), label='validation')",
                    "ax.set_xlabel('training rows')",
                    "ax.legend()",
                ])
            }
            Backend::Keras => lines([
                axes,
                "ax.plot(history.history['loss'], label='loss')",
                "if 'val_loss' in history.history:",
                "    ax.plot(history.history['val_loss'], label='val_loss')",
                "ax.set_xlabel('epoch')",
                "ax.legend()",
            ]),
        },
        PlotKind::ClusteringScatter => {
            imports.add("from sklearn.decomposition import PCA");
            lines([
                axes,
                "if n_features > 2:",
                "    points = PCA(n_components=2).fit_transform(X_train)",
                "elif n_features == 2:",
                "    points = X_train.to_numpy()",
                "else:",
                "    points = np.column_stack([X_train.iloc[:, 0], np.zeros(n_samples)])",
                "ax.scatter(points[:, 0], points[:, 1], c=cluster_labels, cmap='tab10', s=12)",
            ])
        }
    }
}

pub(super) fn plots_block(plan: &GenerationPlan, imports: &mut Imports) -> String {
    let plots: Vec<PlotKind> = plan.plots().collect();
    if plots.is_empty() {
        return String::new();
    }
    imports.add("import matplotlib.pyplot as plt");

    let mut block = vec![
        "plt.switch_backend('Agg')".to_string(),
        "os.makedirs(PLOTS_DIR, exist_ok=True)".to_string(),
    ];
    for plot in plots {
        let body = plot_body(plot, plan.backend, imports);
        block.push(format!(
            "try:\n{}\n    fig.savefig(os.path.join(PLOTS_DIR, {}), bbox_inches='tight')\n\
             except Exception as error:\n    print({}.format(error), file=sys.stderr)\n\
             finally:\n    plt.close('all')",
            crate::template::indent(&body, 1),
            py_str(&plot.file_name()),
            py_str(&format!("failed to produce plot {}: {{}}", plot.as_str())),
        ));
    }
    lines(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::resolve;
    use crate::catalog::test_support::supervised_spec;
    use crate::diagnostics::Diagnostics;
    use crate::model::NativeType;
    use pretty_assertions::assert_eq;

    fn plan_with_outputs() -> GenerationPlan {
        let mut spec = supervised_spec(NativeType::String);
        spec.name = "a<b".to_string();
        spec.metrics.insert(MetricKind::Accuracy);
        spec.metrics.insert(MetricKind::Rmse);
        spec.plots.insert(PlotKind::ConfusionMatrix);
        spec.plots.insert(PlotKind::Heatmap);
        resolve(&spec, &mut Diagnostics::new()).unwrap()
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<td a="1">&'"#),
            "&lt;td a=&quot;1&quot;&gt;&amp;&#x27;"
        );
    }

    #[test]
    fn test_every_metric_is_guarded() {
        let mut imports = Imports::default();
        let block = report_block(&plan_with_outputs(), &mut imports);
        assert!(block.contains("except Exception:\n    sections.append('<p>failed to produce metric RMSE</p>')"));
        assert!(block.contains("failed to produce metric accuracy"));
        assert!(imports.contains("from sklearn.metrics import mean_squared_error"));
        assert!(imports.contains("import html"));
        assert!(block.contains("<tr><td>Algorithm</td><td>DecisionTreeClassifier</td></tr>"));
        assert!(block.contains("html.escape('a<b')"));
    }

    #[test]
    fn test_every_plot_is_guarded() {
        let mut imports = Imports::default();
        let block = plots_block(&plan_with_outputs(), &mut imports);
        assert_eq!(block.matches("try:\n").count(), 2);
        assert_eq!(block.matches("finally:\n    plt.close('all')").count(), 2);
        assert!(block.contains("print('failed to produce plot heatmap: {}'.format(error), file=sys.stderr)"));
        assert!(block.contains("fig.savefig(os.path.join(PLOTS_DIR, 'confusion_matrix.png'), bbox_inches='tight')"));
        assert!(imports.contains("import matplotlib.pyplot as plt"));
    }

    #[test]
    fn test_no_plots_no_matplotlib() {
        let plan = resolve(&supervised_spec(NativeType::String), &mut Diagnostics::new()).unwrap();
        let mut imports = Imports::default();
        assert!(plots_block(&plan, &mut imports).is_empty());
        assert!(!imports.contains("import matplotlib.pyplot as plt"));
    }
}
