//! Positional argument contract between the host and the stage scripts.
//!
//! Preprocess and train take
//! `dataset sequential timestamps names types labels`. Both predict stages
//! take `names types value...` followed by the epoch-seconds timestamp when
//! the spec declares one. Predict stages print one result per stdout line,
//! in declaration order; array results print as `[v1 v2 ...]`.
//!
//! The generated host glue, the generated scripts and the `ml2-runtime`
//! runner all follow this module, so the three cannot drift apart.

use serde::Serialize;
use std::path::PathBuf;

use crate::catalog::GenerationPlan;
use crate::error::{CodegenError, Result};
use crate::layout::{ScriptLayout, Stage};
use crate::model::Feature;

/// One positional argument of a stage invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Arg {
    /// Fixed at generation time.
    Constant(String),
    /// Current host value of the feature at this index.
    Feature(usize),
    /// Epoch seconds at invocation time.
    Timestamp,
}

/// Everything needed to run one stage script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    pub stage: Stage,
    pub script: PathBuf,
    pub args: Vec<Arg>,
    /// Files that must all exist, otherwise the stage is skipped.
    pub required: Vec<PathBuf>,
    /// Results decoded from stdout, one per line. Empty for non-predict
    /// stages.
    pub results: Vec<Feature>,
}

/// `true` / `false`, as parsed by the scripts.
pub fn encode_flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

pub fn join_names(features: &[Feature]) -> String {
    features
        .iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn join_types(features: &[Feature]) -> String {
    features
        .iter()
        .map(Feature::type_name)
        .collect::<Vec<_>>()
        .join(",")
}

/// Encode array items as a single argument: `'[1 2 3]'`.
pub fn encode_array<S: AsRef<str>>(items: &[S]) -> String {
    let body = items
        .iter()
        .map(|item| item.as_ref())
        .collect::<Vec<_>>()
        .join(" ");
    format!("'[{body}]'")
}

/// Split an array result line (`[1.0 2.0]`) into its items.
pub fn split_array_line(line: &str) -> Vec<&str> {
    line.trim()
        .trim_matches('\'')
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split_whitespace()
        .collect()
}

/// Files `stage` needs before it may run.
pub fn required_inputs(plan: &GenerationPlan, layout: &ScriptLayout, stage: Stage) -> Vec<PathBuf> {
    match stage {
        Stage::Preprocess => vec![PathBuf::from(&plan.spec.dataset)],
        Stage::Train | Stage::Predict => plan
            .required_artifacts(stage)
            .into_iter()
            .map(|artifact| layout.pickle(&artifact.file_name))
            .collect(),
        Stage::PreTrainedPredict => match &plan.spec.blackbox {
            Some(blackbox) => std::iter::once(&blackbox.model)
                .chain(blackbox.feature_encoders.iter())
                .chain(blackbox.label_encoder.iter())
                .chain(blackbox.scaler.iter())
                .map(PathBuf::from)
                .collect(),
            None => Vec::new(),
        },
    }
}

/// Build the invocation of `stage` for `plan` laid out as `layout`.
pub fn invocation(plan: &GenerationPlan, layout: &ScriptLayout, stage: Stage) -> Result<Invocation> {
    let spec = &plan.spec;
    if stage == Stage::PreTrainedPredict && spec.blackbox.is_none() {
        return Err(CodegenError::StageUnavailable {
            stage: stage.to_string(),
            reason: format!("'{}' declares no pre-trained model", spec.name),
        });
    }

    let args = if stage.is_predict() {
        let mut args = vec![
            Arg::Constant(join_names(&spec.features)),
            Arg::Constant(join_types(&spec.features)),
        ];
        args.extend((0..spec.features.len()).map(Arg::Feature));
        if spec.timestamps {
            args.push(Arg::Timestamp);
        }
        args
    } else {
        vec![
            Arg::Constant(spec.dataset.clone()),
            Arg::Constant(encode_flag(spec.sequential).to_string()),
            Arg::Constant(encode_flag(spec.timestamps).to_string()),
            Arg::Constant(join_names(&spec.features)),
            Arg::Constant(join_types(&spec.features)),
            Arg::Constant(join_names(&spec.prediction_results)),
        ]
    };

    Ok(Invocation {
        stage,
        script: layout.script(stage),
        args,
        required: required_inputs(plan, layout, stage),
        results: if stage.is_predict() {
            spec.prediction_results.clone()
        } else {
            Vec::new()
        },
    })
}
