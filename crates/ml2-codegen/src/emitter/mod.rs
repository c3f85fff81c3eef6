//! Stage script emission.
//!
//! Each stage is a template skeleton filled with blocks rendered from the
//! [`GenerationPlan`]. Emission is a pure function of the plan and the
//! config, so regenerating an unchanged spec yields byte-identical files.
//! Writing goes through a temporary file and a rename so a half-written
//! script never replaces a working one.

mod predict;
mod preprocess;
mod report;
mod train;

use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::catalog::GenerationPlan;
use crate::config::GeneratorConfig;
use crate::error::{CodegenError, Result};
use crate::layout::{ScriptLayout, Stage};
use crate::render::{Dialect, Literal, quote};
use crate::template::{Template, Vars};

const PREPROCESS: Template = Template::new(
    "preprocess.py",
    include_str!("../../templates/preprocess.py.tmpl"),
);
const TRAIN: Template = Template::new("train.py", include_str!("../../templates/train.py.tmpl"));
const PREDICT: Template = Template::new(
    "predict.py",
    include_str!("../../templates/predict.py.tmpl"),
);
const HELPERS: &str = include_str!("../../templates/common.py.tmpl");

/// Deduplicated import lines of one script.
///
/// Plain `import` lines render first, then `from` lines, each sorted, so
/// the header is stable whatever order the blocks asked for them.
#[derive(Debug, Clone, Default)]
pub struct Imports {
    lines: BTreeSet<String>,
}

impl Imports {
    /// The imports every stage script needs.
    pub fn base() -> Self {
        let mut imports = Self::default();
        imports
            .add("import os")
            .add("import pickle")
            .add("import sys")
            .add("import numpy as np")
            .add("import pandas as pd");
        imports
    }

    pub fn add(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.insert(line.into());
        self
    }

    pub fn extend<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.add(line);
        }
        self
    }

    pub fn contains(&self, line: &str) -> bool {
        self.lines.contains(line)
    }

    pub fn render(&self) -> String {
        let (plain, from): (Vec<&String>, Vec<&String>) =
            self.lines.iter().partition(|l| l.starts_with("import "));
        plain
            .into_iter()
            .chain(from)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A rendered stage script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptText {
    pub stage: Stage,
    pub file_name: String,
    pub source: String,
}

/// Renders the stage scripts of one plan.
pub struct ScriptEmitter<'a> {
    plan: &'a GenerationPlan,
    config: &'a GeneratorConfig,
}

impl<'a> ScriptEmitter<'a> {
    pub fn new(plan: &'a GenerationPlan, config: &'a GeneratorConfig) -> Self {
        Self { plan, config }
    }

    /// Stages this plan produces scripts for.
    pub fn stages(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|stage| *stage != Stage::PreTrainedPredict || self.plan.spec.is_blackbox())
            .collect()
    }

    pub fn emit(&self, stage: Stage) -> Result<ScriptText> {
        let plan = self.plan;
        let mut imports = Imports::base();
        let mut vars = Vars::new();
        vars.set("python", self.config.python_interpreter.as_str())
            .set("spec_name", py_str(&plan.spec.name))
            .set("algorithm", py_str(plan.algorithm))
            .set("pickles_dir", py_str(&self.config.pickles_dir))
            .set("helpers", HELPERS.trim_end());

        let template = match stage {
            Stage::Preprocess => {
                preprocess::fill(plan, self.config, &mut imports, &mut vars);
                PREPROCESS
            }
            Stage::Train => {
                vars.set("plots_dir", py_str(&self.config.plots_dir));
                train::fill(plan, &mut imports, &mut vars);
                TRAIN
            }
            Stage::Predict => {
                predict::fill(plan, &mut imports, &mut vars);
                PREDICT
            }
            Stage::PreTrainedPredict => {
                let Some(blackbox) = &plan.spec.blackbox else {
                    return Err(CodegenError::StageUnavailable {
                        stage: stage.to_string(),
                        reason: format!("'{}' declares no pre-trained model", plan.spec.name),
                    });
                };
                predict::fill_pre_trained(plan, blackbox, &mut imports, &mut vars);
                PREDICT
            }
        };
        vars.set("stage", stage.as_str())
            .set("imports", imports.render());

        let source = template.render(&vars)?;
        debug!(stage = %stage, bytes = source.len(), "Rendered stage script");
        Ok(ScriptText {
            stage,
            file_name: stage.script_name(),
            source,
        })
    }

    /// Render every stage of [`Self::stages`].
    pub fn emit_all(&self) -> Result<Vec<ScriptText>> {
        self.stages()
            .into_iter()
            .map(|stage| self.emit(stage))
            .collect()
    }
}

/// Python string literal.
pub(crate) fn py_str(value: &str) -> String {
    quote(value, Dialect::Python)
}

/// Python list of string literals.
pub(crate) fn py_str_list<S: AsRef<str>>(values: &[S]) -> String {
    Literal::List(values.iter().map(|v| Literal::str(v.as_ref())).collect()).render(Dialect::Python)
}

/// Join the non-empty blocks, one per line.
pub(crate) fn lines<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .filter(|part| !part.as_ref().is_empty())
        .map(|part| part.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write `script` into `layout`, creating the artifact and plot directories
/// on the way. The file is made executable on unix.
pub fn write_script(layout: &ScriptLayout, script: &ScriptText) -> Result<PathBuf> {
    let target = layout.root().join(&script.file_name);
    let failed = |reason: String| CodegenError::ScriptWriteFailed {
        path: target.display().to_string(),
        reason,
    };

    for dir in [layout.root().to_path_buf(), layout.pickles_dir(), layout.plots_dir()] {
        fs::create_dir_all(&dir)
            .map_err(|e| failed(format!("cannot create '{}': {e}", dir.display())))?;
    }

    let staging = staging_path(&target);
    fs::write(&staging, script.source.as_bytes()).map_err(|e| failed(e.to_string()))?;
    set_executable(&staging).map_err(|e| failed(e.to_string()))?;
    if let Err(e) = fs::rename(&staging, &target) {
        let _ = fs::remove_file(&staging);
        return Err(failed(e.to_string()));
    }
    debug!(path = %target.display(), "Wrote stage script");
    Ok(target)
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{resolve, test_support::supervised_spec};
    use crate::diagnostics::Diagnostics;
    use crate::model::NativeType;
    use pretty_assertions::assert_eq;

    fn plan() -> GenerationPlan {
        resolve(&supervised_spec(NativeType::String), &mut Diagnostics::new()).unwrap()
    }

    #[test]
    fn test_imports_are_ordered_and_deduplicated() {
        let mut imports = Imports::base();
        imports
            .add("from sklearn.tree import DecisionTreeClassifier")
            .add("import html")
            .add("import os");
        assert_eq!(
            imports.render(),
            "import html\nimport numpy as np\nimport os\nimport pandas as pd\nimport pickle\nimport sys\n\
             from sklearn.tree import DecisionTreeClassifier"
        );
    }

    #[test]
    fn test_every_template_renders_without_leftover_placeholders() {
        let plan = plan();
        let config = GeneratorConfig::default();
        let emitter = ScriptEmitter::new(&plan, &config);
        assert_eq!(
            emitter.stages(),
            vec![Stage::Preprocess, Stage::Train, Stage::Predict]
        );
        for script in emitter.emit_all().unwrap() {
            assert!(script.source.starts_with("#!/usr/bin/env python3\n"));
            assert!(!script.source.contains("{{"), "{} kept a placeholder", script.file_name);
        }
    }

    #[test]
    fn test_pre_trained_predict_unavailable_without_blackbox() {
        let plan = plan();
        let config = GeneratorConfig::default();
        let err = ScriptEmitter::new(&plan, &config)
            .emit(Stage::PreTrainedPredict)
            .unwrap_err();
        assert_eq!(err.error_code(), "STAGE_UNAVAILABLE");
    }

    #[test]
    fn test_emission_is_deterministic() {
        let plan = plan();
        let config = GeneratorConfig::default();
        let emitter = ScriptEmitter::new(&plan, &config);
        assert_eq!(emitter.emit_all().unwrap(), emitter.emit_all().unwrap());
    }

    #[test]
    fn test_write_script_creates_tree() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ScriptLayout::new(dir.path().join("python-scripts"), "pickles", "plots");
        let script = ScriptText {
            stage: Stage::Train,
            file_name: "train.py".to_string(),
            source: "#!/usr/bin/env python3\n".to_string(),
        };
        let path = write_script(&layout, &script).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), script.source);
        assert!(layout.pickles_dir().is_dir());
        assert!(layout.plots_dir().is_dir());
        assert!(!staging_path(&path).exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }
}
