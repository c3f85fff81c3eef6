//! Configuration types for the generator.
//!
//! This module provides [`GeneratorConfig`] and its builder. The config
//! decides *where* things are written and which interpreter the emitted
//! scripts run under; *what* gets generated is decided by the
//! [`DataAnalyticsSpec`](crate::model::DataAnalyticsSpec).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::layout::ScriptLayout;

/// Configuration for script and glue generation.
///
/// Use [`GeneratorConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use ml2_codegen::GeneratorConfig;
///
/// let config = GeneratorConfig::builder()
///     .output_root("target/generated")
///     .test_size(0.3)
///     .random_state(42)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Per-project generation root. Scripts land in `<root>/<scripts_dir>`.
    /// Default: "output"
    pub output_root: PathBuf,

    /// Directory (under the root) holding the stage scripts.
    /// Default: "python-scripts"
    pub scripts_dir: String,

    /// Directory (under the scripts directory) holding pipeline artifacts.
    /// Default: "pickles"
    pub pickles_dir: String,

    /// Directory (under the scripts directory) holding rendered plots.
    /// Default: "plots"
    pub plots_dir: String,

    /// Interpreter named in the scripts' shebang line.
    /// Default: "python3"
    pub python_interpreter: String,

    /// Fraction of rows held out by the preprocess split (exclusive 0..1).
    /// Default: 0.25
    pub test_size: f64,

    /// Seed passed to the train/test split.
    /// Default: None (library default)
    pub random_state: Option<u64>,

    /// Root as seen by the generated host program, if it differs from
    /// `output_root` (e.g. the host runs from another working directory).
    /// Default: None
    pub host_root: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("output"),
            scripts_dir: "python-scripts".to_string(),
            pickles_dir: "pickles".to_string(),
            plots_dir: "plots".to_string(),
            python_interpreter: "python3".to_string(),
            test_size: 0.25,
            random_state: None,
            host_root: None,
        }
    }
}

impl GeneratorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ConfigValidationError::InvalidTestSize(self.test_size));
        }

        for (field, value) in [
            ("scripts_dir", &self.scripts_dir),
            ("pickles_dir", &self.pickles_dir),
            ("plots_dir", &self.plots_dir),
        ] {
            if value.trim().is_empty() || value.contains(['/', '\\']) {
                return Err(ConfigValidationError::InvalidDirectoryName {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }

        if self.python_interpreter.trim().is_empty()
            || self.python_interpreter.contains(char::is_whitespace)
        {
            return Err(ConfigValidationError::InvalidInterpreter(
                self.python_interpreter.clone(),
            ));
        }

        Ok(())
    }

    /// Layout of the generated tree on the generating machine.
    pub fn layout(&self) -> ScriptLayout {
        ScriptLayout::new(
            self.output_root.join(&self.scripts_dir),
            &self.pickles_dir,
            &self.plots_dir,
        )
    }

    /// Layout of the generated tree as the host program will see it.
    pub fn host_layout(&self) -> ScriptLayout {
        match &self.host_root {
            Some(root) => ScriptLayout::new(
                PathBuf::from(root).join(&self.scripts_dir),
                &self.pickles_dir,
                &self.plots_dir,
            ),
            None => self.layout(),
        }
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid test size: {0} (must be strictly between 0.0 and 1.0)")]
    InvalidTestSize(f64),

    #[error("Invalid directory name for '{field}': '{value}' (must be a single non-empty path segment)")]
    InvalidDirectoryName { field: String, value: String },

    #[error("Invalid python interpreter: '{0}'")]
    InvalidInterpreter(String),
}

impl From<ConfigValidationError> for crate::error::CodegenError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::CodegenError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`GeneratorConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct GeneratorConfigBuilder {
    output_root: Option<PathBuf>,
    scripts_dir: Option<String>,
    pickles_dir: Option<String>,
    plots_dir: Option<String>,
    python_interpreter: Option<String>,
    test_size: Option<f64>,
    random_state: Option<u64>,
    host_root: Option<String>,
}

impl GeneratorConfigBuilder {
    /// Set the per-project generation root.
    pub fn output_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_root = Some(path.into());
        self
    }

    /// Set the scripts directory name.
    pub fn scripts_dir(mut self, name: impl Into<String>) -> Self {
        self.scripts_dir = Some(name.into());
        self
    }

    /// Set the artifacts directory name.
    pub fn pickles_dir(mut self, name: impl Into<String>) -> Self {
        self.pickles_dir = Some(name.into());
        self
    }

    /// Set the plots directory name.
    pub fn plots_dir(mut self, name: impl Into<String>) -> Self {
        self.plots_dir = Some(name.into());
        self
    }

    /// Set the interpreter used in the scripts' shebang.
    pub fn python_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.python_interpreter = Some(interpreter.into());
        self
    }

    /// Set the held-out fraction for the train/test split.
    ///
    /// # Arguments
    /// * `size` - Value strictly between 0.0 and 1.0 (e.g., 0.25 = 25%)
    pub fn test_size(mut self, size: f64) -> Self {
        self.test_size = Some(size);
        self
    }

    /// Set the random seed.
    pub fn random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Set the root path used inside generated host glue.
    pub fn host_root(mut self, root: impl Into<String>) -> Self {
        self.host_root = Some(root.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `GeneratorConfig` or an error if validation fails.
    pub fn build(self) -> Result<GeneratorConfig, ConfigValidationError> {
        let defaults = GeneratorConfig::default();
        let config = GeneratorConfig {
            output_root: self.output_root.unwrap_or(defaults.output_root),
            scripts_dir: self.scripts_dir.unwrap_or(defaults.scripts_dir),
            pickles_dir: self.pickles_dir.unwrap_or(defaults.pickles_dir),
            plots_dir: self.plots_dir.unwrap_or(defaults.plots_dir),
            python_interpreter: self
                .python_interpreter
                .unwrap_or(defaults.python_interpreter),
            test_size: self.test_size.unwrap_or(defaults.test_size),
            random_state: self.random_state,
            host_root: self.host_root,
        };

        config.validate()?;
        Ok(config)
    }
}
