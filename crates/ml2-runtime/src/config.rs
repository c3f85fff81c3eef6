//! Configuration for running stage scripts.
//!
//! # Example
//!
//! ```
//! use ml2_runtime::RunnerConfig;
//! use std::time::Duration;
//!
//! let config = RunnerConfig::builder()
//!     .timeout(Duration::from_secs(900))
//!     .working_dir("/srv/statechart")
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.timeout, Some(Duration::from_secs(900)));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::error::RuntimeError;

/// Configuration for a [`StageRunner`](crate::StageRunner).
///
/// # Validation
///
/// [`build()`](RunnerConfigBuilder::build) rejects:
/// - a zero `timeout`
/// - a zero `poll_interval`
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Kill the stage after this long (default: none, wait indefinitely).
    pub timeout: Option<Duration>,

    /// How often a running stage is checked for exit, timeout and
    /// cancellation (default: 50ms).
    pub poll_interval: Duration,

    /// Directory the scripts run in. Relative artifact and dataset paths
    /// resolve against it (default: the current directory).
    pub working_dir: Option<PathBuf>,

    /// Forward the scripts' stderr to ours (default: true).
    pub inherit_stderr: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            poll_interval: Duration::from_millis(50),
            working_dir: None,
            inherit_stderr: true,
        }
    }
}

impl RunnerConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(RuntimeError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(RuntimeError::InvalidConfig(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`RunnerConfig`].
#[derive(Debug, Default)]
#[must_use]
pub struct RunnerConfigBuilder {
    timeout: Option<Duration>,
    poll_interval: Option<Duration>,
    working_dir: Option<PathBuf>,
    inherit_stderr: Option<bool>,
}

impl RunnerConfigBuilder {
    /// Kill stages that run longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn inherit_stderr(mut self, inherit: bool) -> Self {
        self.inherit_stderr = Some(inherit);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<RunnerConfig, RuntimeError> {
        let defaults = RunnerConfig::default();
        let config = RunnerConfig {
            timeout: self.timeout,
            poll_interval: self.poll_interval.unwrap_or(defaults.poll_interval),
            working_dir: self.working_dir,
            inherit_stderr: self.inherit_stderr.unwrap_or(defaults.inherit_stderr),
        };
        config.validate()?;
        Ok(config)
    }
}
