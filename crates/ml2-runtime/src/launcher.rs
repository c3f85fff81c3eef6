//! Process launching.
//!
//! [`ProcessLauncher`] is the seam between the runner and the operating
//! system, so gating and decoding can be tested without spawning anything.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, warn};

use crate::cancellation::CancellationToken;
use crate::config::RunnerConfig;
use crate::error::{Result, RuntimeError};

/// One process to start.
#[derive(Debug, Clone)]
pub struct LaunchRequest<'a> {
    pub script: &'a Path,
    pub args: &'a [String],
    /// Collect stdout instead of forwarding it.
    pub capture_stdout: bool,
}

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout, empty unless requested.
    pub stdout: String,
}

/// Starts a script and waits for it.
///
/// Implementations must honour the config's timeout and the cancellation
/// token while waiting.
pub trait ProcessLauncher: Send + Sync {
    fn launch(
        &self,
        request: &LaunchRequest<'_>,
        config: &RunnerConfig,
        cancellation: &CancellationToken,
    ) -> Result<ProcessOutput>;
}

/// Runs scripts as child processes through their shebang.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubprocessLauncher;

impl SubprocessLauncher {
    /// Stage scripts are written executable, but may have been copied
    /// around since.
    #[cfg(unix)]
    fn ensure_executable(script: &Path) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = std::fs::metadata(script)?.permissions();
        let mode = permissions.mode();
        if mode & 0o111 != 0o111 {
            permissions.set_mode(mode | 0o111);
            std::fs::set_permissions(script, permissions)?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn ensure_executable(_script: &Path) -> std::io::Result<()> {
        Ok(())
    }

    fn kill(child: &mut Child) {
        if let Err(e) = child.kill() {
            warn!("Failed to kill stage process: {}", e);
        }
        let _ = child.wait();
    }

    /// Poll until the child exits, the timeout passes or the token fires.
    fn supervise(
        child: &mut Child,
        script: &Path,
        config: &RunnerConfig,
        cancellation: &CancellationToken,
    ) -> Result<ExitStatus> {
        Self::supervise_with(child, script, config, cancellation, Child::try_wait)
    }

    /// The child is killed and reaped on every error path, including a
    /// failed poll.
    fn supervise_with(
        child: &mut Child,
        script: &Path,
        config: &RunnerConfig,
        cancellation: &CancellationToken,
        mut poll: impl FnMut(&mut Child) -> std::io::Result<Option<ExitStatus>>,
    ) -> Result<ExitStatus> {
        let started = Instant::now();
        loop {
            match poll(child) {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => {
                    warn!("Failed to poll stage process: {}", e);
                    Self::kill(child);
                    return Err(e.into());
                }
            }
            if cancellation.is_cancelled() {
                Self::kill(child);
                return Err(RuntimeError::Cancelled);
            }
            if let Some(timeout) = config.timeout {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    Self::kill(child);
                    return Err(RuntimeError::Timeout {
                        script: script.display().to_string(),
                        after: elapsed,
                    });
                }
            }
            thread::sleep(config.poll_interval);
        }
    }
}

impl ProcessLauncher for SubprocessLauncher {
    fn launch(
        &self,
        request: &LaunchRequest<'_>,
        config: &RunnerConfig,
        cancellation: &CancellationToken,
    ) -> Result<ProcessOutput> {
        let script_name = request.script.display().to_string();
        let launch_error = |reason: String| RuntimeError::Launch {
            script: script_name.clone(),
            reason,
        };

        if cancellation.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        Self::ensure_executable(request.script).map_err(|e| launch_error(e.to_string()))?;

        let mut command = Command::new(request.script);
        command
            .args(request.args)
            .stdin(Stdio::null())
            .stdout(if request.capture_stdout {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .stderr(if config.inherit_stderr {
                Stdio::inherit()
            } else {
                Stdio::null()
            });
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        debug!(script = %script_name, args = ?request.args, "Launching stage");
        let mut child = spawn(&mut command).map_err(|e| launch_error(e.to_string()))?;

        // Drain stdout on its own thread so a chatty script cannot fill
        // the pipe and block before exiting.
        let reader: Option<JoinHandle<std::io::Result<String>>> =
            child.stdout.take().map(|mut stdout| {
                thread::spawn(move || {
                    let mut buffer = String::new();
                    stdout.read_to_string(&mut buffer)?;
                    Ok(buffer)
                })
            });

        let status = Self::supervise(&mut child, request.script, config, cancellation)?;

        let stdout = match reader {
            Some(handle) => handle
                .join()
                .map_err(|_| launch_error("stdout reader panicked".to_string()))??,
            None => String::new(),
        };

        debug!(script = %script_name, code = ?status.code(), "Stage exited");
        Ok(ProcessOutput {
            exit_code: status.code(),
            stdout,
        })
    }
}

/// ETXTBSY on Linux and macOS.
const TEXT_FILE_BUSY: i32 = 26;
const SPAWN_ATTEMPTS: u32 = 5;

/// A script written moments ago can still be open in a child forked by
/// another thread, which makes exec fail with ETXTBSY until that child
/// execs in turn.
fn spawn(command: &mut Command) -> std::io::Result<Child> {
    let mut attempt = 1;
    loop {
        match command.spawn() {
            Err(e) if e.raw_os_error() == Some(TEXT_FILE_BUSY) && attempt < SPAWN_ATTEMPTS => {
                debug!(attempt, "Script busy, retrying spawn");
                thread::sleep(std::time::Duration::from_millis(20 * u64::from(attempt)));
                attempt += 1;
            }
            result => return result,
        }
    }
}
