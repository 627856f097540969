//! Remote command execution entry points.
//!
//! [`RemoteShell`] is the whole public surface: run a command through a
//! configured shell, read a remote file, or read a remote shell history.
//! None of these ever return an error. Failures are logged and come back as
//! `None` (or an empty string for history).

mod file;
mod history;

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{RunnerSettings, ShellConfig, Variables};
use crate::shell::{resolve_shell, ExecutionRequest, Outcome, ProcessSpawner, ShellSpawner};

pub use history::History;

/// Runs commands through caller-configured shells.
///
/// Settings are fixed at construction. Each call spawns and owns its own
/// shell process, so one `RemoteShell` can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct RemoteShell<S = ProcessSpawner> {
    settings: RunnerSettings,
    spawner: S,
}

impl Default for RemoteShell<ProcessSpawner> {
    fn default() -> Self {
        Self::new(RunnerSettings::default())
    }
}

impl RemoteShell<ProcessSpawner> {
    pub fn new(settings: RunnerSettings) -> Self {
        Self::with_spawner(settings, ProcessSpawner)
    }
}

impl<S: ShellSpawner> RemoteShell<S> {
    pub fn with_spawner(settings: RunnerSettings, spawner: S) -> Self {
        Self { settings, spawner }
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Run `command` inside the shell described by `config`.
    ///
    /// `timeout` defaults to `settings.default_timeout`. Returns the combined
    /// output (an empty string is a valid result), or `None` when the config
    /// is unusable, the command is blank, the shell cannot be spawned, or the
    /// deadline passes.
    pub async fn run(
        &self,
        config: Option<&ShellConfig>,
        command: &str,
        variables: Option<&Variables>,
        timeout: Option<Duration>,
    ) -> Option<String> {
        if config.is_none_or(ShellConfig::is_empty) {
            debug!("No shell configuration, skipping command");
            return None;
        }
        if command.trim().is_empty() {
            debug!("Empty command, skipping");
            return None;
        }
        let Some(shell) = resolve_shell(config, variables) else {
            debug!("Shell configuration has no usable get_shell template");
            return None;
        };

        let request = ExecutionRequest {
            shell,
            command: command.to_string(),
            timeout: timeout.unwrap_or(self.settings.default_timeout),
        };
        self.execute(&request).await
    }

    /// Run a pre-resolved request under the same contract as [`run`](Self::run).
    pub async fn execute(&self, request: &ExecutionRequest) -> Option<String> {
        if request.shell.trim().is_empty() || request.command.trim().is_empty() {
            return None;
        }

        match request.execute(&self.spawner, self.settings.poll_interval).await {
            Ok(Outcome::Completed(output)) => Some(output),
            Ok(Outcome::TimedOut { discarded_bytes }) => {
                warn!(
                    shell = %request.shell,
                    discarded_bytes,
                    "Command timed out after {:?}",
                    request.timeout
                );
                None
            }
            Err(e) => {
                warn!(shell = %request.shell, "Command execution failed: {:#}", e);
                None
            }
        }
    }
}
