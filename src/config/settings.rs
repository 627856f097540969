//! Process-wide runner settings.
//!
//! These are fixed when a [`RemoteShell`](crate::remote::RemoteShell) is built
//! and read-only afterwards.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const COMMAND_TIMEOUT_MS: u64 = 10_000;
const POLL_INTERVAL_MS: u64 = 10;

pub const ENV_DEFAULT_TIMEOUT: &str = "REMOTE_SHELL_DEFAULT_TIMEOUT_MS";
pub const ENV_COMMAND_TIMEOUT: &str = "REMOTE_SHELL_COMMAND_TIMEOUT_MS";
pub const ENV_POLL_INTERVAL: &str = "REMOTE_SHELL_POLL_INTERVAL_MS";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "RawSettings")]
pub struct RunnerSettings {
    /// Applied by `run` when the caller passes no timeout.
    pub default_timeout: Duration,
    /// Applied by the file and history helpers.
    pub command_timeout: Duration,
    /// Longest single wait for output before re-checking liveness and the deadline.
    pub poll_interval: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            command_timeout: Duration::from_millis(COMMAND_TIMEOUT_MS),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
        }
    }
}

impl RunnerSettings {
    /// Defaults overlaid with any `REMOTE_SHELL_*_MS` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        let read = |name: &str| -> Option<Duration> {
            let raw = lookup(name)?;
            match raw.trim().parse::<u64>() {
                Ok(ms) => Some(Duration::from_millis(ms)),
                Err(e) => {
                    warn!("Ignoring {}={:?}: {}", name, raw, e);
                    None
                }
            }
        };

        if let Some(d) = read(ENV_DEFAULT_TIMEOUT) {
            settings.default_timeout = d;
        }
        if let Some(d) = read(ENV_COMMAND_TIMEOUT) {
            settings.command_timeout = d;
        }
        if let Some(d) = read(ENV_POLL_INTERVAL) {
            // A zero poll interval would spin.
            settings.poll_interval = d.max(Duration::from_millis(1));
        }
        settings
    }
}

#[derive(Deserialize)]
struct RawSettings {
    #[serde(default = "default_timeout_ms")]
    default_timeout_ms: u64,
    #[serde(default = "command_timeout_ms")]
    command_timeout_ms: u64,
    #[serde(default = "poll_interval_ms")]
    poll_interval_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn command_timeout_ms() -> u64 {
    COMMAND_TIMEOUT_MS
}

fn poll_interval_ms() -> u64 {
    POLL_INTERVAL_MS
}

impl From<RawSettings> for RunnerSettings {
    fn from(raw: RawSettings) -> Self {
        Self {
            default_timeout: Duration::from_millis(raw.default_timeout_ms),
            command_timeout: Duration::from_millis(raw.command_timeout_ms),
            poll_interval: Duration::from_millis(raw.poll_interval_ms.max(1)),
        }
    }
}
