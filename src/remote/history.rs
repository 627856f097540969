//! Remote shell history reads.
//!
//! History is best-effort enrichment: every failure collapses to an empty
//! string instead of `None`.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::RemoteShell;
use crate::config::ShellConfig;
use crate::shell::ShellSpawner;

const HISTORY_FILE: &str = ".bash_history";

#[allow(clippy::expect_used)]
static USER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*$").expect("Invalid user name regex"));

/// Lines of a shell history listing, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct History {
    commands: Vec<String>,
}

impl History {
    /// Parse a history listing. Blank lines are skipped.
    pub fn from_output(output: &str) -> Self {
        let commands = output
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        Self { commands }
    }

    /// Get the most recent n commands.
    pub fn recent(&self, n: usize) -> &[String] {
        let start = self.commands.len().saturating_sub(n);
        &self.commands[start..]
    }

    /// Get total number of commands in history.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if history is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Whether `user` is safe to splice into `~user`.
pub(crate) fn is_valid_user(user: &str) -> bool {
    USER_NAME.is_match(user)
}

/// Command that lists the history of `user` (or the login user), keeping the last `limit` lines.
pub(crate) fn history_command(user: Option<&str>, limit: Option<usize>) -> String {
    let home = match user {
        Some(user) => format!("~{}", user),
        None => "~".to_string(),
    };
    // A missing or unreadable history file is no history, not an error message
    let mut command = format!("cat {}/{} 2>/dev/null", home, HISTORY_FILE);
    if let Some(limit) = limit {
        command.push_str(&format!(" | tail -n {}", limit));
    }
    command
}

impl<S: ShellSpawner> RemoteShell<S> {
    /// Read shell history, optionally for `user` and limited to the newest `limit` entries.
    ///
    /// Never fails: an unusable config, an invalid user name, a missing history
    /// file or any execution failure yields `""`.
    ///
    /// The result is one entry per line, newline-terminated, with blank lines
    /// and trailing whitespace dropped, whether or not a limit is given.
    pub async fn read_history(
        &self,
        config: Option<&ShellConfig>,
        user: Option<&str>,
        limit: Option<usize>,
    ) -> String {
        let user = user.map(str::trim).filter(|u| !u.is_empty());
        if let Some(user) = user {
            if !is_valid_user(user) {
                warn!(user, "Refusing to read history for invalid user name");
                return String::new();
            }
        }
        if limit == Some(0) {
            return String::new();
        }

        let command = history_command(user, limit);
        let Some(output) = self
            .run(config, &command, None, Some(self.settings().command_timeout))
            .await
        else {
            debug!("History unavailable");
            return String::new();
        };

        let history = History::from_output(&output);
        let mut text = history.recent(limit.unwrap_or(usize::MAX)).join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }
}
