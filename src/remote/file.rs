//! Remote file reads.

use tracing::debug;

use super::RemoteShell;
use crate::config::{ShellConfig, Variables};
use crate::shell::ShellSpawner;

/// Command that dumps a file. The path is passed through as given.
pub(crate) fn cat_command(path: &str) -> String {
    format!("cat {}", path)
}

impl<S: ShellSpawner> RemoteShell<S> {
    /// Read the full contents of `path` on the remote side.
    ///
    /// Absolute and relative paths are both used verbatim. Returns `None` on
    /// any failure so a failed read can be told apart from an empty file.
    pub async fn read_file(
        &self,
        config: Option<&ShellConfig>,
        path: &str,
        variables: Option<&Variables>,
    ) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            debug!("Empty path, skipping file read");
            return None;
        }

        self.run(
            config,
            &cat_command(path),
            variables,
            Some(self.settings().command_timeout),
        )
        .await
    }
}
