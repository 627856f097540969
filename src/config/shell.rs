//! Shell-launch configuration.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{may_replace, normalize_key, KeyForm};

/// Canonical key holding the shell-launch template.
pub const SHELL_KEY: &str = "get_shell";

/// A loosely-typed configuration map that carries the shell-launch template.
///
/// ```
/// use remote_shell::config::ShellConfig;
///
/// let config = ShellConfig::from_json_str(r#"{":get_shell": "ssh bot@{{chat_ip_address}}"}"#).unwrap();
/// assert_eq!(config.shell_template(), Some("ssh bot@{{chat_ip_address}}"));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ShellConfig {
    entries: HashMap<String, (KeyForm, Value)>,
}

impl ShellConfig {
    /// Build a config from raw key/value pairs, normalizing keys.
    pub fn from_map<K, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            config.insert(key.as_ref(), value);
        }
        config
    }

    /// Config holding only a shell-launch template.
    pub fn with_shell(template: impl Into<String>) -> Self {
        Self::from_map([(SHELL_KEY, Value::String(template.into()))])
    }

    /// Parse a JSON object into a config.
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("Shell configuration must be a JSON object")
    }

    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("Invalid shell configuration at {}", path.display()))
    }

    pub fn insert(&mut self, raw_key: &str, value: Value) {
        let (key, form) = normalize_key(raw_key);
        match self.entries.get(&key) {
            Some((existing, _)) if !may_replace(*existing, form) => {}
            _ => {
                self.entries.insert(key, (form, value));
            }
        }
    }

    /// Look up a value by canonical key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The shell-launch template, if present and non-empty.
    pub fn shell_template(&self) -> Option<&str> {
        self.get(SHELL_KEY)
            .and_then(Value::as_str)
            .filter(|template| !template.trim().is_empty())
    }
}

impl From<Map<String, Value>> for ShellConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_and_symbol_keys() {
        let config = ShellConfig::from_map([("get_shell", json!("ssh a@b"))]);
        assert_eq!(config.shell_template(), Some("ssh a@b"));

        let config = ShellConfig::from_map([(":get_shell", json!("ssh c@d"))]);
        assert_eq!(config.shell_template(), Some("ssh c@d"));
    }

    #[test]
    fn test_symbol_key_takes_precedence() {
        let config = ShellConfig::from_map([
            (":get_shell", json!("ssh symbol@host")),
            ("get_shell", json!("ssh string@host")),
        ]);
        assert_eq!(config.shell_template(), Some("ssh symbol@host"));

        let config = ShellConfig::from_map([
            ("get_shell", json!("ssh string@host")),
            (":get_shell", json!("ssh symbol@host")),
        ]);
        assert_eq!(config.shell_template(), Some("ssh symbol@host"));
    }

    #[test]
    fn test_missing_or_unusable_template() {
        assert!(ShellConfig::default().shell_template().is_none());
        assert!(ShellConfig::from_map([("other", json!("x"))]).shell_template().is_none());
        assert!(ShellConfig::with_shell("").shell_template().is_none());
        assert!(ShellConfig::with_shell("   ").shell_template().is_none());
        assert!(ShellConfig::from_map([("get_shell", json!(42))]).shell_template().is_none());
    }

    #[test]
    fn test_from_json_str() {
        let config = ShellConfig::from_json_str(r#"{"get_shell": "ssh x@y", "port": 22}"#).unwrap();
        assert_eq!(config.shell_template(), Some("ssh x@y"));
        assert_eq!(config.get("port"), Some(&json!(22)));

        assert!(ShellConfig::from_json_str("[1, 2]").is_err());
        assert!(ShellConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.json");
        fs::write(&path, r#"{":get_shell": "ssh ops@{{host}}"}"#).unwrap();

        let config = ShellConfig::load(&path).unwrap();
        assert_eq!(config.shell_template(), Some("ssh ops@{{host}}"));

        assert!(ShellConfig::load(&dir.path().join("missing.json")).is_err());
    }
}
