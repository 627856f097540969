//! Shell-launch template resolution.
//!
//! Templates carry `{{name}}` placeholders which are replaced with caller
//! supplied variables. Substitution is best-effort: a placeholder with no
//! matching variable is left exactly as written. Values are interposed
//! verbatim, with no shell quoting.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::{ShellConfig, Variables};

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}").expect("Invalid placeholder regex"));

/// Resolve the shell command line from a config.
///
/// Returns `None` when the config is absent or has no usable `get_shell`
/// template. With no variables the raw template is returned unchanged.
pub fn resolve_shell(config: Option<&ShellConfig>, variables: Option<&Variables>) -> Option<String> {
    let template = config?.shell_template()?;
    Some(match variables {
        Some(vars) => render_template(template, vars),
        None => template.to_string(),
    })
}

/// Replace every `{{name}}` with its value from `variables`.
///
/// ```
/// use remote_shell::config::Variables;
/// use remote_shell::shell::render_template;
///
/// let vars = Variables::new().with("chat_ip_address", "10.0.0.1");
/// assert_eq!(
///     render_template("ssh bot@{{chat_ip_address}} -p {{port}}", &vars),
///     "ssh bot@10.0.0.1 -p {{port}}",
/// );
/// ```
pub fn render_template(template: &str, variables: &Variables) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match variables.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(template: &str) -> ShellConfig {
        ShellConfig::with_shell(template)
    }

    #[test]
    fn test_substitutes_known_variable() {
        let vars = Variables::new().with("chat_ip_address", "10.0.0.1");
        let shell = resolve_shell(Some(&config("ssh user@{{chat_ip_address}}")), Some(&vars)).unwrap();

        assert!(shell.contains("10.0.0.1"));
        assert!(!shell.contains("{{chat_ip_address}}"));
        assert_eq!(shell, "ssh user@10.0.0.1");
    }

    #[test]
    fn test_symbol_form_variable() {
        let vars = Variables::new().with(":chat_ip_address", "192.168.1.5");
        let shell = resolve_shell(Some(&config("ssh user@{{chat_ip_address}}")), Some(&vars)).unwrap();
        assert_eq!(shell, "ssh user@192.168.1.5");
    }

    #[test]
    fn test_unmatched_placeholder_left_verbatim() {
        let vars = Variables::new().with("other", "x");
        let shell = resolve_shell(Some(&config("ssh user@{{chat_ip_address}}")), Some(&vars)).unwrap();
        assert_eq!(shell, "ssh user@{{chat_ip_address}}");
    }

    #[test]
    fn test_no_variables_returns_raw_template() {
        let shell = resolve_shell(Some(&config("ssh {{user}}@{{host}}")), None).unwrap();
        assert_eq!(shell, "ssh {{user}}@{{host}}");
    }

    #[test]
    fn test_absent_config() {
        assert!(resolve_shell(None, None).is_none());
        assert!(resolve_shell(Some(&ShellConfig::default()), None).is_none());
        assert!(resolve_shell(Some(&config("")), None).is_none());
    }

    #[test]
    fn test_repeated_and_adjacent_placeholders() {
        let vars = Variables::new().with("a", "1").with("b", "2");
        assert_eq!(render_template("{{a}}{{b}}-{{a}}", &vars), "12-1");
    }

    #[test]
    fn test_non_identifier_braces_untouched() {
        let vars = Variables::new().with("a", "1");
        assert_eq!(render_template("{{ a }} {{1a}} {a} {{a}", &vars), "{{ a }} {{1a}} {a} {{a}");
    }

    #[test]
    fn test_values_are_not_reexpanded() {
        let vars = Variables::new().with("a", "{{b}}").with("b", "nope");
        assert_eq!(render_template("x {{a}}", &vars), "x {{b}}");
    }
}
