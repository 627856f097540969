//! Configuration for remote command execution.
//!
//! Callers hand us loosely-typed maps: a key may arrive in plain string form
//! (`"get_shell"`) or in symbol form (`":get_shell"`). Both are normalized to
//! one canonical key at the boundary so nothing past this module has to care.

mod settings;
mod shell;
mod variables;

pub use settings::RunnerSettings;
pub use shell::{ShellConfig, SHELL_KEY};
pub use variables::Variables;

/// The form a key was written in before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyForm {
    Symbol,
    String,
}

/// Normalize an external key to its canonical form.
///
/// A single leading `:` marks the symbol form and is stripped.
pub(crate) fn normalize_key(raw: &str) -> (String, KeyForm) {
    match raw.strip_prefix(':') {
        Some(name) => (name.to_string(), KeyForm::Symbol),
        None => (raw.to_string(), KeyForm::String),
    }
}

/// Whether an entry written in `incoming` form may replace one written in `existing` form.
///
/// Symbol keys are looked up first, so a string key never shadows a symbol key.
pub(crate) fn may_replace(existing: KeyForm, incoming: KeyForm) -> bool {
    !(existing == KeyForm::Symbol && incoming == KeyForm::String)
}
