//! Shell execution and process management module.
//!
//! This module resolves shell-launch templates, spawns the resulting shell
//! as a subprocess, and runs a single command through it under a deadline.

mod runner;
mod subprocess;
mod template;

pub use runner::{ExecutionRequest, Outcome};
pub use subprocess::{ProcessSession, ProcessSpawner, ShellSession, ShellSpawner};
pub use template::{render_template, resolve_shell};

#[cfg(test)]
pub(crate) use runner::mock;
