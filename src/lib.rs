//! remote-shell - run commands through caller-configured remote shells
//!
//! This library provides:
//! - Shell-launch template resolution (`ssh bot@{{chat_ip_address}}`)
//! - Time-bounded command execution with combined stdout/stderr capture
//! - Remote file and shell-history reads built on top of it
//!
//! Every operation degrades gracefully: failures are logged through
//! `tracing` and surface as `None` (or `""` for history), never as errors.
//!
//! # Example
//!
//! ```no_run
//! use remote_shell::config::{ShellConfig, Variables};
//! use remote_shell::RemoteShell;
//!
//! #[tokio::main]
//! async fn main() {
//!     let shell = RemoteShell::default();
//!     let config = ShellConfig::with_shell("ssh bot@{{chat_ip_address}}");
//!     let vars = Variables::new().with("chat_ip_address", "10.0.0.1");
//!
//!     if let Some(output) = shell.run(Some(&config), "uptime", Some(&vars), None).await {
//!         println!("{}", output);
//!     }
//!     let history = shell.read_history(Some(&config), Some("deploy"), Some(20)).await;
//!     println!("{}", history);
//! }
//! ```

pub mod config;
pub mod remote;
pub mod shell;
pub mod utils;

// Re-export commonly used types
pub use config::{RunnerSettings, ShellConfig, Variables};
pub use remote::RemoteShell;
pub use shell::{ExecutionRequest, ProcessSpawner};
