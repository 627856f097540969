//! Command-line entry point for remote-shell.
//!
//! The result is printed to stdout. A missing result exits with status 1.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use remote_shell::utils;
use remote_shell::{RemoteShell, RunnerSettings, ShellConfig, Variables};

/// Run commands through a configured remote shell.
///
/// The config is a JSON object whose `get_shell` (or `:get_shell`) entry is
/// the shell-launch template, e.g. `ssh bot@{{chat_ip_address}}`.
#[derive(Parser, Debug)]
#[command(name = "remote-shell")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the JSON shell configuration.
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a command inside the shell and print its combined output.
    Run {
        command: String,

        /// Template variables as name=value.
        #[arg(value_parser = parse_var)]
        vars: Vec<(String, String)>,

        /// Timeout in milliseconds (defaults to the configured default timeout).
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Print the contents of a remote file.
    Cat {
        path: String,

        /// Template variables as name=value.
        #[arg(value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },

    /// Print remote shell history.
    History {
        /// Read this user's history instead of the login user's.
        user: Option<String>,

        /// Keep only the newest N entries.
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging before anything else
    let _log_guard = utils::logger::init_logging();

    // A config that can't be loaded behaves like an absent one
    let config = match ShellConfig::load(&cli.config) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("{:#}", e);
            None
        }
    };

    let shell = RemoteShell::new(RunnerSettings::from_env());
    let result = match cli.command {
        Command::Run {
            command,
            vars,
            timeout_ms,
        } => {
            let vars: Variables = vars.into_iter().collect();
            let timeout = timeout_ms.map(Duration::from_millis);
            shell.run(config.as_ref(), &command, Some(&vars), timeout).await
        }
        Command::Cat { path, vars } => {
            let vars: Variables = vars.into_iter().collect();
            shell.read_file(config.as_ref(), &path, Some(&vars)).await
        }
        Command::History { user, limit } => Some(
            shell
                .read_history(config.as_ref(), user.as_deref(), limit)
                .await,
        ),
    };

    match result {
        Some(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        None => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_vars() {
        let cli = Cli::try_parse_from([
            "remote-shell",
            "cfg.json",
            "run",
            "uptime",
            "chat_ip_address=10.0.0.1",
            "--timeout-ms",
            "500",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("cfg.json"));
        match cli.command {
            Command::Run {
                command,
                vars,
                timeout_ms,
            } => {
                assert_eq!(command, "uptime");
                assert_eq!(vars, [("chat_ip_address".to_string(), "10.0.0.1".to_string())]);
                assert_eq!(timeout_ms, Some(500));
            }
            other => panic!("Expected Run, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_history_forms() {
        let cli = Cli::try_parse_from(["remote-shell", "c", "history", "deploy", "--limit", "20"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::History { user: Some(ref u), limit: Some(20) } if u == "deploy"
        ));

        // A numeric name is a user, not a limit
        let cli = Cli::try_parse_from(["remote-shell", "c", "history", "42"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::History { user: Some(ref u), limit: None } if u == "42"
        ));

        let cli = Cli::try_parse_from(["remote-shell", "c", "history", "--limit", "15"]).unwrap();
        assert!(matches!(cli.command, Command::History { user: None, limit: Some(15) }));

        let cli = Cli::try_parse_from(["remote-shell", "c", "history"]).unwrap();
        assert!(matches!(cli.command, Command::History { user: None, limit: None }));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Cli::try_parse_from(["remote-shell"]).is_err());
        assert!(Cli::try_parse_from(["remote-shell", "c", "run"]).is_err());
        assert!(Cli::try_parse_from(["remote-shell", "c", "cat", "/etc/hosts", "novalue"]).is_err());
        assert!(Cli::try_parse_from(["remote-shell", "c", "history", "--limit", "lots"]).is_err());
        assert!(Cli::try_parse_from(["remote-shell", "c", "frobnicate"]).is_err());
    }

    #[test]
    fn test_parse_var() {
        assert_eq!(parse_var("a=b=c"), Ok(("a".to_string(), "b=c".to_string())));
        assert_eq!(parse_var("empty="), Ok(("empty".to_string(), String::new())));
        assert!(parse_var("novalue").is_err());
    }
}
