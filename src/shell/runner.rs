//! Time-bounded execution of one command inside a shell session.
//!
//! Per invocation: spawn the shell, write the command, then poll the
//! combined output until the shell is done or the deadline passes.
//! Nothing is kept between invocations.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{timeout, Instant};
use tracing::{debug, trace, warn};

use super::subprocess::{ShellSession, ShellSpawner};

/// A fully resolved command ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Rendered shell-launch command line, e.g. `ssh bot@10.0.0.1`.
    pub shell: String,
    /// Command written to the shell's input.
    pub command: String,
    pub timeout: Duration,
}

/// How a read loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The shell finished; holds everything it wrote (possibly empty).
    Completed(String),
    /// The deadline passed and the shell was killed. Output is discarded.
    TimedOut { discarded_bytes: usize },
}

impl ExecutionRequest {
    /// Spawn, feed and drain the shell.
    ///
    /// Errors cover spawn and setup failures. A timeout is not an error; it
    /// is reported as [`Outcome::TimedOut`].
    pub async fn execute<S: ShellSpawner>(&self, spawner: &S, poll_interval: Duration) -> Result<Outcome> {
        trace!(shell = %self.shell, "Spawning");
        let mut session = spawner.spawn(&self.shell)?;
        let mut output = session
            .take_output()
            .context("Shell session has no output stream")?;

        let mut payload = self.command.clone().into_bytes();
        payload.push(b'\n');
        session.send(payload)?;

        trace!("Reading");
        let outcome = read_until_done(&mut session, &mut output, self.timeout, poll_interval).await;
        Ok(outcome)
    }
}

async fn read_until_done<S: ShellSession>(
    session: &mut S,
    output: &mut tokio::sync::mpsc::Receiver<Vec<u8>>,
    limit: Duration,
    poll_interval: Duration,
) -> Outcome {
    // A limit too large to represent as an instant means no deadline at all.
    let deadline = Instant::now().checked_add(limit);
    let mut buf: Vec<u8> = Vec::new();
    // Set once the shell is seen dead with nothing arriving; a second quiet
    // poll after that means nothing more is pending.
    let mut quiet_since_exit = false;

    loop {
        let now = Instant::now();
        let left = match deadline {
            Some(deadline) => deadline.saturating_duration_since(now),
            None => Duration::MAX,
        };
        if left.is_zero() {
            if let Err(e) = session.kill() {
                warn!("Failed to kill timed out shell: {:#}", e);
            }
            debug!(discarded = buf.len(), "Shell timed out after {:?}", limit);
            return Outcome::TimedOut {
                discarded_bytes: buf.len(),
            };
        }

        let wait = poll_interval.min(left);
        match timeout(wait, output.recv()).await {
            Ok(Some(chunk)) => {
                trace!(bytes = chunk.len(), "Received output");
                buf.extend_from_slice(&chunk);
                quiet_since_exit = false;
            }
            // End-of-stream: treated as "no more data, process not alive"
            Ok(None) => break,
            Err(_elapsed) => {
                let alive = session.is_alive().unwrap_or_else(|e| {
                    debug!("Liveness check failed, treating shell as exited: {:#}", e);
                    false
                });
                if alive {
                    continue;
                }
                while let Ok(chunk) = output.try_recv() {
                    buf.extend_from_slice(&chunk);
                }
                if quiet_since_exit {
                    break;
                }
                quiet_since_exit = true;
            }
        }
    }

    debug!(bytes = buf.len(), "Shell completed");
    Outcome::Completed(String::from_utf8_lossy(&buf).into_owned())
}
