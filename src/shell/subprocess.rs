//! Shell subprocess spawning and I/O plumbing.
//!
//! A session owns one child process: its input pipe, a single combined
//! stdout/stderr pipe, and the process handle. Output is pumped on a
//! dedicated reader thread into a channel so the caller can wait on it
//! with a deadline instead of blocking on the pipe.

use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, warn};

// Channel buffer sizes
const OUTPUT_CHANNEL_BUFFER: usize = 64; // chunks in flight before the reader thread waits
const OUTPUT_READ_BUFFER: usize = 16384; // 16KB per read

/// Starts shell sessions from a rendered shell command line.
pub trait ShellSpawner {
    type Session: ShellSession;

    fn spawn(&self, shell: &str) -> Result<Self::Session>;
}

/// A running shell owned by exactly one invocation.
pub trait ShellSession {
    /// Write `input` to the shell and close its input side.
    ///
    /// Must not block the caller on a child that never reads.
    fn send(&mut self, input: Vec<u8>) -> Result<()>;

    /// The combined output stream. The channel closes at end-of-stream.
    /// Returns `None` once taken.
    fn take_output(&mut self) -> Option<Receiver<Vec<u8>>>;

    fn is_alive(&mut self) -> Result<bool>;

    /// Forcibly terminate the shell.
    fn kill(&mut self) -> Result<()>;
}

/// Spawns real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSpawner;

impl ShellSpawner for ProcessSpawner {
    type Session = ProcessSession;

    fn spawn(&self, shell: &str) -> Result<ProcessSession> {
        let args = shell_words::split(shell)
            .with_context(|| format!("Failed to parse shell command '{}'", shell))?;
        let Some((program, rest)) = args.split_first() else {
            bail!("Shell command is empty after parsing: '{}'", shell);
        };

        // stdout and stderr share one pipe so the output stays interleaved
        // the way the child wrote it.
        let (reader, writer) = io::pipe().context("Failed to create output pipe")?;
        let err_writer = writer.try_clone().context("Failed to clone output pipe")?;

        let mut command = Command::new(program);
        command
            .args(rest)
            .stdin(Stdio::piped())
            .stdout(writer)
            .stderr(err_writer);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group, so a kill also reaches whatever the shell
            // command started (sshpass -> ssh, sh -c wrappers, ...).
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn shell '{}'", program))?;

        // Release our copies of the pipe's write end, otherwise the reader
        // would never see end-of-stream.
        drop(command);

        let stdin = child.stdin.take();
        let (output_tx, output_rx) = mpsc::channel::<Vec<u8>>(OUTPUT_CHANNEL_BUFFER);
        // From here on the session owns the child; an early return kills it.
        let session = ProcessSession {
            child,
            stdin,
            output: Some(output_rx),
            released: false,
        };

        let pid = session.pid();
        std::thread::Builder::new()
            .name(format!("shell-output-{}", pid))
            .spawn(move || pump_output(reader, output_tx))
            .context("Failed to start output reader thread")?;

        debug!(pid, program = %program, "Spawned shell");
        Ok(session)
    }
}

/// Read the combined output pipe until end-of-stream or until nobody listens.
fn pump_output(mut reader: impl Read, output_tx: Sender<Vec<u8>>) {
    let mut buf = [0u8; OUTPUT_READ_BUFFER];

    loop {
        match reader.read(&mut buf) {
            // EOF: every writer is gone
            Ok(0) => break,
            Ok(n) => {
                // Use blocking_send since we're in a std::thread
                if output_tx.blocking_send(buf[..n].to_vec()).is_err() {
                    // Receiver dropped, exit thread
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                // Read errors end the stream like EOF does
                debug!("Shell output read error: {}", e);
                break;
            }
        }
    }
}

/// A spawned OS process leading its own process group.
///
/// Dropping it kills whatever is left of the group and reaps the child.
#[derive(Debug)]
pub struct ProcessSession {
    child: Child,
    stdin: Option<ChildStdin>,
    output: Option<Receiver<Vec<u8>>>,
    /// Group signalled and child reaped.
    released: bool,
}

impl ProcessSession {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    #[cfg(unix)]
    fn kill_group(&self) -> Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let pgid = i32::try_from(self.child.id()).context("Process id out of range")?;
        match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            // ESRCH: every member is already gone
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(e).context("Failed to kill shell process group"),
        }
    }

    #[cfg(not(unix))]
    fn kill_group(&self) -> Result<()> {
        Ok(())
    }
}

impl ShellSession for ProcessSession {
    fn send(&mut self, input: Vec<u8>) -> Result<()> {
        let Some(mut stdin) = self.stdin.take() else {
            bail!("Shell input is already closed");
        };

        let pid = self.child.id();
        std::thread::Builder::new()
            .name(format!("shell-input-{}", pid))
            .spawn(move || {
                let result = stdin.write_all(&input).and_then(|()| stdin.flush());
                if let Err(e) = result {
                    // A shell that exits without reading its input closes the pipe early
                    debug!(pid, "Failed to write shell input: {}", e);
                }
                // stdin dropped here: end-of-input for the shell
            })
            .context("Failed to start input writer thread")?;

        Ok(())
    }

    fn take_output(&mut self) -> Option<Receiver<Vec<u8>>> {
        self.output.take()
    }

    fn is_alive(&mut self) -> Result<bool> {
        let status = self
            .child
            .try_wait()
            .context("Failed to check shell process status")?;
        if let Some(status) = status {
            debug!(pid = self.child.id(), %status, "Shell exited");
        }
        Ok(status.is_none())
    }

    fn kill(&mut self) -> Result<()> {
        self.stdin = None;
        if self.released {
            return Ok(());
        }

        // The child is reaped even if signalling the group failed
        let group = self.kill_group();
        if self.child.try_wait().context("Failed to check shell process status")?.is_none() {
            self.child.kill().context("Failed to kill shell process")?;
        }
        self.child.wait().context("Failed to reap shell process")?;
        self.released = true;
        group
    }
}

impl Drop for ProcessSession {
    fn drop(&mut self) {
        if let Err(e) = self.kill() {
            warn!(pid = self.child.id(), "Failed to release shell process: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn collect(mut rx: Receiver<Vec<u8>>) -> String {
        let mut out = Vec::new();
        while let Some(chunk) = rx.recv().await {
            out.extend_from_slice(&chunk);
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    #[tokio::test]
    async fn test_combined_stdout_and_stderr() {
        let mut session = ProcessSpawner
            .spawn("sh -c 'echo to-stdout; echo to-stderr >&2'")
            .unwrap();
        let output = collect(session.take_output().unwrap()).await;

        assert!(output.contains("to-stdout"));
        assert!(output.contains("to-stderr"));
        assert!(session.take_output().is_none());
    }

    #[tokio::test]
    async fn test_input_reaches_shell() {
        let mut session = ProcessSpawner.spawn("sh").unwrap();
        let rx = session.take_output().unwrap();
        session.send(b"echo from-stdin\n".to_vec()).unwrap();

        let output = tokio::time::timeout(Duration::from_secs(5), collect(rx)).await.unwrap();
        assert_eq!(output, "from-stdin\n");

        // Input can only be sent once
        assert!(session.send(b"echo again\n".to_vec()).is_err());
    }

    #[test]
    fn test_spawn_failures() {
        assert!(ProcessSpawner.spawn("").is_err());
        assert!(ProcessSpawner.spawn("ssh 'unterminated").is_err());
        assert!(ProcessSpawner.spawn("/definitely/not/a/real/binary").is_err());
    }

    #[test]
    fn test_kill_running_process() {
        let mut session = ProcessSpawner.spawn("sleep 30").unwrap();
        assert!(session.is_alive().unwrap());

        session.kill().unwrap();
        assert!(!session.is_alive().unwrap());

        // Killing an already-dead process is fine
        session.kill().unwrap();
    }

    #[test]
    fn test_kill_reaches_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let shell = format!("sh -c 'sh -c \"sleep 1; touch {}\"; :'", marker.display());

        let mut session = ProcessSpawner.spawn(&shell).unwrap();
        let mut rx = session.take_output().unwrap();
        std::thread::sleep(Duration::from_millis(100));
        session.kill().unwrap();

        // The grandchild held the output pipe; killing the group closes it
        assert!(rx.blocking_recv().is_none());
        std::thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists(), "grandchild ran to completion after kill");
    }
}
