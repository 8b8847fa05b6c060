//! Low-level execution of storage CLI commands.
//!
//! Handles timeouts, process management and output capture. Arguments are
//! passed straight to the executable; callers validate them first.

use anyhow::{Context, Result};
use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Runs commands against the storage CLI
#[derive(Debug, Clone)]
pub struct AwsCore {
    /// Path to the CLI executable
    cli_path: String,
    /// Command timeout in seconds (None means no timeout)
    timeout: Option<u64>,
}

impl AwsCore {
    /// Create a core with the default executable
    pub fn new() -> Self {
        Self::with_path(crate::core::config::DEFAULT_AWS_CLI.to_string())
    }

    /// Create a core with a custom executable path
    pub fn with_path(cli_path: String) -> Self {
        Self {
            cli_path,
            timeout: None,
        }
    }

    /// Set a timeout for commands in seconds
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Execute a command and return its output if it exited successfully
    pub fn execute(&self, args: &[&str]) -> Result<Output> {
        let cmd_str = format!("{} {}", self.cli_path, args.join(" "));
        debug!("Executing: {}", cmd_str);

        let mut cmd = Command::new(&self.cli_path);
        cmd.args(args);

        let output = match self.timeout {
            Some(timeout_secs) => self.execute_with_timeout(&mut cmd, timeout_secs)?,
            None => cmd
                .output()
                .with_context(|| format!("Failed to execute command: {}", cmd_str))?,
        };

        if !output.stderr.is_empty() {
            trace!("STDERR:\n{}", String::from_utf8_lossy(&output.stderr));
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} ({}) {}", cmd_str, output.status, stderr.trim());
        }

        Ok(output)
    }

    /// Execute a command, killing it once `timeout_secs` has elapsed.
    ///
    /// Both pipes are drained on their own threads while the child runs, so a
    /// large listing cannot stall the child on a full pipe.
    fn execute_with_timeout(&self, cmd: &mut Command, timeout_secs: u64) -> Result<Output> {
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().context("Failed to spawn command")?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let start = Instant::now();
        let timeout = Duration::from_secs(timeout_secs);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() > timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        anyhow::bail!("Command timed out after {} seconds", timeout_secs);
                    }
                    thread::sleep(Duration::from_millis(100));
                }
                Err(e) => return Err(anyhow::anyhow!("Error waiting for process: {}", e)),
            }
        };

        Ok(Output {
            status,
            stdout: collect(stdout).context("Failed to read stdout")?,
            stderr: collect(stderr).context("Failed to read stderr")?,
        })
    }
}

impl Default for AwsCore {
    fn default() -> Self {
        Self::new()
    }
}

type Drain = Option<thread::JoinHandle<std::io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Drain {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn collect(handle: Drain) -> Result<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| anyhow::anyhow!("pipe reader panicked"))?
            .map_err(Into::into),
        None => Ok(Vec::new()),
    }
}
