//! Pipe a planning request through an external process.
//!
//! The request body goes to the child's stdin unchanged and whatever the
//! child writes to stdout comes back unchanged. Exit status is reported
//! but never interpreted.

use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// The external planner to run for each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Kill the child after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl PlannerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// What one planner run produced.
#[derive(Debug, Clone)]
pub struct RelayOutput {
    /// Raw stdout, returned to the caller verbatim.
    pub stdout: Vec<u8>,
    pub stderr: String,
    /// `None` when the child was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    pub duration_ms: i64,
    pub timed_out: bool,
}

impl RelayOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Spawn the planner, feed it `input` on stdin and collect its output.
///
/// Fails only when the process cannot be spawned or waited on. A
/// non-zero exit is returned as a normal [`RelayOutput`].
pub async fn run_planner(command: &PlannerCommand, input: &[u8]) -> Result<RelayOutput> {
    let start = Instant::now();

    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to start planner ({})", command.display()))?;

    let mut stdin_pipe = child.stdin.take();
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();

    // Write and read concurrently so a child that produces output before
    // draining stdin cannot deadlock on a full pipe.
    let write_stdin = async {
        if let Some(mut pipe) = stdin_pipe.take() {
            if let Err(e) = pipe.write_all(input).await {
                tracing::debug!(error = %e, "planner closed stdin early");
            }
            // dropping the pipe sends EOF
        }
    };

    let read_stdout = async {
        let mut buf = Vec::new();
        if let Some(ref mut pipe) = stdout_pipe {
            pipe.read_to_end(&mut buf).await.ok();
        }
        buf
    };

    let read_stderr = async {
        let mut buf = Vec::new();
        if let Some(ref mut pipe) = stderr_pipe {
            pipe.read_to_end(&mut buf).await.ok();
        }
        String::from_utf8_lossy(&buf).into_owned()
    };

    let run = async {
        let (wait_result, (), stdout, stderr) =
            tokio::join!(child.wait(), write_stdin, read_stdout, read_stderr);
        (wait_result, stdout, stderr)
    };

    let finished = match command.timeout {
        Some(limit) => tokio::time::timeout(limit, run).await.ok(),
        None => Some(run.await),
    };

    let elapsed = || i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);

    match finished {
        Some((Ok(status), stdout, stderr)) => Ok(RelayOutput {
            stdout,
            stderr,
            exit_code: status.code(),
            duration_ms: elapsed(),
            timed_out: false,
        }),
        Some((Err(e), _, _)) => {
            Err(e).with_context(|| format!("failed to wait on planner ({})", command.display()))
        }
        None => {
            let _ = child.kill().await;
            Ok(RelayOutput {
                stdout: Vec::new(),
                stderr: format!(
                    "planner timed out after {}s",
                    command.timeout.map(|t| t.as_secs()).unwrap_or_default()
                ),
                exit_code: None,
                duration_ms: elapsed(),
                timed_out: true,
            })
        }
    }
}
