//! External command execution.
//!
//! Commands run directly from an argument vector (no shell), with stdout
//! and stderr captured into a single buffer in arrival order. A deadline
//! or a cancellation signal kills the process.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{ChildStderr, ChildStdout, Command};
use tokio_util::sync::CancellationToken;

/// How long to keep draining output after the process is gone.
///
/// Background grandchildren can hold the pipes open indefinitely.
const OUTPUT_GRACE: Duration = Duration::from_millis(250);

/// How a command stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The process exited on its own.
    Exited,

    /// The deadline passed and the process was killed.
    TimedOut(Duration),

    /// Cancellation fired and the process was killed.
    Cancelled,
}

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal or by us).
    pub exit_code: Option<i32>,

    /// Combined stdout and stderr.
    pub output: Vec<u8>,

    /// Execution duration.
    pub duration: Duration,

    /// How the process stopped.
    pub termination: Termination,
}

impl CommandResult {
    /// Whether the command exited on its own with code 0.
    pub fn success(&self) -> bool {
        self.termination == Termination::Exited && self.exit_code == Some(0)
    }

    /// Output as lossy UTF-8.
    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (layered over the inherited environment).
    pub env: BTreeMap<String, String>,

    /// Hard deadline (None = no deadline).
    pub timeout: Option<Duration>,
}

/// Execute `argv[0]` with the remaining arguments.
///
/// # Errors
///
/// Returns an error if `argv` is empty, if the process cannot be spawned,
/// or if waiting on it fails. A non-zero exit, a timeout or a cancellation
/// is reported through [`CommandResult`], not as an error.
pub async fn execute(
    argv: &[String],
    options: &CommandOptions,
    cancel: &CancellationToken,
) -> std::io::Result<CommandResult> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command")
    })?;

    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    cmd.envs(&options.env);
    cmd.kill_on_drop(true);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;

    let captured = Arc::new(Mutex::new(Vec::new()));
    let mut collector = tokio::spawn(collect_output(
        child.stdout.take(),
        child.stderr.take(),
        Arc::clone(&captured),
    ));

    let deadline = async {
        match options.timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };

    let (termination, status) = tokio::select! {
        status = child.wait() => (Termination::Exited, Some(status?)),
        _ = deadline => (Termination::TimedOut(options.timeout.unwrap_or_default()), None),
        _ = cancel.cancelled() => (Termination::Cancelled, None),
    };

    if termination != Termination::Exited {
        tracing::debug!(program = %program, ?termination, "Killing command");
        if let Err(e) = child.kill().await {
            tracing::warn!(program = %program, "Failed to kill command: {}", e);
        }
    }

    if tokio::time::timeout(OUTPUT_GRACE, &mut collector)
        .await
        .is_err()
    {
        collector.abort();
    }

    let output = std::mem::take(&mut *captured.lock().unwrap_or_else(|e| e.into_inner()));

    Ok(CommandResult {
        exit_code: status.and_then(|s| s.code()),
        output,
        duration: start.elapsed(),
        termination,
    })
}

/// Drain both pipes into one buffer, chunk by chunk, until both close.
async fn collect_output(
    mut stdout: Option<ChildStdout>,
    mut stderr: Option<ChildStderr>,
    sink: Arc<Mutex<Vec<u8>>>,
) {
    enum Chunk {
        Stdout(Option<usize>),
        Stderr(Option<usize>),
    }

    let mut out_buf = [0u8; 8192];
    let mut err_buf = [0u8; 8192];

    while stdout.is_some() || stderr.is_some() {
        let chunk = tokio::select! {
            n = read_chunk(&mut stdout, &mut out_buf) => Chunk::Stdout(n),
            n = read_chunk(&mut stderr, &mut err_buf) => Chunk::Stderr(n),
        };

        let mut buffer = sink.lock().unwrap_or_else(|e| e.into_inner());
        match chunk {
            Chunk::Stdout(Some(n)) => buffer.extend_from_slice(&out_buf[..n]),
            Chunk::Stderr(Some(n)) => buffer.extend_from_slice(&err_buf[..n]),
            Chunk::Stdout(None) => stdout = None,
            Chunk::Stderr(None) => stderr = None,
        }
    }
}

/// Read one chunk. `None` means the pipe is closed; a missing pipe never resolves.
async fn read_chunk<R: AsyncRead + Unpin>(reader: &mut Option<R>, buf: &mut [u8]) -> Option<usize> {
    match reader {
        Some(r) => match r.read(buf).await {
            Ok(0) | Err(_) => None,
            Ok(n) => Some(n),
        },
        None => std::future::pending().await,
    }
}
