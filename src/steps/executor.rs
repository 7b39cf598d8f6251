//! Step execution with retries.
//!
//! Runs one step to a terminal [`StepResult`]: up to `retries + 1`
//! sequential attempts, a short pause between them, and one log file per
//! attempt.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::artifacts::LogSink;
use crate::config::StepKind;
use crate::duration::format_duration;
use crate::runner::observer::{ExecutionEvent, ExecutionObserver};
use crate::shell::{self, CommandOptions, Termination};
use crate::steps::model::Step;
use crate::steps::result::{StepResult, StepStatus, NO_EXIT_CODE};

/// Pause between a failed attempt and the next one.
pub const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Outcome of a single attempt.
#[derive(Debug, Clone)]
struct AttemptOutcome {
    succeeded: bool,
    error: Option<String>,
    exit_code: i32,
    log_file: Option<PathBuf>,
    /// Configuration errors fail identically every time.
    retryable: bool,
}

impl AttemptOutcome {
    fn config_error(message: String) -> Self {
        Self {
            succeeded: false,
            error: Some(message),
            exit_code: NO_EXIT_CODE,
            log_file: None,
            retryable: false,
        }
    }
}

/// Executes individual steps.
pub struct StepExecutor {
    log_dir: Option<PathBuf>,
    default_timeout: Option<Duration>,
    log_sink: Arc<dyn LogSink>,
    observer: Arc<dyn ExecutionObserver>,
}

impl StepExecutor {
    /// Create a step executor.
    ///
    /// `log_dir = None` disables per-attempt logs. `default_timeout` applies to
    /// steps without their own timeout; `None` or zero means no deadline.
    pub fn new(
        log_dir: Option<PathBuf>,
        default_timeout: Option<Duration>,
        log_sink: Arc<dyn LogSink>,
        observer: Arc<dyn ExecutionObserver>,
    ) -> Self {
        Self {
            log_dir,
            default_timeout: default_timeout.filter(|t| !t.is_zero()),
            log_sink,
            observer,
        }
    }

    /// Run a step to completion.
    ///
    /// Stops early on success, on a configuration error, or when `cancel`
    /// fires. The returned duration covers every attempt.
    pub async fn run(&self, step: &Step, cancel: &CancellationToken) -> StepResult {
        let start = Instant::now();
        let max_attempts = step.max_attempts();
        let mut attempt = 1;

        loop {
            self.observer.on_event(ExecutionEvent::StepStarting {
                id: &step.id,
                attempt,
                max_attempts,
                command: &step.command,
            });

            let outcome = self.attempt(step, attempt, cancel).await;

            let finished = outcome.succeeded
                || !outcome.retryable
                || attempt >= max_attempts
                || cancel.is_cancelled();

            if !outcome.succeeded {
                self.observer.on_event(ExecutionEvent::AttemptFailed {
                    id: &step.id,
                    attempt,
                    error: outcome.error.as_deref().unwrap_or(""),
                });
            }

            if finished {
                return finish(step, attempt, outcome, start.elapsed());
            }

            tokio::select! {
                _ = cancel.cancelled() => return finish(step, attempt, outcome, start.elapsed()),
                _ = tokio::time::sleep(RETRY_DELAY) => {}
            }

            attempt += 1;
        }
    }

    async fn attempt(&self, step: &Step, attempt: u32, cancel: &CancellationToken) -> AttemptOutcome {
        if step.kind != StepKind::Shell {
            return AttemptOutcome::config_error(format!("unsupported step type: {}", step.kind));
        }
        if step.command.is_empty() {
            return AttemptOutcome::config_error("empty command".to_string());
        }
        let timeout = match step.timeout() {
            Ok(Some(t)) => Some(t),
            Ok(None) => self.default_timeout,
            Err(e) => return AttemptOutcome::config_error(format!("invalid timeout: {}", e)),
        };

        let options = CommandOptions {
            cwd: None,
            env: step.env.clone(),
            timeout,
        };

        let (outcome, output) = match shell::execute(&step.command, &options, cancel).await {
            Ok(result) => {
                let (succeeded, error) = match result.termination {
                    Termination::Exited => match result.exit_code {
                        Some(0) => (true, None),
                        Some(code) => (false, Some(format!("exit status {}", code))),
                        None => (false, Some("terminated by signal".to_string())),
                    },
                    Termination::TimedOut(limit) => (
                        false,
                        Some(format!("timed out after {}", format_duration(limit))),
                    ),
                    Termination::Cancelled => {
                        (false, Some("interrupted by cancellation".to_string()))
                    }
                };
                let outcome = AttemptOutcome {
                    succeeded,
                    error,
                    exit_code: result.exit_code.unwrap_or(NO_EXIT_CODE),
                    log_file: None,
                    retryable: true,
                };
                (outcome, result.output)
            }
            Err(e) => {
                let outcome = AttemptOutcome {
                    succeeded: false,
                    error: Some(format!("failed to start '{}': {}", step.command[0], e)),
                    exit_code: NO_EXIT_CODE,
                    log_file: None,
                    retryable: true,
                };
                (outcome, Vec::new())
            }
        };

        AttemptOutcome {
            log_file: self.write_log(step, attempt, &output),
            ..outcome
        }
    }

    /// Persist an attempt's output as `<log_dir>/<id>.<attempt>.log`.
    fn write_log(&self, step: &Step, attempt: u32, output: &[u8]) -> Option<PathBuf> {
        let dir = self.log_dir.as_ref()?;
        let path = dir.join(format!("{}.{}.log", step.id, attempt));
        match self.log_sink.write_log(&path, output) {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(step = %step.id, path = %path.display(), "Failed to write log: {}", e);
                None
            }
        }
    }
}

fn finish(step: &Step, attempt: u32, outcome: AttemptOutcome, duration: Duration) -> StepResult {
    StepResult {
        id: step.id.clone(),
        status: if outcome.succeeded {
            StepStatus::Success
        } else {
            StepStatus::Failed
        },
        error: outcome.error,
        log_file: outcome.log_file,
        duration,
        exit_code: if outcome.succeeded { 0 } else { outcome.exit_code },
        attempt,
    }
}
