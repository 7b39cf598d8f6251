//! Execution lifecycle events.
//!
//! The executor reports progress through an [`ExecutionObserver`] handed to
//! it by the caller instead of logging through a process-wide default.
//! Observers are shared across step tasks, so they must be `Send + Sync`.

use crate::steps::StepResult;

/// Progress events emitted during plan execution.
#[derive(Debug)]
pub enum ExecutionEvent<'a> {
    /// An attempt is about to start.
    StepStarting {
        id: &'a str,
        attempt: u32,
        max_attempts: u32,
        command: &'a [String],
    },
    /// An attempt failed; another may follow.
    AttemptFailed {
        id: &'a str,
        attempt: u32,
        error: &'a str,
    },
    /// A step ran and reached a terminal status.
    StepFinished { result: &'a StepResult },
    /// A step never ran.
    StepSkipped { id: &'a str, reason: &'a str },
}

/// Receives execution events.
pub trait ExecutionObserver: Send + Sync {
    /// Handle one event. Called from step tasks; must not block for long.
    fn on_event(&self, event: ExecutionEvent<'_>);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn on_event(&self, event: ExecutionEvent<'_>) {
        match event {
            ExecutionEvent::StepStarting {
                id,
                attempt,
                max_attempts,
                command,
            } => {
                tracing::info!(step = id, attempt, max_attempts, ?command, "executing step");
            }
            ExecutionEvent::AttemptFailed { id, attempt, error } => {
                tracing::warn!(step = id, attempt, error, "attempt failed");
            }
            ExecutionEvent::StepFinished { result } => {
                if result.is_success() {
                    tracing::info!(
                        step = %result.id,
                        attempt = result.attempt,
                        duration = ?result.duration,
                        "step succeeded"
                    );
                } else {
                    tracing::error!(
                        step = %result.id,
                        attempt = result.attempt,
                        exit_code = result.exit_code,
                        error = result.error.as_deref().unwrap_or(""),
                        "step failed"
                    );
                }
            }
            ExecutionEvent::StepSkipped { id, reason } => {
                tracing::info!(step = id, reason, "step skipped");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ExecutionObserver for NullObserver {
    fn on_event(&self, _event: ExecutionEvent<'_>) {}
}
