//! Step outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::duration::format_duration;

/// Reason recorded when cancellation stops a step before it runs.
pub const SKIP_CANCELLED: &str = "execution cancelled";

/// Reason recorded when a dependency of the step failed.
pub const SKIP_DEPENDENCY_FAILED: &str = "dependency failed";

/// Exit code reported when no process exit status exists.
pub const NO_EXIT_CODE: i32 = -1;

/// Terminal status of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step completed successfully.
    Success,

    /// Step failed after exhausting its attempts.
    Failed,

    /// Step never ran (cancelled or dependency failed).
    Skipped,
}

impl StepStatus {
    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Success => '✓',
            StepStatus::Failed => '✗',
            StepStatus::Skipped => '○',
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Success => "success",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// Result of one step, created once the step concludes and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Step id.
    pub id: String,

    /// Terminal status.
    pub status: StepStatus,

    /// Error or skip reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Log of the last attempt, when logging is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Wall-clock time across all attempts.
    #[serde(with = "crate::duration::serde_str")]
    pub duration: Duration,

    /// Exit code of the last attempt, `-1` if the process never exited normally.
    pub exit_code: i32,

    /// Number of attempts made. Zero for skipped steps.
    pub attempt: u32,
}

impl StepResult {
    /// Create a skipped result.
    pub fn skipped(id: &str, reason: &str) -> Self {
        Self {
            id: id.to_string(),
            status: StepStatus::Skipped,
            error: Some(reason.to_string()),
            log_file: None,
            duration: Duration::ZERO,
            exit_code: 0,
            attempt: 0,
        }
    }

    /// Whether this step was skipped because of cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.status == StepStatus::Skipped && self.error.as_deref() == Some(SKIP_CANCELLED)
    }

    /// Whether the step finished successfully.
    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }

    /// Whether the step failed.
    pub fn is_failed(&self) -> bool {
        self.status == StepStatus::Failed
    }

    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        let base = format!(
            "{} {} [{}] {}",
            self.status.display_char(),
            self.id,
            self.status,
            format_duration(self.duration)
        );

        match (&self.status, &self.error) {
            (StepStatus::Success, _) | (_, None) => base,
            (_, Some(error)) => format!("{} - {}", base, error),
        }
    }
}
