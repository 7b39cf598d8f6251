//! The result document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::artifacts::{ensure_dir, read_json, write_json, RESULTS_FILE};
use crate::error::{AnvilError, Result};
use crate::steps::StepResult;

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// No step failed.
    Success,
    /// At least one step failed.
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Aggregated outcome of executing a plan.
///
/// `steps` follows the plan's order, not completion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// `failed` if any step failed, else `success`
    pub status: RunStatus,

    /// Total wall-clock time
    #[serde(with = "crate::duration::serde_str")]
    pub duration: Duration,

    /// One result per planned step
    pub steps: Vec<StepResult>,
}

impl ExecutionResult {
    /// Assemble a result, deriving the overall status from the steps.
    pub fn new(steps: Vec<StepResult>, duration: Duration) -> Self {
        let status = if steps.iter().any(StepResult::is_failed) {
            RunStatus::Failed
        } else {
            RunStatus::Success
        };
        Self {
            status,
            duration,
            steps,
        }
    }

    /// Whether the run succeeded.
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Look up a step's result by id.
    pub fn step(&self, id: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Ids of failed steps, in plan order.
    pub fn failed_steps(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.is_failed())
            .map(|s| s.id.as_str())
            .collect()
    }

    /// Write the result to `<dir>/results.json`, returning the path.
    ///
    /// # Errors
    ///
    /// Fails if `dir` is empty or cannot be written.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        if dir.as_os_str().is_empty() {
            return Err(AnvilError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "write results: output directory is empty",
            )));
        }
        ensure_dir(dir)?;
        let path = dir.join(RESULTS_FILE);
        write_json(&path, self)?;
        Ok(path)
    }

    /// Read a result previously written with [`ExecutionResult::write`].
    pub fn read(dir: &Path) -> Result<Self> {
        read_json(&dir.join(RESULTS_FILE))
    }
}
