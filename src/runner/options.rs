//! Executor options.

use std::path::PathBuf;
use std::time::Duration;

use crate::artifacts::DEFAULT_OUT_DIR;

/// Default number of steps allowed to run at once.
pub const DEFAULT_JOBS: usize = 4;

/// Default deadline for steps without their own timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Options for plan execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Where per-attempt logs are written. `None` disables logs.
    pub out_dir: Option<PathBuf>,

    /// Deadline for steps without their own timeout. `None` means no deadline.
    pub default_timeout: Option<Duration>,

    /// Upper bound on steps running their command at the same time.
    /// Zero is treated as one.
    pub jobs: usize,

    /// Cancel everything not yet finished after the first failure.
    pub fail_fast: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            out_dir: Some(PathBuf::from(DEFAULT_OUT_DIR)),
            default_timeout: Some(DEFAULT_TIMEOUT),
            jobs: DEFAULT_JOBS,
            fail_fast: true,
        }
    }
}

impl ExecuteOptions {
    /// Builder-style: set the log directory.
    pub fn with_out_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.out_dir = dir;
        self
    }

    /// Builder-style: set the default timeout.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Builder-style: set the concurrency limit.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Builder-style: toggle fail-fast.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// The concurrency limit actually used.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ExecuteOptions::default();
        assert_eq!(options.jobs, 4);
        assert_eq!(options.default_timeout, Some(Duration::from_secs(300)));
        assert!(options.fail_fast);
        assert_eq!(options.out_dir, Some(PathBuf::from(".foundry/out")));
    }

    #[test]
    fn zero_jobs_means_one() {
        assert_eq!(ExecuteOptions::default().with_jobs(0).effective_jobs(), 1);
        assert_eq!(ExecuteOptions::default().with_jobs(8).effective_jobs(), 8);
    }
}
