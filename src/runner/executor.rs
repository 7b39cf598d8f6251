//! Concurrent plan execution.
//!
//! Every planned step gets its own task as soon as execution starts. A task
//! waits until each of its dependencies has a recorded result, then either
//! skips (a dependency failed, or the run was cancelled) or takes a
//! concurrency permit and runs the step. Results are reassembled in plan
//! order at the end, independent of completion order.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::artifacts::{ensure_dir, FileLogSink, LogSink};
use crate::error::{AnvilError, Result};
use crate::plan::Plan;
use crate::runner::observer::{ExecutionEvent, ExecutionObserver, TracingObserver};
use crate::runner::options::ExecuteOptions;
use crate::runner::result::ExecutionResult;
use crate::steps::{Step, StepExecutor, StepResult, SKIP_CANCELLED, SKIP_DEPENDENCY_FAILED};

/// How often a waiting task re-checks its dependencies.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs plans.
pub struct PlanExecutor {
    options: ExecuteOptions,
    observer: Arc<dyn ExecutionObserver>,
    log_sink: Arc<dyn LogSink>,
}

impl PlanExecutor {
    /// Create an executor that reports through `tracing` and writes logs to files.
    pub fn new(options: ExecuteOptions) -> Self {
        Self {
            options,
            observer: Arc::new(TracingObserver),
            log_sink: Arc::new(FileLogSink),
        }
    }

    /// Builder-style: replace the observer.
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Builder-style: replace the log sink.
    pub fn with_log_sink(mut self, log_sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = log_sink;
        self
    }

    /// Get the execution options.
    pub fn options(&self) -> &ExecuteOptions {
        &self.options
    }

    /// Execute every step in `plan.order`.
    ///
    /// Step failures are reported inside the returned [`ExecutionResult`].
    /// `cancel` is observed but never triggered by the executor; fail-fast
    /// uses a child token.
    ///
    /// # Errors
    ///
    /// - `Io` if the output directory cannot be created
    /// - `SchedulerInvariant` if `order` names a step missing from `steps`,
    ///   or if a step ends without a recorded result
    pub async fn execute(&self, plan: &Plan, cancel: &CancellationToken) -> Result<ExecutionResult> {
        let start = Instant::now();

        if let Some(dir) = &self.options.out_dir {
            ensure_dir(dir)?;
        }

        let by_id: HashMap<&str, &Step> = plan.steps.iter().map(|s| (s.id.as_str(), s)).collect();
        let mut scheduled = Vec::with_capacity(plan.order.len());
        for id in &plan.order {
            let step = by_id.get(id.as_str()).ok_or_else(|| AnvilError::SchedulerInvariant {
                message: format!("step \"{}\" in order but not in steps", id),
            })?;
            scheduled.push((*step).clone());
        }

        let ctx = Arc::new(TaskContext {
            results: Mutex::new(HashMap::with_capacity(scheduled.len())),
            failed: Mutex::new(HashSet::new()),
            permits: Semaphore::new(self.options.effective_jobs()),
            cancel: cancel.child_token(),
            fail_fast: self.options.fail_fast,
            observer: Arc::clone(&self.observer),
            steps: StepExecutor::new(
                self.options.out_dir.clone(),
                self.options.default_timeout,
                Arc::clone(&self.log_sink),
                Arc::clone(&self.observer),
            ),
        });

        tracing::debug!(
            steps = scheduled.len(),
            jobs = self.options.effective_jobs(),
            fail_fast = self.options.fail_fast,
            "Launching step tasks"
        );

        let mut tasks = JoinSet::new();
        for step in scheduled {
            tasks.spawn(run_task(Arc::clone(&ctx), step));
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Step task ended abnormally: {}", e);
            }
        }

        let mut results = lock(&ctx.results);
        let mut ordered = Vec::with_capacity(plan.order.len());
        for id in &plan.order {
            let result = results.remove(id).ok_or_else(|| AnvilError::SchedulerInvariant {
                message: format!("missing result for step \"{}\"", id),
            })?;
            ordered.push(result);
        }

        Ok(ExecutionResult::new(ordered, start.elapsed()))
    }
}

/// State shared by all step tasks of one execution.
struct TaskContext {
    results: Mutex<HashMap<String, StepResult>>,
    failed: Mutex<HashSet<String>>,
    permits: Semaphore,
    cancel: CancellationToken,
    fail_fast: bool,
    observer: Arc<dyn ExecutionObserver>,
    steps: StepExecutor,
}

impl TaskContext {
    /// Poll until every dependency has a result. Returns `false` if
    /// cancellation fires while a dependency is still outstanding.
    async fn wait_for_dependencies(&self, deps: &[String]) -> bool {
        loop {
            if self.all_recorded(deps) {
                return true;
            }
            tokio::select! {
                biased;
                // A failing dependency records its result before fail-fast
                // cancels, so its dependents still report the dependency.
                _ = self.cancel.cancelled() => return self.all_recorded(deps),
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }
    }

    fn all_recorded(&self, deps: &[String]) -> bool {
        let results = lock(&self.results);
        deps.iter().all(|dep| results.contains_key(dep))
    }

    fn any_failed(&self, deps: &[String]) -> bool {
        let failed = lock(&self.failed);
        deps.iter().any(|dep| failed.contains(dep))
    }

    fn skip(&self, id: &str, reason: &str) {
        self.observer
            .on_event(ExecutionEvent::StepSkipped { id, reason });
        self.record(StepResult::skipped(id, reason));
    }

    fn record(&self, result: StepResult) {
        lock(&self.results).insert(result.id.clone(), result);
    }
}

async fn run_task(ctx: Arc<TaskContext>, step: Step) {
    if !ctx.wait_for_dependencies(&step.deps).await {
        ctx.skip(&step.id, SKIP_CANCELLED);
        return;
    }

    if ctx.any_failed(&step.deps) {
        ctx.skip(&step.id, SKIP_DEPENDENCY_FAILED);
        return;
    }

    // Only steps ready to run hold a permit.
    let permit = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        permit = ctx.permits.acquire() => permit.ok(),
    };
    let Some(_permit) = permit else {
        ctx.skip(&step.id, SKIP_CANCELLED);
        return;
    };

    let result = ctx.steps.run(&step, &ctx.cancel).await;
    ctx.observer
        .on_event(ExecutionEvent::StepFinished { result: &result });

    let failed = result.is_failed();
    // Mark the failure before publishing the result so a dependent never
    // sees the result without the failure.
    if failed {
        lock(&ctx.failed).insert(step.id.clone());
    }
    ctx.record(result);

    if failed && ctx.fail_fast {
        tracing::debug!(step = %step.id, "Fail-fast: cancelling remaining steps");
        ctx.cancel.cancel();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::runner::observer::NullObserver;
    use crate::runner::result::RunStatus;
    use crate::steps::StepStatus;
    use tempfile::TempDir;

    fn sh(id: &str, script: &str) -> Step {
        Step::shell(id, ["sh", "-c", script])
    }

    fn plan(steps: Vec<Step>) -> Plan {
        Plan::build("test", "default", steps, b"").unwrap()
    }

    fn executor() -> PlanExecutor {
        PlanExecutor::new(ExecuteOptions::default().with_out_dir(None))
            .with_observer(Arc::new(NullObserver))
    }

    #[tokio::test]
    async fn empty_plan_succeeds() {
        let result = executor()
            .execute(&plan(vec![]), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Success);
        assert!(result.steps.is_empty());
    }

    #[tokio::test]
    async fn dependency_runs_before_dependent() {
        let temp = TempDir::new().unwrap();
        let trace = temp.path().join("trace");
        let append = |id: &str| format!("sleep 0.05; echo {} >> '{}'", id, trace.display());

        let p = plan(vec![
            sh("second", &append("second")).with_deps(["first"]),
            sh("first", &append("first")),
        ]);
        let result = executor()
            .execute(&p, &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_success());
        let lines = std::fs::read_to_string(&trace).unwrap();
        assert_eq!(lines, "first\nsecond\n");
    }

    #[tokio::test]
    async fn results_follow_plan_order_not_completion_order() {
        let p = plan(vec![
            sh("a_slow", "sleep 0.2"),
            sh("b_fast", "true"),
        ]);
        let result = executor()
            .execute(&p, &CancellationToken::new())
            .await
            .unwrap();
        let ids: Vec<_> = result.steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a_slow", "b_fast"]);
    }

    #[tokio::test]
    async fn jobs_limit_serializes_independent_steps() {
        let p = plan(vec![
            sh("a", "sleep 0.1"),
            sh("b", "sleep 0.1"),
            sh("c", "sleep 0.1"),
        ]);
        let start = Instant::now();
        let result = executor()
            .execute(&p, &CancellationToken::new())
            .await
            .unwrap();
        let parallel = start.elapsed();
        assert!(result.is_success());

        let serial_executor = PlanExecutor::new(
            ExecuteOptions::default().with_out_dir(None).with_jobs(1),
        )
        .with_observer(Arc::new(NullObserver));
        let start = Instant::now();
        serial_executor
            .execute(&p, &CancellationToken::new())
            .await
            .unwrap();
        let serial = start.elapsed();

        assert!(serial >= Duration::from_millis(300));
        assert!(parallel < serial);
    }

    #[tokio::test]
    async fn single_permit_does_not_deadlock_on_chains() {
        let p = plan(vec![
            sh("c", "true").with_deps(["b"]),
            sh("b", "true").with_deps(["a"]),
            sh("a", "true"),
        ]);
        let executor = PlanExecutor::new(ExecuteOptions::default().with_out_dir(None).with_jobs(1))
            .with_observer(Arc::new(NullObserver));
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            executor.execute(&p, &CancellationToken::new()),
        )
        .await
        .expect("chain with one permit must finish")
        .unwrap();
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn fail_fast_interrupts_running_steps() {
        let p = plan(vec![
            sh("a_fail", "exit 1"),
            sh("b_slow", "sleep 2"),
            sh("c_after", "true").with_deps(["b_slow"]),
        ]);
        let start = Instant::now();
        let result = executor()
            .execute(&p, &CancellationToken::new())
            .await
            .unwrap();

        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(result.status, RunStatus::Failed);
        let slow = result.step("b_slow").unwrap();
        assert_eq!(slow.status, StepStatus::Failed);
        assert_eq!(slow.error.as_deref(), Some("interrupted by cancellation"));
        assert_eq!(result.step("c_after").unwrap().status, StepStatus::Skipped);
    }

    #[tokio::test]
    async fn dependent_of_failed_step_reports_dependency_under_fail_fast() {
        let p = plan(vec![
            sh("a", "exit 1"),
            sh("b", "true").with_deps(["a"]),
        ]);
        let result = executor()
            .execute(&p, &CancellationToken::new())
            .await
            .unwrap();

        let b = result.step("b").unwrap();
        assert_eq!(b.status, StepStatus::Skipped);
        assert_eq!(b.error.as_deref(), Some(SKIP_DEPENDENCY_FAILED));
    }

    #[tokio::test]
    async fn without_fail_fast_independent_steps_finish() {
        let p = plan(vec![
            sh("a_fail", "exit 1"),
            sh("b_slow", "sleep 0.2"),
            sh("c_after", "true").with_deps(["b_slow"]),
        ]);
        let executor = PlanExecutor::new(
            ExecuteOptions::default()
                .with_out_dir(None)
                .with_fail_fast(false),
        )
        .with_observer(Arc::new(NullObserver));
        let result = executor
            .execute(&p, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Failed);
        assert!(result.step("b_slow").unwrap().is_success());
        assert!(result.step("c_after").unwrap().is_success());
    }

    #[tokio::test]
    async fn caller_cancellation_skips_everything_pending() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let p = plan(vec![sh("a", "true"), sh("b", "true").with_deps(["a"])]);
        let result = executor().execute(&p, &cancel).await.unwrap();

        for step in &result.steps {
            assert_eq!(step.status, StepStatus::Skipped);
            assert_eq!(step.error.as_deref(), Some(SKIP_CANCELLED));
            assert_eq!(step.attempt, 0);
        }
        assert_eq!(result.status, RunStatus::Success);
    }

    #[tokio::test]
    async fn executor_never_cancels_caller_token() {
        let cancel = CancellationToken::new();
        let p = plan(vec![sh("a", "exit 1")]);
        executor().execute(&p, &cancel).await.unwrap();
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn order_naming_unknown_step_is_invariant_error() {
        let mut p = plan(vec![sh("a", "true")]);
        p.order.push("ghost".to_string());
        let err = executor()
            .execute(&p, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AnvilError::SchedulerInvariant { .. }));
    }

    #[tokio::test]
    async fn creates_output_directory() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("nested/out");
        let executor = PlanExecutor::new(ExecuteOptions::default().with_out_dir(Some(out.clone())))
            .with_observer(Arc::new(NullObserver));
        let result = executor
            .execute(&plan(vec![sh("a", "echo hi")]), &CancellationToken::new())
            .await
            .unwrap();
        assert!(out.is_dir());
        assert_eq!(
            result.steps[0].log_file.as_deref(),
            Some(out.join("a.1.log").as_path())
        );
    }
}
