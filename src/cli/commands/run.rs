//! Run command implementation.
//!
//! The `anvil run` command plans a profile and executes it. Interrupting
//! with Ctrl-C cancels the run; finished steps keep their results and
//! everything else is reported as skipped.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::cli::args::RunArgs;
use crate::duration::format_duration;
use crate::error::Result;
use crate::plan::Plan;
use crate::runner::{ExecuteOptions, ExecutionResult, PlanExecutor};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::pipeline::{build_plan, check_drift, write_plan};

/// The run command implementation.
pub struct RunCommand {
    project_root: PathBuf,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(project_root: &Path, args: RunArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    fn options(&self, out_dir: PathBuf) -> ExecuteOptions {
        ExecuteOptions::default()
            .with_out_dir(Some(out_dir))
            .with_default_timeout(Some(self.args.timeout))
            .with_jobs(self.args.jobs)
            .with_fail_fast(!self.args.no_fail_fast)
    }

    fn execute_plan(&self, plan: &Plan, out_dir: PathBuf) -> Result<ExecutionResult> {
        let executor = PlanExecutor::new(self.options(out_dir));

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        runtime.block_on(async {
            let cancel = CancellationToken::new();
            let interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, cancelling remaining steps");
                    interrupt.cancel();
                }
            });

            executor.execute(plan, &cancel).await
        })
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config_path = self.project_root.join(&self.args.config);
        let out_dir = self.project_root.join(&self.args.out);

        let plan = build_plan(&config_path, &self.args.profile)?;
        check_drift(&out_dir, &plan, ui);
        write_plan(&out_dir, &plan)?;

        if !self.args.json {
            let label = if plan.order.len() == 1 { "step" } else { "steps" };
            ui.show_header(&format!(
                "{} · {} · {} {}",
                plan.project_name,
                plan.profile,
                plan.order.len(),
                label
            ));
        }

        let result = self.execute_plan(&plan, out_dir.clone())?;
        result.write(&out_dir)?;

        if self.args.json {
            ui.message(&serde_json::to_string_pretty(&result)?);
        } else {
            ui.message(&format!(
                "Execution {} ({})",
                result.status,
                format_duration(result.duration)
            ));
            for step in &result.steps {
                ui.step_result(step);
            }
        }

        if result.is_success() {
            Ok(CommandResult::success())
        } else {
            if !self.args.json {
                ui.error(&format!("Failed steps: {}", result.failed_steps().join(", ")));
            }
            Ok(CommandResult::failure(1))
        }
    }
}
