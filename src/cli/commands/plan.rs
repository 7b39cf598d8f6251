//! Plan command implementation.
//!
//! The `anvil plan` command resolves a profile into an ordered plan and
//! writes `plan.json` without running anything.

use std::path::{Path, PathBuf};

use crate::cli::args::PlanArgs;
use crate::error::Result;
use crate::plan::Plan;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::pipeline::{build_plan, check_drift, short_hash, write_plan};

/// The plan command implementation.
pub struct PlanCommand {
    project_root: PathBuf,
    args: PlanArgs,
}

impl PlanCommand {
    /// Create a new plan command.
    pub fn new(project_root: &Path, args: PlanArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }
}

impl Command for PlanCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config_path = self.project_root.join(&self.args.config);
        let out_dir = self.project_root.join(&self.args.out);

        let plan = build_plan(&config_path, &self.args.profile)?;
        check_drift(&out_dir, &plan, ui);
        let written = write_plan(&out_dir, &plan)?;

        if self.args.json {
            ui.message(&serde_json::to_string_pretty(&plan)?);
        } else {
            render_plan(&plan, ui);
            ui.success(&format!("Plan written to {}", written.display()));
        }

        Ok(CommandResult::success())
    }
}

/// Print the numbered execution order.
pub(super) fn render_plan(plan: &Plan, ui: &mut dyn UserInterface) {
    ui.show_header(&format!("{} · {}", plan.project_name, plan.profile));
    let label = if plan.order.len() == 1 { "step" } else { "steps" };
    ui.message(&format!(
        "Plan: {} {} (config {})",
        plan.order.len(),
        label,
        short_hash(&plan.config_hash)
    ));
    for (index, id) in plan.order.iter().enumerate() {
        let deps = plan
            .step(id)
            .map(|s| s.deps.as_slice())
            .unwrap_or_default();
        if deps.is_empty() {
            ui.message(&format!("  {}. {}", index + 1, id));
        } else {
            ui.message(&format!("  {}. {} (after {})", index + 1, id, deps.join(", ")));
        }
    }
}
