//! Loading a profile into a plan, shared by `plan` and `run`.

use std::path::{Path, PathBuf};

use crate::artifacts::ensure_dir;
use crate::config::{load_config, resolve_profile};
use crate::error::Result;
use crate::plan::Plan;
use crate::steps::Step;
use crate::ui::UserInterface;

/// Load the configuration, resolve `profile`, enforce the policy, and build
/// the plan.
pub fn build_plan(config_path: &Path, profile: &str) -> Result<Plan> {
    let loaded = load_config(config_path)?;
    let resolved = resolve_profile(&loaded.config, profile)?;
    loaded.config.policy.validate_steps(&resolved)?;

    let steps = resolved.iter().map(Step::from).collect();
    Plan::build(&loaded.config.project.name, profile, steps, &loaded.raw)
}

/// Warn if the plan last written to `out_dir` came from a different
/// configuration.
pub fn check_drift(out_dir: &Path, plan: &Plan, ui: &mut dyn UserInterface) {
    if !out_dir.join(crate::artifacts::PLAN_FILE).exists() {
        return;
    }
    match Plan::read(out_dir) {
        Ok(previous) => {
            if previous.config_hash != plan.config_hash {
                ui.warning(&format!(
                    "Configuration changed since the last plan ({} -> {})",
                    short_hash(&previous.config_hash),
                    short_hash(&plan.config_hash)
                ));
            }
        }
        Err(e) => tracing::debug!("Ignoring unreadable previous plan: {}", e),
    }
}

/// Write `plan.json` into `out_dir`, creating it if needed.
pub fn write_plan(out_dir: &Path, plan: &Plan) -> Result<PathBuf> {
    ensure_dir(out_dir)?;
    plan.write(out_dir)
}

/// First twelve hex digits of a hash.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
