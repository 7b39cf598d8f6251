//! Doctor command implementation.
//!
//! The `anvil doctor` command runs a few quick environment checks and
//! prints one PASS/FAIL line per check.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context};

use crate::cli::args::DoctorArgs;
use crate::config::load_config;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// One named check and its outcome.
#[derive(Debug)]
pub struct CheckOutcome {
    pub name: String,
    pub error: Option<String>,
}

impl CheckOutcome {
    fn from_result(name: impl Into<String>, result: anyhow::Result<()>) -> Self {
        Self {
            name: name.into(),
            // {:#} prints the whole context chain on one line
            error: result.err().map(|e| format!("{:#}", e)),
        }
    }

    /// Whether the check passed.
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }

    /// The line printed for this check.
    pub fn line(&self) -> String {
        match &self.error {
            None => format!("PASS {}", self.name),
            Some(e) => format!("FAIL {}: {}", self.name, e),
        }
    }
}

/// The doctor command implementation.
pub struct DoctorCommand {
    project_root: PathBuf,
    args: DoctorArgs,
}

impl DoctorCommand {
    /// Create a new doctor command.
    pub fn new(project_root: &Path, args: DoctorArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }

    /// Run every check.
    pub fn checks(&self) -> Vec<CheckOutcome> {
        let config_path = self.project_root.join(&self.args.config);
        vec![
            CheckOutcome::from_result("config file exists", check_exists(&config_path)),
            CheckOutcome::from_result("config is valid", check_config(&config_path)),
            CheckOutcome::from_result("shell is available", check_shell()),
        ]
    }
}

fn check_exists(path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        bail!("{} not found", path.display());
    }
    Ok(())
}

fn check_config(path: &Path) -> anyhow::Result<()> {
    load_config(path).with_context(|| format!("loading {}", path.display()))?;
    Ok(())
}

fn check_shell() -> anyhow::Result<()> {
    let status = std::process::Command::new("sh")
        .args(["-c", "true"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("running sh")?;
    if !status.success() {
        bail!("sh -c true exited with {}", status);
    }
    Ok(())
}

impl Command for DoctorCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let checks = self.checks();
        for check in &checks {
            ui.message(&check.line());
        }

        let failed = checks.iter().filter(|c| !c.passed()).count();
        if failed == 0 {
            ui.message("All checks passed.");
            Ok(CommandResult::success())
        } else {
            ui.error(&format!("{} check(s) failed", failed));
            Ok(CommandResult::failure(1))
        }
    }
}
