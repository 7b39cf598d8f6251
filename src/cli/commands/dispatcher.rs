//! Command dispatching.
//!
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::PathBuf;

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::ui::UserInterface;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    ///
    /// Returns a [`CommandResult`] carrying the process exit code. Errors
    /// that abort the command are returned as `Err` and reported by `main`.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
}

impl CommandDispatcher {
    /// Create a new dispatcher. Relative config and output paths resolve
    /// against `project_root`.
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Commands::Version(args) => super::version::VersionCommand::new(args.clone()).execute(ui),
            Commands::Doctor(args) => {
                super::doctor::DoctorCommand::new(&self.project_root, args.clone()).execute(ui)
            }
            Commands::Plan(args) => {
                super::plan::PlanCommand::new(&self.project_root, args.clone()).execute(ui)
            }
            Commands::Run(args) => {
                super::run::RunCommand::new(&self.project_root, args.clone()).execute(ui)
            }
        }
    }
}
