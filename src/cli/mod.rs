//! Command-line interface for anvil.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, DoctorArgs, LogFormat, PlanArgs, RunArgs, VersionArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
