//! External process execution.

pub mod command;

pub use command::{execute, CommandOptions, CommandResult, Termination};
