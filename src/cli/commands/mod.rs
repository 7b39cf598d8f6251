//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands are
//! routed by [`CommandDispatcher`].

pub mod dispatcher;
pub mod doctor;
pub mod pipeline;
pub mod plan;
pub mod run;
pub mod version;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
