//! Anvil - a deterministic DAG pipeline runner.
//!
//! A pipeline is a YAML file of named profiles, each a list of steps with
//! dependencies. Anvil resolves a profile into a [`plan::Plan`] with a
//! stable topological order, then runs it concurrently with a
//! [`runner::PlanExecutor`], writing per-attempt logs and a result document.
//!
//! # Modules
//!
//! - [`artifacts`] - Output directory layout and JSON persistence
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, profile resolution, and validation
//! - [`duration`] - Duration strings such as `90s` or `1m30s`
//! - [`error`] - Error types and result aliases
//! - [`plan`] - Dependency graph, topological order, and the plan document
//! - [`policy`] - Which step types a configuration may use
//! - [`runner`] - Concurrent plan execution
//! - [`shell`] - Child process execution
//! - [`steps`] - Step records, step results, and the retry loop
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```
//! use anvil::plan::Plan;
//! use anvil::steps::Step;
//!
//! let plan = Plan::build(
//!     "demo",
//!     "default",
//!     vec![
//!         Step::shell("test", ["cargo", "test"]).with_deps(["build"]),
//!         Step::shell("build", ["cargo", "build"]),
//!     ],
//!     b"raw config bytes",
//! )
//! .unwrap();
//! assert_eq!(plan.order, vec!["build", "test"]);
//! ```

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod plan;
pub mod policy;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod ui;

pub use error::{AnvilError, Result};
