//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::artifacts::DEFAULT_OUT_DIR;
use crate::config::DEFAULT_CONFIG_FILE;
use crate::duration::parse_duration;
use crate::runner::{DEFAULT_JOBS, DEFAULT_TIMEOUT};

/// anvil - deterministic DAG pipeline runner.
#[derive(Debug, Parser)]
#[command(name = "anvil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print version information
    Version(VersionArgs),

    /// Check that the environment can run pipelines
    Doctor(DoctorArgs),

    /// Resolve a profile into an execution plan
    Plan(PlanArgs),

    /// Plan and execute a profile
    Run(RunArgs),
}

/// Arguments for the `version` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `doctor` command.
#[derive(Debug, Clone, clap::Args)]
pub struct DoctorArgs {
    /// Path to the pipeline configuration
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

impl Default for DoctorArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }
}

/// Arguments for the `plan` command.
#[derive(Debug, Clone, clap::Args)]
pub struct PlanArgs {
    /// Profile to plan
    #[arg(short, long, default_value = "default")]
    pub profile: String,

    /// Path to the pipeline configuration
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory for plan.json
    #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
    pub out: PathBuf,

    /// Output the plan as JSON
    #[arg(long)]
    pub json: bool,
}

impl Default for PlanArgs {
    fn default() -> Self {
        Self {
            profile: "default".to_string(),
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            out: PathBuf::from(DEFAULT_OUT_DIR),
            json: false,
        }
    }
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Profile to run
    #[arg(short, long, default_value = "default")]
    pub profile: String,

    /// Path to the pipeline configuration
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory for plan.json, results.json and step logs
    #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
    pub out: PathBuf,

    /// Maximum number of steps running at once
    #[arg(short, long, default_value_t = DEFAULT_JOBS)]
    pub jobs: usize,

    /// Timeout for steps without their own (e.g. 90s, 5m); 0 disables it
    #[arg(long, default_value = "5m", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Keep running independent steps after a failure
    #[arg(long)]
    pub no_fail_fast: bool,

    /// Output the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            profile: "default".to_string(),
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            out: PathBuf::from(DEFAULT_OUT_DIR),
            jobs: DEFAULT_JOBS,
            timeout: DEFAULT_TIMEOUT,
            no_fail_fast: false,
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_match_runtime_defaults() {
        let cli = Cli::try_parse_from(["anvil", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.profile, "default");
        assert_eq!(args.jobs, 4);
        assert_eq!(args.timeout, Duration::from_secs(300));
        assert!(!args.no_fail_fast);
        assert_eq!(args.config, PathBuf::from(".foundry.yaml"));
        assert_eq!(args.out, PathBuf::from(".foundry/out"));
    }

    #[test]
    fn run_parses_flags() {
        let cli = Cli::try_parse_from([
            "anvil",
            "--quiet",
            "run",
            "--profile",
            "ci",
            "--jobs",
            "2",
            "--timeout",
            "90s",
            "--no-fail-fast",
            "--json",
        ])
        .unwrap();
        assert!(cli.quiet);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.profile, "ci");
        assert_eq!(args.jobs, 2);
        assert_eq!(args.timeout, Duration::from_secs(90));
        assert!(args.no_fail_fast);
        assert!(args.json);
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["anvil", "run", "--timeout", "soon"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["anvil", "plan", "--debug", "--log-format", "json"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["anvil"]).is_err());
    }
}
