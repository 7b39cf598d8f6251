//! Version command implementation.

use serde::Serialize;

use crate::cli::args::VersionArgs;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const COMMIT: &str = match option_env!("ANVIL_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};

const BUILD_DATE: &str = match option_env!("ANVIL_BUILD_DATE") {
    Some(date) => date,
    None => "unknown",
};

/// Build information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub build_date: &'static str,
}

impl VersionInfo {
    /// Information about the running binary.
    pub fn current() -> Self {
        Self {
            version: VERSION,
            commit: COMMIT,
            build_date: BUILD_DATE,
        }
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "anvil {} (commit {}, built {})",
            self.version, self.commit, self.build_date
        )
    }
}

/// The version command implementation.
pub struct VersionCommand {
    args: VersionArgs,
}

impl VersionCommand {
    /// Create a new version command.
    pub fn new(args: VersionArgs) -> Self {
        Self { args }
    }
}

impl Command for VersionCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let info = VersionInfo::current();
        if self.args.json {
            ui.message(&serde_json::to_string_pretty(&info)?);
        } else {
            ui.message(&info.to_string());
        }
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;

    #[test]
    fn human_output() {
        let mut ui = MockUI::new();
        VersionCommand::new(VersionArgs::default())
            .execute(&mut ui)
            .unwrap();
        let line = &ui.messages()[0];
        assert!(line.starts_with(&format!("anvil {} (commit ", VERSION)));
        assert!(line.contains(", built "));
    }

    #[test]
    fn json_output() {
        let mut ui = MockUI::new();
        VersionCommand::new(VersionArgs { json: true })
            .execute(&mut ui)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        assert_eq!(value["version"], VERSION);
        assert!(value["commit"].is_string());
        assert!(value["build_date"].is_string());
    }
}
