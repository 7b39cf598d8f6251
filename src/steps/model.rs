//! The canonical step record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::{StepConfig, StepKind};
use crate::duration::{parse_duration, InvalidDuration};

/// One unit of work, as recorded in a plan.
///
/// Steps are immutable once planning begins. Empty collections and unset
/// values are omitted when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Unique id within the plan
    pub id: String,

    /// Step kind
    #[serde(rename = "type")]
    pub kind: StepKind,

    /// Argument vector; the first element is the program
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// Ids of steps that must reach a terminal state first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<String>,

    /// Environment overrides layered over the inherited environment
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Raw timeout string, parsed when the step runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Additional attempts after the first failure
    #[serde(default, skip_serializing_if = "is_zero")]
    pub retries: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl Step {
    /// Create a shell step with no dependencies.
    pub fn shell<I, S>(id: impl Into<String>, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            kind: StepKind::Shell,
            command: command.into_iter().map(Into::into).collect(),
            deps: Vec::new(),
            env: BTreeMap::new(),
            timeout: None,
            retries: 0,
        }
    }

    /// Builder-style: add dependencies.
    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Builder-style: set the retry budget.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Builder-style: set the timeout string.
    pub fn with_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    /// Builder-style: add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Total attempts allowed: `retries + 1`.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// The step's own timeout, if one is set and non-zero.
    ///
    /// # Errors
    ///
    /// Returns the parse error for a malformed timeout string.
    pub fn timeout(&self) -> Result<Option<Duration>, InvalidDuration> {
        match self.timeout.as_deref() {
            None => Ok(None),
            Some(raw) => {
                let parsed = parse_duration(raw)?;
                Ok((!parsed.is_zero()).then_some(parsed))
            }
        }
    }
}

impl From<&StepConfig> for Step {
    /// Copy a configured step into a plan record.
    ///
    /// Repeated dependency ids collapse to their first occurrence and a
    /// blank timeout is treated as unset.
    fn from(config: &StepConfig) -> Self {
        let mut deps: Vec<String> = Vec::with_capacity(config.deps.len());
        for dep in &config.deps {
            if !deps.contains(dep) {
                deps.push(dep.clone());
            }
        }

        Self {
            id: config.id.clone(),
            kind: config.kind,
            command: config.command.clone(),
            deps,
            env: config.env.clone(),
            timeout: config
                .timeout
                .as_ref()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            retries: config.retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_attempts_is_retries_plus_one() {
        assert_eq!(Step::shell("a", ["true"]).max_attempts(), 1);
        assert_eq!(Step::shell("a", ["true"]).with_retries(2).max_attempts(), 3);
        assert_eq!(
            Step::shell("a", ["true"]).with_retries(u32::MAX).max_attempts(),
            u32::MAX
        );
    }

    #[test]
    fn timeout_parses_or_falls_back() {
        assert_eq!(Step::shell("a", ["true"]).timeout().unwrap(), None);
        assert_eq!(
            Step::shell("a", ["true"]).with_timeout("90s").timeout().unwrap(),
            Some(Duration::from_secs(90))
        );
        assert_eq!(
            Step::shell("a", ["true"]).with_timeout("0s").timeout().unwrap(),
            None
        );
        assert!(Step::shell("a", ["true"])
            .with_timeout("later")
            .timeout()
            .is_err());
    }

    #[test]
    fn from_config_normalizes() {
        let config = StepConfig {
            id: "test".into(),
            kind: StepKind::Shell,
            command: vec!["cargo".into(), "test".into()],
            deps: vec!["build".into(), "lint".into(), "build".into()],
            timeout: Some("  ".into()),
            retries: 1,
            ..Default::default()
        };
        let step = Step::from(&config);
        assert_eq!(step.deps, vec!["build", "lint"]);
        assert_eq!(step.timeout, None);
        assert_eq!(step.retries, 1);
        assert_eq!(step.command, vec!["cargo", "test"]);
    }

    #[test]
    fn serializes_without_empty_fields() {
        let json = serde_json::to_value(Step::shell("a", ["echo", "hi"])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "a", "type": "shell", "command": ["echo", "hi"]})
        );
    }

    #[test]
    fn serializes_all_fields_when_set() {
        let step = Step::shell("b", ["make"])
            .with_deps(["a"])
            .with_env("CI", "1")
            .with_timeout("1m")
            .with_retries(2);
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["deps"], serde_json::json!(["a"]));
        assert_eq!(json["env"]["CI"], "1");
        assert_eq!(json["timeout"], "1m");
        assert_eq!(json["retries"], 2);
    }
}
