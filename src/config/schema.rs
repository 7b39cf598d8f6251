//! Configuration schema definitions for anvil.
//!
//! This module contains the struct definitions that map to the
//! `.foundry.yaml` file format. Unknown keys are rejected at every level.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::policy::Policy;

/// Root configuration structure for `.foundry.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FoundryConfig {
    /// Schema version. Only `1` is supported.
    pub version: u32,

    /// Project metadata
    pub project: Project,

    /// Execution policy
    pub policy: Policy,

    /// Named step collections
    pub profiles: BTreeMap<String, Profile>,
}

/// Project-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Project {
    /// Project name, stamped into every plan
    pub name: String,
}

/// A named collection of steps that may extend another profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    /// Parent profile whose steps are inherited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Steps defined (or overridden) by this profile
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepConfig>,
}

/// The kind of work a step performs.
///
/// Every kind is accepted by configuration; only [`StepKind::Shell`] is
/// executable today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Run an external command
    #[default]
    Shell,
    /// Delegate to a plugin
    Plugin,
    /// Run an inline script
    Script,
}

impl StepKind {
    /// The configuration name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Shell => "shell",
            StepKind::Plugin => "plugin",
            StepKind::Script => "script",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a single step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    /// Unique identifier within the resolved profile
    pub id: String,

    /// Step kind; `shell` when omitted
    #[serde(rename = "type", default)]
    pub kind: StepKind,

    /// Argument vector; the first element is the program
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// Ids of steps that must finish first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<String>,

    /// Extra environment variables layered over the inherited environment
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Hard deadline such as `30s` or `1m30s`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Additional attempts after the first failure
    #[serde(default, skip_serializing_if = "is_zero")]
    pub retries: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}
