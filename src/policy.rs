//! Project execution policy.
//!
//! Policy is a pure predicate over steps, consulted before a plan is
//! built. The defaults are restrictive.

use serde::{Deserialize, Serialize};

use crate::config::{StepConfig, StepKind};
use crate::error::{AnvilError, Result};

/// Policy block of `.foundry.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Permit `type: script` steps
    pub allow_script_steps: bool,
}

impl Policy {
    /// Check that a single step is allowed.
    pub fn validate_step(&self, kind: StepKind, id: &str) -> Result<()> {
        if kind == StepKind::Script && !self.allow_script_steps {
            return Err(AnvilError::PolicyViolation {
                step: id.to_string(),
            });
        }
        Ok(())
    }

    /// Check every step, reporting the first violation.
    pub fn validate_steps(&self, steps: &[StepConfig]) -> Result<()> {
        steps
            .iter()
            .try_for_each(|step| self.validate_step(step.kind, &step.id))
    }
}
