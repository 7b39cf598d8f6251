//! Configuration validation rules.
//!
//! This module validates configuration for correctness:
//! - Version must be `1` and the project must be named
//! - At least one profile must exist and every `extends:` must resolve
//! - Step ids must be non-empty, unique within a profile, and usable as
//!   a file name (attempt logs are named after them)
//! - Shell steps must have a command
//! - `deps` must reference steps visible to the profile (own or inherited)
//!
//! Dependency cycles are left to the planner, which reports them with the
//! offending path.

use std::collections::HashSet;

use crate::config::profile::{extends_chain, resolve_profile};
use crate::config::schema::{FoundryConfig, StepKind};
use crate::error::{AnvilError, Result};

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Profile name if error is profile-specific
    pub profile: Option<String>,
    /// Step id if error is step-specific
    pub step: Option<String>,
}

impl ValidationError {
    fn global(rule: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            profile: None,
            step: None,
        }
    }

    fn in_profile(rule: &str, profile: &str, step: Option<&str>, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            profile: Some(profile.to_string()),
            step: step.map(String::from),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// This function collects all validation errors rather than stopping
/// at the first one, allowing users to fix multiple issues at once.
pub fn validate_config(config: &FoundryConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.version != 1 {
        errors.push(ValidationError::global(
            "unsupported-version",
            format!(
                "unsupported config version {} (expected 1)",
                config.version
            ),
        ));
    }

    if config.project.name.trim().is_empty() {
        errors.push(ValidationError::global(
            "missing-project-name",
            "project.name must be non-empty".to_string(),
        ));
    }

    if config.profiles.is_empty() {
        errors.push(ValidationError::global(
            "no-profiles",
            "at least one profile must be defined".to_string(),
        ));
    }

    for name in config.profiles.keys() {
        errors.extend(validate_profile(config, name));
    }

    errors
}

fn validate_profile(config: &FoundryConfig, name: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let Some(profile) = config.profiles.get(name) else {
        return errors;
    };

    if let Err(e) = extends_chain(config, name) {
        let message = match e {
            AnvilError::ProfileNotFound { name: missing } => format!(
                "profile '{}' extends non-existent profile '{}'",
                name, missing
            ),
            other => other.to_string(),
        };
        errors.push(ValidationError::in_profile("bad-extends", name, None, message));
        // Without a resolvable chain the visible step set is unknown.
        return errors;
    }

    let mut seen = HashSet::new();
    for step in &profile.steps {
        if step.id.trim().is_empty() {
            errors.push(ValidationError::in_profile(
                "empty-step-id",
                name,
                None,
                format!("profile '{}' has step with empty id", name),
            ));
            continue;
        }

        if !is_file_safe_id(&step.id) {
            errors.push(ValidationError::in_profile(
                "invalid-step-id",
                name,
                Some(&step.id),
                format!(
                    "profile '{}' step '{}': id must not contain '/', '\\' or '..'",
                    name, step.id
                ),
            ));
        }

        if !seen.insert(step.id.as_str()) {
            errors.push(ValidationError::in_profile(
                "duplicate-step-id",
                name,
                Some(&step.id),
                format!("profile '{}' has duplicate step id '{}'", name, step.id),
            ));
        }

        if step.kind == StepKind::Shell && step.command.is_empty() {
            errors.push(ValidationError::in_profile(
                "missing-command",
                name,
                Some(&step.id),
                format!(
                    "profile '{}' step '{}': shell steps must have non-empty command",
                    name, step.id
                ),
            ));
        }
    }

    let visible: HashSet<String> = match resolve_profile(config, name) {
        Ok(steps) => steps.into_iter().map(|s| s.id).collect(),
        Err(_) => return errors,
    };

    for step in &profile.steps {
        for dep in &step.deps {
            if !visible.contains(dep) {
                errors.push(ValidationError::in_profile(
                    "unknown-dependency",
                    name,
                    Some(&step.id),
                    format!(
                        "profile '{}' step '{}': dependency '{}' not found in profile",
                        name, step.id, dep
                    ),
                ));
            }
        }
    }

    errors
}

/// Step ids end up in `<out>/<id>.<attempt>.log`.
fn is_file_safe_id(id: &str) -> bool {
    !id.contains(['/', '\\']) && !id.contains("..")
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &FoundryConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(AnvilError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}
