//! Profile inheritance resolution.
//!
//! A profile may name a parent through `extends:`. Resolution walks the
//! chain to its root and layers each profile's steps on top of its
//! parent's: a step whose id already exists replaces the inherited step in
//! place, any other step is appended.

use std::collections::HashSet;

use crate::config::schema::{FoundryConfig, StepConfig};
use crate::error::{AnvilError, Result};

/// Return the inheritance chain for `name`, root first and `name` last.
///
/// # Errors
///
/// - `ProfileNotFound` if `name` or any ancestor is undefined
/// - `ConfigValidationError` if the chain loops back on itself
pub fn extends_chain<'a>(config: &'a FoundryConfig, name: &'a str) -> Result<Vec<&'a str>> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = name;

    loop {
        if !visited.insert(current) {
            return Err(AnvilError::ConfigValidationError {
                message: format!(
                    "profile '{}': circular extends chain detected (reaches '{}' again)",
                    name, current
                ),
            });
        }

        let profile = config
            .profiles
            .get(current)
            .ok_or_else(|| AnvilError::ProfileNotFound {
                name: current.to_string(),
            })?;
        chain.push(current);

        match profile.extends.as_deref() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    chain.reverse();
    Ok(chain)
}

/// Resolve a profile into its flat, merged step list.
pub fn resolve_profile(config: &FoundryConfig, name: &str) -> Result<Vec<StepConfig>> {
    let chain = extends_chain(config, name)?;
    let mut steps: Vec<StepConfig> = Vec::new();

    for profile_name in &chain {
        // extends_chain already proved every link exists
        let Some(profile) = config.profiles.get(*profile_name) else {
            continue;
        };

        for step in &profile.steps {
            match steps.iter_mut().find(|existing| existing.id == step.id) {
                Some(existing) => *existing = step.clone(),
                None => steps.push(step.clone()),
            }
        }
    }

    tracing::debug!(profile = name, chain = ?chain, steps = steps.len(), "Resolved profile");
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Profile;

    fn step(id: &str, cmd: &str) -> StepConfig {
        StepConfig {
            id: id.to_string(),
            command: vec![cmd.to_string()],
            ..Default::default()
        }
    }

    fn config_with(profiles: Vec<(&str, Option<&str>, Vec<StepConfig>)>) -> FoundryConfig {
        let mut config = FoundryConfig::default();
        for (name, extends, steps) in profiles {
            config.profiles.insert(
                name.to_string(),
                Profile {
                    extends: extends.map(String::from),
                    steps,
                },
            );
        }
        config
    }

    #[test]
    fn resolves_profile_without_parent() {
        let config = config_with(vec![("default", None, vec![step("a", "x")])]);
        let steps = resolve_profile(&config, "default").unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].id, "a");
    }

    #[test]
    fn child_overrides_parent_in_place_and_appends() {
        let config = config_with(vec![
            ("base", None, vec![step("lint", "old"), step("build", "make")]),
            ("ci", Some("base"), vec![step("lint", "new"), step("test", "t")]),
        ]);

        let steps = resolve_profile(&config, "ci").unwrap();
        let ids: Vec<_> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["lint", "build", "test"]);
        assert_eq!(steps[0].command, vec!["new"]);
    }

    #[test]
    fn multi_level_chain_is_root_first() {
        let config = config_with(vec![
            ("a", None, vec![]),
            ("b", Some("a"), vec![]),
            ("c", Some("b"), vec![]),
        ]);
        assert_eq!(extends_chain(&config, "c").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_profile_is_not_found() {
        let config = config_with(vec![("default", None, vec![])]);
        let result = resolve_profile(&config, "release");
        assert!(matches!(result, Err(AnvilError::ProfileNotFound { name }) if name == "release"));
    }

    #[test]
    fn missing_parent_is_not_found() {
        let config = config_with(vec![("ci", Some("ghost"), vec![])]);
        let result = resolve_profile(&config, "ci");
        assert!(matches!(result, Err(AnvilError::ProfileNotFound { name }) if name == "ghost"));
    }

    #[test]
    fn circular_extends_is_rejected() {
        let config = config_with(vec![("a", Some("b"), vec![]), ("b", Some("a"), vec![])]);
        let err = resolve_profile(&config, "a").unwrap_err();
        assert!(err.to_string().contains("circular extends"));
    }

    #[test]
    fn self_extension_is_rejected() {
        let config = config_with(vec![("a", Some("a"), vec![])]);
        assert!(extends_chain(&config, "a").is_err());
    }
}
