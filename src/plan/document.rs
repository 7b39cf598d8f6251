//! The plan document.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::artifacts::{now_utc, read_json, write_json, PLAN_FILE};
use crate::error::{AnvilError, Result};
use crate::plan::graph::DependencyGraph;
use crate::steps::Step;

/// Version stamped into every plan document.
pub const PLAN_VERSION: u32 = 1;

/// An immutable execution plan: steps, their canonical order, and a
/// fingerprint of the configuration they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Document format version
    pub version: u32,

    /// Project the plan belongs to
    pub project_name: String,

    /// Profile the steps were resolved from
    pub profile: String,

    /// Hex SHA-256 of the raw configuration bytes
    pub config_hash: String,

    /// When the plan was built
    pub created_at: DateTime<Utc>,

    /// Plan-local copies of the steps
    pub steps: Vec<Step>,

    /// Deterministic topological order of step ids
    pub order: Vec<String>,
}

impl Plan {
    /// Build a plan.
    ///
    /// # Errors
    ///
    /// - `PlanValidation` if `project_name` or `profile` is empty
    /// - `DuplicateStep`, `UnknownDependency` or `CircularDependency` if the
    ///   steps do not form a DAG
    pub fn build(
        project_name: &str,
        profile: &str,
        steps: Vec<Step>,
        config_bytes: &[u8],
    ) -> Result<Self> {
        if project_name.is_empty() {
            return Err(AnvilError::PlanValidation {
                message: "project name is required".to_string(),
            });
        }
        if profile.is_empty() {
            return Err(AnvilError::PlanValidation {
                message: "profile name is required".to_string(),
            });
        }

        let order = topological_sort(&steps)?;

        tracing::debug!(
            project = project_name,
            profile,
            steps = steps.len(),
            "Built plan"
        );

        Ok(Self {
            version: PLAN_VERSION,
            project_name: project_name.to_string(),
            profile: profile.to_string(),
            config_hash: config_hash(config_bytes),
            created_at: now_utc(),
            steps,
            order,
        })
    }

    /// Look up a step by id.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Write the plan to `<dir>/plan.json`, returning the path.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(PLAN_FILE);
        write_json(&path, self)?;
        Ok(path)
    }

    /// Read a plan previously written with [`Plan::write`].
    pub fn read(dir: &Path) -> Result<Self> {
        read_json(&dir.join(PLAN_FILE))
    }
}

/// Order steps so every step follows its dependencies, breaking ties by
/// smallest id.
///
/// An empty slice yields an empty order.
pub fn topological_sort(steps: &[Step]) -> Result<Vec<String>> {
    steps
        .iter()
        .fold(DependencyGraph::builder(), |builder, step| {
            builder.add_step(step.id.as_str(), step.deps.iter().map(String::as_str))
        })
        .build()?
        .topological_order()
}

/// Hex-encoded SHA-256 of the raw configuration bytes.
pub fn config_hash(config_bytes: &[u8]) -> String {
    let digest = Sha256::digest(config_bytes);
    hex::encode(&digest[..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn diamond() -> Vec<Step> {
        vec![
            Step::shell("d", ["true"]).with_deps(["b", "c"]),
            Step::shell("c", ["true"]).with_deps(["a"]),
            Step::shell("b", ["true"]).with_deps(["a"]),
            Step::shell("a", ["true"]),
        ]
    }

    #[test]
    fn sort_empty_is_empty() {
        assert!(topological_sort(&[]).unwrap().is_empty());
    }

    #[test]
    fn sort_independent_steps_lexicographically() {
        let steps = vec![
            Step::shell("c", ["true"]),
            Step::shell("a", ["true"]),
            Step::shell("b", ["true"]),
        ];
        assert_eq!(topological_sort(&steps).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn sort_diamond() {
        assert_eq!(
            topological_sort(&diamond()).unwrap(),
            vec!["a", "b", "c", "d"]
        );
    }

    #[test]
    fn sort_cycle_is_error() {
        let steps = vec![
            Step::shell("a", ["true"]).with_deps(["b"]),
            Step::shell("b", ["true"]).with_deps(["a"]),
        ];
        assert!(matches!(
            topological_sort(&steps),
            Err(AnvilError::CircularDependency { .. })
        ));
    }

    #[test]
    fn build_requires_names() {
        let err = Plan::build("", "default", vec![], b"").unwrap_err();
        assert!(matches!(err, AnvilError::PlanValidation { .. }));
        let err = Plan::build("demo", "", vec![], b"").unwrap_err();
        assert!(err.to_string().contains("profile"));
    }

    #[test]
    fn build_is_deterministic() {
        let bytes = b"version: 1\n";
        let first = Plan::build("demo", "default", diamond(), bytes).unwrap();
        let second = Plan::build("demo", "default", diamond(), bytes).unwrap();
        assert_eq!(first.config_hash, second.config_hash);
        assert_eq!(first.order, second.order);
        assert_eq!(first.version, PLAN_VERSION);
    }

    #[test]
    fn config_hash_is_sha256_hex() {
        assert_eq!(
            config_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(config_hash(b"a"), config_hash(b"b"));
    }

    #[test]
    fn json_shape() {
        let plan = Plan::build("demo", "ci", vec![Step::shell("a", ["true"])], b"x").unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["project_name"], "demo");
        assert_eq!(json["profile"], "ci");
        assert_eq!(json["order"], serde_json::json!(["a"]));
        let created = json["created_at"].as_str().unwrap();
        assert!(created.ends_with('Z'), "{}", created);
        assert!(!created.contains('.'), "{}", created);
    }

    #[test]
    fn write_and_read_back() {
        let temp = TempDir::new().unwrap();
        let plan = Plan::build("demo", "default", diamond(), b"cfg").unwrap();

        let path = plan.write(temp.path()).unwrap();
        assert_eq!(path, temp.path().join("plan.json"));

        let loaded = Plan::read(temp.path()).unwrap();
        assert_eq!(loaded, plan);
        assert_eq!(loaded.step("b").unwrap().deps, vec!["a"]);
    }
}
