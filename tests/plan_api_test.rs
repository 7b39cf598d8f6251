//! Public API tests for configuration loading and planning.

use anvil::config::{load_config, resolve_profile};
use anvil::plan::{config_hash, topological_sort, Plan};
use anvil::steps::Step;
use anvil::AnvilError;
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
version: 1
project:
  name: shop
policy:
  allow_script_steps: true
profiles:
  default:
    steps:
      - id: fmt
        command: ["cargo", "fmt", "--check"]
      - id: build
        command: ["cargo", "build"]
        timeout: 10m
      - id: test
        command: ["cargo", "test"]
        deps: [build]
        retries: 2
        env:
          RUST_BACKTRACE: "1"
  release:
    extends: default
    steps:
      - id: build
        command: ["cargo", "build", "--release"]
      - id: package
        type: script
        command: ["./package.sh"]
        deps: [test, fmt]
"#;

fn plan_for(profile: &str) -> Plan {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".foundry.yaml");
    fs::write(&path, CONFIG).unwrap();

    let loaded = load_config(&path).unwrap();
    let resolved = resolve_profile(&loaded.config, profile).unwrap();
    loaded.config.policy.validate_steps(&resolved).unwrap();
    let steps = resolved.iter().map(Step::from).collect();
    Plan::build(&loaded.config.project.name, profile, steps, &loaded.raw).unwrap()
}

#[test]
fn default_profile_orders_lexicographically_among_ready_steps() {
    let plan = plan_for("default");
    assert_eq!(plan.order, vec!["build", "fmt", "test"]);
    assert_eq!(plan.project_name, "shop");
    assert_eq!(plan.config_hash, config_hash(CONFIG.as_bytes()));
}

#[test]
fn extended_profile_overrides_and_appends() {
    let plan = plan_for("release");
    assert_eq!(plan.order, vec!["build", "fmt", "test", "package"]);

    let build = plan.step("build").unwrap();
    assert_eq!(build.command, vec!["cargo", "build", "--release"]);
    // the override replaces the whole step, including its timeout
    assert_eq!(build.timeout, None);

    let test = plan.step("test").unwrap();
    assert_eq!(test.retries, 2);
    assert_eq!(test.max_attempts(), 3);
    assert_eq!(test.env.get("RUST_BACKTRACE").map(String::as_str), Some("1"));
}

#[test]
fn plan_round_trips_through_disk() {
    let temp = TempDir::new().unwrap();
    let plan = plan_for("default");
    let path = plan.write(temp.path()).unwrap();
    assert_eq!(path, temp.path().join("plan.json"));
    assert_eq!(Plan::read(temp.path()).unwrap(), plan);
}

#[test]
fn plan_json_field_names() {
    let plan = plan_for("default");
    let value = serde_json::to_value(&plan).unwrap();
    for field in ["version", "project_name", "profile", "config_hash", "created_at", "steps", "order"] {
        assert!(value.get(field).is_some(), "missing {}", field);
    }
    assert_eq!(value["steps"][0]["type"], "shell");
}

#[test]
fn sort_is_independent_of_input_order() {
    let forward = vec![
        Step::shell("a", ["true"]),
        Step::shell("b", ["true"]).with_deps(["a"]),
        Step::shell("c", ["true"]).with_deps(["a"]),
        Step::shell("d", ["true"]).with_deps(["b", "c"]),
    ];
    let mut backward = forward.clone();
    backward.reverse();

    assert_eq!(topological_sort(&forward).unwrap(), vec!["a", "b", "c", "d"]);
    assert_eq!(
        topological_sort(&forward).unwrap(),
        topological_sort(&backward).unwrap()
    );
}

#[test]
fn planning_errors_are_typed() {
    let dup = vec![Step::shell("a", ["true"]), Step::shell("a", ["true"])];
    assert!(matches!(
        topological_sort(&dup),
        Err(AnvilError::DuplicateStep { .. })
    ));

    let unknown = vec![Step::shell("a", ["true"]).with_deps(["ghost"])];
    assert!(matches!(
        topological_sort(&unknown),
        Err(AnvilError::UnknownDependency { .. })
    ));

    let cycle = vec![
        Step::shell("a", ["true"]).with_deps(["b"]),
        Step::shell("b", ["true"]).with_deps(["a"]),
    ];
    assert!(matches!(
        topological_sort(&cycle),
        Err(AnvilError::CircularDependency { .. })
    ));

    assert!(matches!(
        Plan::build("", "default", vec![], b""),
        Err(AnvilError::PlanValidation { .. })
    ));
}
