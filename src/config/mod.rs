//! Configuration loading, parsing, and validation for anvil.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - File loading in [`loader`]
//! - Profile inheritance in [`profile`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use anvil::config::{load_config, resolve_profile};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join(".foundry.yaml");
//! fs::write(&path, r#"
//! version: 1
//! project:
//!   name: demo
//! profiles:
//!   default:
//!     steps:
//!       - id: build
//!         type: shell
//!         command: ["make"]
//! "#).unwrap();
//!
//! let loaded = load_config(&path).unwrap();
//! let steps = resolve_profile(&loaded.config, "default").unwrap();
//! assert_eq!(steps[0].id, "build");
//! ```

pub mod loader;
pub mod profile;
pub mod schema;
pub mod validator;

pub use loader::{load_config, parse_config, read_raw, LoadedConfig, DEFAULT_CONFIG_FILE};
pub use profile::{extends_chain, resolve_profile};
pub use schema::{FoundryConfig, Profile, Project, StepConfig, StepKind};
pub use validator::{validate, validate_config, ValidationError};
