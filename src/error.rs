//! Error types for anvil operations.
//!
//! This module defines [`AnvilError`], the error type used throughout the
//! crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Configuration, policy and planning problems are fatal and surface as `AnvilError`
//! - A step that fails at runtime is *not* an error: it is recorded in its
//!   [`StepResult`](crate::steps::StepResult) and the run continues
//! - [`AnvilError::SchedulerInvariant`] marks an executor bug and is never
//!   folded into a result document

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for anvil operations.
#[derive(Debug, Error)]
pub enum AnvilError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// Requested profile is not defined.
    #[error("Profile not found: {name}")]
    ProfileNotFound { name: String },

    /// A step is rejected by the project policy.
    #[error("step \"{step}\": script steps are not allowed by policy")]
    PolicyViolation { step: String },

    /// Plan inputs are malformed (empty project or profile name).
    #[error("Invalid plan: {message}")]
    PlanValidation { message: String },

    /// Two steps share an id.
    #[error("Duplicate step id: {step}")]
    DuplicateStep { step: String },

    /// A step depends on an id that is not part of the step set.
    #[error("Step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    /// Step dependency cycle detected.
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// The executor lost track of a step. Indicates a bug, not a step failure.
    #[error("Scheduler invariant violated: {message}")]
    SchedulerInvariant { message: String },

    /// A plan or result document could not be encoded or decoded.
    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for AnvilError {
    fn from(err: serde_json::Error) -> Self {
        AnvilError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type alias for anvil operations.
pub type Result<T> = std::result::Result<T, AnvilError>;
