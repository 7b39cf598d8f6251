//! Steps: the canonical step record, its outcome, and single-step execution.

pub mod executor;
pub mod model;
pub mod result;

pub use executor::{StepExecutor, RETRY_DELAY};
pub use model::Step;
pub use result::{
    StepResult, StepStatus, NO_EXIT_CODE, SKIP_CANCELLED, SKIP_DEPENDENCY_FAILED,
};
