//! Plan execution.
//!
//! [`PlanExecutor`] runs a [`Plan`](crate::plan::Plan) concurrently,
//! respecting dependencies, a concurrency limit, and fail-fast
//! cancellation. Progress is reported through an [`ExecutionObserver`].

pub mod executor;
pub mod observer;
pub mod options;
pub mod result;

pub use executor::{PlanExecutor, POLL_INTERVAL};
pub use observer::{ExecutionEvent, ExecutionObserver, NullObserver, TracingObserver};
pub use options::{ExecuteOptions, DEFAULT_JOBS, DEFAULT_TIMEOUT};
pub use result::{ExecutionResult, RunStatus};
