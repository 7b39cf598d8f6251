//! Planning: turn a flat step list into an immutable, ordered [`Plan`].
//!
//! Planning is synchronous and has no side effects besides the optional
//! [`Plan::write`]. Two builds over the same steps and configuration bytes
//! produce the same `order` and `config_hash`.

pub mod document;
pub mod graph;

pub use document::{config_hash, topological_sort, Plan, PLAN_VERSION};
pub use graph::{DependencyGraph, DependencyGraphBuilder};
