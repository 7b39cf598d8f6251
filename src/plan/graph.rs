//! Dependency graph and deterministic ordering.
//!
//! All internal collections are ordered so that every traversal, and
//! therefore every error message and every order, is reproducible.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{AnvilError, Result};

/// Represents the dependency relationships between steps.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Map of step id to its direct dependencies.
    dependencies: BTreeMap<String, BTreeSet<String>>,
    /// Map of step id to steps that depend on it.
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create a new dependency graph builder.
    pub fn builder() -> DependencyGraphBuilder {
        DependencyGraphBuilder::new()
    }

    /// Get the number of steps in the graph.
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Returns steps in topological order (dependencies before dependents).
    ///
    /// Kahn's algorithm with a sorted ready set: whenever several steps are
    /// ready, the lexicographically smallest id is emitted first. Identical
    /// graphs always produce identical orders.
    ///
    /// Returns `CircularDependency` if not every step can be ordered. No
    /// partial order is ever returned.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        let mut in_degree: BTreeMap<&str, usize> = self
            .dependencies
            .iter()
            .map(|(step, deps)| (step.as_str(), deps.len()))
            .collect();

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&step, _)| step)
            .collect();

        let mut order = Vec::with_capacity(self.len());

        while let Some(step) = ready.pop_first() {
            order.push(step.to_string());

            // dependents are a sorted set, so decrements happen in id order
            if let Some(dependents) = self.dependents.get(step) {
                for dependent in dependents {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            ready.insert(dependent.as_str());
                        }
                    }
                }
            }
        }

        if order.len() < self.len() {
            let cycle = match self.find_cycle() {
                Some(path) => path.join(" -> "),
                None => in_degree
                    .iter()
                    .filter(|(_, &d)| d > 0)
                    .map(|(&s, _)| s)
                    .collect::<Vec<_>>()
                    .join(", "),
            };

            return Err(AnvilError::CircularDependency {
                cycle: format!(
                    "{} (ordered {} of {} steps)",
                    cycle,
                    order.len(),
                    self.len()
                ),
            });
        }

        Ok(order)
    }

    /// Find a cycle in the graph, returning the path if one exists.
    ///
    /// The path starts and ends with the same step, e.g. `["a", "b", "a"]`.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Unvisited,
            Visiting,
            Visited,
        }

        fn dfs<'a>(
            node: &'a str,
            graph: &'a DependencyGraph,
            state: &mut BTreeMap<&'a str, State>,
            path: &mut Vec<&'a str>,
        ) -> Option<Vec<String>> {
            state.insert(node, State::Visiting);
            path.push(node);

            if let Some(deps) = graph.dependencies.get(node) {
                for dep in deps {
                    match state.get(dep.as_str()) {
                        Some(State::Visiting) => {
                            let start = path.iter().position(|s| *s == dep.as_str())?;
                            let mut cycle: Vec<String> =
                                path[start..].iter().map(|s| s.to_string()).collect();
                            cycle.push(dep.clone());
                            return Some(cycle);
                        }
                        Some(State::Unvisited) => {
                            if let Some(cycle) = dfs(dep, graph, state, path) {
                                return Some(cycle);
                            }
                        }
                        Some(State::Visited) | None => {}
                    }
                }
            }

            path.pop();
            state.insert(node, State::Visited);
            None
        }

        let mut state: BTreeMap<&str, State> = self
            .dependencies
            .keys()
            .map(|s| (s.as_str(), State::Unvisited))
            .collect();
        let mut path = Vec::new();

        for step in self.dependencies.keys() {
            if state.get(step.as_str()) == Some(&State::Unvisited) {
                if let Some(cycle) = dfs(step, self, &mut state, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }
}

/// Builder for constructing a DependencyGraph.
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    dependencies: BTreeMap<String, BTreeSet<String>>,
    duplicates: Vec<String>,
}

impl DependencyGraphBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step with its dependencies.
    pub fn add_step<I, S>(mut self, id: impl Into<String>, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        if self.dependencies.contains_key(&id) {
            self.duplicates.push(id);
            return self;
        }
        self.dependencies
            .insert(id, deps.into_iter().map(Into::into).collect());
        self
    }

    /// Build the dependency graph.
    ///
    /// # Errors
    ///
    /// - `DuplicateStep` if an id was added twice
    /// - `UnknownDependency` if a dependency references a missing step
    pub fn build(self) -> Result<DependencyGraph> {
        if let Some(step) = self.duplicates.into_iter().next() {
            return Err(AnvilError::DuplicateStep { step });
        }

        let mut dependents: BTreeMap<String, BTreeSet<String>> = self
            .dependencies
            .keys()
            .map(|id| (id.clone(), BTreeSet::new()))
            .collect();

        for (step, deps) in &self.dependencies {
            for dep in deps {
                match dependents.get_mut(dep) {
                    Some(set) => {
                        set.insert(step.clone());
                    }
                    None => {
                        return Err(AnvilError::UnknownDependency {
                            step: step.clone(),
                            dependency: dep.clone(),
                        })
                    }
                }
            }
        }

        Ok(DependencyGraph {
            dependencies: self.dependencies,
            dependents,
        })
    }
}
