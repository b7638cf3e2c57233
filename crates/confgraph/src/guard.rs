//! Circular dependency guard.
//!
//! Every recursive walk over the configuration graph records the component it
//! descends into on a bounded path. The graph is expected to be a DAG, so a
//! path longer than the configured limit can only mean a containment cycle (or
//! a configuration deep enough to be indistinguishable from one), and the walk
//! is aborted with [`Error::StructuralCycle`].
//!
//! The guard measures path *length*, not revisits: a resource set shared by
//! two segments is reached twice, on two different paths, and that is fine.
//!
//! # Usage
//!
//! [`CircularDependencyGuard::descend`] returns a [`GuardScope`] that pops the
//! entry when dropped, so the matching leave happens on every return path,
//! including `?` early returns. The scope dereferences to the guard, which lets
//! the next level of recursion descend through it:
//!
//! ```
//! use confgraph::domain::ComponentId;
//! use confgraph::graph::{ConfigurationGraph, InMemoryConfiguration};
//! use confgraph::guard::CircularDependencyGuard;
//!
//! fn count<G: ConfigurationGraph>(
//!     guard: &mut CircularDependencyGuard<'_, G>,
//!     graph: &G,
//!     segment: ComponentId,
//! ) -> confgraph::Result<usize> {
//!     let mut scope = guard.descend(segment)?;
//!     let mut total = 1;
//!     for &sub in graph.children(segment).segments {
//!         total += count(&mut scope, graph, sub)?;
//!     }
//!     Ok(total)
//! }
//!
//! # fn main() -> confgraph::Result<()> {
//! let mut config = InMemoryConfiguration::new();
//! let root = config.add_segment("root")?;
//! let sub = config.add_segment("sub")?;
//! config.add_sub_segment(root, sub)?;
//!
//! let mut guard = CircularDependencyGuard::new(&config, "segment count", 64);
//! assert_eq!(count(&mut guard, &config, root)?, 2);
//! assert_eq!(guard.depth(), 0);
//! # Ok(())
//! # }
//! ```

use crate::domain::ComponentId;
use crate::error::{Error, Result};
use crate::graph::ConfigurationGraph;
use std::ops::{Deref, DerefMut};

/// Bounded recursion path tracker.
pub struct CircularDependencyGuard<'g, G: ConfigurationGraph + ?Sized> {
    graph: &'g G,
    goal: String,
    limit: usize,
    path: Vec<ComponentId>,
}

impl<'g, G: ConfigurationGraph + ?Sized> CircularDependencyGuard<'g, G> {
    /// Create an empty guard.
    ///
    /// `goal` names the computation in error messages; `limit` is the maximum
    /// number of components allowed on the path at once.
    pub fn new(graph: &'g G, goal: impl Into<String>, limit: usize) -> Self {
        Self {
            graph,
            goal: goal.into(),
            limit,
            path: Vec::with_capacity(limit),
        }
    }

    /// Record `node` on the current path.
    ///
    /// Prefer [`descend`](Self::descend), which pairs this with
    /// [`leave`](Self::leave) automatically.
    ///
    /// # Errors
    ///
    /// Returns `Error::StructuralCycle` if the path already holds `limit`
    /// entries. The path is left unchanged in that case.
    pub fn enter(&mut self, node: ComponentId) -> Result<()> {
        if self.path.len() >= self.limit {
            let path = self
                .path
                .iter()
                .chain(std::iter::once(&node))
                .map(|id| self.graph.describe(*id))
                .collect();
            return Err(Error::StructuralCycle {
                goal: self.goal.clone(),
                limit: self.limit,
                path,
            });
        }

        self.path.push(node);
        Ok(())
    }

    /// Remove the most recent entry from the path.
    pub fn leave(&mut self) -> Option<ComponentId> {
        self.path.pop()
    }

    /// Enter `node` and return a scope that leaves it when dropped.
    pub fn descend(&mut self, node: ComponentId) -> Result<GuardScope<'_, 'g, G>> {
        self.enter(node)?;
        Ok(GuardScope { guard: self })
    }

    /// Number of components currently on the path.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Components currently on the path, outermost first.
    pub fn path(&self) -> &[ComponentId] {
        &self.path
    }

    /// Configured maximum path depth.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// One level of descent; leaves the guard on drop.
pub struct GuardScope<'s, 'g, G: ConfigurationGraph + ?Sized> {
    guard: &'s mut CircularDependencyGuard<'g, G>,
}

impl<'g, G: ConfigurationGraph + ?Sized> Deref for GuardScope<'_, 'g, G> {
    type Target = CircularDependencyGuard<'g, G>;

    fn deref(&self) -> &Self::Target {
        self.guard
    }
}

impl<G: ConfigurationGraph + ?Sized> DerefMut for GuardScope<'_, '_, G> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.guard
    }
}

impl<G: ConfigurationGraph + ?Sized> Drop for GuardScope<'_, '_, G> {
    fn drop(&mut self) {
        self.guard.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InMemoryConfiguration;

    fn chain(len: usize) -> (InMemoryConfiguration, Vec<ComponentId>) {
        let mut config = InMemoryConfiguration::new();
        let ids = (0..len)
            .map(|i| config.add_segment(&format!("seg-{i}")).unwrap())
            .collect();
        (config, ids)
    }

    #[test]
    fn test_path_of_limit_length_is_accepted() {
        let (config, ids) = chain(64);
        let mut guard = CircularDependencyGuard::new(&config, "test", 64);

        for id in &ids {
            guard.enter(*id).unwrap();
        }
        assert_eq!(guard.depth(), 64);
    }

    #[test]
    fn test_path_beyond_limit_is_structural_cycle() {
        let (config, ids) = chain(65);
        let mut guard = CircularDependencyGuard::new(&config, "test", 64);

        for id in &ids[..64] {
            guard.enter(*id).unwrap();
        }
        let err = guard.enter(ids[64]).unwrap_err();

        match err {
            Error::StructuralCycle { goal, limit, path } => {
                assert_eq!(goal, "test");
                assert_eq!(limit, 64);
                assert_eq!(path.len(), 65);
                assert_eq!(path[0], "seg-0");
                assert_eq!(path[64], "seg-64");
            }
            other => panic!("unexpected error: {other}"),
        }
        // Failed enter leaves the path untouched
        assert_eq!(guard.depth(), 64);
    }

    #[test]
    fn test_leave_pops_most_recent() {
        let (config, ids) = chain(2);
        let mut guard = CircularDependencyGuard::new(&config, "test", 4);

        guard.enter(ids[0]).unwrap();
        guard.enter(ids[1]).unwrap();
        assert_eq!(guard.leave(), Some(ids[1]));
        assert_eq!(guard.path(), &[ids[0]]);
        assert_eq!(guard.leave(), Some(ids[0]));
        assert_eq!(guard.leave(), None);
    }

    #[test]
    fn test_scope_releases_on_early_return() {
        fn fails_inside(
            guard: &mut CircularDependencyGuard<'_, InMemoryConfiguration>,
            id: ComponentId,
        ) -> Result<()> {
            let _scope = guard.descend(id)?;
            Err(Error::Config("boom".to_string()))
        }

        let (config, ids) = chain(1);
        let mut guard = CircularDependencyGuard::new(&config, "test", 4);

        assert!(fails_inside(&mut guard, ids[0]).is_err());
        assert_eq!(guard.depth(), 0);
    }

    #[test]
    fn test_revisiting_a_node_is_not_a_cycle() {
        let (config, ids) = chain(1);
        let mut guard = CircularDependencyGuard::new(&config, "test", 2);

        for _ in 0..10 {
            let scope = guard.descend(ids[0]).unwrap();
            assert_eq!(scope.depth(), 1);
        }
        assert_eq!(guard.depth(), 0);
    }
}
