//! Parent-path finder.
//!
//! Computes every containment path from the root segment down to the
//! immediate container of a component. Used for diagnostics ("why is this
//! resource disabled?") and by UIs that show where a component lives.
//!
//! A component reachable through N distinct containment paths yields N paths;
//! shared resource sets are not deduplicated.

use crate::domain::ComponentId;
use crate::error::Result;
use crate::graph::ConfigurationGraph;
use crate::guard::CircularDependencyGuard;

/// Goal reported by the guard when a parent walk hits a cycle.
pub const PARENTS_GOAL: &str = "component parents";

/// A containment path, root segment first, target's container last.
pub type ParentPath = Vec<ComponentId>;

/// Find all containment paths from `root` to the container of `target`.
///
/// Sub-segments are searched before applications, each in configuration
/// order; resource sets are searched recursively. If `target` is `root` the
/// result is one empty path. If `target` is not reachable (or unknown) the
/// result is empty.
///
/// # Errors
///
/// Returns `Error::StructuralCycle` if a containment path exceeds `max_depth`.
pub fn find_paths<G: ConfigurationGraph + ?Sized>(
    graph: &G,
    root: ComponentId,
    target: ComponentId,
    max_depth: usize,
) -> Result<Vec<ParentPath>> {
    let mut out = Vec::new();

    if root == target {
        out.push(Vec::new());
        return Ok(out);
    }

    let Some(kind) = graph.kind(target) else {
        tracing::debug!(component = %target, "cannot find parents of unknown component");
        return Ok(out);
    };

    let mut walk = PathWalk {
        graph,
        target,
        // Segments only ever live in segments, so applications need no search
        search_applications: !kind.is_segment(),
        path: Vec::new(),
        out: &mut out,
    };

    let mut guard = CircularDependencyGuard::new(graph, PARENTS_GOAL, max_depth);
    let mut scope = guard.descend(root)?;
    walk.segment(root, &mut scope)?;

    if out.is_empty() {
        tracing::debug!(
            component = %graph.describe(target),
            root = %graph.describe(root),
            "cannot find segment/resource path(s) between component and root segment"
        );
    }

    Ok(out)
}

struct PathWalk<'a, G: ConfigurationGraph + ?Sized> {
    graph: &'a G,
    target: ComponentId,
    search_applications: bool,
    path: ParentPath,
    out: &'a mut Vec<ParentPath>,
}

impl<G: ConfigurationGraph + ?Sized> PathWalk<'_, G> {
    fn segment(
        &mut self,
        segment: ComponentId,
        guard: &mut CircularDependencyGuard<'_, G>,
    ) -> Result<()> {
        let graph = self.graph;
        self.path.push(segment);
        let children = graph.children(segment);

        for &sub in children.segments {
            if sub == self.target {
                self.out.push(self.path.clone());
            } else {
                let mut scope = guard.descend(sub)?;
                self.segment(sub, &mut scope)?;
            }
        }

        if self.search_applications {
            for &app in children.applications {
                if app == self.target {
                    self.out.push(self.path.clone());
                } else if graph.variant(app).is_some() {
                    let mut scope = guard.descend(app)?;
                    self.resource_set(app, &mut scope)?;
                }
            }
        }

        self.path.pop();
        Ok(())
    }

    fn resource_set(
        &mut self,
        set: ComponentId,
        guard: &mut CircularDependencyGuard<'_, G>,
    ) -> Result<()> {
        let graph = self.graph;
        self.path.push(set);

        for &child in graph.contains(set) {
            if child == self.target {
                self.out.push(self.path.clone());
            } else if graph.variant(child).is_some() {
                let mut scope = guard.descend(child)?;
                self.resource_set(child, &mut scope)?;
            }
        }

        self.path.pop();
        Ok(())
    }
}
