//! Disabled-set computation.
//!
//! # Algorithm
//!
//! 1. Fast path: nothing persisted-disabled and no overrides ⇒ empty set.
//! 2. Walk the graph from the root, collecting AND and OR resource sets. The
//!    walk goes through the guard, so a cycle fails here.
//! 3. Seed with `user_disabled ∪ (persisted_disabled \ user_enabled)`.
//! 4. Disable every seed and cascade downward:
//!    - a resource set disables everything it contains, recursively;
//!    - a segment disables its applications and cascades into its
//!      sub-segments. The applications themselves are not cascaded into.
//! 5. Repeat AND/OR promotion until a pass disables nothing new:
//!    - an OR set is disabled when any direct child is disabled;
//!    - an AND set is disabled when it has children and all are disabled.
//!
//!    Promoted sets cascade as in step 4. A set a segment disabled without
//!    cascading is still evaluated; only cascaded sets are skipped. Segments
//!    never aggregate.
//!
//! User-enabled entries only filter the persisted seed; a user-enabled
//! component inside a disabled container is still disabled by the cascade.

use crate::config::EngineConfig;
use crate::domain::{ComponentId, ComponentKind};
use crate::error::{Error, Result};
use crate::graph::ConfigurationGraph;
use crate::guard::CircularDependencyGuard;
use crate::walk;
use std::collections::HashSet;

/// Goal reported by the guard when the disabled-set walk hits a cycle.
pub const DISABLED_GOAL: &str = "component 'is-disabled' status";

/// Result of one recomputation.
#[derive(Debug, Default)]
pub(super) struct Outcome {
    pub(super) disabled: HashSet<ComponentId>,
    pub(super) seeded: usize,
    pub(super) passes: usize,
    pub(super) iteration_limit_hit: bool,
}

pub(super) fn compute<G: ConfigurationGraph + ?Sized>(
    graph: &G,
    user_disabled: &HashSet<ComponentId>,
    user_enabled: &HashSet<ComponentId>,
    config: &EngineConfig,
) -> Result<Outcome> {
    let persisted = graph.persisted_disabled();

    if persisted.is_empty() && user_disabled.is_empty() && user_enabled.is_empty() {
        tracing::debug!("system has no disabled components");
        return Ok(Outcome::default());
    }

    let mut guard = CircularDependencyGuard::new(graph, DISABLED_GOAL, config.max_path_depth);
    let index = walk::collect_resource_sets(graph, &mut guard)?;
    tracing::debug!(
        and_sets = index.and_sets.len(),
        or_sets = index.or_sets.len(),
        "collected resource sets"
    );

    let seed = seed(graph, persisted, user_disabled, user_enabled);
    let mut closure = Closure::new(graph);
    for &id in &seed {
        closure.disable_and_cascade(id, &mut guard)?;
    }
    tracing::debug!(
        seeded = seed.len(),
        disabled = closure.disabled.len(),
        "disabled seed components and their contents"
    );

    let mut passes = 0;
    let mut settled = false;
    while passes < config.max_iterations {
        passes += 1;
        let before = closure.disabled.len();
        tracing::trace!(pass = passes, disabled = before, "starting AND/OR pass");

        // A set a segment disabled without cascading still promotes, so its
        // contents end up disabled whatever order the seed was walked in.
        for &set in &index.or_sets {
            if closure.cascaded.contains(&set) {
                continue;
            }
            let disabled_child = graph
                .contains(set)
                .iter()
                .find(|c| closure.disabled.contains(*c));
            if let Some(&child) = disabled_child {
                tracing::trace!(
                    set = %graph.describe(set),
                    child = %graph.describe(child),
                    "disable resource-set-OR because a child is disabled"
                );
                closure.disable_and_cascade(set, &mut guard)?;
            }
        }

        for &set in &index.and_sets {
            if closure.cascaded.contains(&set) {
                continue;
            }
            let children = graph.contains(set);
            if !children.is_empty() && children.iter().all(|c| closure.disabled.contains(c)) {
                tracing::trace!(
                    set = %graph.describe(set),
                    "disable resource-set-AND because all its children are disabled"
                );
                closure.disable_and_cascade(set, &mut guard)?;
            }
        }

        if closure.disabled.len() == before {
            settled = true;
            break;
        }
    }

    if settled {
        tracing::debug!(
            passes,
            disabled = closure.disabled.len(),
            "AND/OR propagation found no newly disabled sets"
        );
    } else {
        let err = Error::IterationLimitExceeded {
            limit: config.max_iterations,
        };
        tracing::error!(error = %err, "keeping best-effort disabled set");
    }

    Ok(Outcome {
        disabled: closure.disabled,
        seeded: seed.len(),
        passes,
        iteration_limit_hit: !settled,
    })
}

fn seed<G: ConfigurationGraph + ?Sized>(
    graph: &G,
    persisted: &[ComponentId],
    user_disabled: &HashSet<ComponentId>,
    user_enabled: &HashSet<ComponentId>,
) -> Vec<ComponentId> {
    let mut seed: Vec<ComponentId> = user_disabled.iter().copied().collect();
    seed.sort_unstable();
    for id in &seed {
        tracing::trace!(component = %graph.describe(*id), "disabled explicitly by user");
    }

    for &id in persisted {
        if user_enabled.contains(&id) {
            tracing::trace!(
                component = %graph.describe(id),
                "skip persisted-disabled component enabled by user"
            );
        } else if !user_disabled.contains(&id) {
            tracing::trace!(component = %graph.describe(id), "disabled in persisted configuration");
            seed.push(id);
        }
    }

    seed
}

/// Downward closure of the disabled set.
struct Closure<'a, G: ConfigurationGraph + ?Sized> {
    graph: &'a G,
    disabled: HashSet<ComponentId>,
    // Containers whose contents are known to be disabled already
    cascaded: HashSet<ComponentId>,
}

impl<'a, G: ConfigurationGraph + ?Sized> Closure<'a, G> {
    fn new(graph: &'a G) -> Self {
        Self {
            graph,
            disabled: HashSet::new(),
            cascaded: HashSet::new(),
        }
    }

    /// Disable `id` and everything it contains.
    fn disable_and_cascade(
        &mut self,
        id: ComponentId,
        guard: &mut CircularDependencyGuard<'_, G>,
    ) -> Result<()> {
        self.disabled.insert(id);
        if self.cascaded.contains(&id) {
            return Ok(());
        }

        let mut scope = guard.descend(id)?;
        let graph = self.graph;
        match graph.kind(id) {
            Some(ComponentKind::ResourceSet(_)) => {
                for &child in graph.contains(id) {
                    self.disable_and_cascade(child, &mut scope)?;
                }
            }
            Some(ComponentKind::Segment) => {
                let children = graph.children(id);
                for &app in children.applications {
                    tracing::trace!(
                        application = %graph.describe(app),
                        segment = %graph.describe(id),
                        "disable application because its segment is disabled"
                    );
                    self.disabled.insert(app);
                }
                for &sub in children.segments {
                    tracing::trace!(
                        segment = %graph.describe(sub),
                        parent = %graph.describe(id),
                        "disable segment because its parent segment is disabled"
                    );
                    self.disable_and_cascade(sub, &mut scope)?;
                }
            }
            _ => {}
        }

        // Marked only once finished, so a cycle keeps deepening the path until
        // the guard trips instead of being silently cut short.
        self.cascaded.insert(id);
        Ok(())
    }
}
