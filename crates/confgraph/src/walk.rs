//! Guarded whole-graph walks shared by the engine and the system facade.

use crate::domain::{ComponentId, SetVariant};
use crate::error::Result;
use crate::graph::ConfigurationGraph;
use crate::guard::CircularDependencyGuard;
use std::collections::HashSet;

/// Every resource set reachable from the root, split by variant.
///
/// Sets appear in pre-order (a set before the sets it contains) and at most
/// once, even when shared between several containers.
#[derive(Debug, Default)]
pub(crate) struct ResourceSetIndex {
    pub(crate) and_sets: Vec<ComponentId>,
    pub(crate) or_sets: Vec<ComponentId>,
    recorded: HashSet<ComponentId>,
    // Containers whose whole subtree has been walked without error
    explored: HashSet<ComponentId>,
}

impl ResourceSetIndex {
    fn record(&mut self, id: ComponentId, variant: SetVariant) {
        if self.recorded.insert(id) {
            match variant {
                SetVariant::And => self.and_sets.push(id),
                SetVariant::Or => self.or_sets.push(id),
            }
        }
    }
}

/// Walk the whole graph once, collecting its AND and OR resource sets.
///
/// Doubles as the structural check of the graph: a cycle anywhere below the
/// root fails here with `Error::StructuralCycle`.
pub(crate) fn collect_resource_sets<G: ConfigurationGraph + ?Sized>(
    graph: &G,
    guard: &mut CircularDependencyGuard<'_, G>,
) -> Result<ResourceSetIndex> {
    let mut index = ResourceSetIndex::default();

    if let Some(root) = graph.root_segment() {
        let mut scope = guard.descend(root)?;
        fill_segment(graph, root, &mut index, &mut scope)?;
    }

    Ok(index)
}

fn fill_segment<G: ConfigurationGraph + ?Sized>(
    graph: &G,
    segment: ComponentId,
    index: &mut ResourceSetIndex,
    guard: &mut CircularDependencyGuard<'_, G>,
) -> Result<()> {
    if index.explored.contains(&segment) {
        return Ok(());
    }
    let children = graph.children(segment);

    for &app in children.applications {
        let mut scope = guard.descend(app)?;
        if let Some(variant) = graph.variant(app) {
            fill_set(graph, app, variant, index, &mut scope)?;
        }
    }

    for &sub in children.segments {
        tracing::trace!(segment = %graph.describe(sub), "collecting resource sets of segment");
        let mut scope = guard.descend(sub)?;
        fill_segment(graph, sub, index, &mut scope)?;
    }

    index.explored.insert(segment);
    Ok(())
}

fn fill_set<G: ConfigurationGraph + ?Sized>(
    graph: &G,
    set: ComponentId,
    variant: SetVariant,
    index: &mut ResourceSetIndex,
    guard: &mut CircularDependencyGuard<'_, G>,
) -> Result<()> {
    index.record(set, variant);
    // A set still on the current path is walked again so that a cycle keeps
    // growing the path until the guard trips.
    if index.explored.contains(&set) {
        return Ok(());
    }

    for &child in graph.contains(set) {
        let mut scope = guard.descend(child)?;
        if let Some(child_variant) = graph.variant(child) {
            fill_set(graph, child, child_variant, index, &mut scope)?;
        }
    }

    index.explored.insert(set);
    Ok(())
}

/// All applications of the segment tree: a segment's own applications first,
/// then those of each sub-segment, depth first.
pub(crate) fn all_applications<G: ConfigurationGraph + ?Sized>(
    graph: &G,
    guard: &mut CircularDependencyGuard<'_, G>,
) -> Result<Vec<ComponentId>> {
    let mut apps = Vec::new();

    if let Some(root) = graph.root_segment() {
        let mut scope = guard.descend(root)?;
        segment_applications(graph, root, &mut apps, &mut scope)?;
    }

    Ok(apps)
}

fn segment_applications<G: ConfigurationGraph + ?Sized>(
    graph: &G,
    segment: ComponentId,
    apps: &mut Vec<ComponentId>,
    guard: &mut CircularDependencyGuard<'_, G>,
) -> Result<()> {
    let children = graph.children(segment);
    apps.extend_from_slice(children.applications);

    for &sub in children.segments {
        let mut scope = guard.descend(sub)?;
        segment_applications(graph, sub, apps, &mut scope)?;
    }

    Ok(())
}
