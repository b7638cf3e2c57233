//! Arena-backed configuration graph.
//!
//! Components are stored in a `Vec` indexed by [`ComponentId`]; containment
//! edges are ordered index lists on the parent. A uid map gives O(1) lookup by
//! name.
//!
//! The builder validates component *kinds* on every edge (a segment cannot be
//! placed in a resource set, only segments hold sub-segments, and so on) but
//! deliberately accepts cycles: a store can hand the engine a malformed graph,
//! and the engine has to cope. Use [`InMemoryConfiguration::find_cycle`] to
//! check a graph eagerly.

use crate::domain::{Component, ComponentId, ComponentKind, SetVariant};
use crate::error::{Error, Result};
use crate::graph::{ConfigurationGraph, SegmentChildren};
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// In-memory configuration graph.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfiguration {
    /// Components indexed by `ComponentId`
    components: Vec<Component>,

    /// Mapping from uid to arena slot
    by_uid: HashMap<String, ComponentId>,

    /// Uid of the system the configuration describes
    system: Option<String>,

    /// Root segment of the system
    root: Option<ComponentId>,

    /// Persisted disabled list, in insertion order
    disabled: Vec<ComponentId>,
}

impl InMemoryConfiguration {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uid of the system the configuration describes, if known.
    pub fn system_uid(&self) -> Option<&str> {
        self.system.as_deref()
    }

    /// Name the system the configuration describes.
    pub fn set_system_uid(&mut self, uid: impl Into<String>) {
        self.system = Some(uid.into());
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if no component has been added.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Look up a component id by uid.
    pub fn lookup(&self, uid: &str) -> Option<ComponentId> {
        self.by_uid.get(uid).copied()
    }

    /// Look up a component id by uid, failing if it does not exist.
    pub fn require(&self, uid: &str) -> Result<ComponentId> {
        self.lookup(uid)
            .ok_or_else(|| Error::ComponentNotFound(uid.to_string()))
    }

    /// Get a component by id.
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.index())
    }

    /// Iterate over all components with their ids, in insertion order.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components
            .iter()
            .enumerate()
            .map(|(index, component)| (Self::id_at(index), component))
    }

    /// Add a component of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateComponent` if the uid is already taken.
    pub fn add_component(&mut self, uid: &str, kind: ComponentKind) -> Result<ComponentId> {
        if self.by_uid.contains_key(uid) {
            return Err(Error::DuplicateComponent(uid.to_string()));
        }

        let index = u32::try_from(self.components.len())
            .map_err(|_| Error::Config("component arena is full".to_string()))?;
        let id = ComponentId(index);
        self.components.push(Component::new(uid, kind));
        self.by_uid.insert(uid.to_string(), id);
        Ok(id)
    }

    /// Add a segment.
    pub fn add_segment(&mut self, uid: &str) -> Result<ComponentId> {
        self.add_component(uid, ComponentKind::Segment)
    }

    /// Add a plain application.
    pub fn add_plain_application(&mut self, uid: &str) -> Result<ComponentId> {
        self.add_component(uid, ComponentKind::Application)
    }

    /// Add a plain resource.
    pub fn add_resource(&mut self, uid: &str) -> Result<ComponentId> {
        self.add_component(uid, ComponentKind::Resource)
    }

    /// Add an AND or OR resource set.
    pub fn add_resource_set(&mut self, uid: &str, variant: SetVariant) -> Result<ComponentId> {
        self.add_component(uid, ComponentKind::ResourceSet(variant))
    }

    /// Make `segment` the root segment of the system.
    pub fn set_root(&mut self, segment: ComponentId) -> Result<()> {
        let kind = self.kind_of(segment)?;
        if !kind.is_segment() {
            return Err(Error::InvalidContainment {
                parent: "system".to_string(),
                child: self.describe(segment),
                reason: format!("the root must be a segment, not a {}", kind),
            });
        }
        self.root = Some(segment);
        Ok(())
    }

    /// Remove the root segment, leaving an empty system.
    pub fn clear_root(&mut self) {
        self.root = None;
    }

    /// Append `child` to the sub-segments of `parent`.
    pub fn add_sub_segment(&mut self, parent: ComponentId, child: ComponentId) -> Result<()> {
        self.check_edge(parent, child, |p, c| {
            if !p.is_segment() {
                Some(format!("a {} has no sub-segments", p))
            } else if !c.is_segment() {
                Some(format!("a {} is not a segment", c))
            } else {
                None
            }
        })?;
        self.components[parent.index()].segments.push(child);
        Ok(())
    }

    /// Append `application` to the applications of `segment`.
    pub fn add_application(&mut self, segment: ComponentId, application: ComponentId) -> Result<()> {
        self.check_edge(segment, application, |p, c| {
            if !p.is_segment() {
                Some(format!("a {} has no applications", p))
            } else if !c.is_application_like() {
                Some("segments must be added as sub-segments".to_string())
            } else {
                None
            }
        })?;
        self.components[segment.index()].applications.push(application);
        Ok(())
    }

    /// Append `child` to the resources contained by `resource_set`.
    pub fn add_to_set(&mut self, resource_set: ComponentId, child: ComponentId) -> Result<()> {
        self.check_edge(resource_set, child, |p, c| {
            if p.set_variant().is_none() {
                Some(format!("a {} contains no resources", p))
            } else if c.is_segment() {
                Some("a resource set cannot contain a segment".to_string())
            } else {
                None
            }
        })?;
        self.components[resource_set.index()].contains.push(child);
        Ok(())
    }

    /// Remove every containment edge from `parent` to `child`.
    ///
    /// Returns `true` if at least one edge was removed.
    pub fn detach(&mut self, parent: ComponentId, child: ComponentId) -> bool {
        let Some(component) = self.components.get_mut(parent.index()) else {
            return false;
        };

        let before =
            component.segments.len() + component.applications.len() + component.contains.len();
        component.segments.retain(|c| *c != child);
        component.applications.retain(|c| *c != child);
        component.contains.retain(|c| *c != child);
        let after =
            component.segments.len() + component.applications.len() + component.contains.len();

        before != after
    }

    /// Replace the persisted disabled list.
    pub fn set_persisted_disabled(&mut self, ids: impl IntoIterator<Item = ComponentId>) {
        self.disabled.clear();
        for id in ids {
            if !self.disabled.contains(&id) {
                self.disabled.push(id);
            }
        }
    }

    /// Add a component to the persisted disabled list.
    pub fn disable(&mut self, id: ComponentId) {
        if !self.disabled.contains(&id) {
            self.disabled.push(id);
        }
    }

    /// Remove a component from the persisted disabled list.
    pub fn enable(&mut self, id: ComponentId) {
        self.disabled.retain(|d| *d != id);
    }

    /// Find a component that sits on a containment cycle, if any.
    ///
    /// Considers every component in the arena, reachable from the root or not.
    pub fn find_cycle(&self) -> Option<ComponentId> {
        let mut graph: DiGraph<ComponentId, ()> = DiGraph::with_capacity(self.len(), 0);
        let nodes: Vec<NodeIndex> = self
            .components()
            .map(|(id, _)| graph.add_node(id))
            .collect();

        for (index, component) in self.components.iter().enumerate() {
            let edges = component
                .segments
                .iter()
                .chain(&component.applications)
                .chain(&component.contains);
            for child in edges {
                if let Some(&target) = nodes.get(child.index()) {
                    graph.add_edge(nodes[index], target, ());
                }
            }
        }

        algo::toposort(&graph, None)
            .err()
            .map(|cycle| graph[cycle.node_id()])
    }

    // add_component keeps every arena index within u32
    #[allow(clippy::cast_possible_truncation)]
    fn id_at(index: usize) -> ComponentId {
        ComponentId(index as u32)
    }

    fn kind_of(&self, id: ComponentId) -> Result<ComponentKind> {
        self.kind(id)
            .ok_or_else(|| Error::ComponentNotFound(id.to_string()))
    }

    fn check_edge(
        &self,
        parent: ComponentId,
        child: ComponentId,
        reject: impl FnOnce(ComponentKind, ComponentKind) -> Option<String>,
    ) -> Result<()> {
        let parent_kind = self.kind_of(parent)?;
        let child_kind = self.kind_of(child)?;

        match reject(parent_kind, child_kind) {
            Some(reason) => Err(Error::InvalidContainment {
                parent: self.describe(parent),
                child: self.describe(child),
                reason,
            }),
            None => Ok(()),
        }
    }
}

impl ConfigurationGraph for InMemoryConfiguration {
    fn root_segment(&self) -> Option<ComponentId> {
        self.root
    }

    fn kind(&self, id: ComponentId) -> Option<ComponentKind> {
        self.component(id).map(|c| c.kind)
    }

    fn uid(&self, id: ComponentId) -> Option<&str> {
        self.component(id).map(|c| c.uid.as_str())
    }

    fn children(&self, segment: ComponentId) -> SegmentChildren<'_> {
        match self.component(segment) {
            Some(c) if c.kind.is_segment() => SegmentChildren {
                segments: &c.segments,
                applications: &c.applications,
            },
            _ => SegmentChildren::EMPTY,
        }
    }

    fn contains(&self, resource_set: ComponentId) -> &[ComponentId] {
        match self.component(resource_set) {
            Some(c) if c.kind.set_variant().is_some() => &c.contains,
            _ => &[],
        }
    }

    fn persisted_disabled(&self) -> &[ComponentId] {
        &self.disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> (InMemoryConfiguration, ComponentId, ComponentId, ComponentId) {
        let mut config = InMemoryConfiguration::new();
        let root = config.add_segment("root").unwrap();
        let set = config.add_resource_set("set", SetVariant::Or).unwrap();
        let res = config.add_resource("res").unwrap();
        config.set_root(root).unwrap();
        config.add_application(root, set).unwrap();
        config.add_to_set(set, res).unwrap();
        (config, root, set, res)
    }

    #[test]
    fn test_duplicate_uid_rejected() {
        let mut config = InMemoryConfiguration::new();
        config.add_segment("s").unwrap();
        let err = config.add_resource("s").unwrap_err();
        assert!(matches!(err, Error::DuplicateComponent(uid) if uid == "s"));
    }

    #[test]
    fn test_lookup_and_accessors() {
        let (config, root, set, res) = small_tree();

        assert_eq!(config.lookup("set"), Some(set));
        assert_eq!(config.lookup("nope"), None);
        assert!(config.require("nope").is_err());
        assert_eq!(config.root_segment(), Some(root));
        assert_eq!(config.children(root).applications, &[set]);
        assert_eq!(config.contains(set), &[res]);
        assert_eq!(config.variant(set), Some(SetVariant::Or));
        assert_eq!(config.uid(res), Some("res"));
    }

    #[test]
    fn test_accessors_on_wrong_kind_are_empty() {
        let (config, root, set, res) = small_tree();

        assert_eq!(config.children(set), SegmentChildren::EMPTY);
        assert!(config.contains(root).is_empty());
        assert!(config.contains(res).is_empty());
        assert_eq!(config.variant(root), None);
        assert_eq!(config.kind(ComponentId(99)), None);
        assert_eq!(config.describe(ComponentId(99)), "#99");
    }

    #[test]
    fn test_kind_validation_on_edges() {
        let (mut config, root, set, res) = small_tree();
        let seg = config.add_segment("seg").unwrap();

        assert!(matches!(
            config.add_to_set(set, seg),
            Err(Error::InvalidContainment { .. })
        ));
        assert!(matches!(
            config.add_application(root, seg),
            Err(Error::InvalidContainment { .. })
        ));
        assert!(matches!(
            config.add_sub_segment(set, seg),
            Err(Error::InvalidContainment { .. })
        ));
        assert!(matches!(
            config.add_to_set(res, set),
            Err(Error::InvalidContainment { .. })
        ));
        assert!(matches!(
            config.set_root(res),
            Err(Error::InvalidContainment { .. })
        ));
        assert!(matches!(
            config.add_to_set(set, ComponentId(42)),
            Err(Error::ComponentNotFound(_))
        ));
    }

    #[test]
    fn test_detach_removes_edge() {
        let (mut config, root, set, _) = small_tree();
        assert!(config.detach(root, set));
        assert!(config.children(root).applications.is_empty());
        assert!(!config.detach(root, set));
    }

    #[test]
    fn test_persisted_disabled_deduplicates() {
        let (mut config, _, set, res) = small_tree();
        config.set_persisted_disabled([res, res, set]);
        assert_eq!(config.persisted_disabled(), &[res, set]);

        config.disable(res);
        assert_eq!(config.persisted_disabled().len(), 2);

        config.enable(res);
        assert_eq!(config.persisted_disabled(), &[set]);
    }

    #[test]
    fn test_find_cycle_on_dag_is_none() {
        let (mut config, root, set, _) = small_tree();
        // Shared resource set reached through two segments is not a cycle
        let sub = config.add_segment("sub").unwrap();
        config.add_sub_segment(root, sub).unwrap();
        config.add_application(sub, set).unwrap();

        assert_eq!(config.find_cycle(), None);
    }

    #[test]
    fn test_find_cycle_reports_member() {
        let (mut config, _, set, _) = small_tree();
        let inner = config.add_resource_set("inner", SetVariant::And).unwrap();
        config.add_to_set(set, inner).unwrap();
        config.add_to_set(inner, set).unwrap();

        let member = config.find_cycle().unwrap();
        assert!(member == set || member == inner);
    }
}
