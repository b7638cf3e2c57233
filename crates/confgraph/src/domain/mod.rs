//! Domain types for the configuration graph.
//!
//! Components live in an arena owned by the graph supplier and are addressed by
//! [`ComponentId`]. The kind of a component is an explicit tag checked by the
//! algorithms rather than something discovered at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a component inside its configuration arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

impl ComponentId {
    /// Arena slot of this component.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a resource set combines the state of its direct children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetVariant {
    /// Disabled once every direct child is disabled.
    And,

    /// Disabled as soon as any direct child is disabled.
    Or,
}

impl fmt::Display for SetVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetVariant::And => write!(f, "AND"),
            SetVariant::Or => write!(f, "OR"),
        }
    }
}

/// Kind tag of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    /// Organizes sub-segments and applications.
    Segment,

    /// Leaf application.
    Application,

    /// Leaf resource.
    Resource,

    /// Container of resources under AND/OR combination.
    ResourceSet(SetVariant),
}

impl ComponentKind {
    /// Returns `true` for segments.
    pub fn is_segment(self) -> bool {
        matches!(self, ComponentKind::Segment)
    }

    /// Returns the AND/OR variant when this is a resource set.
    pub fn set_variant(self) -> Option<SetVariant> {
        match self {
            ComponentKind::ResourceSet(variant) => Some(variant),
            _ => None,
        }
    }

    /// Returns `true` for kinds that may be placed in a segment's application list.
    pub fn is_application_like(self) -> bool {
        !self.is_segment()
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Segment => write!(f, "segment"),
            ComponentKind::Application => write!(f, "application"),
            ComponentKind::Resource => write!(f, "resource"),
            ComponentKind::ResourceSet(variant) => write!(f, "resource-set-{variant}"),
        }
    }
}

/// A node of the configuration graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Unique, human-readable identifier
    pub uid: String,

    /// Kind tag
    pub kind: ComponentKind,

    /// Sub-segments, in order (segments only)
    pub segments: Vec<ComponentId>,

    /// Applications, in order (segments only)
    pub applications: Vec<ComponentId>,

    /// Contained resources, in order (resource sets only)
    pub contains: Vec<ComponentId>,
}

impl Component {
    /// Create a component with no edges.
    pub fn new(uid: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            uid: uid.into(),
            kind,
            segments: Vec::new(),
            applications: Vec::new(),
            contains: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(ComponentKind::Segment.to_string(), "segment");
        assert_eq!(
            ComponentKind::ResourceSet(SetVariant::Or).to_string(),
            "resource-set-OR"
        );
    }

    #[test]
    fn test_set_variant_only_for_resource_sets() {
        assert_eq!(
            ComponentKind::ResourceSet(SetVariant::And).set_variant(),
            Some(SetVariant::And)
        );
        assert_eq!(ComponentKind::Resource.set_variant(), None);
        assert_eq!(ComponentKind::Segment.set_variant(), None);
    }

    #[test]
    fn test_segments_are_not_application_like() {
        assert!(!ComponentKind::Segment.is_application_like());
        assert!(ComponentKind::Application.is_application_like());
        assert!(ComponentKind::ResourceSet(SetVariant::Or).is_application_like());
    }
}
