//! Graph supplier abstraction.
//!
//! The disabled-set engine never owns configuration data. It reads the
//! containment graph through the [`ConfigurationGraph`] trait, which a
//! configuration store implements over whatever it has materialized. This
//! crate ships an arena-backed implementation, [`InMemoryConfiguration`],
//! that can be built programmatically or loaded from JSONL.
//!
//! # Contract
//!
//! - Lookups of unknown ids return `None` or empty slices, never panic.
//! - Child lists are returned in configuration order; the parent-path finder
//!   relies on that order for its output.
//! - The supplier does not detect cycles. Every walk over it goes through the
//!   [`CircularDependencyGuard`](crate::guard::CircularDependencyGuard).

use crate::domain::{ComponentId, ComponentKind, SetVariant};

pub mod in_memory;
pub mod jsonl;

pub use in_memory::InMemoryConfiguration;
pub use jsonl::{LoadWarning, load_from_jsonl};

/// Direct children of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentChildren<'a> {
    /// Sub-segments, in order
    pub segments: &'a [ComponentId],

    /// Applications, in order
    pub applications: &'a [ComponentId],
}

impl SegmentChildren<'_> {
    /// Children of something that is not a segment.
    pub const EMPTY: SegmentChildren<'static> = SegmentChildren {
        segments: &[],
        applications: &[],
    };
}

/// Read-only typed view over a materialized configuration.
pub trait ConfigurationGraph {
    /// Root segment of the system, if one is configured.
    fn root_segment(&self) -> Option<ComponentId>;

    /// Kind tag of a component.
    fn kind(&self, id: ComponentId) -> Option<ComponentKind>;

    /// Human-readable unique identifier of a component.
    fn uid(&self, id: ComponentId) -> Option<&str>;

    /// Sub-segments and applications of a segment.
    ///
    /// Returns [`SegmentChildren::EMPTY`] for anything that is not a segment.
    fn children(&self, segment: ComponentId) -> SegmentChildren<'_>;

    /// Resources contained by a resource set, in order.
    ///
    /// Returns an empty slice for anything that is not a resource set.
    fn contains(&self, resource_set: ComponentId) -> &[ComponentId];

    /// Components disabled in the persisted configuration.
    fn persisted_disabled(&self) -> &[ComponentId];

    /// AND/OR variant of a resource set.
    fn variant(&self, resource_set: ComponentId) -> Option<SetVariant> {
        self.kind(resource_set).and_then(ComponentKind::set_variant)
    }

    /// Uid for log and error messages; falls back to the arena id.
    fn describe(&self, id: ComponentId) -> String {
        self.uid(id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }
}
