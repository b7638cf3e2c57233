//! Confgraph - disabled-state propagation over control-system configuration.
//!
//! A control system is described as a tree of segments holding sub-segments and
//! applications. Applications may be resource sets that contain resources (and
//! further resource sets) combined with AND/OR semantics. This crate answers
//! "is this component disabled?" for such a tree, taking into account:
//!
//! - the persisted disabled list supplied by the configuration,
//! - transient user overrides (force-disable / force-enable),
//! - downward cascade through segments and resource sets,
//! - upward AND/OR promotion of resource sets, iterated to a fixed point.
//!
//! Results are memoized per [`System`](system::System) and invalidated on
//! configuration notifications or override changes.
//!
//! # Example
//!
//! ```
//! use confgraph::domain::SetVariant;
//! use confgraph::graph::InMemoryConfiguration;
//! use confgraph::system::System;
//!
//! # fn main() -> confgraph::error::Result<()> {
//! let mut config = InMemoryConfiguration::new();
//! let root = config.add_segment("root")?;
//! config.set_root(root)?;
//! let set = config.add_resource_set("readout", SetVariant::And)?;
//! let m1 = config.add_resource("m1")?;
//! let m2 = config.add_resource("m2")?;
//! config.add_application(root, set)?;
//! config.add_to_set(set, m1)?;
//! config.add_to_set(set, m2)?;
//! config.set_persisted_disabled([m1]);
//!
//! let system = System::new("session", config);
//! assert!(system.is_disabled(m1)?);
//! assert!(!system.is_disabled(set)?);
//!
//! system.set_disabled([m2]);
//! assert!(system.is_disabled(set)?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod disabled;
pub mod domain;
pub mod error;
pub mod graph;
pub mod guard;
pub mod parents;
pub mod system;

pub(crate) mod walk;

pub use error::{Error, Result};
