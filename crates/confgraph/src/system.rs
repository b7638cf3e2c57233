//! Per-system facade over the configuration graph and its disabled-set cache.
//!
//! A [`System`] owns the configuration graph, the engine limits and the
//! disabled-set cache. Queries take `&self`: the API is pure from the outside
//! (same graph and overrides, same answers) while the cache is filled lazily
//! behind a `RefCell`.
//!
//! # Threading
//!
//! `System` is deliberately `!Sync`. Recomputation is not reentrant, so the
//! embedding process serializes configuration changes and queries on one
//! thread (or wraps the system in its own lock).
//!
//! # Notifications
//!
//! When the configuration changes underneath the system, the store calls
//! [`on_change`](System::on_change), [`on_load`](System::on_load) or
//! [`on_unload`](System::on_unload). When the graph is owned and edited through
//! the system, [`update`](System::update) and [`load`](System::load) raise the
//! notification themselves.

use crate::config::EngineConfig;
use crate::disabled::{CacheState, DisabledComponents, DisabledStats};
use crate::domain::ComponentId;
use crate::error::Result;
use crate::graph::{ConfigurationGraph, InMemoryConfiguration};
use crate::guard::CircularDependencyGuard;
use crate::parents::{self, ParentPath};
use crate::walk;
use std::cell::RefCell;

/// Goal reported by the guard when listing applications hits a cycle.
const APPLICATIONS_GOAL: &str = "system applications";

/// A control system: configuration graph plus runtime disabled state.
#[derive(Debug)]
pub struct System<G: ConfigurationGraph = InMemoryConfiguration> {
    uid: String,
    graph: G,
    config: EngineConfig,
    disabled: RefCell<DisabledComponents>,
}

impl<G: ConfigurationGraph> System<G> {
    /// Create a system with default engine limits.
    pub fn new(uid: impl Into<String>, graph: G) -> Self {
        let uid = uid.into();
        tracing::debug!(system = %uid, "construct system");
        Self {
            uid,
            graph,
            config: EngineConfig::default(),
            disabled: RefCell::new(DisabledComponents::new()),
        }
    }

    /// Create a system with explicit engine limits.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the limits fail validation.
    pub fn with_config(uid: impl Into<String>, graph: G, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut system = Self::new(uid, graph);
        system.config = config;
        Ok(system)
    }

    /// Unique identifier of the system.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Read-only view of the configuration graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Engine limits in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========== Queries ==========

    /// Whether `component` is disabled, recomputing the cache if it is stale.
    ///
    /// Unknown components are reported as enabled.
    ///
    /// # Errors
    ///
    /// Returns `Error::StructuralCycle` if the graph contains a containment
    /// cycle. Nothing is cached in that case; fixing the graph and querying
    /// again retries the computation.
    pub fn is_disabled(&self, component: ComponentId) -> Result<bool> {
        let mut cache = self.disabled.borrow_mut();
        cache.ensure_fresh(&self.graph, &self.config)?;

        let result = cache.contains(component);
        tracing::trace!(
            system = %self.uid,
            component = %self.graph.describe(component),
            disabled = result,
            "is_disabled"
        );
        Ok(result)
    }

    /// Every disabled component, in ascending id order.
    pub fn disabled_components(&self) -> Result<Vec<ComponentId>> {
        let mut cache = self.disabled.borrow_mut();
        cache.ensure_fresh(&self.graph, &self.config)?;
        Ok(cache.snapshot())
    }

    /// All containment paths from the root segment to `component`'s container.
    ///
    /// See [`parents::find_paths`]. A system without a root segment yields no
    /// paths.
    pub fn find_parents(&self, component: ComponentId) -> Result<Vec<ParentPath>> {
        match self.graph.root_segment() {
            Some(root) => {
                parents::find_paths(&self.graph, root, component, self.config.max_path_depth)
            }
            None => {
                tracing::debug!(system = %self.uid, "system has no root segment");
                Ok(Vec::new())
            }
        }
    }

    /// All applications of the segment tree, depth first.
    pub fn all_applications(&self) -> Result<Vec<ComponentId>> {
        let mut guard = CircularDependencyGuard::new(
            &self.graph,
            APPLICATIONS_GOAL,
            self.config.max_path_depth,
        );
        walk::all_applications(&self.graph, &mut guard)
    }

    /// Applications of the segment tree that are not disabled.
    pub fn enabled_applications(&self) -> Result<Vec<ComponentId>> {
        let apps = self.all_applications()?;

        let mut cache = self.disabled.borrow_mut();
        cache.ensure_fresh(&self.graph, &self.config)?;
        Ok(apps.into_iter().filter(|app| !cache.contains(*app)).collect())
    }

    // ========== Overrides ==========

    /// Replace the user-disabled override set.
    pub fn set_disabled(&self, components: impl IntoIterator<Item = ComponentId>) {
        let mut cache = self.disabled.borrow_mut();
        cache.set_user_disabled(components);
        tracing::debug!(
            system = %self.uid,
            count = cache.user_disabled().len(),
            "replaced user-disabled components"
        );
    }

    /// Replace the user-enabled override set.
    pub fn set_enabled(&self, components: impl IntoIterator<Item = ComponentId>) {
        let mut cache = self.disabled.borrow_mut();
        cache.set_user_enabled(components);
        tracing::debug!(
            system = %self.uid,
            count = cache.user_enabled().len(),
            "replaced user-enabled components"
        );
    }

    /// Drop the cached answer, keeping the override sets.
    pub fn reset(&self) {
        tracing::debug!(system = %self.uid, "reset disabled components by explicit user call");
        self.disabled.borrow_mut().reset();
    }

    // ========== Diagnostics ==========

    /// Diagnostic counters.
    pub fn stats(&self) -> DisabledStats {
        self.disabled.borrow().stats()
    }

    /// Number of resources currently overridden by the user, enabled or disabled.
    pub fn slr_resource_count(&self) -> usize {
        let stats = self.stats();
        stats.user_disabled + stats.user_enabled
    }

    /// Current cache state.
    pub fn cache_state(&self) -> CacheState {
        self.disabled.borrow().state()
    }

    // ========== Notifications ==========

    /// The persisted configuration changed.
    pub fn on_change(&self) {
        tracing::debug!(
            system = %self.uid,
            "reset disabled components because of configuration change"
        );
        self.disabled.borrow_mut().clear();
    }

    /// A configuration was loaded.
    pub fn on_load(&self) {
        tracing::debug!(
            system = %self.uid,
            "reset disabled components because of configuration load"
        );
        self.disabled.borrow_mut().clear();
    }

    /// The configuration was unloaded.
    pub fn on_unload(&self) {
        tracing::debug!(
            system = %self.uid,
            "reset disabled components because of configuration unload"
        );
        self.disabled.borrow_mut().clear();
    }

    /// Edit the owned graph, then raise [`on_change`](Self::on_change).
    pub fn update<R>(&mut self, edit: impl FnOnce(&mut G) -> R) -> R {
        let result = edit(&mut self.graph);
        self.on_change();
        result
    }

    /// Swap in a newly loaded graph, then raise [`on_load`](Self::on_load).
    ///
    /// Returns the previous graph.
    pub fn load(&mut self, graph: G) -> G {
        let previous = std::mem::replace(&mut self.graph, graph);
        self.on_load();
        previous
    }
}
