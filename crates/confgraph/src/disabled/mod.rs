//! Disabled-set cache.
//!
//! [`DisabledComponents`] holds, per system, the user override sets and the
//! memoized set of disabled components. The cache has two states:
//!
//! - **Stale**: no answer is cached. The next query recomputes.
//! - **Fresh**: the cached set is valid and queries are O(1) lookups.
//!
//! Recomputation is all-or-nothing: if the walk fails (structural cycle) the
//! cache stays Stale and nothing partial is published, so a later query
//! retries from scratch.
//!
//! # Invalidation
//!
//! | Trigger                          | Cache   | Override sets |
//! |----------------------------------|---------|---------------|
//! | configuration change/load/unload | cleared | dropped       |
//! | explicit [`reset`](DisabledComponents::reset) | cleared | kept |
//! | override replacement             | cleared | replaced      |
//!
//! Configuration notifications drop the overrides because the component
//! identities they refer to belong to the configuration that just changed.

mod compute;

use crate::config::EngineConfig;
use crate::domain::ComponentId;
use crate::error::Result;
use crate::graph::ConfigurationGraph;
use serde::Serialize;
use std::collections::HashSet;

pub use compute::DISABLED_GOAL;

/// Whether the cache currently holds a valid answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// No cached answer; the next query recomputes
    Stale,

    /// Cached answer is valid
    Fresh,
}

/// Diagnostic counters of a system's disabled-set cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DisabledStats {
    /// Size of the current user-disabled override set
    pub user_disabled: usize,

    /// Size of the current user-enabled override set
    pub user_enabled: usize,

    /// Components in the seed of the last recomputation
    pub seeded: usize,

    /// Components in the last published disabled set
    pub disabled: usize,

    /// AND/OR passes run by the last recomputation
    pub passes: usize,

    /// Whether the last recomputation stopped at the pass cap
    pub iteration_limit_hit: bool,

    /// Completed recomputations (fast path included) since construction
    pub recomputations: u64,
}

/// Per-system override sets and memoized disabled set.
#[derive(Debug)]
pub struct DisabledComponents {
    state: CacheState,
    disabled: HashSet<ComponentId>,
    user_disabled: HashSet<ComponentId>,
    user_enabled: HashSet<ComponentId>,
    stats: DisabledStats,
}

impl Default for DisabledComponents {
    fn default() -> Self {
        Self::new()
    }
}

impl DisabledComponents {
    /// Create an empty, stale cache with no overrides.
    pub fn new() -> Self {
        Self {
            state: CacheState::Stale,
            disabled: HashSet::new(),
            user_disabled: HashSet::new(),
            user_enabled: HashSet::new(),
            stats: DisabledStats::default(),
        }
    }

    /// Current cache state.
    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> DisabledStats {
        self.stats
    }

    /// Current user-disabled override set.
    pub fn user_disabled(&self) -> &HashSet<ComponentId> {
        &self.user_disabled
    }

    /// Current user-enabled override set.
    pub fn user_enabled(&self) -> &HashSet<ComponentId> {
        &self.user_enabled
    }

    /// Drop the cached answer, keeping the override sets.
    pub fn reset(&mut self) {
        self.disabled.clear();
        self.state = CacheState::Stale;
    }

    /// Drop the cached answer and the override sets.
    pub fn clear(&mut self) {
        self.reset();
        self.user_disabled.clear();
        self.user_enabled.clear();
        self.stats.user_disabled = 0;
        self.stats.user_enabled = 0;
    }

    /// Replace the user-disabled override set and invalidate.
    pub fn set_user_disabled(&mut self, ids: impl IntoIterator<Item = ComponentId>) {
        self.user_disabled = ids.into_iter().collect();
        self.stats.user_disabled = self.user_disabled.len();
        self.reset();
    }

    /// Replace the user-enabled override set and invalidate.
    pub fn set_user_enabled(&mut self, ids: impl IntoIterator<Item = ComponentId>) {
        self.user_enabled = ids.into_iter().collect();
        self.stats.user_enabled = self.user_enabled.len();
        self.reset();
    }

    /// Recompute the disabled set if the cache is stale.
    ///
    /// # Errors
    ///
    /// Returns `Error::StructuralCycle` if a walk exceeds the configured path
    /// depth. The cache stays stale in that case.
    pub fn ensure_fresh<G: ConfigurationGraph + ?Sized>(
        &mut self,
        graph: &G,
        config: &EngineConfig,
    ) -> Result<()> {
        if self.state == CacheState::Fresh {
            return Ok(());
        }

        let outcome = compute::compute(graph, &self.user_disabled, &self.user_enabled, config)?;

        self.disabled = outcome.disabled;
        self.stats.seeded = outcome.seeded;
        self.stats.disabled = self.disabled.len();
        self.stats.passes = outcome.passes;
        self.stats.iteration_limit_hit = outcome.iteration_limit_hit;
        self.stats.recomputations += 1;
        self.state = CacheState::Fresh;
        Ok(())
    }

    /// Membership in the cached disabled set.
    ///
    /// Only meaningful while [`state`](Self::state) is `Fresh`; a stale cache
    /// reports every component as enabled.
    pub fn contains(&self, id: ComponentId) -> bool {
        self.disabled.contains(&id)
    }

    /// Cached disabled set in ascending id order.
    pub fn snapshot(&self) -> Vec<ComponentId> {
        let mut ids: Vec<ComponentId> = self.disabled.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
