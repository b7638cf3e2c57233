//! Error types for confgraph operations.

use std::io;
use thiserror::Error;

/// The error type for confgraph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A recursive walk exceeded the maximum path depth.
    ///
    /// Almost always caused by a containment cycle between segments and/or
    /// resource sets. `path` holds the uids recorded on the recursion path when
    /// the limit was hit, outermost first.
    #[error(
        "circular dependency suspected while computing {goal}: path exceeds {limit} levels ({})",
        .path.join(", ")
    )]
    StructuralCycle {
        /// What the walk was computing.
        goal: String,
        /// Configured maximum path depth.
        limit: usize,
        /// Uids on the recursion path when the limit was hit.
        path: Vec<String>,
    },

    /// The AND/OR fixed-point iteration did not settle within the pass cap.
    ///
    /// Non-fatal: only ever logged, the best-effort result is kept.
    #[error(
        "exceeded the maximum of {limit} iterations allowed during calculation of disabled components"
    )]
    IterationLimitExceeded {
        /// Configured maximum number of passes.
        limit: usize,
    },

    /// No component with the given uid or id exists.
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// A component with the given uid already exists.
    #[error("Duplicate component: {0}")]
    DuplicateComponent(String),

    /// A containment edge between incompatible components was requested.
    #[error("Cannot place {child} in {parent}: {reason}")]
    InvalidContainment {
        /// Uid of the container.
        parent: String,
        /// Uid of the component being contained.
        child: String,
        /// Why the edge was rejected.
        reason: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for confgraph operations.
pub type Result<T> = std::result::Result<T, Error>;
