//! Engine configuration.
//!
//! Limits applied to every graph walk and fixed-point iteration of a
//! [`System`](crate::system::System). Stored as YAML:
//!
//! ```yaml
//! max-path-depth: 64
//! max-iterations: 1000
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Default maximum recursion path depth of the circular dependency guard
pub const DEFAULT_MAX_PATH_DEPTH: usize = 64;

/// Default cap on AND/OR fixed-point passes
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Limits used by the disabled-set engine and parent-path finder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct EngineConfig {
    /// Maximum number of components on a recursion path before a walk is
    /// aborted as a structural cycle
    pub max_path_depth: usize,

    /// Maximum number of AND/OR propagation passes
    pub max_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_path_depth: DEFAULT_MAX_PATH_DEPTH,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        Self::from_yaml_str(&content)
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {}", e)))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check that both limits allow at least one step.
    pub fn validate(&self) -> Result<()> {
        if self.max_path_depth == 0 {
            return Err(Error::Config(
                "max-path-depth must be at least 1".to_string(),
            ));
        }

        if self.max_iterations == 0 {
            return Err(Error::Config(
                "max-iterations must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
