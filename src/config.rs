//! Analysis parameters, read from TOML or built in code.
//!
//! ```toml
//! permutations = 1000
//! seed = 42
//! ties = "ordinal"
//! max_samples = 100
//! threads = 4
//! ```

use crate::correlation::TieMethod;
use crate::error::{DiffCoexError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of permutation trials
    pub permutations: usize,
    /// Seed for the permutation generator
    pub seed: u64,
    pub ties: TieMethod,
    /// Profile cut-off for module statistics; `None` uses every sample
    pub max_samples: Option<usize>,
    /// Worker threads for the analysis; `None` uses the global rayon pool
    pub threads: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            permutations: 1000,
            seed: 42,
            ties: TieMethod::Ordinal,
            max_samples: None,
            threads: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.permutations == 0 {
            return Err(DiffCoexError::InvalidInput {
                reason: "permutations must be at least 1".to_string(),
            });
        }
        if self.threads == Some(0) {
            return Err(DiffCoexError::InvalidInput {
                reason: "threads must be at least 1".to_string(),
            });
        }
        if self.max_samples == Some(0) {
            return Err(DiffCoexError::InvalidInput {
                reason: "max_samples must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
