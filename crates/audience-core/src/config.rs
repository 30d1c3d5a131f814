use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Thresholds applied by the analysis engine for one invocation.
///
/// The value is immutable once built and carries no defaults of its own:
/// every caller states its thresholds explicitly, so two consumers passing
/// equal configs are guaranteed to run the same aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineConfig {
    min_observations: usize,
    top_n: usize,
}

impl EngineConfig {
    /// Build a validated configuration.
    ///
    /// Both thresholds must be positive.
    pub fn new(min_observations: usize, top_n: usize) -> Result<Self> {
        let config = Self {
            min_observations,
            top_n,
        };
        config.validate()?;
        Ok(config)
    }

    /// Minimum positive-rating observations a program needs to be ranked.
    pub fn min_observations(&self) -> usize {
        self.min_observations
    }

    /// Number of programs kept in the age-preference ranking.
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Re-check the invariants. Deserialised configs bypass [`Self::new`],
    /// so the engine calls this on every entry.
    pub fn validate(&self) -> Result<()> {
        validate_thresholds(self.min_observations, self.top_n)
    }
}

/// Reject non-positive thresholds.
pub fn validate_thresholds(min_observations: usize, top_n: usize) -> Result<()> {
    if min_observations == 0 {
        return Err(AnalysisError::Configuration(
            "min_observations must be a positive integer".to_string(),
        ));
    }
    if top_n == 0 {
        return Err(AnalysisError::Configuration(
            "top_n must be a positive integer".to_string(),
        ));
    }
    Ok(())
}
