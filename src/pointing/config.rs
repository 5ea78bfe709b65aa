use super::error::{PointingCacheError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the pointing direction cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of antennas; valid antenna ids are `0..n_antennas`
    pub n_antennas: usize,
    /// Entries kept per antenna after a compaction
    pub min_times: usize,
    /// Entries per antenna that trigger a compaction
    pub max_times: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            n_antennas: 64,
            min_times: 1000,
            max_times: 10000,
        }
    }
}

impl CacheConfig {
    pub fn new(n_antennas: usize) -> Self {
        Self {
            n_antennas,
            ..Self::default()
        }
    }

    pub fn with_min_times(mut self, min_times: usize) -> Self {
        self.min_times = min_times;
        self
    }

    pub fn with_max_times(mut self, max_times: usize) -> Self {
        self.max_times = max_times;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_antennas == 0 {
            return Err(PointingCacheError::InvalidConfig(
                "n_antennas must be at least 1".to_string(),
            ));
        }
        if self.min_times == 0 {
            return Err(PointingCacheError::InvalidConfig(
                "min_times must be at least 1".to_string(),
            ));
        }
        if self.min_times > self.max_times {
            return Err(PointingCacheError::InvalidConfig(format!(
                "min_times ({}) exceeds max_times ({})",
                self.min_times, self.max_times
            )));
        }
        Ok(())
    }
}
