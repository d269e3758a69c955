// Configuration for the per-cluster permutation test
//
// Every knob has a default that reproduces the reference behaviour: 1000
// resamples, cross-condition mean distance, Tukey fences at 1.5 x IQR.

use crate::error::{HeterogeneityError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Aggregate of the cross-condition distances used as the test statistic
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CrossStatistic {
    /// Mean distance over all (A, B) pairs in the cluster
    #[default]
    Mean,
    /// Median distance over all (A, B) pairs in the cluster
    Median,
}

impl fmt::Display for CrossStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossStatistic::Mean => write!(f, "mean"),
            CrossStatistic::Median => write!(f, "median"),
        }
    }
}

/// Configuration for heterogeneity analysis
///
/// # Example
/// ```
/// use clusterhet::HeterogeneityConfig;
///
/// let config = HeterogeneityConfig::default();
/// assert_eq!(config.resample_count, 1000);
/// assert_eq!(config.iqr_multiplier, 1.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeterogeneityConfig {
    /// Size of the permutation null distribution per cluster
    ///
    /// Achievable p-value resolution is `1 / resample_count`; scale it up
    /// for clusters with many observations.
    pub resample_count: usize,

    /// Base seed for the per-cluster random streams
    ///
    /// `None` draws a fresh seed from the operating system; the seed actually
    /// used is reported in the result table either way.
    pub seed: Option<u64>,

    /// Tukey fence multiplier `k` for the IQR call
    pub iqr_multiplier: f32,

    /// Test statistic over cross-condition distances
    pub statistic: CrossStatistic,

    /// Process clusters on the rayon thread pool
    pub parallel: bool,
}

impl Default for HeterogeneityConfig {
    fn default() -> Self {
        Self {
            resample_count: 1000,
            seed: None,
            iqr_multiplier: 1.5,
            statistic: CrossStatistic::Mean,
            parallel: true,
        }
    }
}

impl HeterogeneityConfig {
    /// Fast, coarse configuration for interactive exploration
    pub fn quick() -> Self {
        Self {
            resample_count: 200,
            ..Self::default()
        }
    }

    /// Fine-grained configuration for large clusters (p resolution 1e-4)
    pub fn thorough() -> Self {
        Self {
            resample_count: 10_000,
            ..Self::default()
        }
    }

    /// Builder-style seed override
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder-style resample count override
    pub fn with_resample_count(mut self, resample_count: usize) -> Self {
        self.resample_count = resample_count;
        self
    }

    /// Load configuration from a TOML file; missing keys take their defaults
    ///
    /// # Example TOML
    /// ```toml
    /// resample_count = 5000
    /// seed = 42
    /// iqr_multiplier = 3.0
    /// statistic = "median"
    /// ```
    pub fn from_toml<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self =
            toml::from_str(content).context("Failed to parse TOML analysis configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.resample_count == 0 {
            return Err(HeterogeneityError::InvalidResampleCount(self.resample_count));
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(HeterogeneityError::InvalidConfig(format!(
                "iqr_multiplier must be finite and non-negative, got {}",
                self.iqr_multiplier
            )));
        }

        Ok(())
    }
}
