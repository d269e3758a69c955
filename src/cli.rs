//! CLI argument parsing for clusterhet

use crate::engine::{CrossStatistic, HeterogeneityConfig};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the result table
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text report (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "clusterhet")]
#[command(version)]
#[command(
    about = "Per-cluster condition heterogeneity via permutation tests on a distance matrix",
    long_about = None
)]
pub struct Cli {
    /// JSON input document with "clusters", "conditions" and "distances"
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// TOML analysis configuration (command-line flags take precedence)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Permutations drawn per cluster
    #[arg(short = 'n', long = "resamples", value_name = "N")]
    pub resamples: Option<usize>,

    /// Base seed for reproducible runs
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Tukey fence multiplier for the IQR call
    #[arg(long = "iqr-multiplier", value_name = "K")]
    pub iqr_multiplier: Option<f32>,

    /// Aggregate of cross-condition distances used as the test statistic
    #[arg(long = "statistic", value_enum)]
    pub statistic: Option<CrossStatistic>,

    /// Process clusters on a single thread
    #[arg(long = "sequential")]
    pub sequential: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write an SVG chart of the results to this path
    #[arg(long = "plot", value_name = "SVG")]
    pub plot: Option<PathBuf>,

    /// Chart title
    #[arg(long = "title", default_value = "Condition heterogeneity")]
    pub title: String,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Effective engine configuration: config file (or defaults) overlaid with flags
    pub fn analysis_config(&self) -> Result<HeterogeneityConfig> {
        let mut config = match &self.config {
            Some(path) => HeterogeneityConfig::from_toml(path)?,
            None => HeterogeneityConfig::default(),
        };

        if let Some(resamples) = self.resamples {
            config.resample_count = resamples;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(k) = self.iqr_multiplier {
            config.iqr_multiplier = k;
        }
        if let Some(statistic) = self.statistic {
            config.statistic = statistic;
        }
        if self.sequential {
            config.parallel = false;
        }

        config.validate()?;
        Ok(config)
    }
}
