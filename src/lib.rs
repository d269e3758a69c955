//! clusterhet - per-cluster condition heterogeneity from precomputed distances
//!
//! Given a cluster label and a two-valued condition label per observation,
//! plus an N x N pairwise distance matrix, this library asks for every
//! cluster whether its condition-A and condition-B members sit further apart
//! than a random relabelling of the same cluster would place them. The answer
//! is a permutation z-score, a two-tailed p-value and a coarse IQR call per
//! cluster, with an optional two-panel SVG chart of the results.

pub mod cli;
pub mod csv_output;
pub mod engine;
pub mod error;
pub mod input;
pub mod json_output;
pub mod matrix;
pub mod presenter;

pub use engine::{
    analyze, ClusterHeterogeneity, ClusterStatus, CrossStatistic, HeterogeneityConfig,
    HeterogeneityEngine, IqrCall, ResultTable,
};
pub use error::HeterogeneityError;
pub use matrix::DistanceMatrix;
