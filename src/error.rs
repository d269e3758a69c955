//! Input-contract errors for the heterogeneity engine
//!
//! Every variant is raised before any cluster is processed. Per-cluster
//! degeneracy (single-condition clusters, singletons, zero-spread nulls) is
//! not an error; it is encoded in the result record instead.

use thiserror::Error;

/// Errors raised by the heterogeneity engine and distance-matrix constructors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HeterogeneityError {
    #[error("Label length mismatch: {clusters} cluster labels vs {conditions} condition labels")]
    LabelLengthMismatch { clusters: usize, conditions: usize },

    #[error("Distance matrix covers {matrix} observations but {labels} observations are labelled")]
    DimensionMismatch { matrix: usize, labels: usize },

    #[error("Distance matrix is not square: row {row} has {len} entries, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("Condensed distance vector of length {len} does not describe any n x n matrix")]
    CondensedLength { len: usize },

    #[error("Invalid distance at ({i}, {j}): {value} (must be finite and non-negative)")]
    InvalidDistance { i: usize, j: usize, value: f32 },

    #[error("Distance matrix is not symmetric at ({i}, {j}): {forward} vs {backward}")]
    Asymmetric {
        i: usize,
        j: usize,
        forward: f32,
        backward: f32,
    },

    #[error("Distance matrix diagonal must be zero, found {value} at ({index}, {index})")]
    NonZeroDiagonal { index: usize, value: f32 },

    #[error("Condition labels must take exactly two distinct values, found {found}")]
    ConditionCount { found: usize },

    #[error("resample_count must be positive, got {0}")]
    InvalidResampleCount(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Random source failure: {0}")]
    RandomSource(String),

    #[error("Statistics backend failure: {0}")]
    Statistics(String),
}

pub type Result<T> = std::result::Result<T, HeterogeneityError>;
