//! JSON input documents for the `clusterhet` binary
//!
//! ```json
//! {
//!   "clusters":   ["T", "T", "B", "B"],
//!   "conditions": ["ctrl", "stim", "ctrl", "stim"],
//!   "distances":  [[0, 1, 4, 4], [1, 0, 4, 4], [4, 4, 0, 1], [4, 4, 1, 0]]
//! }
//! ```
//!
//! Labels may be strings or integers. Distances may be a square matrix
//! (array of rows) or the condensed upper triangle.

use crate::matrix::DistanceMatrix;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Cluster or condition label as written in the input document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(value) => write!(f, "{}", value),
            Label::Text(value) => write!(f, "{}", value),
        }
    }
}

/// Distance matrix encodings accepted in the input document
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DistanceInput {
    /// Full N x N matrix, one array per row
    Square(Vec<Vec<f32>>),
    /// Upper triangle without the diagonal, row-major
    Condensed(Vec<f32>),
}

impl DistanceInput {
    pub fn into_matrix(self) -> crate::error::Result<DistanceMatrix> {
        match self {
            DistanceInput::Square(rows) => DistanceMatrix::from_rows(rows),
            DistanceInput::Condensed(values) => DistanceMatrix::from_condensed(&values),
        }
    }
}

/// Parsed analysis input: per-observation labels plus pairwise distances
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisInput {
    pub clusters: Vec<Label>,
    pub conditions: Vec<Label>,
    pub distances: DistanceInput,
}

impl AnalysisInput {
    /// Parse an input document from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse analysis input JSON")
    }

    /// Read and parse an input document from disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Invalid input document: {}", path.display()))
    }

    /// Split into label vectors and a validated distance matrix
    pub fn into_parts(self) -> Result<(Vec<Label>, Vec<Label>, DistanceMatrix)> {
        let matrix = self
            .distances
            .into_matrix()
            .context("Invalid distance matrix")?;
        Ok((self.clusters, self.conditions, matrix))
    }
}
