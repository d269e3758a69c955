// Heterogeneity Engine: per-cluster permutation test on a distance matrix
//
// For every cluster, the observed statistic is the aggregate distance
// between the cluster's condition-A and condition-B members. Condition labels
// are then shuffled within the cluster (group sizes fixed) to build a null
// distribution, from which the z-score, two-tailed p-value and IQR call are
// read.
//
// Contract violations fail before any cluster is touched. Degenerate
// clusters produce a sentinel record and never abort the batch.
//
// Clusters are independent. Each one draws from its own StdRng seeded with
// `base_seed + cluster_position`, so parallel and sequential runs agree.

mod config;
mod labels;
mod permutation;
mod table;

pub use config::{CrossStatistic, HeterogeneityConfig};
pub use table::ResultTable;

use crate::error::{HeterogeneityError, Result};
use crate::matrix::DistanceMatrix;
use labels::{condition_ratio, group_clusters, resolve_conditions, ClusterGroup};
use permutation::{null_distribution, ClusterView, NullSummary};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Coarse IQR-based heterogeneity call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IqrCall {
    /// Observed statistic inside the null's Tukey fences
    Same,
    /// Observed statistic outside the null's Tukey fences
    Diff,
}

impl fmt::Display for IqrCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IqrCall::Same => write!(f, "Same"),
            IqrCall::Diff => write!(f, "Diff"),
        }
    }
}

/// How a cluster was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStatus {
    /// Permutation test ran
    Tested,
    /// Fewer than two observations in the cluster
    TooFewObservations,
    /// Every observation in the cluster carries the same condition
    SingleCondition,
}

impl ClusterStatus {
    /// True for every status that skips the permutation test
    pub fn is_degenerate(&self) -> bool {
        !matches!(self, ClusterStatus::Tested)
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterStatus::Tested => write!(f, "tested"),
            ClusterStatus::TooFewObservations => write!(f, "too few observations"),
            ClusterStatus::SingleCondition => write!(f, "single condition"),
        }
    }
}

/// Heterogeneity result for one cluster
///
/// Degenerate clusters carry `NaN` in every statistic field and no IQR call.
/// A tested cluster whose null distribution has zero spread reports a `NaN`
/// z-score unless the observed statistic coincides with the null centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterHeterogeneity<C> {
    /// Cluster identifier
    pub cluster: C,

    /// Observations carrying condition A
    pub count_a: usize,

    /// Observations carrying condition B
    pub count_b: usize,

    /// min(count_a, count_b) / max(count_a, count_b); 0 when a side is empty
    pub ratio: f32,

    /// Observed cross-condition statistic
    pub observed: f32,

    /// Mean of the permutation null distribution
    pub null_mean: f32,

    /// Population standard deviation of the permutation null distribution
    pub null_sd: f32,

    /// (observed - null_mean) / null_sd
    pub z_score: f32,

    /// Two-tailed permutation p-value, uncorrected
    pub p_value: f32,

    /// IQR call; `None` for degenerate clusters
    pub call: Option<IqrCall>,

    pub status: ClusterStatus,
}

impl<C> ClusterHeterogeneity<C> {
    fn degenerate(cluster: C, count_a: usize, count_b: usize, status: ClusterStatus) -> Self {
        Self {
            cluster,
            count_a,
            count_b,
            ratio: condition_ratio(count_a, count_b),
            observed: f32::NAN,
            null_mean: f32::NAN,
            null_sd: f32::NAN,
            z_score: f32::NAN,
            p_value: f32::NAN,
            call: None,
            status,
        }
    }

    /// Total observations in the cluster
    pub fn size(&self) -> usize {
        self.count_a + self.count_b
    }

    /// True when the record carries sentinel values instead of statistics
    pub fn is_degenerate(&self) -> bool {
        self.status.is_degenerate()
    }
}

/// Permutation-test engine over a fixed configuration
///
/// # Example
/// ```
/// use clusterhet::{DistanceMatrix, HeterogeneityConfig, HeterogeneityEngine};
///
/// let d = DistanceMatrix::from_rows(vec![
///     vec![0.0, 1.0, 5.0, 5.0],
///     vec![1.0, 0.0, 5.0, 5.0],
///     vec![5.0, 5.0, 0.0, 1.0],
///     vec![5.0, 5.0, 1.0, 0.0],
/// ])
/// .unwrap();
///
/// let engine = HeterogeneityEngine::new(HeterogeneityConfig::default().with_seed(1));
/// let table = engine
///     .analyze(&["c1"; 4], &["ctrl", "ctrl", "drug", "drug"], &d)
///     .unwrap();
///
/// assert_eq!(table.records.len(), 1);
/// assert_eq!(table.records[0].ratio, 1.0);
/// assert!(table.records[0].z_score > 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HeterogeneityEngine {
    config: HeterogeneityConfig,
}

impl HeterogeneityEngine {
    pub fn new(config: HeterogeneityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HeterogeneityConfig {
        &self.config
    }

    /// Run the per-cluster test for every cluster, in first-appearance order
    ///
    /// # Errors
    /// Fails before any cluster is processed when the configuration is
    /// invalid, the label vectors and matrix disagree in length, the condition
    /// labels do not take exactly two values, or the random source fails.
    pub fn analyze<C, K>(
        &self,
        clusters: &[C],
        conditions: &[K],
        distances: &DistanceMatrix,
    ) -> Result<ResultTable<C, K>>
    where
        C: Clone + Eq + Hash + Send + Sync,
        K: Clone + Eq + Hash,
    {
        self.config.validate()?;

        if clusters.len() != conditions.len() {
            return Err(HeterogeneityError::LabelLengthMismatch {
                clusters: clusters.len(),
                conditions: conditions.len(),
            });
        }
        if distances.len() != clusters.len() {
            return Err(HeterogeneityError::DimensionMismatch {
                matrix: distances.len(),
                labels: clusters.len(),
            });
        }

        let (condition_a, condition_b) = resolve_conditions(conditions)?;
        let in_a: Vec<bool> = conditions.iter().map(|k| *k == condition_a).collect();
        let groups = group_clusters(clusters);

        let seed = match self.config.seed {
            Some(seed) => seed,
            None => entropy_seed()?,
        };

        tracing::info!(
            observations = clusters.len(),
            clusters = groups.len(),
            resamples = self.config.resample_count,
            seed,
            statistic = %self.config.statistic,
            "Starting heterogeneity analysis"
        );

        let run = |(position, group): (usize, &ClusterGroup<C>)| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(position as u64));
            self.test_cluster(group, &in_a, distances, &mut rng)
        };

        let records = if self.config.parallel {
            groups
                .par_iter()
                .enumerate()
                .map(run)
                .collect::<Result<Vec<_>>>()?
        } else {
            groups
                .iter()
                .enumerate()
                .map(run)
                .collect::<Result<Vec<_>>>()?
        };

        let degenerate = records.iter().filter(|r| r.is_degenerate()).count();
        tracing::info!(
            tested = records.len() - degenerate,
            degenerate,
            "Heterogeneity analysis complete"
        );

        Ok(ResultTable {
            condition_a,
            condition_b,
            resample_count: self.config.resample_count,
            seed,
            statistic: self.config.statistic,
            iqr_multiplier: self.config.iqr_multiplier,
            records,
        })
    }

    /// Permutation test for one cluster
    fn test_cluster<C: Clone>(
        &self,
        group: &ClusterGroup<C>,
        in_a: &[bool],
        distances: &DistanceMatrix,
        rng: &mut StdRng,
    ) -> Result<ClusterHeterogeneity<C>> {
        let members = &group.members;
        let (side_a, side_b): (Vec<usize>, Vec<usize>) =
            (0..members.len()).partition(|&p| in_a[members[p]]);
        let (count_a, count_b) = (side_a.len(), side_b.len());

        let status = if members.len() < 2 {
            ClusterStatus::TooFewObservations
        } else if count_a == 0 || count_b == 0 {
            ClusterStatus::SingleCondition
        } else {
            ClusterStatus::Tested
        };
        if status.is_degenerate() {
            tracing::warn!(
                count_a,
                count_b,
                status = %status,
                "Degenerate cluster, reporting sentinel result"
            );
            return Ok(ClusterHeterogeneity::degenerate(
                group.label.clone(),
                count_a,
                count_b,
                status,
            ));
        }

        // Permute the smaller side; ties keep condition A
        let (smaller, larger) = if count_a <= count_b {
            (&side_a, &side_b)
        } else {
            (&side_b, &side_a)
        };

        let statistic = self.config.statistic;
        let view = ClusterView::new(distances, members);
        let observed = view.statistic(statistic, smaller, larger)?;
        let null = null_distribution(
            &view,
            statistic,
            smaller.len(),
            self.config.resample_count,
            rng,
        )?;
        let summary = NullSummary::from_samples(&null)?;

        let z_score = summary.z_score(observed);
        let p_value = summary.p_value(observed, &null);
        let call = summary.iqr_call(observed, self.config.iqr_multiplier);

        tracing::debug!(
            count_a,
            count_b,
            observed,
            null_mean = summary.mean,
            null_sd = summary.sd,
            z_score,
            p_value,
            call = %call,
            "Cluster tested"
        );

        Ok(ClusterHeterogeneity {
            cluster: group.label.clone(),
            count_a,
            count_b,
            ratio: condition_ratio(count_a, count_b),
            observed,
            null_mean: summary.mean,
            null_sd: summary.sd,
            z_score,
            p_value,
            call: Some(call),
            status,
        })
    }
}

/// Run the heterogeneity analysis with default settings
///
/// `seed = None` draws the base seed from the operating system; the seed
/// used is recorded in [`ResultTable::seed`].
///
/// # Example
/// ```
/// use clusterhet::{analyze, DistanceMatrix};
///
/// let d = DistanceMatrix::from_condensed(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
/// let table = analyze(&[1, 1, 2, 2], &['a', 'b', 'a', 'a'], &d, 100, Some(3)).unwrap();
///
/// assert_eq!(table.records.len(), 2);
/// assert!(table.records[1].is_degenerate());
/// ```
pub fn analyze<C, K>(
    clusters: &[C],
    conditions: &[K],
    distances: &DistanceMatrix,
    resample_count: usize,
    seed: Option<u64>,
) -> Result<ResultTable<C, K>>
where
    C: Clone + Eq + Hash + Send + Sync,
    K: Clone + Eq + Hash,
{
    let config = HeterogeneityConfig {
        resample_count,
        seed,
        ..HeterogeneityConfig::default()
    };
    HeterogeneityEngine::new(config).analyze(clusters, conditions, distances)
}

/// Fresh base seed from the operating system's entropy source
fn entropy_seed() -> Result<u64> {
    let mut bytes = [0u8; 8];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| HeterogeneityError::RandomSource(e.to_string()))?;
    Ok(u64::from_le_bytes(bytes))
}
