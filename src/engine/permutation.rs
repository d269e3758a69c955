// Permutation null distribution for one cluster
//
// Resampling keeps the cluster's membership and group sizes fixed and only
// reassigns which members form the smaller condition side. A partial
// Fisher-Yates shuffle picks that side uniformly over all subsets of the
// required size; the remaining members form the other side.
//
// The null is summarised with trueno (mean, population standard deviation)
// and aprender's DescriptiveStats (R-7 quartiles).

use crate::engine::config::CrossStatistic;
use crate::engine::IqrCall;
use crate::error::{HeterogeneityError, Result};
use crate::matrix::DistanceMatrix;
use aprender::stats::DescriptiveStats;
use rand::seq::SliceRandom;
use rand::Rng;
use trueno::Vector;

/// Tolerance for zero-spread detection and tie counting, relative to the
/// null mean so results do not depend on the units of the distances
const RELATIVE_TOLERANCE: f32 = 1e-5;

/// Read-only view of one cluster inside the shared distance matrix
///
/// Members are addressed by local position `0..m`.
pub(crate) struct ClusterView<'a> {
    matrix: &'a DistanceMatrix,
    members: &'a [usize],
    /// Sum of distances from each member to every member of the cluster
    row_sums: Vec<f64>,
}

impl<'a> ClusterView<'a> {
    pub fn new(matrix: &'a DistanceMatrix, members: &'a [usize]) -> Self {
        let row_sums = members
            .iter()
            .map(|&i| {
                let row = matrix.row(i);
                members.iter().map(|&j| row[j] as f64).sum()
            })
            .collect();

        Self {
            matrix,
            members,
            row_sums,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    fn distance(&self, p: usize, q: usize) -> f32 {
        self.matrix.get(self.members[p], self.members[q])
    }

    /// Test statistic for the split `group | other` (local positions)
    pub fn statistic(&self, kind: CrossStatistic, group: &[usize], other: &[usize]) -> Result<f32> {
        match kind {
            CrossStatistic::Mean => Ok(self.cross_mean(group)),
            CrossStatistic::Median => self.cross_median(group, other),
        }
    }

    /// Mean (group, other) distance in O(|group|^2)
    ///
    /// Cross sum = sum of the group's row sums minus twice the within-group
    /// sum, so only the smaller side needs to be walked.
    fn cross_mean(&self, group: &[usize]) -> f32 {
        let other_len = self.len() - group.len();
        let pairs = group.len() * other_len;
        if pairs == 0 {
            return f32::NAN;
        }

        let row_total: f64 = group.iter().map(|&p| self.row_sums[p]).sum();
        let mut within = 0.0f64;
        for (k, &p) in group.iter().enumerate() {
            for &q in &group[k + 1..] {
                within += self.distance(p, q) as f64;
            }
        }

        ((row_total - 2.0 * within) / pairs as f64) as f32
    }

    fn cross_median(&self, group: &[usize], other: &[usize]) -> Result<f32> {
        let cross: Vec<f32> = group
            .iter()
            .flat_map(|&p| other.iter().map(move |&q| self.distance(p, q)))
            .collect();
        if cross.is_empty() {
            return Ok(f32::NAN);
        }
        DescriptiveStats::new(&Vector::from_slice(&cross))
            .quantile(0.5)
            .map_err(|e| HeterogeneityError::Statistics(format!("cross median: {}", e)))
    }
}

/// Draw `resamples` permuted statistics with the smaller side of size `group_size`
pub(crate) fn null_distribution<R: Rng + ?Sized>(
    view: &ClusterView<'_>,
    kind: CrossStatistic,
    group_size: usize,
    resamples: usize,
    rng: &mut R,
) -> Result<Vec<f32>> {
    let mut positions: Vec<usize> = (0..view.len()).collect();
    let mut null = Vec::with_capacity(resamples);

    for _ in 0..resamples {
        let (group, other) = positions.partial_shuffle(rng, group_size);
        null.push(view.statistic(kind, group, other)?);
    }

    Ok(null)
}

/// Location, spread and quartiles of a permutation null distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NullSummary {
    pub mean: f32,
    pub sd: f32,
    pub q1: f32,
    pub q3: f32,
}

impl NullSummary {
    pub fn from_samples(samples: &[f32]) -> Result<Self> {
        let vector = Vector::from_slice(samples);
        let mean = vector
            .mean()
            .map_err(|e| HeterogeneityError::Statistics(format!("null mean: {}", e)))?;
        let sd = vector
            .stddev()
            .map_err(|e| HeterogeneityError::Statistics(format!("null spread: {}", e)))?;

        let stats = DescriptiveStats::new(&vector);
        let q1 = stats
            .quantile(0.25)
            .map_err(|e| HeterogeneityError::Statistics(format!("null Q1: {}", e)))?;
        let q3 = stats
            .quantile(0.75)
            .map_err(|e| HeterogeneityError::Statistics(format!("null Q3: {}", e)))?;

        Ok(Self { mean, sd, q1, q3 })
    }

    fn tolerance(&self) -> f32 {
        RELATIVE_TOLERANCE * self.mean.abs()
    }

    /// A null whose spread is indistinguishable from zero
    pub fn is_degenerate(&self) -> bool {
        self.sd <= self.tolerance()
    }

    /// Standardised deviation of `observed` from the null
    ///
    /// On a zero-spread null the score is 0 when `observed` sits on the null
    /// centre and `NaN` (undefined) otherwise.
    pub fn z_score(&self, observed: f32) -> f32 {
        let deviation = observed - self.mean;
        if self.is_degenerate() {
            if deviation.abs() <= self.tolerance() {
                0.0
            } else {
                f32::NAN
            }
        } else {
            deviation / self.sd
        }
    }

    /// Two-tailed permutation p-value, floored at `1 / samples.len()`
    pub fn p_value(&self, observed: f32, samples: &[f32]) -> f32 {
        let threshold = (observed - self.mean).abs() - self.tolerance();
        let extreme = samples
            .iter()
            .filter(|&&s| (s - self.mean).abs() >= threshold)
            .count();
        extreme.max(1) as f32 / samples.len() as f32
    }

    /// `Same` inside `[Q1 - k*IQR, Q3 + k*IQR]`, `Diff` outside
    pub fn iqr_call(&self, observed: f32, multiplier: f32) -> IqrCall {
        let iqr = self.q3 - self.q1;
        let lower = self.q1 - multiplier * iqr - self.tolerance();
        let upper = self.q3 + multiplier * iqr + self.tolerance();
        if (lower..=upper).contains(&observed) {
            IqrCall::Same
        } else {
            IqrCall::Diff
        }
    }
}
