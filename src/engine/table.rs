// Result table: ordered per-cluster records plus run metadata

use crate::engine::config::CrossStatistic;
use crate::engine::{ClusterHeterogeneity, IqrCall};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Ordered heterogeneity results, one record per cluster in first-appearance order
///
/// The p-value column is raw; apply multiple-testing correction downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable<C, K> {
    /// First condition value to appear in the condition labels
    pub condition_a: K,

    /// Second condition value to appear in the condition labels
    pub condition_b: K,

    /// Permutations drawn per cluster
    pub resample_count: usize,

    /// Base seed of the per-cluster random streams (rerun with it to reproduce)
    pub seed: u64,

    pub statistic: CrossStatistic,

    pub iqr_multiplier: f32,

    pub records: Vec<ClusterHeterogeneity<C>>,
}

impl<C, K> ResultTable<C, K> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClusterHeterogeneity<C>> {
        self.records.iter()
    }

    /// Record for `cluster`, if present
    pub fn get(&self, cluster: &C) -> Option<&ClusterHeterogeneity<C>>
    where
        C: PartialEq,
    {
        self.records.iter().find(|r| &r.cluster == cluster)
    }

    /// Tested clusters with raw `p_value < alpha`
    pub fn significant(&self, alpha: f32) -> impl Iterator<Item = &ClusterHeterogeneity<C>> {
        self.records
            .iter()
            .filter(move |r| !r.is_degenerate() && r.p_value < alpha)
    }

    /// Clusters whose IQR call is `Diff`
    pub fn diff_clusters(&self) -> impl Iterator<Item = &ClusterHeterogeneity<C>> {
        self.records
            .iter()
            .filter(|r| r.call == Some(IqrCall::Diff))
    }

    /// Count of clusters that produced a sentinel record
    pub fn degenerate_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_degenerate()).count()
    }
}

impl<C: Display, K: Display> ResultTable<C, K> {
    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!(
            "📊 Condition heterogeneity: {} vs {}\n",
            self.condition_a, self.condition_b
        ));
        report.push_str(&format!(
            "Statistic: cross-condition {} distance | resamples: {} | IQR k: {} | seed: {}\n\n",
            self.statistic, self.resample_count, self.iqr_multiplier, self.seed
        ));

        report.push_str(&format!(
            "{:<16} {:>7} {:>7} {:>7} {:>9} {:>9} {:>5}\n",
            "cluster", "n_a", "n_b", "ratio", "z", "p", "call"
        ));
        report.push_str(&format!("{}\n", "─".repeat(66)));

        for record in &self.records {
            let call = record
                .call
                .map(|c| c.to_string())
                .unwrap_or_else(|| "NA".to_string());
            report.push_str(&format!(
                "{:<16} {:>7} {:>7} {:>7.3} {:>9.3} {:>9.4} {:>5}\n",
                record.cluster.to_string(),
                record.count_a,
                record.count_b,
                record.ratio,
                record.z_score,
                record.p_value,
                call
            ));
        }

        let degenerate: Vec<String> = self
            .records
            .iter()
            .filter(|r| r.is_degenerate())
            .map(|r| format!("{} ({})", r.cluster, r.status))
            .collect();
        if !degenerate.is_empty() {
            report.push_str(&format!(
                "\n⚠️  Untestable clusters ({}): {}\n",
                degenerate.len(),
                degenerate.join(", ")
            ));
        }

        report.push_str("\np-values are uncorrected; apply multiple-testing correction downstream.\n");
        report
    }
}
