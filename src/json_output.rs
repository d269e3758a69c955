//! JSON export of heterogeneity results
//!
//! Non-finite statistics (degenerate clusters, undefined z-scores) are
//! written as `null`.

use crate::engine::ResultTable;
use serde::Serialize;

/// JSON document wrapping a result table
#[derive(Debug, Serialize)]
pub struct JsonReport<'a, C, K> {
    /// Format version identifier
    pub version: String,
    /// Clusters that went through the permutation test
    pub tested: usize,
    /// Clusters reported with sentinel values
    pub degenerate: usize,
    #[serde(flatten)]
    pub table: &'a ResultTable<C, K>,
}

impl<'a, C: Serialize, K: Serialize> JsonReport<'a, C, K> {
    pub fn new(table: &'a ResultTable<C, K>) -> Self {
        let degenerate = table.degenerate_count();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            tested: table.len() - degenerate,
            degenerate,
            table,
        }
    }

    /// Serialize to pretty JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ClusterHeterogeneity, ClusterStatus, CrossStatistic, IqrCall};
    use serde_json::Value;

    fn table() -> ResultTable<u32, &'static str> {
        ResultTable {
            condition_a: "young",
            condition_b: "old",
            resample_count: 500,
            seed: 3,
            statistic: CrossStatistic::Median,
            iqr_multiplier: 1.5,
            records: vec![
                ClusterHeterogeneity {
                    cluster: 0,
                    count_a: 8,
                    count_b: 8,
                    ratio: 1.0,
                    observed: 1.5,
                    null_mean: 1.0,
                    null_sd: 0.5,
                    z_score: 1.0,
                    p_value: 0.25,
                    call: Some(IqrCall::Same),
                    status: ClusterStatus::Tested,
                },
                ClusterHeterogeneity {
                    cluster: 7,
                    count_a: 1,
                    count_b: 0,
                    ratio: 0.0,
                    observed: f32::NAN,
                    null_mean: f32::NAN,
                    null_sd: f32::NAN,
                    z_score: f32::NAN,
                    p_value: f32::NAN,
                    call: None,
                    status: ClusterStatus::TooFewObservations,
                },
            ],
        }
    }

    #[test]
    fn test_json_structure() {
        let table = table();
        let json = JsonReport::new(&table).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(value["tested"], 1);
        assert_eq!(value["degenerate"], 1);
        assert_eq!(value["condition_a"], "young");
        assert_eq!(value["condition_b"], "old");
        assert_eq!(value["statistic"], "median");
        assert_eq!(value["seed"], 3);
        assert_eq!(value["records"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_json_records() {
        let table = table();
        let value: Value =
            serde_json::from_str(&JsonReport::new(&table).to_json().unwrap()).unwrap();

        let tested = &value["records"][0];
        assert_eq!(tested["cluster"], 0);
        assert_eq!(tested["z_score"], 1.0);
        assert_eq!(tested["call"], "Same");
        assert_eq!(tested["status"], "tested");

        let degenerate = &value["records"][1];
        assert!(degenerate["z_score"].is_null());
        assert!(degenerate["p_value"].is_null());
        assert!(degenerate["call"].is_null());
        assert_eq!(degenerate["status"], "too_few_observations");
    }
}
