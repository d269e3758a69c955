//! CSV export of heterogeneity results
//!
//! One row per cluster, in result-table order. Undefined statistics
//! (degenerate clusters, undefined z-scores) are written as `NA`.

use crate::engine::{ClusterHeterogeneity, ResultTable};
use std::fmt::Display;

const HEADER: [&str; 11] = [
    "cluster",
    "count_a",
    "count_b",
    "ratio",
    "observed",
    "null_mean",
    "null_sd",
    "z_score",
    "p_value",
    "call",
    "status",
];

/// CSV output formatter
#[derive(Debug)]
pub struct CsvOutput {
    rows: Vec<Vec<String>>,
}

impl CsvOutput {
    /// Build a formatter holding one row per cluster record
    pub fn from_table<C: Display, K>(table: &ResultTable<C, K>) -> Self {
        Self {
            rows: table.iter().map(Self::format_record).collect(),
        }
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn format_number(value: f32) -> String {
        if value.is_finite() {
            value.to_string()
        } else {
            "NA".to_string()
        }
    }

    fn format_record<C: Display>(record: &ClusterHeterogeneity<C>) -> Vec<String> {
        vec![
            Self::escape_field(&record.cluster.to_string()),
            record.count_a.to_string(),
            record.count_b.to_string(),
            Self::format_number(record.ratio),
            Self::format_number(record.observed),
            Self::format_number(record.null_mean),
            Self::format_number(record.null_sd),
            Self::format_number(record.z_score),
            Self::format_number(record.p_value),
            record
                .call
                .map(|c| c.to_string())
                .unwrap_or_else(|| "NA".to_string()),
            record.status.to_string().replace(' ', "_"),
        ]
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(&HEADER.join(","));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&row.join(","));
            output.push('\n');
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ClusterStatus, CrossStatistic, IqrCall};

    fn table() -> ResultTable<String, String> {
        ResultTable {
            condition_a: "ctrl".to_string(),
            condition_b: "stim".to_string(),
            resample_count: 1000,
            seed: 1,
            statistic: CrossStatistic::Mean,
            iqr_multiplier: 1.5,
            records: vec![
                ClusterHeterogeneity {
                    cluster: "CD4, naive".to_string(),
                    count_a: 10,
                    count_b: 5,
                    ratio: 0.5,
                    observed: 2.5,
                    null_mean: 2.0,
                    null_sd: 0.25,
                    z_score: 2.0,
                    p_value: 0.04,
                    call: Some(IqrCall::Diff),
                    status: ClusterStatus::Tested,
                },
                ClusterHeterogeneity {
                    cluster: "Mk".to_string(),
                    count_a: 3,
                    count_b: 0,
                    ratio: 0.0,
                    observed: f32::NAN,
                    null_mean: f32::NAN,
                    null_sd: f32::NAN,
                    z_score: f32::NAN,
                    p_value: f32::NAN,
                    call: None,
                    status: ClusterStatus::SingleCondition,
                },
            ],
        }
    }

    #[test]
    fn test_csv_header() {
        let csv = CsvOutput::from_table(&table()).to_csv();
        let header = csv.lines().next().unwrap();
        assert_eq!(
            header,
            "cluster,count_a,count_b,ratio,observed,null_mean,null_sd,z_score,p_value,call,status"
        );
    }

    #[test]
    fn test_csv_tested_row_with_escaping() {
        let csv = CsvOutput::from_table(&table()).to_csv();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "\"CD4, naive\",10,5,0.5,2.5,2,0.25,2,0.04,Diff,tested");
    }

    #[test]
    fn test_csv_degenerate_row_uses_na() {
        let csv = CsvOutput::from_table(&table()).to_csv();
        let row = csv.lines().nth(2).unwrap();
        assert_eq!(row, "Mk,3,0,0,NA,NA,NA,NA,NA,NA,single_condition");
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(CsvOutput::escape_field("plain"), "plain");
        assert_eq!(CsvOutput::escape_field("a\"b"), "\"a\"\"b\"");
        assert_eq!(CsvOutput::escape_field("a\nb"), "\"a\nb\"");
    }
}
