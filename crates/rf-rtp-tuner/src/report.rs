//! Optimization result payload

use serde::{Deserialize, Serialize};

use crate::assign::{Assignment, BucketAssignment};
use crate::error::TunerResult;
use crate::table::OutcomeTable;

/// Name used for the loss set in reports and outcome details
pub const LOSS_BUCKET_NAME: &str = "loss";

/// Name for winning outcomes that no bucket owns
pub const UNASSIGNED_BUCKET_NAME: &str = "unassigned";

/// Per-bucket statistics of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketReport {
    pub name: String,
    pub min_payout: f64,
    pub max_payout: f64,
    pub outcome_count: usize,
    pub target_probability: f64,
    pub actual_probability: f64,
    /// 1-in-N form of `target_probability` (0 when the probability is 0)
    pub target_frequency: f64,
    pub actual_frequency: f64,
    /// Share of the final RTP coming from this bucket, in percent
    pub rtp_contribution_percent: f64,
    pub total_weight: u64,
    pub avg_payout: f64,
}

/// Per-outcome line of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDetail {
    pub id: i64,
    pub payout: f64,
    pub old_weight: u64,
    pub new_weight: u64,
    pub bucket_name: String,
    pub probability: f64,
}

/// Final product of an optimization run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub original_rtp: f64,
    pub final_rtp: f64,
    pub target_rtp: f64,
    pub converged: bool,
    #[serde(rename = "new_weights")]
    pub weights: Vec<u64>,
    #[serde(rename = "bucket_results")]
    pub bucket_reports: Vec<BucketReport>,
    #[serde(rename = "loss_result")]
    pub loss_report: Option<BucketReport>,
    pub total_weight: u64,
    pub warnings: Vec<String>,
    pub outcome_details: Vec<OutcomeDetail>,
}

impl OptimizationResult {
    /// Absolute distance between final and target RTP
    pub fn rtp_error(&self) -> f64 {
        (self.final_rtp - self.target_rtp).abs()
    }

    /// Report for a bucket by name
    pub fn bucket(&self, name: &str) -> Option<&BucketReport> {
        self.bucket_reports.iter().find(|b| b.name == name)
    }

    pub fn to_json_pretty(&self) -> TunerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn frequency_of(probability: f64) -> f64 {
    if probability > 0.0 { 1.0 / probability } else { 0.0 }
}

fn ratio(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole } else { 0.0 }
}

/// Aggregate `(Σw, Σw·p)` over a set of outcome indices
fn member_sums(indices: &[usize], weights: &[u64], payouts: &[f64]) -> (u64, f64) {
    indices.iter().fold((0u64, 0.0), |(w, s), &i| {
        let p = payouts[i].max(0.0);
        (w.saturating_add(weights[i]), s + weights[i] as f64 * p)
    })
}

pub(crate) fn bucket_report(
    bucket: &BucketAssignment,
    weights: &[u64],
    payouts: &[f64],
    total: u64,
    final_rtp: f64,
) -> BucketReport {
    let (bucket_weight, weighted) = member_sums(&bucket.outcome_indices, weights, payouts);
    let total = total as f64;
    let actual_probability = ratio(bucket_weight as f64, total);
    let bucket_rtp = ratio(weighted, total);

    BucketReport {
        name: bucket.spec.name.clone(),
        min_payout: bucket.spec.min_payout,
        max_payout: bucket.spec.max_payout,
        outcome_count: bucket.len(),
        target_probability: bucket.target_probability,
        actual_probability,
        target_frequency: frequency_of(bucket.target_probability),
        actual_frequency: frequency_of(actual_probability),
        rtp_contribution_percent: ratio(bucket_rtp, final_rtp) * 100.0,
        total_weight: bucket_weight,
        avg_payout: bucket.avg_payout,
    }
}

pub(crate) fn loss_report(
    loss_indices: &[usize],
    loss_probability: f64,
    weights: &[u64],
    payouts: &[f64],
    total: u64,
) -> Option<BucketReport> {
    if loss_indices.is_empty() {
        return None;
    }
    let (loss_weight, _) = member_sums(loss_indices, weights, payouts);
    let actual_probability = ratio(loss_weight as f64, total as f64);

    Some(BucketReport {
        name: LOSS_BUCKET_NAME.to_string(),
        min_payout: 0.0,
        max_payout: 0.0,
        outcome_count: loss_indices.len(),
        target_probability: loss_probability,
        actual_probability,
        target_frequency: frequency_of(loss_probability),
        actual_frequency: frequency_of(actual_probability),
        rtp_contribution_percent: 0.0,
        total_weight: loss_weight,
        avg_payout: 0.0,
    })
}

pub(crate) fn outcome_details(
    table: &OutcomeTable,
    assignment: &Assignment,
    weights: &[u64],
    total: u64,
) -> Vec<OutcomeDetail> {
    let owners = assignment.owner_map(table.len());
    table
        .outcomes
        .iter()
        .zip(weights)
        .zip(owners)
        .map(|((outcome, &new_weight), owner)| {
            let bucket_name = match owner {
                Some(b) => assignment.buckets[b].spec.name.clone(),
                None if outcome.is_loss() => LOSS_BUCKET_NAME.to_string(),
                None => UNASSIGNED_BUCKET_NAME.to_string(),
            };
            OutcomeDetail {
                id: outcome.id,
                payout: outcome.payout,
                old_weight: outcome.raw_weight,
                new_weight,
                bucket_name,
                probability: ratio(new_weight as f64, total as f64),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::assign_buckets;
    use crate::config::BucketSpec;

    #[test]
    fn test_bucket_report_numbers() {
        let specs = vec![BucketSpec::frequency("small", 0.0, 10.0, 4.0)];
        let payouts = [0.0, 2.0];
        let mut a = assign_buckets(&payouts, &specs);
        a.buckets[0].target_probability = 0.25;
        let weights = [3, 1];
        // rtp = 2/4 = 0.5, all of it from "small"
        let report = bucket_report(&a.buckets[0], &weights, &payouts, 4, 0.5);

        assert_eq!(report.total_weight, 1);
        assert!((report.actual_probability - 0.25).abs() < 1e-12);
        assert!((report.actual_frequency - 4.0).abs() < 1e-12);
        assert!((report.target_frequency - 4.0).abs() < 1e-12);
        assert!((report.rtp_contribution_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_loss_report_absent_without_losses() {
        assert!(loss_report(&[], 0.5, &[1], &[1.0], 1).is_none());
        let report = loss_report(&[0], 0.75, &[3, 1], &[0.0, 2.0], 4).unwrap();
        assert_eq!(report.name, LOSS_BUCKET_NAME);
        assert!((report.actual_probability - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_outcome_detail_names() {
        let table = OutcomeTable::from_pairs(&[(0.0, 5), (2.0, 1)]);
        let specs = vec![BucketSpec::auto("win", 0.0, 10.0, 1.0)];
        let a = assign_buckets(&table.payouts(), &specs);
        let details = outcome_details(&table, &a, &[6, 2], 8);

        assert_eq!(details[0].bucket_name, "loss");
        assert_eq!(details[1].bucket_name, "win");
        assert_eq!(details[1].old_weight, 1);
        assert!((details[1].probability - 0.25).abs() < 1e-12);

        let bare = assign_buckets(&table.payouts(), &[]);
        let details = outcome_details(&table, &bare, &[6, 2], 8);
        assert_eq!(details[1].bucket_name, "unassigned");
    }

    #[test]
    fn test_result_wire_names() {
        let result = OptimizationResult {
            original_rtp: 0.9,
            final_rtp: 0.96,
            target_rtp: 0.96,
            converged: true,
            weights: vec![1, 2],
            bucket_reports: Vec::new(),
            loss_report: None,
            total_weight: 3,
            warnings: Vec::new(),
            outcome_details: Vec::new(),
        };
        let json = result.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["new_weights"], serde_json::json!([1, 2]));
        assert!(value["loss_result"].is_null());
        assert!(value["bucket_results"].is_array());
        assert!(value["outcome_details"].is_array());
    }
}
