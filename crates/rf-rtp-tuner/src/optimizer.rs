//! Baseline optimizer: a single assign → resolve → synthesize pass

use crate::assign::{Assignment, assign_buckets};
use crate::config::{OptimizerConfig, TunerDefaults};
use crate::constraints::{apply_bucket_max_win_frequency, apply_global_max_win_frequency};
use crate::report::{OptimizationResult, bucket_report, loss_report, outcome_details};
use crate::resolve::{Resolution, resolve_targets};
use crate::synth::{balance_loss, synthesize_weights};
use crate::table::{OutcomeTable, rtp, total_weight};

/// Working state shared by the baseline and refinement paths
pub(crate) struct RunState<'a> {
    pub table: &'a OutcomeTable,
    pub payouts: Vec<f64>,
    pub assignment: Assignment,
    pub resolution: Resolution,
    pub target_rtp: f64,
    pub min_weight: u64,
    pub original_rtp: f64,
    pub warnings: Vec<String>,
}

impl<'a> RunState<'a> {
    /// Assign, resolve, synthesize, balance and clamp.
    ///
    /// Returns the state together with the initial weight vector.
    pub fn prepare(
        table: &'a OutcomeTable,
        config: &OptimizerConfig,
        defaults: &TunerDefaults,
    ) -> (Self, Vec<u64>) {
        let payouts = table.payouts();
        let raw_weights = table.raw_weights();
        let min_weight = config.effective_min_weight();

        let mut assignment = assign_buckets(&payouts, &config.buckets);
        let resolution = resolve_targets(&mut assignment, config.target_rtp);

        let mut state = Self {
            table,
            payouts,
            assignment,
            warnings: resolution.warnings.clone(),
            resolution,
            target_rtp: config.target_rtp,
            min_weight,
            original_rtp: table.original_rtp(),
        };

        if config.buckets.is_empty() {
            state.warn("No buckets configured; winning outcomes keep their current weights".into());
        }
        let empty: Vec<String> = state
            .assignment
            .buckets
            .iter()
            .filter(|b| b.is_empty())
            .map(|b| b.spec.name.clone())
            .collect();
        for name in empty {
            state.warn(format!("Bucket '{}' has no outcomes in its payout range", name));
        }

        let mut weights =
            synthesize_weights(&raw_weights, &state.assignment, defaults.base_weight, min_weight);
        if !state.rebalance_loss(&mut weights) {
            state.warn("Table has no loss outcomes; RTP cannot be balanced through loss".into());
        }

        if let Some(frequency) = config.global_max_win_frequency {
            apply_global_max_win_frequency(
                &mut weights,
                &state.payouts,
                &state.assignment.loss_indices,
                frequency,
                min_weight,
            );
        }
        for bucket in &state.assignment.buckets {
            if let Some(frequency) = bucket.spec.max_win_frequency {
                apply_bucket_max_win_frequency(&mut weights, bucket, frequency, min_weight);
            }
        }

        (state, weights)
    }

    pub fn warn(&mut self, msg: String) {
        log::warn!("{}", msg);
        self.warnings.push(msg);
    }

    pub fn rtp(&self, weights: &[u64]) -> f64 {
        rtp(weights, &self.payouts)
    }

    /// Re-solve the loss weight for the current winners; false if no loss outcomes
    pub fn rebalance_loss(&self, weights: &mut [u64]) -> bool {
        balance_loss(
            weights,
            &self.payouts,
            &self.assignment.loss_indices,
            self.target_rtp,
            self.min_weight,
        )
        .is_some()
    }

    /// Record why the final RTP misses the target, if it misses by more than `threshold`
    pub fn check_shortfall(&mut self, final_rtp: f64, threshold: f64) {
        let deviation = (final_rtp - self.target_rtp).abs();
        if deviation <= threshold {
            return;
        }
        let cause = if self.resolution.over_constrained(self.target_rtp) {
            "frequency/RTP-percent buckets demand more RTP than the target allows; \
             relax those constraints"
        } else if final_rtp < self.target_rtp {
            "not enough high-value outcomes to reach the target; \
             widen auto buckets or add higher payouts"
        } else {
            "winning weights exceed the target even at minimum loss weight; \
             loosen frequency constraints or add loss outcomes"
        };
        self.warn(format!(
            "Final RTP {:.4}% deviates from target {:.4}% by {:.3} pp: {}",
            final_rtp * 100.0,
            self.target_rtp * 100.0,
            deviation * 100.0,
            cause
        ));
    }

    pub fn finish(self, weights: Vec<u64>, converged: bool) -> OptimizationResult {
        let total = total_weight(&weights);
        let final_rtp = self.rtp(&weights);

        let bucket_reports = self
            .assignment
            .buckets
            .iter()
            .map(|b| bucket_report(b, &weights, &self.payouts, total, final_rtp))
            .collect();
        let loss_report = loss_report(
            &self.assignment.loss_indices,
            self.resolution.loss_probability,
            &weights,
            &self.payouts,
            total,
        );
        let outcome_details = outcome_details(self.table, &self.assignment, &weights, total);

        OptimizationResult {
            original_rtp: self.original_rtp,
            final_rtp,
            target_rtp: self.target_rtp,
            converged,
            weights,
            bucket_reports,
            loss_report,
            total_weight: total,
            warnings: self.warnings,
            outcome_details,
        }
    }
}

/// Single-pass bucket-constrained optimizer.
///
/// Good enough whenever the closed-form loss balance is not disturbed by
/// max-win clamps; otherwise use [`crate::refine::BruteForceOptimizer`].
#[derive(Debug, Clone, Default)]
pub struct WeightOptimizer {
    defaults: TunerDefaults,
}

impl WeightOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: TunerDefaults) -> Self {
        Self { defaults }
    }

    /// Optimize `table` for `config`. An empty table yields `None`.
    pub fn optimize(
        &self,
        table: &OutcomeTable,
        config: &OptimizerConfig,
    ) -> Option<OptimizationResult> {
        if table.is_empty() {
            log::info!("Empty outcome table, nothing to optimize");
            return None;
        }

        let tolerance = config.tolerance_or(self.defaults.baseline_tolerance);
        log::info!(
            "Optimizing {} outcomes across {} buckets (target RTP {:.4}%, tolerance {})",
            table.len(),
            config.buckets.len(),
            config.target_rtp * 100.0,
            tolerance
        );

        let (mut state, weights) = RunState::prepare(table, config, &self.defaults);
        let final_rtp = state.rtp(&weights);
        let converged = (final_rtp - state.target_rtp).abs() <= tolerance;
        state.check_shortfall(final_rtp, self.defaults.deviation_warning);

        log::info!(
            "Optimization done: RTP {:.4}% → {:.4}% (converged: {})",
            state.original_rtp * 100.0,
            final_rtp * 100.0,
            converged
        );
        Some(state.finish(weights, converged))
    }
}

/// Run the baseline optimizer with default numeric settings
pub fn optimize(table: &OutcomeTable, config: &OptimizerConfig) -> Option<OptimizationResult> {
    WeightOptimizer::new().optimize(table, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BucketSpec;

    fn table() -> OutcomeTable {
        OutcomeTable::from_pairs(&[(0.0, 1000), (1.0, 100), (3.0, 40), (20.0, 5), (80.0, 1)])
    }

    fn config() -> OptimizerConfig {
        OptimizerConfig::new(0.95)
            .with_bucket(BucketSpec::frequency("small", 0.0, 5.0, 4.0))
            .with_bucket(BucketSpec::auto("big", 5.0, 100.0, 1.0))
    }

    #[test]
    fn test_empty_table_is_none() {
        assert!(optimize(&OutcomeTable::default(), &config()).is_none());
    }

    #[test]
    fn test_baseline_converges() {
        let result = optimize(&table(), &config()).unwrap();
        assert!(result.converged);
        assert!(result.rtp_error() <= 0.001);
        assert_eq!(result.weights.len(), 5);
        assert_eq!(result.total_weight, result.weights.iter().sum::<u64>());
        assert!(result.loss_report.is_some());
    }

    #[test]
    fn test_input_not_mutated() {
        let t = table();
        let before = t.raw_weights();
        let result = optimize(&t, &config()).unwrap();
        assert_eq!(t.raw_weights(), before);
        assert_eq!(result.outcome_details[1].old_weight, 100);
    }

    #[test]
    fn test_original_rtp_reported() {
        let t = table();
        let result = optimize(&t, &config()).unwrap();
        assert!((result.original_rtp - t.original_rtp()).abs() < 1e-15);
    }

    #[test]
    fn test_empty_bucket_warning() {
        let config = config().with_bucket(BucketSpec::auto("huge", 100.0, 10_000.0, 1.0));
        let result = optimize(&table(), &config).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("'huge'")));
        assert_eq!(result.bucket("huge").unwrap().outcome_count, 0);
    }

    #[test]
    fn test_shortfall_warning_when_over_constrained() {
        // Every spin wins and there is no loss outcome to dilute it
        let t = OutcomeTable::from_pairs(&[(3.0, 10), (5.0, 10)]);
        let config = OptimizerConfig::new(0.9)
            .with_bucket(BucketSpec::frequency("hot", 0.0, 10.0, 1.0));
        let result = optimize(&t, &config).unwrap();
        assert!(!result.converged);
        assert!(result.warnings.iter().any(|w| w.contains("deviates")));
    }
}
