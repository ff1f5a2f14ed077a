//! Iterative Refinement Engine (brute-force path)
//!
//! ```text
//! Init ──(within tolerance)──────────────────────────► Converged
//!   │
//!   └─► Refining ──┬─ rebalance loss, track best ──► Converged
//!        ▲         ├─ budget spent ────────────────► Exhausted
//!        │         └─ cancel token set ────────────► Cancelled
//!        └── every Nth iteration: rescale dominant bucket
//! ```
//!
//! Whatever the exit, the weights returned are the best candidate seen,
//! never the last iterate.

use std::time::Instant;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::config::{OptimizerConfig, TunerDefaults};
use crate::error::{TunerError, TunerResult};
use crate::optimizer::RunState;
use crate::progress::{CancelToken, ProgressEvent, ProgressPhase, ProgressReporter};
use crate::report::OptimizationResult;
use crate::table::OutcomeTable;

/// Refinement state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefineState {
    Init,
    Refining,
    Converged,
    Exhausted,
    Cancelled,
}

impl RefineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RefineState::Converged | RefineState::Exhausted | RefineState::Cancelled
        )
    }
}

/// Scratch weight vector with its realized RTP
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub weights: Vec<u64>,
    pub realized_rtp: f64,
    pub absolute_error: f64,
}

impl Candidate {
    fn evaluate(state: &RunState<'_>, weights: Vec<u64>) -> Self {
        let realized_rtp = state.rtp(&weights);
        Self {
            absolute_error: (realized_rtp - state.target_rtp).abs(),
            weights,
            realized_rtp,
        }
    }

    /// Adopt `weights` if they beat this candidate; clones only on improvement
    fn offer(&mut self, state: &RunState<'_>, weights: &[u64]) -> (f64, f64) {
        let realized_rtp = state.rtp(weights);
        let absolute_error = (realized_rtp - state.target_rtp).abs();
        if absolute_error < self.absolute_error {
            *self = Self {
                weights: weights.to_vec(),
                realized_rtp,
                absolute_error,
            };
        }
        (realized_rtp, absolute_error)
    }
}

/// Result of the brute-force path: the plain result plus search diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BruteForceResult {
    #[serde(flatten)]
    pub result: OptimizationResult,
    pub iterations: u64,
    pub search_duration_ms: u64,
    pub final_error: f64,
    pub stop_reason: RefineState,
}

/// Cancellable, progress-reporting refinement optimizer
#[derive(Debug, Clone, Default)]
pub struct BruteForceOptimizer {
    defaults: TunerDefaults,
    progress: ProgressReporter,
    cancel: CancelToken,
}

impl BruteForceOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self, defaults: TunerDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Send progress events to `tx` (best-effort)
    pub fn with_progress(mut self, tx: Sender<ProgressEvent>) -> Self {
        self.progress = ProgressReporter::new(tx);
        self
    }

    /// Poll `token` once per iteration
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels runs of this optimizer
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Refine weights for `table` until converged, out of budget or cancelled
    pub fn run(
        &self,
        table: &OutcomeTable,
        config: &OptimizerConfig,
    ) -> TunerResult<BruteForceResult> {
        if table.is_empty() {
            return Err(TunerError::EmptyTable);
        }

        let start = Instant::now();
        let defaults = &self.defaults;
        let tolerance = config.tolerance_or(defaults.refine_tolerance);
        let max_iterations = config.iteration_budget(defaults);
        let mut progress = self.progress.clone();

        log::info!(
            "Refining {} outcomes: target RTP {:.4}%, tolerance {}, budget {} iterations",
            table.len(),
            config.target_rtp * 100.0,
            tolerance,
            max_iterations
        );

        let (mut state, initial) = RunState::prepare(table, config, defaults);
        let mut current = initial.clone();
        let mut best = Candidate::evaluate(&state, initial);

        let event = |phase, iteration, current_rtp: f64, error: f64| ProgressEvent {
            phase,
            iteration,
            max_iterations,
            current_rtp,
            target_rtp: config.target_rtp,
            error,
            converged: error <= tolerance,
        };

        progress.emit(event(ProgressPhase::Init, 0, best.realized_rtp, best.absolute_error));
        let mut phase = if best.absolute_error <= tolerance {
            RefineState::Converged
        } else {
            RefineState::Refining
        };
        log::debug!(
            "{:?} → {:?}: initial RTP {:.6} (error {:.6})",
            RefineState::Init,
            phase,
            best.realized_rtp,
            best.absolute_error
        );

        let mut iterations = 0u64;
        while phase == RefineState::Refining {
            if iterations >= max_iterations {
                phase = RefineState::Exhausted;
                break;
            }
            if self.cancel.is_cancelled() {
                log::info!("Refinement cancelled after {} iterations", iterations);
                phase = RefineState::Cancelled;
                break;
            }
            iterations += 1;

            state.rebalance_loss(&mut current);
            let (rtp, error) = best.offer(&state, &current);
            let converged = error <= tolerance;
            if iterations % defaults.progress_interval.max(1) == 0 || converged {
                progress.emit(event(ProgressPhase::Refine, iterations, rtp, error));
            }

            if converged {
                phase = RefineState::Converged;
                break;
            }

            if iterations % defaults.fine_tune_interval.max(1) == 0
                && fine_tune(&state, &mut current, defaults)
            {
                best.offer(&state, &current);
            }
        }

        let converged = best.absolute_error <= tolerance;
        progress.emit(event(
            ProgressPhase::Complete,
            iterations,
            best.realized_rtp,
            best.absolute_error,
        ));
        state.check_shortfall(best.realized_rtp, defaults.deviation_warning);

        let search_duration_ms = start.elapsed().as_millis() as u64;
        log::info!(
            "Refinement {:?} after {} iterations ({} ms): RTP {:.4}%, error {:.6}, {} dropped",
            phase,
            iterations,
            search_duration_ms,
            best.realized_rtp * 100.0,
            best.absolute_error,
            progress.dropped()
        );

        let final_error = best.absolute_error;
        Ok(BruteForceResult {
            result: state.finish(best.weights, converged),
            iterations,
            search_duration_ms,
            final_error,
            stop_reason: phase,
        })
    }
}

/// Rescale the non-frequency bucket contributing most RTP toward the target.
///
/// Returns false when no bucket is eligible.
fn fine_tune(state: &RunState<'_>, weights: &mut [u64], defaults: &TunerDefaults) -> bool {
    let dominant = state
        .assignment
        .buckets
        .iter()
        .filter(|b| !b.spec.is_hard_frequency() && !b.is_empty())
        .map(|b| {
            let contribution: f64 = b
                .outcome_indices
                .iter()
                .map(|&i| weights[i] as f64 * state.payouts[i])
                .sum();
            (b, contribution)
        })
        .fold(None, |best, (b, c)| match best {
            Some((_, bc)) if c <= bc => best,
            _ => Some((b, c)),
        });

    let Some((bucket, _)) = dominant else {
        return false;
    };

    let rtp = state.rtp(weights);
    let factor = if rtp > state.target_rtp {
        defaults.fine_tune_down
    } else {
        defaults.fine_tune_up
    };
    for &i in &bucket.outcome_indices {
        let scaled = (weights[i] as f64 * factor).round();
        weights[i] = if scaled > state.min_weight as f64 {
            scaled as u64
        } else {
            state.min_weight
        };
    }

    log::debug!(
        "Fine-tune: bucket '{}' scaled by {} (RTP {:.6} vs target {:.6})",
        bucket.spec.name,
        factor,
        rtp,
        state.target_rtp
    );
    true
}

/// Run the refinement engine with default numeric settings and no hooks
pub fn optimize_brute_force(
    table: &OutcomeTable,
    config: &OptimizerConfig,
) -> TunerResult<BruteForceResult> {
    BruteForceOptimizer::new().run(table, config)
}
