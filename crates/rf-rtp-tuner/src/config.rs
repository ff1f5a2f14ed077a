//! Optimizer configuration

use serde::{Deserialize, Serialize};

use crate::error::TunerResult;

/// How a bucket's win probability is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// "1 win in N spins"
    Frequency,
    /// Share of the target RTP, in percent
    RtpPercent,
    /// Whatever RTP remains, spread inversely by payout
    Auto,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Frequency => "frequency",
            ConstraintKind::RtpPercent => "rtp_percent",
            ConstraintKind::Auto => "auto",
        }
    }
}

/// A payout range with its own probability constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSpec {
    pub name: String,
    /// Inclusive lower bound (bet multiplier)
    pub min_payout: f64,
    /// Exclusive upper bound, inclusive for the last bucket
    pub max_payout: f64,
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    /// 1-in-N for `Frequency` buckets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    /// Percent of target RTP for `RtpPercent` buckets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtp_percent: Option<f64>,
    /// Inverse-payout exponent for `Auto` buckets (default 1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_exponent: Option<f64>,
    /// Cap on how often the bucket's top payout may hit (1-in-N)
    #[serde(default, rename = "max_win_freq", skip_serializing_if = "Option::is_none")]
    pub max_win_frequency: Option<f64>,
}

impl BucketSpec {
    fn base(
        name: impl Into<String>,
        min_payout: f64,
        max_payout: f64,
        kind: ConstraintKind,
    ) -> Self {
        Self {
            name: name.into(),
            min_payout,
            max_payout,
            kind,
            frequency: None,
            rtp_percent: None,
            auto_exponent: None,
            max_win_frequency: None,
        }
    }

    /// Bucket hitting once every `frequency` spins
    pub fn frequency(
        name: impl Into<String>,
        min_payout: f64,
        max_payout: f64,
        frequency: f64,
    ) -> Self {
        Self {
            frequency: Some(frequency),
            ..Self::base(name, min_payout, max_payout, ConstraintKind::Frequency)
        }
    }

    /// Bucket contributing `rtp_percent`% of the target RTP
    pub fn rtp_percent(
        name: impl Into<String>,
        min_payout: f64,
        max_payout: f64,
        rtp_percent: f64,
    ) -> Self {
        Self {
            rtp_percent: Some(rtp_percent),
            ..Self::base(name, min_payout, max_payout, ConstraintKind::RtpPercent)
        }
    }

    /// Bucket sharing the remaining RTP pool
    pub fn auto(name: impl Into<String>, min_payout: f64, max_payout: f64, exponent: f64) -> Self {
        Self {
            auto_exponent: Some(exponent),
            ..Self::base(name, min_payout, max_payout, ConstraintKind::Auto)
        }
    }

    /// Set per-bucket max win frequency
    pub fn with_max_win_frequency(mut self, frequency: f64) -> Self {
        self.max_win_frequency = Some(frequency);
        self
    }

    /// Does `payout` fall into this bucket's range?
    pub fn contains(&self, payout: f64, is_last: bool) -> bool {
        if is_last {
            payout >= self.min_payout && payout <= self.max_payout
        } else {
            payout >= self.min_payout && payout < self.max_payout
        }
    }

    /// Distance from `payout` to the nearer range edge
    pub fn edge_distance(&self, payout: f64) -> f64 {
        (payout - self.min_payout)
            .abs()
            .min((payout - self.max_payout).abs())
    }

    /// Exponent for auto distribution; non-positive falls back to 1.0
    pub fn effective_exponent(&self) -> f64 {
        match self.auto_exponent {
            Some(e) if e > 0.0 => e,
            _ => 1.0,
        }
    }

    /// Frequency-constrained buckets are never rescaled by fine-tuning
    pub fn is_hard_frequency(&self) -> bool {
        self.kind == ConstraintKind::Frequency
    }
}

fn default_min_weight() -> u64 {
    1
}

/// Per-run optimizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Target RTP in (0, 1)
    pub target_rtp: f64,
    /// Convergence band; the optimizer's default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtp_tolerance: Option<f64>,
    /// Ordered, contiguous bucket list
    #[serde(default)]
    pub buckets: Vec<BucketSpec>,
    #[serde(default = "default_min_weight")]
    pub min_weight: u64,
    /// Iteration budget for refinement; 0 = unlimited (capped)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
    /// Cap on how often the table's top payout may hit (1-in-N)
    #[serde(default, rename = "global_max_win_freq", skip_serializing_if = "Option::is_none")]
    pub global_max_win_frequency: Option<f64>,
}

impl OptimizerConfig {
    pub fn new(target_rtp: f64) -> Self {
        Self {
            target_rtp,
            rtp_tolerance: None,
            buckets: Vec::new(),
            min_weight: 1,
            max_iterations: None,
            global_max_win_frequency: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.rtp_tolerance = Some(tolerance);
        self
    }

    pub fn with_bucket(mut self, bucket: BucketSpec) -> Self {
        self.buckets.push(bucket);
        self
    }

    pub fn with_min_weight(mut self, min_weight: u64) -> Self {
        self.min_weight = min_weight;
        self
    }

    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn with_global_max_win_frequency(mut self, frequency: f64) -> Self {
        self.global_max_win_frequency = Some(frequency);
        self
    }

    /// Tolerance, falling back to `default` when absent or non-positive
    pub fn tolerance_or(&self, default: f64) -> f64 {
        match self.rtp_tolerance {
            Some(t) if t > 0.0 => t,
            _ => default,
        }
    }

    /// Minimum weight, never below 1
    pub fn effective_min_weight(&self) -> u64 {
        self.min_weight.max(1)
    }

    /// Iteration budget after applying defaults and the safety ceiling
    pub fn iteration_budget(&self, defaults: &TunerDefaults) -> u64 {
        match self.max_iterations {
            None => defaults.default_refine_iterations.min(defaults.iteration_ceiling),
            Some(0) => defaults.iteration_ceiling,
            Some(n) => n.min(defaults.iteration_ceiling),
        }
    }

    pub fn from_json(json: &str) -> TunerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> TunerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Numeric defaults injected into the optimizers at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerDefaults {
    /// Fixed-point scale for probability → weight conversion
    pub base_weight: f64,
    /// Tolerance for the single-pass optimizer
    pub baseline_tolerance: f64,
    /// Tolerance for the refinement engine
    pub refine_tolerance: f64,
    /// Hard cap on refinement iterations
    pub iteration_ceiling: u64,
    /// Budget when the config leaves `max_iterations` unset
    pub default_refine_iterations: u64,
    /// Emit a progress event every N iterations
    pub progress_interval: u64,
    /// Rescale the dominant bucket every N iterations
    pub fine_tune_interval: u64,
    /// Scale applied when RTP is above target
    pub fine_tune_down: f64,
    /// Scale applied when RTP is below target
    pub fine_tune_up: f64,
    /// Deviation (absolute RTP) that triggers a shortfall warning
    pub deviation_warning: f64,
}

impl Default for TunerDefaults {
    fn default() -> Self {
        Self {
            base_weight: 1e12,
            baseline_tolerance: 0.001,
            refine_tolerance: 0.0001,
            iteration_ceiling: 1_000_000,
            default_refine_iterations: 10_000,
            progress_interval: 10,
            fine_tune_interval: 50,
            fine_tune_down: 0.95,
            fine_tune_up: 1.05,
            deviation_warning: 0.001,
        }
    }
}
