//! Target Probability Resolver
//!
//! Turns each bucket's constraint into a target win probability. Fixed
//! constraints (frequency, RTP percent) are resolved first; auto buckets
//! then share whatever RTP the fixed ones left over, weighted by
//! `payout^-e` so larger payouts are never more likely than smaller ones.

use crate::assign::Assignment;
use crate::config::ConstraintKind;

/// Summary of a resolver pass
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// RTP claimed by frequency and RTP-percent buckets
    pub used_rtp: f64,
    /// RTP handed to auto buckets
    pub remaining_rtp: f64,
    /// `1 - Σ bucket probabilities`, floored at 0
    pub loss_probability: f64,
    pub warnings: Vec<String>,
}

impl Resolution {
    /// Fixed constraints alone exceed the target
    pub fn over_constrained(&self, target_rtp: f64) -> bool {
        self.used_rtp > target_rtp
    }
}

/// Fill `target_probability`, `rtp_contribution` and, for auto buckets,
/// `per_outcome_probability` on every bucket of `assignment`.
pub fn resolve_targets(assignment: &mut Assignment, target_rtp: f64) -> Resolution {
    let mut resolution = Resolution::default();

    // Pass 1: fixed constraints
    for bucket in &mut assignment.buckets {
        bucket.per_outcome_probability = None;
        match bucket.spec.kind {
            ConstraintKind::Frequency => {
                let frequency = bucket.spec.frequency.unwrap_or(0.0);
                bucket.target_probability = if frequency > 0.0 { 1.0 / frequency } else { 0.0 };
                bucket.rtp_contribution = bucket.target_probability * bucket.avg_payout;
            }
            ConstraintKind::RtpPercent => {
                if bucket.avg_payout > 0.0 {
                    let percent = bucket.spec.rtp_percent.unwrap_or(0.0);
                    bucket.rtp_contribution = percent / 100.0 * target_rtp;
                    bucket.target_probability = bucket.rtp_contribution / bucket.avg_payout;
                } else {
                    bucket.rtp_contribution = 0.0;
                    bucket.target_probability = 0.0;
                }
            }
            ConstraintKind::Auto => {
                bucket.target_probability = 0.0;
                bucket.rtp_contribution = 0.0;
            }
        }
        resolution.used_rtp += bucket.rtp_contribution;
    }

    if resolution.over_constrained(target_rtp) {
        let msg = format!(
            "Frequency/RTP-percent buckets already claim {:.4}% RTP, above the {:.4}% target",
            resolution.used_rtp * 100.0,
            target_rtp * 100.0
        );
        log::warn!("{}", msg);
        resolution.warnings.push(msg);
    }

    // Pass 2: auto buckets share the remaining pool
    resolution.remaining_rtp = (target_rtp - resolution.used_rtp).max(0.0);

    let denominator: f64 = assignment
        .buckets
        .iter()
        .filter(|b| b.spec.kind == ConstraintKind::Auto)
        .flat_map(|b| {
            let e = b.spec.effective_exponent();
            b.payouts.iter().map(move |&p| p.powf(1.0 - e))
        })
        .sum();

    for bucket in assignment
        .buckets
        .iter_mut()
        .filter(|b| b.spec.kind == ConstraintKind::Auto)
    {
        let e = bucket.spec.effective_exponent();
        let probs: Vec<f64> = if denominator > 0.0 {
            bucket
                .payouts
                .iter()
                .map(|&p| resolution.remaining_rtp * p.powf(-e) / denominator)
                .collect()
        } else {
            vec![0.0; bucket.payouts.len()]
        };
        bucket.target_probability = probs.iter().sum();
        bucket.rtp_contribution = probs.iter().zip(&bucket.payouts).map(|(q, p)| q * p).sum();
        bucket.per_outcome_probability = Some(probs);
    }

    let total_probability: f64 = assignment.buckets.iter().map(|b| b.target_probability).sum();
    resolution.loss_probability = (1.0 - total_probability).max(0.0);

    for bucket in &assignment.buckets {
        log::debug!(
            "Bucket '{}' ({}): {} outcomes, avg {:.4}x, p={:.6e}, rtp={:.6}",
            bucket.spec.name,
            bucket.spec.kind.as_str(),
            bucket.len(),
            bucket.avg_payout,
            bucket.target_probability,
            bucket.rtp_contribution
        );
    }

    resolution
}
