//! Weight Synthesizer & Loss Balancer

use crate::assign::Assignment;
use crate::config::ConstraintKind;

/// Convert a probability to an integer weight on the fixed-point base
fn to_weight(probability: f64, base: f64, min_weight: u64) -> u64 {
    let w = (probability * base).round();
    if w.is_finite() && w > 0.0 {
        (w as u64).max(min_weight)
    } else {
        min_weight
    }
}

/// Build the initial weight vector for winning outcomes.
///
/// Non-auto buckets split `target_probability × base` evenly over their
/// members; auto members take their own probability. Loss outcomes start
/// at `min_weight` and are set by [`balance_loss`]. Unassigned winners keep
/// their raw weight.
pub fn synthesize_weights(
    raw_weights: &[u64],
    assignment: &Assignment,
    base: f64,
    min_weight: u64,
) -> Vec<u64> {
    let mut weights = vec![min_weight; raw_weights.len()];

    for bucket in &assignment.buckets {
        if bucket.is_empty() {
            continue;
        }
        match (&bucket.spec.kind, &bucket.per_outcome_probability) {
            (ConstraintKind::Auto, Some(probs)) => {
                for (&idx, &p) in bucket.outcome_indices.iter().zip(probs) {
                    weights[idx] = to_weight(p, base, min_weight);
                }
            }
            _ => {
                let share = bucket.target_probability / bucket.len() as f64;
                let w = to_weight(share, base, min_weight);
                for &idx in &bucket.outcome_indices {
                    weights[idx] = w;
                }
            }
        }
    }

    for &idx in &assignment.unassigned {
        weights[idx] = raw_weights[idx].max(min_weight);
    }

    weights
}

/// `(Σ w·p, Σ w)` over winning outcomes
pub fn winning_sums(weights: &[u64], payouts: &[f64]) -> (f64, f64) {
    weights
        .iter()
        .zip(payouts)
        .filter(|(_, p)| **p > 0.0)
        .fold((0.0, 0.0), |(s, w), (&wi, &pi)| (s + wi as f64 * pi, w + wi as f64))
}

/// Closed-form loss weight making `S / (W + loss) = target_rtp`
pub fn required_loss_weight(
    weighted_payout: f64,
    winning_weight: f64,
    target_rtp: f64,
    min_weight: u64,
    loss_count: usize,
) -> u64 {
    let floor = min_weight.max(loss_count as u64);
    if target_rtp <= 0.0 {
        return floor;
    }
    let loss = (weighted_payout / target_rtp - winning_weight).round();
    if loss.is_finite() && loss > floor as f64 {
        loss as u64
    } else {
        floor
    }
}

/// Solve for the loss weight and split it evenly over loss outcomes.
///
/// Returns the total loss weight written, or `None` when the table has no
/// loss outcomes to absorb it.
pub fn balance_loss(
    weights: &mut [u64],
    payouts: &[f64],
    loss_indices: &[usize],
    target_rtp: f64,
    min_weight: u64,
) -> Option<u64> {
    if loss_indices.is_empty() {
        return None;
    }
    let (s, w) = winning_sums(weights, payouts);
    let loss = required_loss_weight(s, w, target_rtp, min_weight, loss_indices.len());
    let each = ((loss as f64 / loss_indices.len() as f64).round() as u64).max(min_weight);
    for &idx in loss_indices {
        weights[idx] = each;
    }
    Some(each * loss_indices.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::assign_buckets;
    use crate::config::BucketSpec;
    use crate::resolve::resolve_targets;
    use crate::table::rtp;

    #[test]
    fn test_even_split_within_bucket() {
        let specs = vec![BucketSpec::frequency("small", 0.0, 10.0, 4.0)];
        let payouts = [0.0, 1.0, 2.0];
        let mut a = assign_buckets(&payouts, &specs);
        resolve_targets(&mut a, 0.9);
        let weights = synthesize_weights(&[1, 1, 1], &a, 1e6, 1);

        assert_eq!(weights[1], 125_000);
        assert_eq!(weights[2], 125_000);
        assert_eq!(weights[0], 1);
    }

    #[test]
    fn test_min_weight_floor() {
        let specs = vec![BucketSpec::frequency("rare", 0.0, 10.0, 1e9)];
        let mut a = assign_buckets(&[0.0, 5.0], &specs);
        resolve_targets(&mut a, 0.9);
        let weights = synthesize_weights(&[1, 1], &a, 1e3, 7);
        assert_eq!(weights, vec![7, 7]);
    }

    #[test]
    fn test_loss_balance_hits_target() {
        let payouts = [0.0, 0.0, 2.0, 5.0];
        let mut weights = vec![1, 1, 300_000, 60_000];
        let total = balance_loss(&mut weights, &payouts, &[0, 1], 0.96, 1).unwrap();

        assert_eq!(total, weights[0] + weights[1]);
        assert!((rtp(&weights, &payouts) - 0.96).abs() < 1e-5);
    }

    #[test]
    fn test_loss_floor_when_overpaying() {
        // Winners alone return 2.0, so no loss weight can bring it to 0.5 and
        // the balancer clamps at its floor
        let payouts = [0.0, 0.0, 0.0, 2.0];
        let mut weights = vec![9, 9, 9, 100];
        balance_loss(&mut weights, &payouts, &[0, 1, 2], 0.5, 1);
        // floor = max(min_weight, loss count) = 3, split evenly
        assert_eq!(&weights[..3], &[1, 1, 1]);
    }

    #[test]
    fn test_no_loss_outcomes() {
        let mut weights = vec![10, 10];
        assert!(balance_loss(&mut weights, &[1.0, 2.0], &[], 0.9, 1).is_none());
        assert_eq!(weights, vec![10, 10]);
    }

    #[test]
    fn test_unassigned_keep_raw_weight() {
        let a = assign_buckets(&[0.0, 3.0], &[]);
        let weights = synthesize_weights(&[40, 12], &a, 1e12, 1);
        assert_eq!(weights, vec![1, 12]);
    }
}
