//! Max-win frequency clamps applied after weight synthesis

use crate::assign::BucketAssignment;
use crate::table::total_weight;

fn apply_delta(weight: u64, delta: f64, min_weight: u64) -> u64 {
    let w = (weight as f64 + delta).round();
    if w.is_finite() && w > min_weight as f64 {
        w as u64
    } else {
        min_weight
    }
}

fn frequency_target(weights: &[u64], frequency: f64, min_weight: u64) -> Option<u64> {
    if frequency.is_nan() || frequency <= 0.0 {
        return None;
    }
    let total = total_weight(weights) as f64;
    Some(apply_delta(0, total / frequency, min_weight))
}

/// Pin the table's top payout to hit once every `frequency` spins.
///
/// The weight moved onto (or off) the top outcome is taken from (or given
/// to) the loss outcomes in equal shares, so the total stays close to
/// unchanged. Returns the index that was adjusted.
pub fn apply_global_max_win_frequency(
    weights: &mut [u64],
    payouts: &[f64],
    loss_indices: &[usize],
    frequency: f64,
    min_weight: u64,
) -> Option<usize> {
    let top = payouts
        .iter()
        .enumerate()
        .filter(|(_, p)| **p > 0.0)
        .fold(None, |best: Option<(usize, f64)>, (i, &p)| match best {
            Some((_, bp)) if p <= bp => best,
            _ => Some((i, p)),
        })
        .map(|(i, _)| i)?;

    let target = frequency_target(weights, frequency, min_weight)?;
    let delta = target as f64 - weights[top] as f64;
    weights[top] = target;

    if !loss_indices.is_empty() {
        let share = delta / loss_indices.len() as f64;
        for &idx in loss_indices {
            weights[idx] = apply_delta(weights[idx], -share, min_weight);
        }
    }

    log::debug!(
        "Global max win: outcome {} (payout {:.2}x) pinned to weight {} (1 in {})",
        top,
        payouts[top],
        target,
        frequency
    );
    Some(top)
}

/// Pin a bucket's top payout to hit once every `frequency` spins.
///
/// Loss outcomes are not touched. Returns the index that was adjusted.
pub fn apply_bucket_max_win_frequency(
    weights: &mut [u64],
    bucket: &BucketAssignment,
    frequency: f64,
    min_weight: u64,
) -> Option<usize> {
    let top = bucket.max_payout_member()?;
    let target = frequency_target(weights, frequency, min_weight)?;
    weights[top] = target;

    log::debug!(
        "Bucket '{}' max win: outcome {} pinned to weight {} (1 in {})",
        bucket.spec.name,
        top,
        target,
        frequency
    );
    Some(top)
}
