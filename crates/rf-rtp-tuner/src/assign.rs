//! Bucket assignment: partitions outcomes into payout buckets

use crate::config::BucketSpec;

/// Outcomes placed into one configured bucket for a single run
#[derive(Debug, Clone)]
pub struct BucketAssignment {
    pub spec: BucketSpec,
    /// Indices into the outcome table
    pub outcome_indices: Vec<usize>,
    /// Payouts of the members, parallel to `outcome_indices`
    pub payouts: Vec<f64>,
    pub avg_payout: f64,
    /// Filled by the resolver
    pub target_probability: f64,
    /// Auto buckets only, parallel to `outcome_indices`
    pub per_outcome_probability: Option<Vec<f64>>,
    /// Filled by the resolver
    pub rtp_contribution: f64,
}

impl BucketAssignment {
    fn new(spec: BucketSpec) -> Self {
        Self {
            spec,
            outcome_indices: Vec::new(),
            payouts: Vec::new(),
            avg_payout: 0.0,
            target_probability: 0.0,
            per_outcome_probability: None,
            rtp_contribution: 0.0,
        }
    }

    fn push(&mut self, index: usize, payout: f64) {
        self.outcome_indices.push(index);
        self.payouts.push(payout);
    }

    pub fn is_empty(&self) -> bool {
        self.outcome_indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.outcome_indices.len()
    }

    /// Index of the member with the highest payout (first on ties)
    pub fn max_payout_member(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (&idx, &payout) in self.outcome_indices.iter().zip(&self.payouts) {
            match best {
                Some((_, p)) if payout <= p => {}
                _ => best = Some((idx, payout)),
            }
        }
        best.map(|(idx, _)| idx)
    }
}

/// Result of partitioning a table
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    /// One entry per configured bucket, in config order
    pub buckets: Vec<BucketAssignment>,
    /// Outcomes with payout ≤ 0
    pub loss_indices: Vec<usize>,
    /// Winning outcomes that could not be placed (only when no buckets exist)
    pub unassigned: Vec<usize>,
    /// Outcomes placed via the closest-edge fallback
    pub fallback_count: usize,
}

impl Assignment {
    /// Bucket index owning each outcome (None for loss / unassigned)
    pub fn owner_map(&self, outcome_count: usize) -> Vec<Option<usize>> {
        let mut owners = vec![None; outcome_count];
        for (b, bucket) in self.buckets.iter().enumerate() {
            for &idx in &bucket.outcome_indices {
                if let Some(slot) = owners.get_mut(idx) {
                    *slot = Some(b);
                }
            }
        }
        owners
    }
}

/// Place every winning outcome into exactly one bucket.
///
/// The first bucket whose range contains the payout wins. An outcome that
/// matches no range goes to the bucket with the nearest edge instead of
/// being dropped, so a misconfigured range still leaves the table
/// optimizable.
pub fn assign_buckets(payouts: &[f64], specs: &[BucketSpec]) -> Assignment {
    let mut assignment = Assignment {
        buckets: specs.iter().cloned().map(BucketAssignment::new).collect(),
        ..Default::default()
    };
    let last = specs.len().saturating_sub(1);

    for (idx, &payout) in payouts.iter().enumerate() {
        if payout <= 0.0 {
            assignment.loss_indices.push(idx);
            continue;
        }
        if specs.is_empty() {
            assignment.unassigned.push(idx);
            continue;
        }

        let slot = match specs
            .iter()
            .enumerate()
            .position(|(b, spec)| spec.contains(payout, b == last))
        {
            Some(b) => b,
            None => {
                let b = closest_bucket(payout, specs);
                log::warn!(
                    "Payout {:.4}x matches no bucket range, assigned to closest bucket '{}'",
                    payout,
                    specs[b].name
                );
                assignment.fallback_count += 1;
                b
            }
        };
        assignment.buckets[slot].push(idx, payout);
    }

    for bucket in &mut assignment.buckets {
        bucket.avg_payout = mean(&bucket.payouts);
    }

    assignment
}

fn closest_bucket(payout: f64, specs: &[BucketSpec]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (b, spec) in specs.iter().enumerate() {
        let distance = spec.edge_distance(payout);
        if distance < best_distance {
            best = b;
            best_distance = distance;
        }
    }
    best
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<BucketSpec> {
        vec![
            BucketSpec::frequency("low", 0.0, 1.0, 3.0),
            BucketSpec::frequency("mid", 1.0, 5.0, 6.0),
            BucketSpec::auto("high", 5.0, 100.0, 1.0),
        ]
    }

    #[test]
    fn test_range_assignment() {
        let payouts = [0.0, 0.5, 1.0, 4.99, 5.0, 100.0];
        let a = assign_buckets(&payouts, &specs());

        assert_eq!(a.loss_indices, vec![0]);
        assert_eq!(a.buckets[0].outcome_indices, vec![1]);
        assert_eq!(a.buckets[1].outcome_indices, vec![2, 3]);
        // Last bucket upper bound is inclusive
        assert_eq!(a.buckets[2].outcome_indices, vec![4, 5]);
        assert_eq!(a.fallback_count, 0);
    }

    #[test]
    fn test_closest_bucket_fallback() {
        // 150x is beyond every range; nearest edge is high's 100
        // 0.2x falls in a gap left before "mid"
        let specs = vec![
            BucketSpec::frequency("mid", 1.0, 5.0, 6.0),
            BucketSpec::auto("high", 5.0, 100.0, 1.0),
        ];
        let a = assign_buckets(&[150.0, 0.2], &specs);

        assert_eq!(a.buckets[1].outcome_indices, vec![0]);
        assert_eq!(a.buckets[0].outcome_indices, vec![1]);
        assert_eq!(a.fallback_count, 2);
    }

    #[test]
    fn test_no_duplicates() {
        let payouts: Vec<f64> = (0..50).map(|i| i as f64 * 2.5).collect();
        let a = assign_buckets(&payouts, &specs());
        let placed: usize = a.buckets.iter().map(|b| b.len()).sum::<usize>() + a.loss_indices.len();
        assert_eq!(placed, payouts.len());

        let owners = a.owner_map(payouts.len());
        assert!(owners[0].is_none());
        assert!(owners[1..].iter().all(|o| o.is_some()));
    }

    #[test]
    fn test_average_payout() {
        let a = assign_buckets(&[1.0, 2.0, 3.0], &specs());
        assert!((a.buckets[1].avg_payout - 2.0).abs() < 1e-12);
        assert_eq!(a.buckets[0].avg_payout, 0.0);
    }

    #[test]
    fn test_no_buckets_leaves_winners_unassigned() {
        let a = assign_buckets(&[0.0, 2.0, 3.0], &[]);
        assert_eq!(a.loss_indices, vec![0]);
        assert_eq!(a.unassigned, vec![1, 2]);
    }

    #[test]
    fn test_max_payout_member() {
        let a = assign_buckets(&[10.0, 80.0, 80.0, 6.0], &specs());
        assert_eq!(a.buckets[2].max_payout_member(), Some(1));
    }
}
