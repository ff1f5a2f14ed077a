//! Outcome table input rows and normalized payouts

use serde::{Deserialize, Serialize};

/// Raw row of a weight table as delivered by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Outcome identifier
    pub id: i64,
    /// Current (raw) weight
    pub weight: u64,
    /// Payout in cents for a 1.00 stake
    #[serde(rename = "payoutCents", alias = "payout_cents")]
    pub payout_cents: i64,
}

/// Normalized outcome: payout expressed as a bet multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: i64,
    /// Payout multiplier (0 or below = loss)
    pub payout: f64,
    pub raw_weight: u64,
}

impl Outcome {
    pub fn new(id: i64, payout: f64, raw_weight: u64) -> Self {
        Self {
            id,
            payout,
            raw_weight,
        }
    }

    /// Non-positive payouts are losses
    pub fn is_loss(&self) -> bool {
        self.payout <= 0.0
    }
}

/// Ordered outcome table, read-only for the optimizer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeTable {
    pub outcomes: Vec<Outcome>,
}

impl OutcomeTable {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self { outcomes }
    }

    /// Build from raw entries, normalizing `payout = cents / 100 / cost`
    pub fn from_entries(entries: &[TableEntry], cost: f64) -> Self {
        let cost = normalize_cost(cost);
        let outcomes = entries
            .iter()
            .map(|e| Outcome::new(e.id, e.payout_cents as f64 / 100.0 / cost, e.weight))
            .collect();
        Self { outcomes }
    }

    /// Convenience constructor from `(payout, weight)` pairs; ids are row indices
    pub fn from_pairs(pairs: &[(f64, u64)]) -> Self {
        let outcomes = pairs
            .iter()
            .enumerate()
            .map(|(i, &(payout, weight))| Outcome::new(i as i64, payout, weight))
            .collect();
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn payouts(&self) -> Vec<f64> {
        self.outcomes.iter().map(|o| o.payout).collect()
    }

    pub fn raw_weights(&self) -> Vec<u64> {
        self.outcomes.iter().map(|o| o.raw_weight).collect()
    }

    /// Indices of loss outcomes, in table order
    pub fn loss_indices(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_loss())
            .map(|(i, _)| i)
            .collect()
    }

    /// RTP of the table as delivered
    pub fn original_rtp(&self) -> f64 {
        rtp(&self.raw_weights(), &self.payouts())
    }
}

/// Stake multiplier; non-positive costs are treated as 1.0
pub fn normalize_cost(cost: f64) -> f64 {
    if cost > 0.0 { cost } else { 1.0 }
}

/// Sum of weights (saturating)
pub fn total_weight(weights: &[u64]) -> u64 {
    weights.iter().fold(0u64, |acc, &w| acc.saturating_add(w))
}

/// Expected return `Σ(w·p) / Σw`; zero for an all-zero weight vector
pub fn rtp(weights: &[u64], payouts: &[f64]) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (&w, &p) in weights.iter().zip(payouts) {
        let w = w as f64;
        total += w;
        if p > 0.0 {
            weighted += w * p;
        }
    }
    if total > 0.0 { weighted / total } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payout_normalization() {
        let entries = [
            TableEntry {
                id: 1,
                weight: 10,
                payout_cents: 0,
            },
            TableEntry {
                id: 2,
                weight: 5,
                payout_cents: 250,
            },
        ];
        let table = OutcomeTable::from_entries(&entries, 2.0);
        assert_eq!(table.outcomes[0].payout, 0.0);
        assert!((table.outcomes[1].payout - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_cost_is_unit() {
        let entries = [TableEntry {
            id: 7,
            weight: 1,
            payout_cents: 500,
        }];
        let zero = OutcomeTable::from_entries(&entries, 0.0);
        let negative = OutcomeTable::from_entries(&entries, -3.0);
        assert!((zero.outcomes[0].payout - 5.0).abs() < 1e-12);
        assert!((negative.outcomes[0].payout - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_rtp() {
        // 1 in 4 pays 2x → 0.5
        assert!((rtp(&[3, 1], &[0.0, 2.0]) - 0.5).abs() < 1e-12);
        assert_eq!(rtp(&[0, 0], &[0.0, 2.0]), 0.0);
        assert_eq!(rtp(&[], &[]), 0.0);
    }

    #[test]
    fn test_loss_indices() {
        let table = OutcomeTable::from_pairs(&[(0.0, 5), (1.0, 1), (-1.0, 2)]);
        assert_eq!(table.loss_indices(), vec![0, 2]);
    }

    #[test]
    fn test_entry_wire_names() {
        let entry: TableEntry =
            serde_json::from_str(r#"{"id": 3, "weight": 40, "payoutCents": 1500}"#).unwrap();
        assert_eq!(entry.payout_cents, 1500);
        let snake: TableEntry =
            serde_json::from_str(r#"{"id": 3, "weight": 40, "payout_cents": 1500}"#).unwrap();
        assert_eq!(entry, snake);
    }
}
