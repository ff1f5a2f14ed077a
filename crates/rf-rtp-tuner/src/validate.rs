//! Configuration Validator
//!
//! Advisory checks for callers assembling a configuration. The optimizers
//! never call these themselves; a misconfigured range is tolerated at run
//! time through the assigner's closest-bucket fallback.

use crate::config::{BucketSpec, ConstraintKind, OptimizerConfig};
use crate::error::ConfigError;

/// Check each bucket's own fields, then range contiguity in `min_payout` order.
///
/// Multiple auto buckets are allowed. An empty list is valid.
pub fn validate_buckets(buckets: &[BucketSpec]) -> Result<(), ConfigError> {
    for bucket in buckets {
        validate_bucket(bucket)?;
    }

    let mut sorted: Vec<&BucketSpec> = buckets.iter().collect();
    sorted.sort_by(|a, b| a.min_payout.total_cmp(&b.min_payout));

    for pair in sorted.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if prev.max_payout < next.min_payout {
            return Err(ConfigError::Gap {
                prev: prev.name.clone(),
                prev_max: prev.max_payout,
                next: next.name.clone(),
                next_min: next.min_payout,
            });
        }
        if prev.max_payout > next.min_payout {
            return Err(ConfigError::Overlap {
                prev: prev.name.clone(),
                prev_max: prev.max_payout,
                next: next.name.clone(),
                next_min: next.min_payout,
            });
        }
    }

    Ok(())
}

fn validate_bucket(bucket: &BucketSpec) -> Result<(), ConfigError> {
    let name = || bucket.name.clone();

    if bucket.min_payout < 0.0 {
        return Err(ConfigError::NegativeMinPayout {
            name: name(),
            min: bucket.min_payout,
        });
    }
    if bucket.min_payout.is_nan()
        || bucket.max_payout.is_nan()
        || bucket.max_payout <= bucket.min_payout
    {
        return Err(ConfigError::InvalidRange {
            name: name(),
            min: bucket.min_payout,
            max: bucket.max_payout,
        });
    }
    if let Some(f) = bucket.max_win_frequency {
        if f.is_nan() || f <= 0.0 {
            return Err(ConfigError::InvalidMaxWinFrequency {
                scope: format!("bucket '{}'", bucket.name),
            });
        }
    }

    match bucket.kind {
        ConstraintKind::Frequency => match bucket.frequency {
            Some(f) if f > 0.0 => Ok(()),
            _ => Err(ConfigError::InvalidFrequency { name: name() }),
        },
        ConstraintKind::RtpPercent => match bucket.rtp_percent {
            Some(p) if p > 0.0 && p <= 100.0 => Ok(()),
            _ => Err(ConfigError::RtpPercentOutOfRange { name: name() }),
        },
        ConstraintKind::Auto => match bucket.auto_exponent {
            Some(e) if e < 0.0 => Err(ConfigError::NegativeAutoExponent { name: name() }),
            _ => Ok(()),
        },
    }
}

/// Validate a whole run configuration, buckets included
pub fn validate_config(config: &OptimizerConfig) -> Result<(), ConfigError> {
    if config.target_rtp.is_nan() || config.target_rtp <= 0.0 || config.target_rtp >= 1.0 {
        return Err(ConfigError::InvalidTargetRtp(config.target_rtp));
    }
    if let Some(t) = config.rtp_tolerance {
        if t.is_nan() || t <= 0.0 {
            return Err(ConfigError::InvalidTolerance(t));
        }
    }
    if config.min_weight < 1 {
        return Err(ConfigError::InvalidMinWeight);
    }
    if let Some(f) = config.global_max_win_frequency {
        if f.is_nan() || f <= 0.0 {
            return Err(ConfigError::InvalidMaxWinFrequency {
                scope: "table".to_string(),
            });
        }
    }
    validate_buckets(&config.buckets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_buckets_pass() {
        let buckets = vec![
            BucketSpec::frequency("low", 0.0, 5.0, 5.0),
            BucketSpec::auto("high", 5.0, 100.0, 1.0),
        ];
        assert!(validate_buckets(&buckets).is_ok());
    }

    #[test]
    fn test_order_independent() {
        let buckets = vec![
            BucketSpec::auto("high", 5.0, 100.0, 1.0),
            BucketSpec::frequency("low", 0.0, 5.0, 5.0),
        ];
        assert!(validate_buckets(&buckets).is_ok());
    }

    #[test]
    fn test_gap_and_overlap() {
        let gap = vec![
            BucketSpec::frequency("a", 0.0, 5.0, 5.0),
            BucketSpec::frequency("b", 10.0, 100.0, 50.0),
        ];
        assert!(matches!(validate_buckets(&gap), Err(ConfigError::Gap { .. })));

        let overlap = vec![
            BucketSpec::frequency("a", 0.0, 8.0, 5.0),
            BucketSpec::frequency("b", 5.0, 100.0, 50.0),
        ];
        assert!(matches!(validate_buckets(&overlap), Err(ConfigError::Overlap { .. })));
    }

    #[test]
    fn test_per_type_fields() {
        assert!(matches!(
            validate_buckets(&[BucketSpec::frequency("a", 0.0, 5.0, 0.0)]),
            Err(ConfigError::InvalidFrequency { .. })
        ));
        assert!(matches!(
            validate_buckets(&[BucketSpec::rtp_percent("a", 0.0, 5.0, 150.0)]),
            Err(ConfigError::RtpPercentOutOfRange { .. })
        ));
        assert!(matches!(
            validate_buckets(&[BucketSpec::rtp_percent("a", 0.0, 5.0, 0.0)]),
            Err(ConfigError::RtpPercentOutOfRange { .. })
        ));
        assert!(validate_buckets(&[BucketSpec::rtp_percent("a", 0.0, 5.0, 100.0)]).is_ok());
        assert!(matches!(
            validate_buckets(&[BucketSpec::auto("a", 0.0, 5.0, -0.5)]),
            Err(ConfigError::NegativeAutoExponent { .. })
        ));
    }

    #[test]
    fn test_range_checks() {
        assert!(matches!(
            validate_buckets(&[BucketSpec::auto("a", 5.0, 5.0, 1.0)]),
            Err(ConfigError::InvalidRange { .. })
        ));
        assert!(matches!(
            validate_buckets(&[BucketSpec::auto("a", -1.0, 5.0, 1.0)]),
            Err(ConfigError::NegativeMinPayout { .. })
        ));
    }

    #[test]
    fn test_multiple_auto_buckets_allowed() {
        let buckets = vec![
            BucketSpec::auto("a", 0.0, 5.0, 1.0),
            BucketSpec::auto("b", 5.0, 50.0, 2.0),
        ];
        assert!(validate_buckets(&buckets).is_ok());
    }

    #[test]
    fn test_validate_config() {
        let ok = OptimizerConfig::new(0.96)
            .with_bucket(BucketSpec::auto("all", 0.0, 100.0, 1.0));
        assert!(validate_config(&ok).is_ok());

        assert!(matches!(
            validate_config(&OptimizerConfig::new(1.2)),
            Err(ConfigError::InvalidTargetRtp(_))
        ));
        assert!(matches!(
            validate_config(&ok.clone().with_tolerance(0.0)),
            Err(ConfigError::InvalidTolerance(_))
        ));
        assert!(matches!(
            validate_config(&ok.clone().with_min_weight(0)),
            Err(ConfigError::InvalidMinWeight)
        ));
        assert!(matches!(
            validate_config(&ok.with_global_max_win_frequency(-5.0)),
            Err(ConfigError::InvalidMaxWinFrequency { .. })
        ));
    }
}
