//! Error types for weight optimization

use thiserror::Error;

/// Configuration rejected by the validator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Gap between buckets '{prev}' (max {prev_max}) and '{next}' (min {next_min})")]
    Gap {
        prev: String,
        prev_max: f64,
        next: String,
        next_min: f64,
    },

    #[error("Buckets '{prev}' (max {prev_max}) and '{next}' (min {next_min}) overlap")]
    Overlap {
        prev: String,
        prev_max: f64,
        next: String,
        next_min: f64,
    },

    #[error("Bucket '{name}': max_payout {max} must be greater than min_payout {min}")]
    InvalidRange { name: String, min: f64, max: f64 },

    #[error("Bucket '{name}': min_payout {min} cannot be negative")]
    NegativeMinPayout { name: String, min: f64 },

    #[error("Bucket '{name}': frequency must be positive")]
    InvalidFrequency { name: String },

    #[error("Bucket '{name}': rtp_percent must be in (0, 100]")]
    RtpPercentOutOfRange { name: String },

    #[error("Bucket '{name}': auto_exponent cannot be negative")]
    NegativeAutoExponent { name: String },

    #[error("Target RTP {0} must be between 0 and 1 (exclusive)")]
    InvalidTargetRtp(f64),

    #[error("RTP tolerance {0} must be positive")]
    InvalidTolerance(f64),

    #[error("Minimum weight must be at least 1")]
    InvalidMinWeight,

    #[error("Max win frequency for {scope} must be positive")]
    InvalidMaxWinFrequency { scope: String },
}

/// Optimizer errors
#[derive(Error, Debug)]
pub enum TunerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Outcome table is empty")]
    EmptyTable,
}

/// Result type for tuner operations
pub type TunerResult<T> = Result<T, TunerError>;
