//! # rf-rtp-tuner — Bucket-Constrained Payout Weight Optimizer
//!
//! Tunes the weight table of a slot outcome set so its long-run return
//! (RTP) lands on an operator target while respecting per-bucket
//! constraints such as "1 in 20 spins pays 5x–20x" or "0.5% of RTP comes
//! from wins above 1000x".
//!
//! ## Features
//!
//! - **Bucket Assigner**: partitions outcomes into payout ranges plus a loss set
//! - **Target Resolver**: frequency / RTP-percent / auto constraints → probabilities
//! - **Weight Synthesizer**: fixed-point integer weights with closed-form loss balancing
//! - **Refinement Engine**: cancellable, progress-reporting convergence loop
//! - **Validator**: advisory contiguity and per-type field checks
//!
//! ## Architecture
//!
//! ```text
//! OutcomeTable + OptimizerConfig
//!     │
//!     ├── assign   (payout → bucket, loss set)
//!     ├── resolve  (constraint → target probability)
//!     ├── synth    (probability → weight, loss balance)
//!     └── constraints (max-win frequency clamps)
//!           │
//!           v
//!     WeightOptimizer ─────────────► OptimizationResult
//!     BruteForceOptimizer ──(loop)──► BruteForceResult
//!           │            ▲
//!           v            │
//!     ProgressEvent   CancelToken
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use rf_rtp_tuner::{BucketSpec, OptimizerConfig, OutcomeTable, optimize_brute_force};
//!
//! let table = OutcomeTable::from_pairs(&[(0.0, 1000), (1.0, 100), (5.0, 20), (50.0, 2)]);
//! let config = OptimizerConfig::new(0.96)
//!     .with_bucket(BucketSpec::frequency("small", 0.0, 5.0, 4.0))
//!     .with_bucket(BucketSpec::auto("big", 5.0, 100.0, 1.0));
//!
//! let result = optimize_brute_force(&table, &config).unwrap();
//! assert!(result.result.converged);
//! ```

pub mod assign;
pub mod config;
pub mod constraints;
pub mod error;
pub mod optimizer;
pub mod progress;
pub mod refine;
pub mod report;
pub mod resolve;
pub mod synth;
pub mod table;
pub mod validate;

pub use assign::{Assignment, BucketAssignment, assign_buckets};
pub use config::*;
pub use error::*;
pub use optimizer::{WeightOptimizer, optimize};
pub use progress::*;
pub use refine::*;
pub use report::*;
pub use resolve::{Resolution, resolve_targets};
pub use table::*;
pub use validate::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
