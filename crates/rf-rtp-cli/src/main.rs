//! rf-rtp — Weight table optimizer CLI
//!
//! Usage:
//!   rf-rtp validate --config buckets.yaml
//!   rf-rtp optimize --table table.json --config config.json [--out result.json]
//!   rf-rtp refine   --table table.json --config config.json [--timeout-ms 5000]

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use rf_rtp_tuner::{
    BruteForceOptimizer, CancelToken, OptimizerConfig, OutcomeTable, ProgressEvent, TableEntry,
    WeightOptimizer, validate_config,
};

#[derive(Parser)]
#[command(name = "rf-rtp", about = "Bucket-constrained RTP weight optimizer", version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a configuration without running the optimizer
    Validate {
        /// Configuration file (.json, .yaml, .yml)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Single-pass optimization
    Optimize(RunArgs),
    /// Iterative refinement until convergence
    Refine {
        #[command(flatten)]
        run: RunArgs,

        /// Cancel the search after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Override the configured iteration budget (0 = unlimited)
        #[arg(long)]
        max_iterations: Option<u64>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Outcome table (JSON)
    #[arg(short, long)]
    table: PathBuf,

    /// Configuration file (.json, .yaml, .yml)
    #[arg(short, long)]
    config: PathBuf,

    /// Stake multiplier used to normalize payouts
    #[arg(long)]
    cost: Option<f64>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// Table file: a bare entry list or an object carrying the cost
#[derive(Deserialize)]
#[serde(untagged)]
enum TableFile {
    Entries(Vec<TableEntry>),
    WithCost {
        #[serde(default = "unit_cost")]
        cost: f64,
        outcomes: Vec<TableEntry>,
    },
}

fn unit_cost() -> f64 {
    1.0
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Validate { config } => {
            let config = load_config(&config)?;
            validate_config(&config).context("Configuration rejected")?;
            log::info!("Configuration OK ({} buckets)", config.buckets.len());
        }
        Commands::Optimize(args) => {
            let (table, config) = load_run(&args)?;
            match WeightOptimizer::new().optimize(&table, &config) {
                Some(result) => {
                    let json = serde_json::to_string_pretty(&result)?;
                    write_output(args.out.as_deref(), &json)?;
                }
                None => log::warn!("Outcome table is empty, no result written"),
            }
        }
        Commands::Refine {
            run,
            timeout_ms,
            max_iterations,
        } => {
            let (table, mut config) = load_run(&run)?;
            if let Some(n) = max_iterations {
                config.max_iterations = Some(n);
            }

            let (tx, rx) = crossbeam_channel::bounded::<ProgressEvent>(64);
            let optimizer = BruteForceOptimizer::new().with_progress(tx);
            if let Some(ms) = timeout_ms {
                spawn_timeout(optimizer.cancel_token(), Duration::from_millis(ms));
            }

            let reporter = thread::spawn(move || {
                for event in rx.iter() {
                    log::info!(
                        "[{:?}] iter {}/{} rtp {:.6} error {:.6}{}",
                        event.phase,
                        event.iteration,
                        event.max_iterations,
                        event.current_rtp,
                        event.error,
                        if event.converged { " converged" } else { "" }
                    );
                }
            });

            let outcome = optimizer.run(&table, &config);
            // Closes the channel so the reporter thread ends
            drop(optimizer);
            if reporter.join().is_err() {
                log::warn!("Progress reporter thread panicked");
            }

            let result = outcome.context("Refinement failed")?;
            write_output(run.out.as_deref(), &serde_json::to_string_pretty(&result)?)?;
        }
    }

    Ok(())
}

fn spawn_timeout(token: CancelToken, after: Duration) {
    thread::spawn(move || {
        thread::sleep(after);
        log::info!("Timeout of {} ms reached, cancelling", after.as_millis());
        token.cancel();
    });
}

fn load_run(args: &RunArgs) -> Result<(OutcomeTable, OptimizerConfig)> {
    let config = load_config(&args.config)?;
    let table = load_table(&args.table, args.cost)?;
    if let Err(e) = validate_config(&config) {
        log::warn!(
            "Configuration check: {} (continuing, unmatched payouts use the closest bucket)",
            e
        );
    }
    Ok((table, config))
}

fn load_config(path: &Path) -> Result<OptimizerConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yml::from_str(&text)
            .with_context(|| format!("Invalid YAML config {}", path.display()))?,
        Some("json") | None => serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON config {}", path.display()))?,
        Some(other) => bail!("Unsupported config format: .{}", other),
    };
    Ok(config)
}

fn load_table(path: &Path, cost_override: Option<f64>) -> Result<OutcomeTable> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read table {}", path.display()))?;
    let file: TableFile = serde_json::from_str(&text)
        .with_context(|| format!("Invalid table {}", path.display()))?;

    let (entries, cost) = match file {
        TableFile::Entries(entries) => (entries, 1.0),
        TableFile::WithCost { cost, outcomes } => (outcomes, cost),
    };
    let cost = cost_override.unwrap_or(cost);
    log::info!("Loaded {} outcomes from {} (cost {})", entries.len(), path.display(), cost);
    Ok(OutcomeTable::from_entries(&entries, cost))
}

fn write_output(out: Option<&Path>, json: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Result written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
