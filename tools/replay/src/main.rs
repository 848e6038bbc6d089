//! tick-replay
//!
//! Replays a captured market-data CSV log through the tick ladder and the
//! simulated matching engine, pacing events by their recorded timestamps.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use replay::{load_log, ReplayConfig, ReplayScheduler, StepOutcome};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Market-data replay with simulated order execution
#[derive(Parser)]
#[clap(name = "tick-replay")]
#[clap(about = "Replay a market-data log against a simulated tick ladder")]
struct Cli {
    /// CSV log to replay
    log: PathBuf,

    /// TOML config file
    #[clap(long)]
    config: Option<PathBuf>,

    /// Playback speed multiplier (overrides config)
    #[clap(long)]
    speed: Option<f64>,

    /// Run as fast as possible, ignoring recorded gaps
    #[clap(long)]
    no_pacing: bool,

    /// Print a JSON snapshot to stdout every N events
    #[clap(long)]
    snapshot_every: Option<u64>,

    /// Fail unless the final state checksum matches
    #[clap(long)]
    expect_checksum: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ReplayConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ReplayConfig::default(),
    };
    if let Some(speed) = cli.speed {
        config.playback.speed = speed;
        config.validate()?;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(version = replay::VERSION, log = %cli.log.display(), "Starting tick replay");

    let log = load_log(&cli.log, &config)
        .with_context(|| format!("loading log {}", cli.log.display()))?;
    info!(stats = ?log.stats, source = ?log.tick_size_source, "Log normalized");

    let mut scheduler = ReplayScheduler::new(log, &config)?;
    if let Some(expected) = cli.expect_checksum.clone() {
        scheduler = scheduler.with_expected_checksum(expected);
    }

    if cli.no_pacing && cli.snapshot_every.is_none() {
        let metrics = scheduler.run_to_end()?;
        return summarize(&scheduler, &metrics.state_checksum);
    }

    loop {
        let before = scheduler.cursor();
        let outcome = scheduler.step();
        if matches!(outcome, StepOutcome::Paused) {
            warn!("Replay paused with no command source, stopping");
            scheduler.stop();
            break;
        }

        scheduler.log_executions();
        let applied = scheduler.cursor() as u64;
        if let Some(every) = cli.snapshot_every.filter(|n| *n > 0) {
            if applied > before as u64 && applied % every == 0 {
                println!("{}", serde_json::to_string(&scheduler.snapshot()?)?);
            }
        }

        match outcome {
            StepOutcome::Delay(delay) if !cli.no_pacing => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = tokio::signal::ctrl_c() => {
                        scheduler.stop();
                        break;
                    }
                }
            }
            StepOutcome::Delay(_) => {}
            StepOutcome::Finished | StepOutcome::Paused => break,
        }
    }

    let checksum = scheduler.state_checksum()?;
    if let Some(expected) = &cli.expect_checksum {
        anyhow::ensure!(
            &checksum == expected,
            "state checksum mismatch: expected {expected}, got {checksum}"
        );
    }
    summarize(&scheduler, &checksum)
}

fn summarize(scheduler: &ReplayScheduler, checksum: &str) -> Result<()> {
    let session = scheduler.session();
    let position = session.position();
    info!(
        events = scheduler.cursor(),
        net_quantity = %position.net_quantity,
        average_price = %position.average_price,
        realized_pnl = %position.realized_pnl,
        unrealized_pnl = %position.unrealized_pnl,
        total_pnl = %position.total_pnl(),
        fills = session.fills().len(),
        working_orders = session.working_orders().len(),
        checksum,
        "Replay finished"
    );
    Ok(())
}
