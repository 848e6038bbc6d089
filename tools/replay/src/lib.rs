//! Tick Replay
//!
//! Drives a normalized market-data log through book state, the tick ladder
//! and the simulated matching engine:
//! - `config`: TOML configuration with defaults
//! - `session`: explicit replay state, commands and pulled snapshots
//! - `scheduler`: cooperative one-event-per-step driver with pacing
//! - `checksum`: SHA-256 state checksums for determinism checks

pub mod checksum;
pub mod config;
pub mod scheduler;
pub mod session;

use std::path::Path;

use market_data::ingestion::{read_csv_path, IngestionError, NormalizedLog, Normalizer};
use tracing::info;
use types::errors::{LadderError, OrderError};

pub use config::{ConfigError, ReplayConfig};
pub use scheduler::{ReplayMetrics, ReplayScheduler, StepOutcome};
pub use session::{Command, Session, SessionSnapshot};

/// Crate version constant
pub const VERSION: &str = "0.1.0";

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("Order rejected: {0}")]
    Order(#[from] OrderError),

    #[error("Ladder error: {0}")]
    Ladder(#[from] LadderError),

    #[error("Snapshot encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Replay speed must be positive and finite, got {0}")]
    InvalidSpeed(f64),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

/// Read and normalize a CSV log with the configured normalizer settings.
pub fn load_log(
    path: impl AsRef<Path>,
    config: &ReplayConfig,
) -> Result<NormalizedLog, ReplayError> {
    let path = path.as_ref();
    let records = read_csv_path(path)?;
    let log = Normalizer::normalize(config.normalizer_config()?, records);
    info!(
        path = %path.display(),
        events = log.events.len(),
        tick_size = %log.tick_size.as_decimal(),
        "Log loaded"
    );
    Ok(log)
}
