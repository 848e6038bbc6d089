//! Replay configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file (or
//! no file at all) is a valid configuration. Decimal values are written as
//! strings, e.g. `tick_size = "0.25"`.

use std::path::Path;

use market_data::ingestion::NormalizerConfig;
use matching_engine::EngineConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::numeric::TickSize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default)]
    pub normalizer: NormalizerSection,
    #[serde(default)]
    pub ladder: LadderSection,
    #[serde(default)]
    pub execution: ExecutionSection,
    #[serde(default)]
    pub playback: PlaybackSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerSection {
    /// Fixed tick size. Inference is skipped when set.
    #[serde(default)]
    pub tick_size: Option<Decimal>,
    #[serde(default = "defaults::inference_min_samples")]
    pub inference_min_samples: usize,
    #[serde(default = "defaults::max_samples")]
    pub max_samples: usize,
    #[serde(default = "defaults::fallback_tick_size")]
    pub fallback_tick_size: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderSection {
    /// Ticks shown on each side of the center.
    #[serde(default = "defaults::half_width")]
    pub half_width: u32,
    /// Ticks added per scroll request.
    #[serde(default = "defaults::extend_batch")]
    pub extend_batch: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSection {
    #[serde(default = "defaults::multiplier")]
    pub multiplier: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSection {
    #[serde(default = "defaults::speed")]
    pub speed: f64,
    #[serde(default = "defaults::min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "defaults::max_delay_ms")]
    pub max_delay_ms: u64,
    /// Trades this close together (same price and aggressor) merge into one print.
    #[serde(default = "defaults::aggregation_window_ms")]
    pub aggregation_window_ms: i64,
    /// Prints kept on the tape.
    #[serde(default = "defaults::tape_capacity")]
    pub tape_capacity: usize,
}

mod defaults {
    use rust_decimal::Decimal;

    pub fn log_level() -> String {
        "info".into()
    }

    pub fn inference_min_samples() -> usize {
        20
    }

    pub fn max_samples() -> usize {
        1_000
    }

    pub fn fallback_tick_size() -> Decimal {
        Decimal::new(1, 2)
    }

    pub fn half_width() -> u32 {
        80
    }

    pub fn extend_batch() -> u32 {
        40
    }

    pub fn multiplier() -> Decimal {
        Decimal::ONE
    }

    pub fn speed() -> f64 {
        1.0
    }

    pub fn min_delay_ms() -> u64 {
        1
    }

    pub fn max_delay_ms() -> u64 {
        1_000
    }

    pub fn aggregation_window_ms() -> i64 {
        5
    }

    pub fn tape_capacity() -> usize {
        500
    }
}

impl Default for NormalizerSection {
    fn default() -> Self {
        Self {
            tick_size: None,
            inference_min_samples: defaults::inference_min_samples(),
            max_samples: defaults::max_samples(),
            fallback_tick_size: defaults::fallback_tick_size(),
        }
    }
}

impl Default for LadderSection {
    fn default() -> Self {
        Self {
            half_width: defaults::half_width(),
            extend_batch: defaults::extend_batch(),
        }
    }
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            multiplier: defaults::multiplier(),
        }
    }
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self {
            speed: defaults::speed(),
            min_delay_ms: defaults::min_delay_ms(),
            max_delay_ms: defaults::max_delay_ms(),
            aggregation_window_ms: defaults::aggregation_window_ms(),
            tape_capacity: defaults::tape_capacity(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level(),
            normalizer: NormalizerSection::default(),
            ladder: LadderSection::default(),
            execution: ExecutionSection::default(),
            playback: PlaybackSection::default(),
        }
    }
}

impl ReplayConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: ReplayConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let playback = &self.playback;
        if !(playback.speed.is_finite() && playback.speed > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "playback.speed must be positive, got {}",
                playback.speed
            )));
        }
        if playback.min_delay_ms > playback.max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "playback.min_delay_ms ({}) exceeds max_delay_ms ({})",
                playback.min_delay_ms, playback.max_delay_ms
            )));
        }
        if playback.aggregation_window_ms < 0 {
            return Err(ConfigError::Invalid(
                "playback.aggregation_window_ms must not be negative".into(),
            ));
        }
        if self.ladder.half_width == 0 {
            return Err(ConfigError::Invalid("ladder.half_width must be positive".into()));
        }
        if self.execution.multiplier <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "execution.multiplier must be positive, got {}",
                self.execution.multiplier
            )));
        }
        self.normalizer_config().map(|_| ())
    }

    pub fn normalizer_config(&self) -> Result<NormalizerConfig, ConfigError> {
        let section = &self.normalizer;
        let tick_size = section
            .tick_size
            .map(TickSize::new)
            .transpose()
            .map_err(|e| ConfigError::Invalid(format!("normalizer.tick_size: {e}")))?;
        let fallback_tick_size = TickSize::new(section.fallback_tick_size)
            .map_err(|e| ConfigError::Invalid(format!("normalizer.fallback_tick_size: {e}")))?;

        Ok(NormalizerConfig {
            tick_size,
            inference_min_samples: section.inference_min_samples,
            max_samples: section.max_samples,
            fallback_tick_size,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            multiplier: self.execution.multiplier,
        }
    }
}
