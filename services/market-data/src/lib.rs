//! Market Data
//!
//! Turns a raw market-data log into replayable state:
//! - Normalized, time-ordered events with a frozen tick size
//! - Book state from ORDERBOOK snapshots overlaid by BBO quotes
//! - Anchored, gap-free tick ladders
//! - A trade tape with print aggregation
//!
//! # Architecture
//!
//! ```text
//!   CSV log
//!      │
//!  ┌───▼──────┐
//!  │Normalizer│  ← parses, dedupes, orders, infers tick size
//!  └───┬──────┘
//!      │ MarketEvent
//!   ┌──┴───────┬───────────┐
//!   │          │           │
//! ┌─▼──┐   ┌───▼───┐   ┌───▼───┐
//! │Book│   │ Tape  │   │Volume │
//! └─┬──┘   └───┬───┘   └───┬───┘
//!   │          │ last      │
//! ┌─▼──────────▼───────────▼──┐
//! │      LadderBuilder        │
//! └───────────────────────────┘
//! ```

pub mod events;
pub mod ingestion;
pub mod ladder;
pub mod order_book;
pub mod parse;
pub mod tick_inference;
pub mod trades;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
