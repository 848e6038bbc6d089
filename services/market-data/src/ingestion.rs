//! Event normalization for raw market-data logs
//!
//! Turns heterogeneous tabular rows into a canonical, time-ordered sequence
//! of `MarketEvent`s:
//! - Malformed rows are counted and skipped, never raised
//! - Exact duplicate rows are dropped
//! - Events sort by timestamp, then book < quote < trade
//! - Tick size is inferred once from observed prices and then frozen

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use types::book::{BookLevel, BookSnapshot};
use types::numeric::{Price, Quantity, TickSize};
use types::order::Side;
use types::trade::TapeTrade;

use crate::events::{MarketEvent, MarketEventPayload};
use crate::parse::{exchange_clock_millis, parse_field, parse_list, parse_timestamp};
use crate::tick_inference::TickSizeEstimator;

/// Errors that can occur while reading a log. Row-level problems never
/// surface here; only the source itself failing does.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("failed to open '{path}'")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read market-data log")]
    Read(#[from] csv::Error),
}

/// One row of the log exactly as written. Every column is optional text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    #[serde(alias = "type")]
    pub event_type: Option<String>,
    #[serde(alias = "ts", alias = "datetime", alias = "time")]
    pub timestamp: Option<String>,
    pub ssboe: Option<String>,
    pub usecs: Option<String>,
    pub trade_price: Option<String>,
    pub trade_size: Option<String>,
    pub aggressor: Option<String>,
    pub bid_price: Option<String>,
    pub bid_size: Option<String>,
    pub ask_price: Option<String>,
    pub ask_size: Option<String>,
    pub book_bid_prices: Option<String>,
    pub book_bid_sizes: Option<String>,
    pub book_ask_prices: Option<String>,
    pub book_ask_sizes: Option<String>,
}

/// Recognised event kinds of a raw row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    OrderBook,
    Bbo,
    Trade,
}

impl RawEventKind {
    /// Case-insensitive; `_` and `-` are ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_uppercase();
        match key.as_str() {
            "ORDERBOOK" | "BOOK" | "DEPTH" => Some(RawEventKind::OrderBook),
            "BBO" | "QUOTE" => Some(RawEventKind::Bbo),
            "TRADE" | "PRINT" => Some(RawEventKind::Trade),
            _ => None,
        }
    }
}

/// Why a row was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingEventType,
    UnknownEventType,
    Malformed,
}

/// Result of normalizing a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Row produced an event.
    Accepted,
    /// Identical row seen before; dropped.
    Duplicate,
    /// Row skipped.
    Rejected(RejectReason),
}

/// Where the frozen tick size came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickSizeSource {
    Configured,
    Inferred,
    Fallback,
}

/// Configuration for the normalizer.
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Fixed tick size; disables inference when set.
    pub tick_size: Option<TickSize>,
    /// Prices to observe before inferring.
    pub inference_min_samples: usize,
    /// Cap on distinct prices kept for inference.
    pub max_samples: usize,
    /// Used when inference never succeeds.
    pub fallback_tick_size: TickSize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            tick_size: None,
            inference_min_samples: 20,
            max_samples: 1_000,
            fallback_tick_size: TickSize::snap(Decimal::new(1, 2)),
        }
    }
}

/// Counters for one normalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub records_seen: u64,
    pub accepted: u64,
    pub duplicates: u64,
    pub malformed: u64,
    pub unknown_type: u64,
    pub fallback_timestamps: u64,
}

/// Output of a normalization run.
#[derive(Debug, Clone)]
pub struct NormalizedLog {
    /// Sorted, with sequences assigned 0..n
    pub events: Vec<MarketEvent>,
    pub tick_size: TickSize,
    pub tick_size_source: TickSizeSource,
    pub stats: NormalizationStats,
}

/// Normalizes raw rows into an ordered event log.
pub struct Normalizer {
    config: NormalizerConfig,
    estimator: TickSizeEstimator,
    seen: HashSet<RawRecord>,
    pending: Vec<MarketEvent>,
    /// Latest timestamp handed out so far. Rows with no usable timestamp
    /// continue from it one millisecond at a time.
    fallback_clock: i64,
    stats: NormalizationStats,
}

impl Normalizer {
    /// Create a new normalizer with the given configuration.
    pub fn new(config: NormalizerConfig) -> Self {
        let estimator =
            TickSizeEstimator::new(config.inference_min_samples, config.max_samples);
        Self {
            config,
            estimator,
            seen: HashSet::new(),
            pending: Vec::new(),
            fallback_clock: 0,
            stats: NormalizationStats::default(),
        }
    }

    /// Create a new normalizer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(NormalizerConfig::default())
    }

    /// Normalize a whole batch of rows in one call.
    pub fn normalize<I>(config: NormalizerConfig, records: I) -> NormalizedLog
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut normalizer = Self::new(config);
        for record in records {
            normalizer.push(record);
        }
        normalizer.finish()
    }

    /// Normalize one row.
    pub fn push(&mut self, record: RawRecord) -> RecordOutcome {
        self.stats.records_seen += 1;

        if self.seen.contains(&record) {
            self.stats.duplicates += 1;
            debug!(row = self.stats.records_seen, "Dropping duplicate record");
            return RecordOutcome::Duplicate;
        }

        let outcome = match self.convert(&record) {
            Ok(event) => {
                if self.config.tick_size.is_none() {
                    for price in event.prices() {
                        self.estimator.observe(price);
                    }
                }
                self.pending.push(event);
                self.stats.accepted += 1;
                RecordOutcome::Accepted
            }
            Err(reason) => {
                match reason {
                    RejectReason::UnknownEventType | RejectReason::MissingEventType => {
                        self.stats.unknown_type += 1
                    }
                    RejectReason::Malformed => self.stats.malformed += 1,
                }
                debug!(
                    row = self.stats.records_seen,
                    reason = ?reason,
                    event_type = record.event_type.as_deref().unwrap_or(""),
                    "Skipping record"
                );
                RecordOutcome::Rejected(reason)
            }
        };

        self.seen.insert(record);
        outcome
    }

    /// Order the accepted events, assign sequences and freeze the tick size.
    pub fn finish(mut self) -> NormalizedLog {
        // Stable: equal (timestamp, priority) keep input order.
        self.pending
            .sort_by(|a, b| {
                a.timestamp
                    .cmp(&b.timestamp)
                    .then_with(|| a.type_priority().cmp(&b.type_priority()))
            });
        for (sequence, event) in self.pending.iter_mut().enumerate() {
            event.sequence = sequence as u64;
        }

        let (tick_size, tick_size_source) = match self.config.tick_size {
            Some(configured) => (configured, TickSizeSource::Configured),
            None => match self.estimator.finish() {
                Some(inferred) => (inferred, TickSizeSource::Inferred),
                None => {
                    warn!(
                        fallback = %self.config.fallback_tick_size,
                        "Could not infer tick size; using fallback"
                    );
                    (self.config.fallback_tick_size, TickSizeSource::Fallback)
                }
            },
        };

        if self.stats.malformed > 0 || self.stats.unknown_type > 0 {
            warn!(
                malformed = self.stats.malformed,
                unknown_type = self.stats.unknown_type,
                "Skipped unusable records"
            );
        }
        info!(
            records = self.stats.records_seen,
            accepted = self.stats.accepted,
            duplicates = self.stats.duplicates,
            fallback_timestamps = self.stats.fallback_timestamps,
            tick_size = %tick_size,
            source = ?tick_size_source,
            "Normalization complete"
        );

        NormalizedLog {
            events: self.pending,
            tick_size,
            tick_size_source,
            stats: self.stats,
        }
    }

    /// Events accepted so far, in arrival order.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> &NormalizationStats {
        &self.stats
    }

    /// Finest tick size the log can end up with. A price whose tick fits at
    /// this size fits at any coarser one.
    fn range_tick_size(&self) -> TickSize {
        match self.config.tick_size {
            Some(configured) => configured,
            None => {
                let finest = TickSize::snap(Decimal::ZERO);
                if self.config.fallback_tick_size.as_decimal() < finest.as_decimal() {
                    self.config.fallback_tick_size
                } else {
                    finest
                }
            }
        }
    }

    fn convert(&mut self, record: &RawRecord) -> Result<MarketEvent, RejectReason> {
        let kind = record
            .event_type
            .as_deref()
            .ok_or(RejectReason::MissingEventType)
            .and_then(|raw| RawEventKind::parse(raw).ok_or(RejectReason::UnknownEventType))?;

        let timestamp = resolve_timestamp(record);
        let payload = match kind {
            RawEventKind::Trade => trade_payload(record, timestamp.unwrap_or(0)),
            RawEventKind::Bbo => bbo_payload(record),
            RawEventKind::OrderBook => book_payload(record),
        }
        .ok_or(RejectReason::Malformed)?;
        if !within_range(&payload, self.range_tick_size()) {
            return Err(RejectReason::Malformed);
        }

        let timestamp = match timestamp {
            Some(ts) => ts,
            None => {
                self.stats.fallback_timestamps += 1;
                self.fallback_clock.saturating_add(1)
            }
        };
        self.fallback_clock = self.fallback_clock.max(timestamp);

        let payload = match payload {
            MarketEventPayload::Trade(mut trade) => {
                trade.timestamp = timestamp;
                MarketEventPayload::Trade(trade)
            }
            other => other,
        };

        Ok(MarketEvent::new(0, timestamp, payload))
    }
}

/// Read raw rows from CSV. Rows that fail to deserialize are skipped.
pub fn read_csv<R: Read>(source: R) -> Result<Vec<RawRecord>, IngestionError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut records = Vec::new();
    let mut skipped = 0u64;
    for (row, result) in reader.deserialize::<RawRecord>().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                skipped += 1;
                debug!(row = row + 1, error = %err, "Skipping unreadable row");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped unreadable CSV rows");
    }
    Ok(records)
}

/// Open and read a CSV log from disk.
pub fn read_csv_path(path: impl AsRef<Path>) -> Result<Vec<RawRecord>, IngestionError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IngestionError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_csv(file)
}

/// Direct timestamp first, then the exchange-clock pair.
fn resolve_timestamp(record: &RawRecord) -> Option<i64> {
    if let Some(ts) = record.timestamp.as_deref().and_then(parse_timestamp) {
        return Some(ts);
    }
    match (record.ssboe.as_deref(), record.usecs.as_deref()) {
        (Some(ssboe), Some(usecs)) => exchange_clock_millis(ssboe, usecs),
        _ => None,
    }
}

/// Largest size a single level or print may carry.
fn max_size() -> Decimal {
    Decimal::new(1_000_000_000_000_000, 0)
}

/// Every price maps to a tick inside `±MAX_TICK` at `tick_size` and every
/// size is at most `max_size()`.
fn within_range(payload: &MarketEventPayload, tick_size: TickSize) -> bool {
    let fits = |price: Price, size: Quantity| {
        tick_size.checked_tick_of(price).is_some() && size.as_decimal() <= max_size()
    };
    match payload {
        MarketEventPayload::Trade(trade) => fits(trade.price, trade.size),
        MarketEventPayload::Bbo { bid, ask } => {
            fits(bid.price, bid.size) && fits(ask.price, ask.size)
        }
        MarketEventPayload::OrderBook(book) => book
            .bids
            .iter()
            .chain(&book.asks)
            .all(|level| fits(level.price, level.size)),
    }
}

fn parse_price(raw: Option<&str>) -> Option<Price> {
    parse_field(raw).map(Price::new)
}

fn parse_size(raw: Option<&str>) -> Option<Quantity> {
    parse_field(raw).and_then(Quantity::try_new)
}

fn trade_payload(record: &RawRecord, timestamp: i64) -> Option<MarketEventPayload> {
    let price = parse_price(record.trade_price.as_deref())?;
    let size = parse_size(record.trade_size.as_deref()).filter(|size| !size.is_zero())?;
    let aggressor = record.aggressor.as_deref().and_then(Side::from_aggressor)?;
    Some(MarketEventPayload::Trade(TapeTrade::new(
        timestamp, price, size, aggressor,
    )))
}

fn bbo_payload(record: &RawRecord) -> Option<MarketEventPayload> {
    let bid = BookLevel::new(
        parse_price(record.bid_price.as_deref())?,
        parse_size(record.bid_size.as_deref())?,
    );
    let ask = BookLevel::new(
        parse_price(record.ask_price.as_deref())?,
        parse_size(record.ask_size.as_deref())?,
    );
    Some(MarketEventPayload::Bbo { bid, ask })
}

fn book_payload(record: &RawRecord) -> Option<MarketEventPayload> {
    let bids = book_side(
        record.book_bid_prices.as_deref(),
        record.book_bid_sizes.as_deref(),
    )?;
    let asks = book_side(
        record.book_ask_prices.as_deref(),
        record.book_ask_sizes.as_deref(),
    )?;
    Some(MarketEventPayload::OrderBook(BookSnapshot::new(
        sorted_levels(bids, Side::BUY),
        sorted_levels(asks, Side::SELL),
    )))
}

/// Price and size arrays must pair up one to one.
fn book_side(prices: Option<&str>, sizes: Option<&str>) -> Option<Vec<BookLevel>> {
    let prices = prices.map(parse_list).unwrap_or_default();
    let sizes = sizes.map(parse_list).unwrap_or_default();
    if prices.len() != sizes.len() {
        return None;
    }
    prices
        .into_iter()
        .zip(sizes)
        .map(|(price, size)| Quantity::try_new(size).map(|size| BookLevel::new(Price::new(price), size)))
        .collect()
}

/// Best-first: bids descending, asks ascending. Zero-size levels dropped.
fn sorted_levels(mut levels: Vec<BookLevel>, side: Side) -> Vec<BookLevel> {
    levels.retain(|level| !level.size.is_zero());
    match side {
        Side::BUY => levels.sort_by(|a, b| b.price.cmp(&a.price)),
        Side::SELL => levels.sort_by(|a, b| a.price.cmp(&b.price)),
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn trade_row(ts: &str, price: &str, size: &str, aggressor: &str) -> RawRecord {
        RawRecord {
            event_type: Some("TRADE".into()),
            timestamp: Some(ts.into()),
            trade_price: Some(price.into()),
            trade_size: Some(size.into()),
            aggressor: Some(aggressor.into()),
            ..Default::default()
        }
    }

    fn bbo_row(ts: &str, bid: &str, ask: &str) -> RawRecord {
        RawRecord {
            event_type: Some("BBO".into()),
            timestamp: Some(ts.into()),
            bid_price: Some(bid.into()),
            bid_size: Some("5".into()),
            ask_price: Some(ask.into()),
            ask_size: Some("7".into()),
            ..Default::default()
        }
    }

    fn book_row(ts: &str, bid_px: &str, bid_sz: &str, ask_px: &str, ask_sz: &str) -> RawRecord {
        RawRecord {
            event_type: Some("ORDERBOOK".into()),
            timestamp: Some(ts.into()),
            book_bid_prices: Some(bid_px.into()),
            book_bid_sizes: Some(bid_sz.into()),
            book_ask_prices: Some(ask_px.into()),
            book_ask_sizes: Some(ask_sz.into()),
            ..Default::default()
        }
    }

    fn config_with_tick(tick: &str) -> NormalizerConfig {
        NormalizerConfig {
            tick_size: Some(TickSize::new(tick.parse().unwrap()).unwrap()),
            ..NormalizerConfig::default()
        }
    }

    #[test]
    fn test_event_kind_aliases() {
        assert_eq!(RawEventKind::parse("order_book"), Some(RawEventKind::OrderBook));
        assert_eq!(RawEventKind::parse("Depth"), Some(RawEventKind::OrderBook));
        assert_eq!(RawEventKind::parse("quote"), Some(RawEventKind::Bbo));
        assert_eq!(RawEventKind::parse("trade"), Some(RawEventKind::Trade));
        assert_eq!(RawEventKind::parse("HEARTBEAT"), None);
    }

    #[test]
    fn test_sorted_with_type_priority() {
        let rows = vec![
            trade_row("1000", "100.25", "1", "BUY"),
            bbo_row("1000", "100", "100.25"),
            book_row("1000", "[100]", "[3]", "[100.25]", "[4]"),
            trade_row("999", "100", "2", "S"),
        ];
        let log = Normalizer::normalize(config_with_tick("0.25"), rows);
        let labels: Vec<_> = log.events.iter().map(|e| e.event_type_label()).collect();
        assert_eq!(labels, vec!["TRADE", "ORDERBOOK", "BBO", "TRADE"]);
        let sequences: Vec<_> = log.events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);
        assert_eq!(log.tick_size_source, TickSizeSource::Configured);
    }

    #[test]
    fn test_duplicates_dropped() {
        let mut normalizer = Normalizer::with_defaults();
        let row = trade_row("1000", "100", "1", "BUY");
        assert_eq!(normalizer.push(row.clone()), RecordOutcome::Accepted);
        assert_eq!(normalizer.push(row), RecordOutcome::Duplicate);
        let log = normalizer.finish();
        assert_eq!(log.events.len(), 1);
        assert_eq!(log.stats.duplicates, 1);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let mut normalizer = Normalizer::with_defaults();
        assert_eq!(
            normalizer.push(trade_row("1", "NaN", "1", "BUY")),
            RecordOutcome::Rejected(RejectReason::Malformed)
        );
        assert_eq!(
            normalizer.push(trade_row("2", "100", "1", "")),
            RecordOutcome::Rejected(RejectReason::Malformed)
        );
        assert_eq!(
            normalizer.push(trade_row("3", "100", "-1", "B")),
            RecordOutcome::Rejected(RejectReason::Malformed)
        );
        assert_eq!(
            normalizer.push(RawRecord {
                event_type: Some("STATUS".into()),
                ..Default::default()
            }),
            RecordOutcome::Rejected(RejectReason::UnknownEventType)
        );
        assert_eq!(
            normalizer.push(RawRecord::default()),
            RecordOutcome::Rejected(RejectReason::MissingEventType)
        );
        let log = normalizer.finish();
        assert!(log.events.is_empty());
        assert_eq!(log.stats.malformed, 3);
        assert_eq!(log.stats.unknown_type, 2);
    }

    #[test]
    fn test_book_sides_validated_independently() {
        let mut normalizer = Normalizer::new(config_with_tick("0.25"));
        // Ask arrays mismatched: rejected.
        assert_eq!(
            normalizer.push(book_row("1", "[100]", "[3]", "[100.25,100.5]", "[4]")),
            RecordOutcome::Rejected(RejectReason::Malformed)
        );
        // Bid side empty but consistent; ask side fine.
        assert_eq!(
            normalizer.push(book_row("2", "[]", "[]", "[100.25]", "[4]")),
            RecordOutcome::Accepted
        );
        let log = normalizer.finish();
        match &log.events[0].payload {
            MarketEventPayload::OrderBook(book) => {
                assert!(book.bids.is_empty());
                assert_eq!(book.asks.len(), 1);
            }
            other => panic!("Expected ORDERBOOK, got {:?}", other),
        }
    }

    #[test]
    fn test_book_levels_sorted_best_first() {
        let log = Normalizer::normalize(
            config_with_tick("0.25"),
            vec![book_row("1", "99.5;100;99.75", "1;2;3", "101|100.5", "4|5")],
        );
        match &log.events[0].payload {
            MarketEventPayload::OrderBook(book) => {
                let bids: Vec<String> = book.bids.iter().map(|l| l.price.to_string()).collect();
                let asks: Vec<String> = book.asks.iter().map(|l| l.price.to_string()).collect();
                assert_eq!(bids, vec!["100", "99.75", "99.5"]);
                assert_eq!(asks, vec!["100.5", "101"]);
            }
            other => panic!("Expected ORDERBOOK, got {:?}", other),
        }
    }

    #[test]
    fn test_exchange_clock_and_fallback_timestamps() {
        let clocked = RawRecord {
            timestamp: None,
            ssboe: Some("1708123456".into()),
            usecs: Some("789500".into()),
            ..trade_row("", "100", "1", "BUY")
        };
        let unclocked_a = trade_row("", "100.5", "1", "BUY");
        let unclocked_b = trade_row("", "101", "1", "SELL");

        let log = Normalizer::normalize(
            config_with_tick("0.5"),
            vec![clocked, unclocked_a, unclocked_b],
        );
        let stamps: Vec<i64> = log.events.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![1_708_123_456_789, 1_708_123_456_790, 1_708_123_456_791]);
        assert_eq!(log.stats.fallback_timestamps, 2);
        // Trade payload carries the resolved timestamp too.
        assert_eq!(log.events[0].as_trade().unwrap().timestamp, 1_708_123_456_789);
        assert_eq!(log.events[2].as_trade().unwrap().timestamp, 1_708_123_456_791);
    }

    #[test]
    fn test_fallback_timestamps_stay_near_their_neighbours() {
        let rows = vec![
            trade_row("", "100", "1", "BUY"),
            trade_row("5000", "100.25", "1", "BUY"),
            trade_row("6000", "100.5", "1", "BUY"),
            trade_row("", "100.75", "1", "SELL"),
            trade_row("7000", "101", "1", "SELL"),
        ];
        let log = Normalizer::normalize(config_with_tick("0.25"), rows);
        let order: Vec<(i64, String)> = log
            .events
            .iter()
            .map(|e| (e.timestamp, e.as_trade().unwrap().price.to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                (1, "100".to_string()),
                (5000, "100.25".to_string()),
                (6000, "100.5".to_string()),
                (6001, "100.75".to_string()),
                (7000, "101".to_string()),
            ]
        );
        assert_eq!(log.stats.fallback_timestamps, 2);
    }

    #[test]
    fn test_out_of_range_prices_and_sizes_are_malformed() {
        let mut normalizer = Normalizer::new(NormalizerConfig::default());
        // 1e27 / 0.01 does not fit a Decimal at all.
        assert_eq!(
            normalizer.push(trade_row("1", "1e27", "1", "BUY")),
            RecordOutcome::Rejected(RejectReason::Malformed)
        );
        // Fits a Decimal but not the tick range at the finest tick size.
        assert_eq!(
            normalizer.push(trade_row("2", "1e14", "1", "BUY")),
            RecordOutcome::Rejected(RejectReason::Malformed)
        );
        assert_eq!(
            normalizer.push(bbo_row("3", "100", "1e20")),
            RecordOutcome::Rejected(RejectReason::Malformed)
        );
        assert_eq!(
            normalizer.push(trade_row("4", "100", "1e20", "BUY")),
            RecordOutcome::Rejected(RejectReason::Malformed)
        );
        assert_eq!(
            normalizer.push(trade_row("5", "1e12", "1", "BUY")),
            RecordOutcome::Accepted
        );
        assert_eq!(normalizer.stats().malformed, 4);

        // A configured tick size sets the bound.
        let mut coarse = Normalizer::new(config_with_tick("1"));
        assert_eq!(
            coarse.push(trade_row("1", "1e14", "1", "BUY")),
            RecordOutcome::Accepted
        );
        assert_eq!(
            coarse.push(trade_row("2", "1e20", "1", "BUY")),
            RecordOutcome::Rejected(RejectReason::Malformed)
        );
    }

    #[test]
    fn test_tick_size_inferred_from_prices() {
        let config = NormalizerConfig {
            inference_min_samples: 4,
            ..NormalizerConfig::default()
        };
        let rows = vec![
            trade_row("1", "100", "1", "BUY"),
            trade_row("2", "100.25", "1", "BUY"),
            trade_row("3", "100.75", "1", "SELL"),
            trade_row("4", "100.5", "1", "SELL"),
        ];
        let log = Normalizer::normalize(config, rows);
        assert_eq!(log.tick_size_source, TickSizeSource::Inferred);
        assert_eq!(log.tick_size.as_decimal(), Decimal::new(25, 2));
    }

    #[test]
    fn test_tick_size_fallback_when_uninferable() {
        let log = Normalizer::normalize(
            NormalizerConfig::default(),
            vec![trade_row("1", "100", "1", "BUY")],
        );
        assert_eq!(log.tick_size_source, TickSizeSource::Fallback);
        assert_eq!(log.tick_size.as_decimal(), Decimal::new(1, 2));
    }

    #[test]
    fn test_read_csv_tolerates_missing_columns() {
        let data = "\
event_type,timestamp,trade_price,trade_size,aggressor
TRADE,1708123456789,100.25,2,BUY
TRADE,1708123456790,,2,SELL
";
        let records = read_csv(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].trade_price.as_deref(), Some("100.25"));
        assert_eq!(records[1].trade_price, None);
        assert_eq!(records[0].bid_price, None);
    }

    #[test]
    fn test_read_csv_path_missing_file() {
        let err = read_csv_path("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, IngestionError::Open { .. }));
    }
}
