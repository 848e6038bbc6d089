//! Replayed order book state
//!
//! Mirrors the most recent ORDERBOOK snapshot, overlaid by any BBO updates
//! that arrived after it. Uses `BTreeMap` for deterministic sorted iteration.
//!
//! - ORDERBOOK replaces both sides wholesale
//! - BBO sets the top level of each side; levels that would sit through the
//!   new top are dropped, and a zero size removes the level
//! - TRADE leaves the book untouched (the next snapshot reflects it)

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::book::{BookLevel, BookSnapshot};
use types::numeric::{Price, Quantity};
use types::order::Side;

use crate::events::{MarketEvent, MarketEventPayload};

/// Current best-known depth.
#[derive(Debug, Clone, Default)]
pub struct BookState {
    /// Ascending; best bid is the last key.
    bids: BTreeMap<Price, Quantity>,
    /// Ascending; best ask is the first key.
    asks: BTreeMap<Price, Quantity>,
    /// Last sequence number processed.
    last_sequence: u64,
    /// Timestamp of the last book-changing event.
    last_update: Option<i64>,
}

impl BookState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build directly from a snapshot.
    pub fn from_snapshot(snapshot: &BookSnapshot) -> Self {
        let mut book = Self::new();
        book.replace(snapshot);
        book
    }

    /// Apply one market event. Returns whether the book changed.
    pub fn apply_event(&mut self, event: &MarketEvent) -> bool {
        let changed = match &event.payload {
            MarketEventPayload::OrderBook(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            MarketEventPayload::Bbo { bid, ask } => {
                self.apply_bbo(*bid, *ask);
                true
            }
            MarketEventPayload::Trade(_) => false,
        };
        self.last_sequence = event.sequence;
        if changed {
            self.last_update = Some(event.timestamp);
        }
        changed
    }

    /// Replace both sides with a full snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &BookSnapshot) {
        self.replace(snapshot);
    }

    /// Overlay a top-of-book quote.
    pub fn apply_bbo(&mut self, bid: BookLevel, ask: BookLevel) {
        // Bids above the new best bid are stale.
        self.bids.retain(|price, _| *price <= bid.price);
        set_level(&mut self.bids, bid);

        // Asks below the new best ask are stale.
        self.asks.retain(|price, _| *price >= ask.price);
        set_level(&mut self.asks, ask);
    }

    pub fn best_bid(&self) -> Option<BookLevel> {
        self.bids
            .iter()
            .next_back()
            .map(|(price, size)| BookLevel::new(*price, *size))
    }

    pub fn best_ask(&self) -> Option<BookLevel> {
        self.asks
            .iter()
            .next()
            .map(|(price, size)| BookLevel::new(*price, *size))
    }

    /// Get the mid-market price (average of best bid and best ask).
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid
                .price
                .as_decimal()
                .checked_add(ask.price.as_decimal())
                .map(|sum| sum / Decimal::from(2)),
            _ => None,
        }
    }

    /// Get the spread between best ask and best bid.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price.as_decimal() - bid.price.as_decimal()),
            _ => None,
        }
    }

    /// Resting size at an exact price on one side.
    pub fn size_at(&self, side: Side, price: Price) -> Quantity {
        self.levels(side)
            .get(&price)
            .copied()
            .unwrap_or_else(Quantity::zero)
    }

    /// Owned snapshot, both sides best-first.
    pub fn snapshot(&self) -> BookSnapshot {
        self.depth_snapshot(usize::MAX)
    }

    /// Snapshot limited to `max_levels` per side.
    pub fn depth_snapshot(&self, max_levels: usize) -> BookSnapshot {
        let bids = self
            .bids
            .iter()
            .rev()
            .take(max_levels)
            .map(|(price, size)| BookLevel::new(*price, *size))
            .collect();
        let asks = self
            .asks
            .iter()
            .take(max_levels)
            .map(|(price, size)| BookLevel::new(*price, *size))
            .collect();
        BookSnapshot::new(bids, asks)
    }

    /// Number of bid price levels.
    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    /// Number of ask price levels.
    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Last processed sequence number.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn last_update(&self) -> Option<i64> {
        self.last_update
    }

    fn levels(&self, side: Side) -> &BTreeMap<Price, Quantity> {
        match side {
            Side::BUY => &self.bids,
            Side::SELL => &self.asks,
        }
    }

    fn replace(&mut self, snapshot: &BookSnapshot) {
        self.bids = collect_side(&snapshot.bids);
        self.asks = collect_side(&snapshot.asks);
    }
}

/// Duplicate prices in a snapshot are summed; zero sizes are dropped.
fn collect_side(levels: &[BookLevel]) -> BTreeMap<Price, Quantity> {
    let mut side = BTreeMap::new();
    for level in levels.iter().filter(|level| !level.size.is_zero()) {
        side.entry(level.price)
            .and_modify(|size| *size = *size + level.size)
            .or_insert(level.size);
    }
    side
}

fn set_level(side: &mut BTreeMap<Price, Quantity>, level: BookLevel) {
    if level.size.is_zero() {
        side.remove(&level.price);
    } else {
        side.insert(level.price, level.size);
    }
}

/// Serializable summary of the top of book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopOfBook {
    pub best_bid: Option<BookLevel>,
    pub best_ask: Option<BookLevel>,
    pub last_sequence: u64,
}

impl From<&BookState> for TopOfBook {
    fn from(book: &BookState) -> Self {
        Self {
            best_bid: book.best_bid(),
            best_ask: book.best_ask(),
            last_sequence: book.last_sequence,
        }
    }
}
