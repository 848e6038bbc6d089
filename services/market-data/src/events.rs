//! Canonical market-data events
//!
//! Defines the `MarketEvent` produced by the normalizer and consumed exactly
//! once by the replay scheduler. One payload variant per event kind.
//!
//! Events order by timestamp, then by type priority (book before quote before
//! trade, so book state is current before a same-instant trade is matched),
//! then by sequence.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use types::book::{BookLevel, BookSnapshot};
use types::numeric::Price;
use types::trade::TapeTrade;

/// A normalized market-data event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Position in the normalized log, assigned after ordering
    pub sequence: u64,
    /// Unix milliseconds
    pub timestamp: i64,
    /// Event-specific payload
    pub payload: MarketEventPayload,
}

/// Event-specific payloads
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum MarketEventPayload {
    /// Full depth snapshot, both sides best-first
    #[serde(rename = "ORDERBOOK")]
    OrderBook(BookSnapshot),

    /// Top-of-book quote update
    #[serde(rename = "BBO")]
    Bbo { bid: BookLevel, ask: BookLevel },

    /// Trade print
    #[serde(rename = "TRADE")]
    Trade(TapeTrade),
}

impl MarketEventPayload {
    /// Tie-break rank for events sharing a timestamp.
    pub fn type_priority(&self) -> u8 {
        match self {
            MarketEventPayload::OrderBook(_) => 0,
            MarketEventPayload::Bbo { .. } => 1,
            MarketEventPayload::Trade(_) => 2,
        }
    }
}

impl MarketEvent {
    pub fn new(sequence: u64, timestamp: i64, payload: MarketEventPayload) -> Self {
        Self {
            sequence,
            timestamp,
            payload,
        }
    }

    /// Get the event type as a string label for logging.
    pub fn event_type_label(&self) -> &'static str {
        match &self.payload {
            MarketEventPayload::OrderBook(_) => "ORDERBOOK",
            MarketEventPayload::Bbo { .. } => "BBO",
            MarketEventPayload::Trade(_) => "TRADE",
        }
    }

    pub fn type_priority(&self) -> u8 {
        self.payload.type_priority()
    }

    /// The trade print, if this is a trade.
    pub fn as_trade(&self) -> Option<&TapeTrade> {
        match &self.payload {
            MarketEventPayload::Trade(trade) => Some(trade),
            _ => None,
        }
    }

    /// Every price carried by the event (feeds tick-size inference).
    pub fn prices(&self) -> Vec<Price> {
        match &self.payload {
            MarketEventPayload::OrderBook(book) => book
                .bids
                .iter()
                .chain(book.asks.iter())
                .map(|level| level.price)
                .collect(),
            MarketEventPayload::Bbo { bid, ask } => vec![bid.price, ask.price],
            MarketEventPayload::Trade(trade) => vec![trade.price],
        }
    }
}

impl Ord for MarketEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.type_priority().cmp(&other.type_priority()))
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for MarketEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::numeric::Quantity;
    use types::order::Side;

    fn trade_event(seq: u64, ts: i64) -> MarketEvent {
        MarketEvent::new(
            seq,
            ts,
            MarketEventPayload::Trade(TapeTrade::new(
                ts,
                Price::from_u64(100),
                Quantity::from_u64(1),
                Side::BUY,
            )),
        )
    }

    fn book_event(seq: u64, ts: i64) -> MarketEvent {
        MarketEvent::new(
            seq,
            ts,
            MarketEventPayload::OrderBook(BookSnapshot::new(
                vec![BookLevel::new(Price::from_u64(99), Quantity::from_u64(3))],
                vec![BookLevel::new(Price::from_u64(101), Quantity::from_u64(4))],
            )),
        )
    }

    fn bbo_event(seq: u64, ts: i64) -> MarketEvent {
        MarketEvent::new(
            seq,
            ts,
            MarketEventPayload::Bbo {
                bid: BookLevel::new(Price::from_u64(99), Quantity::from_u64(1)),
                ask: BookLevel::new(Price::from_u64(100), Quantity::from_u64(1)),
            },
        )
    }

    #[test]
    fn test_same_timestamp_orders_book_quote_trade() {
        let mut events = vec![trade_event(0, 5), bbo_event(1, 5), book_event(2, 5)];
        events.sort();
        let labels: Vec<_> = events.iter().map(|e| e.event_type_label()).collect();
        assert_eq!(labels, vec!["ORDERBOOK", "BBO", "TRADE"]);
    }

    #[test]
    fn test_timestamp_dominates_type_priority() {
        let mut events = vec![book_event(0, 6), trade_event(1, 5)];
        events.sort();
        assert_eq!(events[0].event_type_label(), "TRADE");
    }

    #[test]
    fn test_prices_cover_every_level() {
        assert_eq!(book_event(0, 0).prices().len(), 2);
        assert_eq!(bbo_event(0, 0).prices().len(), 2);
        assert_eq!(trade_event(0, 0).prices(), vec![Price::from_u64(100)]);
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let e = bbo_event(42, 1_708_123_456_789);
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"event_type\":\"BBO\""));
        let deserialized: MarketEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(e, deserialized);
    }
}
