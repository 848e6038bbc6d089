//! Trade tape and print aggregation
//!
//! Trades arrive one print at a time. The `PrintAggregator` merges bursts of
//! prints at the same price and aggressor that land within a short window,
//! and the `TradeTape` keeps a bounded history of the merged prints for
//! display along with the last trade and running volume totals.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::TapeTrade;

/// One or more tape trades merged into a single print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedPrint {
    pub first_timestamp: i64,
    pub last_timestamp: i64,
    pub price: Price,
    pub size: Quantity,
    pub aggressor: Side,
    /// Number of raw trades merged.
    pub trade_count: u32,
}

impl AggregatedPrint {
    pub fn from_trade(trade: &TapeTrade) -> Self {
        Self {
            first_timestamp: trade.timestamp,
            last_timestamp: trade.timestamp,
            price: trade.price,
            size: trade.size,
            aggressor: trade.aggressor,
            trade_count: 1,
        }
    }

    /// Whether `trade` continues this print within `window_ms`.
    pub fn accepts(&self, trade: &TapeTrade, window_ms: i64) -> bool {
        self.price == trade.price
            && self.aggressor == trade.aggressor
            && trade.timestamp - self.last_timestamp <= window_ms
    }

    fn merge(&mut self, trade: &TapeTrade) {
        self.size = self.size + trade.size;
        self.last_timestamp = self.last_timestamp.max(trade.timestamp);
        self.trade_count += 1;
    }

    pub fn notional(&self) -> Decimal {
        self.price.as_decimal() * self.size.as_decimal()
    }
}

/// Merges same-price, same-aggressor prints that arrive within a window.
///
/// Holds at most one pending print. The caller must `flush` on pause, stop
/// and end of stream so nothing is left pending.
#[derive(Debug, Clone)]
pub struct PrintAggregator {
    window_ms: i64,
    pending: Option<AggregatedPrint>,
}

impl PrintAggregator {
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms: window_ms.max(0),
            pending: None,
        }
    }

    /// Add a trade. Returns the previous print if this trade closed it.
    pub fn push(&mut self, trade: &TapeTrade) -> Option<AggregatedPrint> {
        match self.pending.as_mut() {
            Some(print) if print.accepts(trade, self.window_ms) => {
                print.merge(trade);
                None
            }
            _ => self.pending.replace(AggregatedPrint::from_trade(trade)),
        }
    }

    /// Emit whatever is pending.
    pub fn flush(&mut self) -> Option<AggregatedPrint> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<&AggregatedPrint> {
        self.pending.as_ref()
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }
}

/// Running traded volume by aggressor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeTotals {
    pub trade_count: u64,
    pub buy_volume: Decimal,
    pub sell_volume: Decimal,
}

impl TapeTotals {
    pub fn total_volume(&self) -> Decimal {
        self.buy_volume + self.sell_volume
    }
}

/// Bounded history of aggregated prints plus the last raw trade.
#[derive(Debug, Clone)]
pub struct TradeTape {
    /// Oldest first.
    prints: VecDeque<AggregatedPrint>,
    capacity: usize,
    last_trade: Option<TapeTrade>,
    totals: TapeTotals,
}

impl TradeTape {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            prints: VecDeque::with_capacity(capacity),
            capacity,
            last_trade: None,
            totals: TapeTotals::default(),
        }
    }

    /// Record a raw trade (last trade and totals only).
    pub fn record_trade(&mut self, trade: &TapeTrade) {
        self.totals.trade_count += 1;
        match trade.aggressor {
            Side::BUY => self.totals.buy_volume += trade.size.as_decimal(),
            Side::SELL => self.totals.sell_volume += trade.size.as_decimal(),
        }
        self.last_trade = Some(trade.clone());
    }

    /// Append a finished print, evicting the oldest at capacity.
    pub fn push_print(&mut self, print: AggregatedPrint) {
        if self.prints.len() >= self.capacity {
            self.prints.pop_front();
        }
        self.prints.push_back(print);
    }

    /// Get recent prints (newest first).
    pub fn recent_prints(&self, limit: usize) -> Vec<AggregatedPrint> {
        self.prints.iter().rev().take(limit).cloned().collect()
    }

    /// All retained prints, oldest first.
    pub fn prints(&self) -> Vec<AggregatedPrint> {
        self.prints.iter().cloned().collect()
    }

    pub fn last_trade(&self) -> Option<&TapeTrade> {
        self.last_trade.as_ref()
    }

    pub fn totals(&self) -> &TapeTotals {
        &self.totals
    }

    pub fn len(&self) -> usize {
        self.prints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prints.is_empty()
    }

    /// Aggregate a batch of trades in one pass, flushing at the end.
    pub fn aggregate_prints(trades: &[TapeTrade], window_ms: i64) -> Vec<AggregatedPrint> {
        let mut aggregator = PrintAggregator::new(window_ms);
        let mut prints: Vec<AggregatedPrint> =
            trades.iter().filter_map(|trade| aggregator.push(trade)).collect();
        prints.extend(aggregator.flush());
        prints
    }
}
