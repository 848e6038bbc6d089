//! Owned order-book snapshot shared between the book builder and the engine

use crate::numeric::{Price, Quantity, Tick, TickSize};
use crate::order::Side;
use serde::{Deserialize, Serialize};

/// Aggregate resting size at one price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    pub size: Quantity,
}

impl BookLevel {
    pub fn new(price: Price, size: Quantity) -> Self {
        Self { price, size }
    }
}

/// Depth snapshot. Both sides are best-first: bids descending, asks ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl BookSnapshot {
    pub fn new(bids: Vec<BookLevel>, asks: Vec<BookLevel>) -> Self {
        Self { bids, asks }
    }

    /// Levels resting on `side` (BUY → bids).
    pub fn side(&self, side: Side) -> &[BookLevel] {
        match side {
            Side::BUY => &self.bids,
            Side::SELL => &self.asks,
        }
    }

    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Total resting size on `side` whose displayed tick is `tick`.
    pub fn size_at_tick(&self, side: Side, tick: Tick, tick_size: TickSize) -> Quantity {
        self.side(side)
            .iter()
            .filter(|level| tick_size.resting_tick(side, level.price) == tick)
            .fold(Quantity::zero(), |acc, level| acc + level.size)
    }
}
