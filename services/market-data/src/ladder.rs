//! Anchored tick ladder
//!
//! Maps the current book onto a fixed, gap-free window of ticks around a
//! center tick. Bid prices land on `floor(price / tick)` and ask prices on
//! `ceil(price / tick)`, so an off-grid bid and ask never share a row.
//!
//! The center is chosen by an explicit, ordered rule:
//! 1. the explicit anchor, if one is set
//! 2. the tick of the most recent trade
//! 3. the floor of the midpoint of best bid tick and best ask tick
//!    (or the single side's best tick when only one side is quoted)
//! 4. zero
//!
//! A rebuild is a pure function of the builder state and its inputs.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::book::{BookLevel, BookSnapshot};
use types::errors::LadderError;
use types::numeric::{Price, Quantity, Tick, TickSize};
use types::order::Side;
use types::trade::TapeTrade;

/// One row of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickLevel {
    pub tick: Tick,
    /// Always `tick * tick_size`.
    pub price: Price,
    pub bid_size: Quantity,
    pub ask_size: Quantity,
    /// Traded volume at this tick so far.
    pub volume: Quantity,
}

impl TickLevel {
    fn empty(tick: Tick, price: Price) -> Self {
        Self {
            tick,
            price,
            bid_size: Quantity::zero(),
            ask_size: Quantity::zero(),
            volume: Quantity::zero(),
        }
    }
}

/// A rendered ladder window, highest tick first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickLadder {
    pub tick_size: TickSize,
    /// Center tick the window was built around.
    pub anchor_tick: Tick,
    pub mid_price: Option<Decimal>,
    pub last_trade_tick: Option<Tick>,
    pub last_trade_price: Option<Price>,
    pub levels: Vec<TickLevel>,
}

impl TickLadder {
    pub fn high_tick(&self) -> Option<Tick> {
        self.levels.first().map(|level| level.tick)
    }

    pub fn low_tick(&self) -> Option<Tick> {
        self.levels.last().map(|level| level.tick)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Row for `tick`, if it is inside the window.
    pub fn level(&self, tick: Tick) -> Option<&TickLevel> {
        let high = self.high_tick()?;
        let index = usize::try_from(high.checked_sub(tick)?).ok()?;
        self.levels.get(index).filter(|level| level.tick == tick)
    }

    /// Check rows are strictly decreasing by exactly one tick and priced on
    /// the grid.
    pub fn validate(&self) -> Result<(), LadderError> {
        for pair in self.levels.windows(2) {
            if pair[0].tick.checked_sub(1) != Some(pair[1].tick) {
                return Err(LadderError::NonContiguous {
                    previous: pair[0].tick,
                    next: pair[1].tick,
                });
            }
        }
        for level in &self.levels {
            let expected = self.tick_size.price_of(level.tick);
            if level.price != expected {
                return Err(LadderError::PriceMismatch {
                    tick: level.tick,
                    price: level.price.as_decimal(),
                    expected: expected.as_decimal(),
                });
            }
        }
        Ok(())
    }
}

/// Which bound of the window to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowDirection {
    /// Higher prices
    Up,
    /// Lower prices
    Down,
}

/// Builds ladders for one instrument with a frozen tick size.
#[derive(Debug, Clone)]
pub struct LadderBuilder {
    tick_size: TickSize,
    half_width: Tick,
    anchor: Option<Tick>,
    /// Extra ticks above `center + half_width`.
    extend_high: Tick,
    /// Extra ticks below `center - half_width`.
    extend_low: Tick,
    volume: BTreeMap<Tick, Quantity>,
}

impl LadderBuilder {
    pub fn new(tick_size: TickSize, half_width: u32) -> Self {
        Self {
            tick_size,
            half_width: Tick::from(half_width),
            anchor: None,
            extend_high: 0,
            extend_low: 0,
            volume: BTreeMap::new(),
        }
    }

    pub fn tick_size(&self) -> TickSize {
        self.tick_size
    }

    pub fn half_width(&self) -> Tick {
        self.half_width
    }

    pub fn anchor(&self) -> Option<Tick> {
        self.anchor
    }

    /// Set or clear the explicit anchor. Window extensions are reset.
    pub fn set_anchor(&mut self, anchor: Option<Tick>) {
        debug!(anchor = ?anchor, previous = ?self.anchor, "Ladder re-anchored");
        self.anchor = anchor;
        self.extend_high = 0;
        self.extend_low = 0;
    }

    pub fn clear_anchor(&mut self) {
        self.set_anchor(None);
    }

    /// Fold a print into the traded-volume profile.
    pub fn record_trade(&mut self, trade: &TapeTrade) {
        let tick = self.tick_size.tick_of(trade.price);
        let entry = self.volume.entry(tick).or_insert_with(Quantity::zero);
        *entry = *entry + trade.size;
    }

    pub fn volume_at(&self, tick: Tick) -> Quantity {
        self.volume.get(&tick).copied().unwrap_or_else(Quantity::zero)
    }

    /// Center tick by the ordered anchor rule.
    pub fn center_tick(&self, book: &BookSnapshot, last_trade: Option<&TapeTrade>) -> Tick {
        if let Some(anchor) = self.anchor {
            return anchor;
        }
        if let Some(trade) = last_trade {
            return self.tick_size.tick_of(trade.price);
        }
        let best_bid = book
            .best_bid()
            .map(|level| self.tick_size.resting_tick(Side::BUY, level.price));
        let best_ask = book
            .best_ask()
            .map(|level| self.tick_size.resting_tick(Side::SELL, level.price));
        match (best_bid, best_ask) {
            // The floored midpoint lies between the two, so it fits a Tick.
            (Some(bid), Some(ask)) => {
                (i128::from(bid) + i128::from(ask)).div_euclid(2) as Tick
            }
            (Some(tick), None) | (None, Some(tick)) => tick,
            (None, None) => 0,
        }
    }

    /// Current window bounds `(low, high)` around `center`, clamped to the
    /// `Tick` range.
    pub fn window(&self, center: Tick) -> (Tick, Tick) {
        (
            center
                .saturating_sub(self.half_width)
                .saturating_sub(self.extend_low),
            center
                .saturating_add(self.half_width)
                .saturating_add(self.extend_high),
        )
    }

    /// Render the ladder for the given book and last trade.
    pub fn rebuild(
        &self,
        book: &BookSnapshot,
        last_trade: Option<&TapeTrade>,
    ) -> Result<TickLadder, LadderError> {
        let center = self.center_tick(book, last_trade);
        let (low, high) = self.window(center);
        if low > high {
            return Err(LadderError::InvalidWindow { low, high });
        }

        let bids = self.bucket(&book.bids, Side::BUY);
        let asks = self.bucket(&book.asks, Side::SELL);

        let levels: Vec<TickLevel> = (low..=high)
            .rev()
            .map(|tick| {
                let mut level = TickLevel::empty(tick, self.tick_size.price_of(tick));
                level.bid_size = bids.get(&tick).copied().unwrap_or_else(Quantity::zero);
                level.ask_size = asks.get(&tick).copied().unwrap_or_else(Quantity::zero);
                level.volume = self.volume_at(tick);
                level
            })
            .collect();

        let ladder = TickLadder {
            tick_size: self.tick_size,
            anchor_tick: center,
            mid_price: mid_price(book),
            last_trade_tick: last_trade.map(|trade| self.tick_size.tick_of(trade.price)),
            last_trade_price: last_trade.map(|trade| trade.price),
            levels,
        };

        debug_assert!(
            ladder.validate().is_ok(),
            "Ladder built from contiguous range failed validation"
        );
        ladder.validate()?;
        Ok(ladder)
    }

    /// Grow one bound of `ladder` by `batch` zero-filled ticks.
    ///
    /// New rows are priced from the anchor row:
    /// `base_price + (tick - anchor_tick) * tick_size`. The extension is
    /// remembered for later rebuilds until the next re-anchor.
    pub fn extend_window(
        &mut self,
        ladder: &TickLadder,
        direction: WindowDirection,
        batch: u32,
    ) -> Result<TickLadder, LadderError> {
        let batch = Tick::from(batch);
        let (Some(high), Some(low)) = (ladder.high_tick(), ladder.low_tick()) else {
            return Err(LadderError::InvalidWindow { low: 0, high: -1 });
        };
        if batch == 0 {
            return Ok(ladder.clone());
        }

        let anchor_tick = ladder.anchor_tick;
        let base_price = self.tick_size.price_of(anchor_tick).as_decimal();
        let step = self.tick_size.as_decimal();
        let row = |tick: Tick| {
            let price = Decimal::from(tick.saturating_sub(anchor_tick))
                .checked_mul(step)
                .and_then(|offset| base_price.checked_add(offset))
                .map(Price::new)
                .unwrap_or_else(|| self.tick_size.price_of(tick));
            let mut level = TickLevel::empty(tick, price);
            level.volume = self.volume_at(tick);
            level
        };

        let mut extended = ladder.clone();
        match direction {
            WindowDirection::Up => {
                let top = high.saturating_add(batch);
                let mut rows: Vec<TickLevel> =
                    (high..top).rev().map(|tick| row(tick + 1)).collect();
                rows.extend(extended.levels);
                extended.levels = rows;
                self.extend_high = self.extend_high.saturating_add(top - high);
            }
            WindowDirection::Down => {
                let bottom = low.saturating_sub(batch);
                extended
                    .levels
                    .extend((bottom..low).rev().map(row));
                self.extend_low = self.extend_low.saturating_add(low - bottom);
            }
        }

        debug!(
            direction = ?direction,
            batch,
            low = ?extended.low_tick(),
            high = ?extended.high_tick(),
            "Ladder window extended"
        );

        extended.validate()?;
        Ok(extended)
    }

    /// Resting size per tick, summing levels that land on the same tick.
    fn bucket(&self, levels: &[BookLevel], side: Side) -> BTreeMap<Tick, Quantity> {
        let mut buckets = BTreeMap::new();
        for level in levels {
            let tick = self.tick_size.resting_tick(side, level.price);
            let entry = buckets.entry(tick).or_insert_with(Quantity::zero);
            *entry = *entry + level.size;
        }
        buckets
    }
}

fn mid_price(book: &BookSnapshot) -> Option<Decimal> {
    match (book.best_bid(), book.best_ask()) {
        (Some(bid), Some(ask)) => bid
            .price
            .as_decimal()
            .checked_add(ask.price.as_decimal())
            .map(|sum| sum / Decimal::from(2)),
        _ => None,
    }
}
