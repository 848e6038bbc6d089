//! Fixed-point decimal types for prices, quantities and ticks
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! A price is always reconstructed as `tick * tick_size`, so two prices that
//! land on the same tick compare equal regardless of how they were written in
//! the source log.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::NumericError;
use crate::order::Side;

/// Integer price index: `round(price / tick_size)`.
pub type Tick = i64;

/// A price. Signed, because ladder windows around a zero center extend below it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value.normalize())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Price {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s).map(Self::new)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Returns `None` for negative values.
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            None
        } else {
            Some(Self(value.normalize()))
        }
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Subtraction clamped at zero.
    pub fn saturating_sub(self, other: Quantity) -> Quantity {
        if other.0 >= self.0 {
            Quantity::zero()
        } else {
            Quantity(self.0 - other.0)
        }
    }
}

impl FromStr for Quantity {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = parse_decimal(s)?;
        Self::try_new(value).ok_or(NumericError::Negative(value))
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    /// # Panics
    /// Panics if the result would be negative.
    fn sub(self, rhs: Quantity) -> Quantity {
        assert!(rhs.0 <= self.0, "Quantity underflow: {} - {}", self.0, rhs.0);
        Quantity(self.0 - rhs.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The canonical tick sizes an inferred price increment is snapped to.
pub fn canonical_tick_sizes() -> [Decimal; 6] {
    [
        Decimal::new(1, 2),
        Decimal::new(5, 2),
        Decimal::new(1, 1),
        Decimal::new(25, 2),
        Decimal::new(5, 1),
        Decimal::ONE,
    ]
}

/// Largest tick magnitude a price may map to. Leaves room in `i64` for
/// ladder windows and extensions built around any valid tick.
pub const MAX_TICK: Tick = 1_000_000_000_000_000;

/// Minimum price increment. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TickSize(Decimal);

impl TickSize {
    pub fn new(value: Decimal) -> Result<Self, NumericError> {
        if value <= Decimal::ZERO {
            return Err(NumericError::NonPositiveTickSize(value));
        }
        Ok(Self(value.normalize()))
    }

    /// Snap an observed price increment to the nearest canonical tick size.
    ///
    /// Ties resolve to the smaller candidate.
    pub fn snap(delta: Decimal) -> Self {
        let delta = delta.abs();
        let mut best = Decimal::ONE;
        let mut best_distance: Option<Decimal> = None;
        for candidate in canonical_tick_sizes() {
            let distance = (candidate - delta).abs();
            if best_distance.map_or(true, |d| distance < d) {
                best = candidate;
                best_distance = Some(distance);
            }
        }
        Self(best)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// `round(price / tick_size)`, midpoints away from zero.
    ///
    /// Saturates at `±MAX_TICK`; use [`TickSize::checked_tick_of`] to reject
    /// prices outside that range instead.
    pub fn tick_of(&self, price: Price) -> Tick {
        let ratio = self
            .ratio(price)
            .map(|ratio| ratio.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero));
        saturate(ratio, price)
    }

    /// Like [`TickSize::tick_of`], but `None` when the tick would fall
    /// outside `±MAX_TICK`.
    pub fn checked_tick_of(&self, price: Price) -> Option<Tick> {
        self.ratio(price)
            .map(|ratio| ratio.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|ratio| ratio.to_i64())
            .filter(|tick| (-MAX_TICK..=MAX_TICK).contains(tick))
    }

    pub fn floor_tick(&self, price: Price) -> Tick {
        saturate(self.ratio(price).map(|ratio| ratio.floor()), price)
    }

    pub fn ceil_tick(&self, price: Price) -> Tick {
        saturate(self.ratio(price).map(|ratio| ratio.ceil()), price)
    }

    /// Tick a resting level is displayed at: bids round down, asks round up,
    /// so an off-grid bid and ask never share a row.
    pub fn resting_tick(&self, side: Side, price: Price) -> Tick {
        match side {
            Side::BUY => self.floor_tick(price),
            Side::SELL => self.ceil_tick(price),
        }
    }

    /// `tick * tick_size`, saturating at the `Decimal` range.
    pub fn price_of(&self, tick: Tick) -> Price {
        let bound = if tick < 0 { Decimal::MIN } else { Decimal::MAX };
        Price::new(Decimal::from(tick).checked_mul(self.0).unwrap_or(bound))
    }

    /// Price re-derived from the nearest tick.
    pub fn snap_price(&self, price: Price) -> Price {
        self.price_of(self.tick_of(price))
    }

    fn ratio(&self, price: Price) -> Option<Decimal> {
        price.as_decimal().checked_div(self.0)
    }
}

impl TryFrom<Decimal> for TickSize {
    type Error = NumericError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TickSize> for Decimal {
    fn from(value: TickSize) -> Self {
        value.0
    }
}

impl fmt::Display for TickSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn saturate(ratio: Option<Decimal>, price: Price) -> Tick {
    match ratio.and_then(|ratio| ratio.to_i64()) {
        Some(tick) => tick.clamp(-MAX_TICK, MAX_TICK),
        None if price.as_decimal().is_sign_negative() => -MAX_TICK,
        None => MAX_TICK,
    }
}

fn parse_decimal(s: &str) -> Result<Decimal, NumericError> {
    let trimmed = s.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| NumericError::Unparseable(trimmed.to_string()))
}
