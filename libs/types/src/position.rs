//! Position tracking for the simulated account
//!
//! One net position per replay. Realized P&L accrues on reducing fills;
//! unrealized P&L is always derived from the last mark, never carried.

use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Net position and P&L.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Signed: positive long, negative short.
    pub net_quantity: Decimal,
    /// Zero when flat.
    pub average_price: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    /// Currency value of one full point per contract.
    pub multiplier: Decimal,
    /// Last reference price used for unrealized P&L.
    pub mark_price: Option<Price>,
}

impl Position {
    /// Flat position with the given contract multiplier.
    pub fn flat(multiplier: Decimal) -> Self {
        Self {
            net_quantity: Decimal::ZERO,
            average_price: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            multiplier,
            mark_price: None,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.net_quantity.is_zero()
    }

    pub fn total_pnl(&self) -> Decimal {
        self.realized_pnl + self.unrealized_pnl
    }

    /// Apply one fill.
    ///
    /// Adding to (or opening) a position volume-weights the average price.
    /// Reducing realizes `(px - avg) * closed * sign(net) * multiplier`. A fill
    /// that flips the position opens the excess at the fill price.
    pub fn apply_fill(&mut self, side: Side, price: Price, quantity: Quantity) {
        let qty = quantity.as_decimal();
        if qty.is_zero() {
            return;
        }
        let px = price.as_decimal();
        let signed_qty = side.sign() * qty;
        let net = self.net_quantity;

        if net.is_zero() || net.is_sign_positive() == signed_qty.is_sign_positive() {
            let held = net.abs();
            self.average_price = (self.average_price * held + px * qty) / (held + qty);
            self.net_quantity = net + signed_qty;
        } else {
            let closed = qty.min(net.abs());
            let direction = if net.is_sign_positive() {
                Decimal::ONE
            } else {
                Decimal::NEGATIVE_ONE
            };
            self.realized_pnl += (px - self.average_price) * closed * direction * self.multiplier;
            self.net_quantity = net + signed_qty;

            if self.net_quantity.is_zero() {
                self.average_price = Decimal::ZERO;
            } else if qty > closed {
                self.average_price = px;
            }
        }

        self.refresh_unrealized();
    }

    /// Recompute unrealized P&L against `mark`.
    pub fn mark_to_market(&mut self, mark: Price) {
        self.mark_price = Some(mark);
        self.refresh_unrealized();
    }

    fn refresh_unrealized(&mut self) {
        self.unrealized_pnl = match self.mark_price {
            Some(mark) if !self.net_quantity.is_zero() => {
                (mark.as_decimal() - self.average_price) * self.net_quantity * self.multiplier
            }
            _ => Decimal::ZERO,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn px(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn qty(n: u64) -> Quantity {
        Quantity::from_u64(n)
    }

    #[test]
    fn test_opening_from_flat_sets_average() {
        let mut pos = Position::flat(Decimal::ONE);
        pos.apply_fill(Side::BUY, px("100"), qty(1));
        pos.apply_fill(Side::BUY, px("100.25"), qty(1));
        assert_eq!(pos.net_quantity, d("2"));
        assert_eq!(pos.average_price, d("100.125"));
        assert_eq!(pos.realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_reducing_long_realizes_against_average() {
        let mut pos = Position::flat(Decimal::ONE);
        pos.apply_fill(Side::BUY, px("100"), qty(3));
        pos.apply_fill(Side::SELL, px("101"), qty(1));
        assert_eq!(pos.net_quantity, d("2"));
        assert_eq!(pos.average_price, d("100"));
        assert_eq!(pos.realized_pnl, d("1"));
    }

    #[test]
    fn test_short_covered_below_average_is_profit() {
        let mut pos = Position::flat(d("50"));
        pos.apply_fill(Side::SELL, px("100"), qty(2));
        pos.apply_fill(Side::BUY, px("99"), qty(2));
        assert!(pos.is_flat());
        assert_eq!(pos.average_price, Decimal::ZERO);
        assert_eq!(pos.realized_pnl, d("100")); // 1 point * 2 * 50
    }

    #[test]
    fn test_flip_opens_remainder_at_fill_price() {
        let mut pos = Position::flat(Decimal::ONE);
        pos.apply_fill(Side::BUY, px("100"), qty(2));
        pos.apply_fill(Side::SELL, px("99"), qty(5));
        assert_eq!(pos.net_quantity, d("-3"));
        assert_eq!(pos.average_price, d("99"));
        assert_eq!(pos.realized_pnl, d("-2"));
    }

    #[test]
    fn test_unrealized_is_derived_from_mark() {
        let mut pos = Position::flat(d("2"));
        pos.apply_fill(Side::BUY, px("100"), qty(3));
        assert_eq!(pos.unrealized_pnl, Decimal::ZERO); // no mark yet

        pos.mark_to_market(px("101.5"));
        assert_eq!(pos.unrealized_pnl, d("9")); // 1.5 * 3 * 2

        // A later fill re-derives against the same mark.
        pos.apply_fill(Side::SELL, px("101.5"), qty(3));
        assert_eq!(pos.unrealized_pnl, Decimal::ZERO);
        assert_eq!(pos.realized_pnl, d("9"));
        assert_eq!(pos.total_pnl(), d("9"));
    }

    #[test]
    fn test_short_unrealized_sign() {
        let mut pos = Position::flat(Decimal::ONE);
        pos.apply_fill(Side::SELL, px("100"), qty(2));
        pos.mark_to_market(px("98"));
        assert_eq!(pos.unrealized_pnl, d("4"));
    }

    #[test]
    fn test_zero_quantity_fill_is_noop() {
        let mut pos = Position::flat(Decimal::ONE);
        pos.apply_fill(Side::BUY, px("100"), Quantity::zero());
        assert!(pos.is_flat());
        assert_eq!(pos.average_price, Decimal::ZERO);
    }
}
