//! Simulated order lifecycle types
//!
//! State machine: WORKING → PARTIAL (zero or more times) → FILLED | CANCELED.
//! FILLED and CANCELED are terminal.

use crate::errors::OrderError;
use crate::ids::OrderId;
use crate::numeric::{Price, Quantity, Tick};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }

    /// +1 for buys, -1 for sells.
    pub fn sign(&self) -> Decimal {
        match self {
            Side::BUY => Decimal::ONE,
            Side::SELL => Decimal::NEGATIVE_ONE,
        }
    }

    /// Parse an aggressor column: `BUY`, `B`, `SELL`, `S` in any case.
    pub fn from_aggressor(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BUY" | "B" => Some(Side::BUY),
            "SELL" | "S" => Some(Side::SELL),
            _ => None,
        }
    }

    /// Side of the book a trade with this aggressor consumed:
    /// buyers lift the offer, sellers hit the bid.
    pub fn resting_side_hit(&self) -> Self {
        self.opposite()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::BUY => "BUY",
            Side::SELL => "SELL",
        }
    }
}

/// Limit orders rest and queue; market orders sweep immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderKind {
    Limit,
    Market,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Resting, nothing filled yet
    Working,
    /// Resting with some quantity filled
    Partial,
    /// Completely filled (terminal)
    Filled,
    /// Canceled by command (terminal)
    Canceled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Canceled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Working => "WORKING",
            OrderStatus::Partial => "PARTIAL",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Canceled => "CANCELED",
        }
    }
}

/// A simulated order.
///
/// `queue_ahead` is the resting size believed to be in front of this order
/// at its tick. It only ever decreases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub side: Side,
    pub kind: OrderKind,
    /// Snapped to the tick grid. Zero for market orders.
    pub limit_price: Price,
    pub requested_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub tick: Tick,
    pub queue_ahead: Quantity,
    pub status: OrderStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Create a new working limit order
    pub fn limit(
        order_id: OrderId,
        side: Side,
        limit_price: Price,
        tick: Tick,
        quantity: Quantity,
        queue_ahead: Quantity,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id,
            side,
            kind: OrderKind::Limit,
            limit_price,
            requested_quantity: quantity,
            remaining_quantity: quantity,
            tick,
            queue_ahead,
            status: OrderStatus::Working,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Create a market order. It never rests, so tick and queue are zero.
    pub fn market(order_id: OrderId, side: Side, quantity: Quantity, timestamp: i64) -> Self {
        Self {
            order_id,
            side,
            kind: OrderKind::Market,
            limit_price: Price::ZERO,
            requested_quantity: quantity,
            remaining_quantity: quantity,
            tick: 0,
            queue_ahead: Quantity::zero(),
            status: OrderStatus::Working,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.requested_quantity - self.remaining_quantity
    }

    /// Working or partially filled.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Let `available` traded volume run through the queue ahead of this order.
    ///
    /// Returns the volume absorbed by the queue; the caller keeps the rest.
    pub fn consume_queue(&mut self, available: Quantity) -> Quantity {
        let consumed = available.min(self.queue_ahead);
        self.queue_ahead = self.queue_ahead - consumed;
        consumed
    }

    /// Apply a fill and advance the status.
    ///
    /// # Panics
    /// Panics if the fill would exceed the remaining quantity.
    pub fn add_fill(&mut self, quantity: Quantity, timestamp: i64) {
        assert!(
            quantity <= self.remaining_quantity,
            "Fill would exceed order quantity"
        );
        assert!(self.is_active(), "Cannot fill terminal order");

        self.remaining_quantity = self.remaining_quantity - quantity;
        self.status = if self.remaining_quantity.is_zero() {
            OrderStatus::Filled
        } else if self.filled_quantity().is_zero() {
            OrderStatus::Working
        } else {
            OrderStatus::Partial
        };
        self.updated_at = timestamp;
    }

    /// Cancel the order.
    pub fn cancel(&mut self, timestamp: i64) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::AlreadyTerminal {
                status: self.status.as_str().to_string(),
            });
        }
        self.status = OrderStatus::Canceled;
        self.updated_at = timestamp;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn working_buy(qty: u64, queue: u64) -> Order {
        Order::limit(
            OrderId::new(1),
            Side::BUY,
            Price::from_u64(100),
            400,
            Quantity::from_u64(qty),
            Quantity::from_u64(queue),
            1_000,
        )
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::BUY.opposite(), Side::SELL);
        assert_eq!(Side::SELL.opposite(), Side::BUY);
    }

    #[test]
    fn test_aggressor_parsing() {
        assert_eq!(Side::from_aggressor("BUY"), Some(Side::BUY));
        assert_eq!(Side::from_aggressor(" b "), Some(Side::BUY));
        assert_eq!(Side::from_aggressor("Sell"), Some(Side::SELL));
        assert_eq!(Side::from_aggressor("S"), Some(Side::SELL));
        assert_eq!(Side::from_aggressor(""), None);
        assert_eq!(Side::from_aggressor("X"), None);
    }

    #[test]
    fn test_aggressor_hits_opposite_resting_side() {
        assert_eq!(Side::BUY.resting_side_hit(), Side::SELL);
        assert_eq!(Side::SELL.resting_side_hit(), Side::BUY);
    }

    #[test]
    fn test_queue_consumption_never_goes_negative() {
        let mut order = working_buy(4, 5);
        assert_eq!(order.consume_queue(Quantity::from_u64(3)), Quantity::from_u64(3));
        assert_eq!(order.queue_ahead, Quantity::from_u64(2));
        assert_eq!(order.consume_queue(Quantity::from_u64(10)), Quantity::from_u64(2));
        assert!(order.queue_ahead.is_zero());
        assert_eq!(order.consume_queue(Quantity::from_u64(10)), Quantity::zero());
    }

    #[test]
    fn test_order_fill_transitions() {
        let mut order = working_buy(4, 0);
        assert_eq!(order.status, OrderStatus::Working);

        order.add_fill(Quantity::from_u64(1), 2_000);
        assert_eq!(order.status, OrderStatus::Partial);
        assert_eq!(order.filled_quantity(), Quantity::from_u64(1));

        order.add_fill(Quantity::from_u64(3), 3_000);
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(order.remaining_quantity.is_zero());
        assert_eq!(order.updated_at, 3_000);
    }

    #[test]
    #[should_panic(expected = "Fill would exceed order quantity")]
    fn test_order_overfill_panics() {
        let mut order = working_buy(1, 0);
        order.add_fill(Quantity::from_u64(2), 2_000);
    }

    #[test]
    fn test_cancel_terminal_is_rejected() {
        let mut order = working_buy(1, 0);
        order.add_fill(Quantity::from_u64(1), 2_000);
        assert!(matches!(
            order.cancel(3_000),
            Err(OrderError::AlreadyTerminal { .. })
        ));
        assert_eq!(order.status, OrderStatus::Filled);
    }

    #[test]
    fn test_order_cancel() {
        let mut order = working_buy(2, 1);
        order.cancel(2_000).unwrap();
        assert_eq!(order.status, OrderStatus::Canceled);
        assert!(order.status.is_terminal());
    }

    #[test]
    fn test_order_serialization() {
        let order = working_buy(2, 1);
        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains("\"WORKING\""));
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }
}
