//! Tape prints and simulated fills

use crate::ids::{FillId, OrderId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A trade print from the market-data log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TapeTrade {
    /// Unix milliseconds
    pub timestamp: i64,
    pub price: Price,
    pub size: Quantity,
    /// Side that crossed the spread
    pub aggressor: Side,
}

impl TapeTrade {
    pub fn new(timestamp: i64, price: Price, size: Quantity, aggressor: Side) -> Self {
        Self {
            timestamp,
            price,
            size,
            aggressor,
        }
    }
}

/// Whether a fill added or removed liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Liquidity {
    /// Resting limit order filled by tape flow
    Maker,
    /// Market order sweeping the book
    Taker,
}

/// One execution against one of our orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub fill_id: FillId,
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub liquidity: Liquidity,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl Fill {
    /// price × quantity
    pub fn notional(&self) -> Decimal {
        self.price.as_decimal() * self.quantity.as_decimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_notional() {
        let fill = Fill {
            fill_id: FillId::new(1),
            order_id: OrderId::new(1),
            side: Side::BUY,
            price: "100.25".parse().unwrap(),
            quantity: Quantity::from_u64(4),
            liquidity: Liquidity::Taker,
            timestamp: 0,
        };
        assert_eq!(fill.notional(), Decimal::from(401));
    }

    #[test]
    fn test_tape_trade_serialization() {
        let trade = TapeTrade::new(
            1_708_123_456_789,
            Price::from_u64(100),
            Quantity::from_u64(2),
            Side::SELL,
        );
        let json = serde_json::to_string(&trade).unwrap();
        assert!(json.contains("\"SELL\""));
        let back: TapeTrade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, back);
    }
}
