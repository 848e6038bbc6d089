//! Error types for the replay core
//!
//! Error taxonomy using thiserror. Malformed market data never reaches these:
//! ingestion skips bad rows. These cover rejected commands and broken
//! invariants inside the ladder and the engine.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::numeric::Tick;

/// Numeric construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("Tick size must be positive, got {0}")]
    NonPositiveTickSize(Decimal),

    #[error("Negative quantity: {0}")]
    Negative(Decimal),

    #[error("Unparseable number: {0:?}")]
    Unparseable(String),
}

/// Order-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Order not found: {order_id}")]
    NotFound { order_id: u64 },

    #[error("Order already in terminal state: {status}")]
    AlreadyTerminal { status: String },

    #[error("No {side} liquidity to execute against")]
    NoLiquidity { side: String },
}

/// Ladder structural errors. These indicate a bug, not bad input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LadderError {
    #[error("Non-contiguous ladder: tick {next} follows {previous}")]
    NonContiguous { previous: Tick, next: Tick },

    #[error("Ladder row for tick {tick} has price {price}, expected {expected}")]
    PriceMismatch {
        tick: Tick,
        price: Decimal,
        expected: Decimal,
    },

    #[error("Invalid window: low {low} above high {high}")]
    InvalidWindow { low: Tick, high: Tick },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_error_display() {
        let err = OrderError::InvalidQuantity("0".to_string());
        assert_eq!(err.to_string(), "Invalid quantity: 0");
    }

    #[test]
    fn test_ladder_error_display() {
        let err = LadderError::NonContiguous {
            previous: 10,
            next: 8,
        };
        assert!(err.to_string().contains("tick 8 follows 10"));
    }
}
