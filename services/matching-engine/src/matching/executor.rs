//! Fill execution
//!
//! Applies a fill to an order, books it against the position and records it
//! in the fill history. Fill ids come from a monotonic counter.

use rust_decimal::Decimal;
use tracing::debug;
use types::ids::IdGenerator;
use types::numeric::{Price, Quantity};
use types::order::Order;
use types::position::Position;
use types::trade::{Fill, Liquidity};

use crate::events::ExecutionEvent;

/// Owns the fill history and the net position.
#[derive(Debug, Clone)]
pub struct FillExecutor {
    fills: Vec<Fill>,
    position: Position,
}

impl FillExecutor {
    pub fn new(multiplier: Decimal) -> Self {
        Self {
            fills: Vec::new(),
            position: Position::flat(multiplier),
        }
    }

    /// Fill `quantity` of `order` at `price`.
    ///
    /// # Panics
    /// Panics (via `Order::add_fill`) if the fill exceeds the order's
    /// remaining quantity or the order is terminal.
    pub fn execute(
        &mut self,
        ids: &mut IdGenerator,
        order: &mut Order,
        price: Price,
        quantity: Quantity,
        liquidity: Liquidity,
        timestamp: i64,
    ) -> ExecutionEvent {
        order.add_fill(quantity, timestamp);
        self.position.apply_fill(order.side, price, quantity);

        let fill = Fill {
            fill_id: ids.next_fill_id(),
            order_id: order.order_id,
            side: order.side,
            price,
            quantity,
            liquidity,
            timestamp,
        };

        debug!(
            fill_id = %fill.fill_id,
            order_id = %fill.order_id,
            side = order.side.as_str(),
            price = %price,
            quantity = %quantity,
            liquidity = ?liquidity,
            net = %self.position.net_quantity,
            realized = %self.position.realized_pnl,
            "Fill executed"
        );

        self.fills.push(fill.clone());
        ExecutionEvent::OrderFilled {
            fill,
            status: order.status,
            remaining_quantity: order.remaining_quantity,
        }
    }

    pub fn mark_to_market(&mut self, mark: Price) {
        self.position.mark_to_market(mark);
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn position(&self) -> &Position {
        &self.position
    }
}
