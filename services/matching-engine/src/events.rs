//! Execution events emitted by the simulated matcher
//!
//! Every state change to a simulated order produces one event. The session
//! drains them after each market event or command for logging and display.

use serde::{Deserialize, Serialize};
use types::ids::OrderId;
use types::numeric::{Price, Quantity, Tick};
use types::order::{Order, OrderKind, OrderStatus, Side};
use types::trade::Fill;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    /// A limit order started resting, or a market order was accepted.
    OrderPlaced {
        order_id: OrderId,
        side: Side,
        kind: OrderKind,
        price: Price,
        tick: Tick,
        quantity: Quantity,
        queue_ahead: Quantity,
        timestamp: i64,
    },

    /// Tape volume traded through the queue ahead of a resting order.
    QueueAdvanced {
        order_id: OrderId,
        consumed: Quantity,
        queue_ahead: Quantity,
        timestamp: i64,
    },

    OrderFilled {
        fill: Fill,
        status: OrderStatus,
        remaining_quantity: Quantity,
    },

    OrderCanceled {
        order_id: OrderId,
        remaining_quantity: Quantity,
        timestamp: i64,
    },
}

impl ExecutionEvent {
    /// Placement event for a freshly created order.
    pub fn placed(order: &Order) -> Self {
        ExecutionEvent::OrderPlaced {
            order_id: order.order_id,
            side: order.side,
            kind: order.kind,
            price: order.limit_price,
            tick: order.tick,
            quantity: order.requested_quantity,
            queue_ahead: order.queue_ahead,
            timestamp: order.created_at,
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            ExecutionEvent::OrderPlaced { order_id, .. }
            | ExecutionEvent::QueueAdvanced { order_id, .. }
            | ExecutionEvent::OrderCanceled { order_id, .. } => *order_id,
            ExecutionEvent::OrderFilled { fill, .. } => fill.order_id,
        }
    }

    /// Get the event type as a string label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionEvent::OrderPlaced { .. } => "OrderPlaced",
            ExecutionEvent::QueueAdvanced { .. } => "QueueAdvanced",
            ExecutionEvent::OrderFilled { .. } => "OrderFilled",
            ExecutionEvent::OrderCanceled { .. } => "OrderCanceled",
        }
    }

    pub fn as_fill(&self) -> Option<&Fill> {
        match self {
            ExecutionEvent::OrderFilled { fill, .. } => Some(fill),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::FillId;
    use types::trade::Liquidity;

    #[test]
    fn test_event_serialization_tagged() {
        let event = ExecutionEvent::OrderFilled {
            fill: Fill {
                fill_id: FillId::new(1),
                order_id: OrderId::new(4),
                side: Side::SELL,
                price: Price::from_u64(100),
                quantity: Quantity::from_u64(2),
                liquidity: Liquidity::Maker,
                timestamp: 10,
            },
            status: OrderStatus::Partial,
            remaining_quantity: Quantity::from_u64(1),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"OrderFilled\""));
        let deserialized: ExecutionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
        assert_eq!(event.order_id(), OrderId::new(4));
        assert!(event.as_fill().is_some());
    }

    #[test]
    fn test_cancel_event_label() {
        let event = ExecutionEvent::OrderCanceled {
            order_id: OrderId::new(2),
            remaining_quantity: Quantity::from_u64(3),
            timestamp: 0,
        };
        assert_eq!(event.label(), "OrderCanceled");
        assert!(event.as_fill().is_none());
    }
}
