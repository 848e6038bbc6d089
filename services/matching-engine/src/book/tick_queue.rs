//! FIFO queue of simulated orders resting at one tick
//!
//! Arrival order is time priority: when tape volume trades at a tick, the
//! orders here are visited front to back.

use std::collections::VecDeque;
use types::ids::OrderId;

/// Orders resting at a single tick, oldest first.
#[derive(Debug, Clone, Default)]
pub struct TickQueue {
    orders: VecDeque<OrderId>,
}

impl TickQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an order at the back of the queue (time priority)
    pub fn push_back(&mut self, order_id: OrderId) {
        self.orders.push_back(order_id);
    }

    /// Remove an order wherever it sits. Returns true if it was present.
    pub fn remove(&mut self, order_id: OrderId) -> bool {
        match self.orders.iter().position(|id| *id == order_id) {
            Some(position) => {
                self.orders.remove(position);
                true
            }
            None => false,
        }
    }

    /// Peek at the front order without removing it
    pub fn front(&self) -> Option<OrderId> {
        self.orders.front().copied()
    }

    /// Snapshot of the queue in arrival order.
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.orders.iter().copied().collect()
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.orders.contains(&order_id)
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the number of orders at this tick
    pub fn len(&self) -> usize {
        self.orders.len()
    }
}
