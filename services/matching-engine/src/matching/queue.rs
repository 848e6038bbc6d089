//! Queue-position fills from tape volume
//!
//! A resting simulated order only fills once the displayed size that was in
//! front of it at placement has traded away. Tape volume at the order's tick
//! first burns down `queue_ahead`, and only the excess fills the order.

use types::numeric::Quantity;
use types::order::Order;

/// How one order absorbed part of a print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueAllocation {
    /// Volume that traded through the queue ahead.
    pub queue_consumed: Quantity,
    /// Volume that should fill the order.
    pub fill: Quantity,
}

impl QueueAllocation {
    pub fn is_empty(&self) -> bool {
        self.queue_consumed.is_zero() && self.fill.is_zero()
    }
}

/// Run `available` print volume past `order`.
///
/// Advances the order's queue in place and takes what it used out of
/// `available`. The fill is returned, not applied.
pub fn allocate(order: &mut Order, available: &mut Quantity) -> QueueAllocation {
    let before = order.queue_ahead;
    let queue_consumed = order.consume_queue(*available);
    debug_assert!(order.queue_ahead <= before, "queue_ahead must never grow");
    *available = *available - queue_consumed;

    let fill = (*available).min(order.remaining_quantity);
    *available = *available - fill;

    QueueAllocation {
        queue_consumed,
        fill,
    }
}
