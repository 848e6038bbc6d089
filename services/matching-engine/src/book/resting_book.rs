//! Resting simulated orders, indexed by side and tick
//!
//! Holds order ids only; the engine owns the orders themselves.
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::Tick;
use types::order::Side;

use super::tick_queue::TickQueue;

/// Simulated orders waiting for tape volume, both sides.
#[derive(Debug, Clone, Default)]
pub struct RestingBook {
    /// Buy orders by tick
    bids: BTreeMap<Tick, TickQueue>,
    /// Sell orders by tick
    asks: BTreeMap<Tick, TickQueue>,
}

impl RestingBook {
    /// Create a new empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an order at the back of its tick.
    pub fn insert(&mut self, side: Side, tick: Tick, order_id: OrderId) {
        self.side_mut(side)
            .entry(tick)
            .or_insert_with(TickQueue::new)
            .push_back(order_id);
    }

    /// Remove an order from the book
    ///
    /// Returns true if the order was found and removed
    pub fn remove(&mut self, side: Side, tick: Tick, order_id: OrderId) -> bool {
        let levels = self.side_mut(side);
        if let Some(queue) = levels.get_mut(&tick) {
            if queue.remove(order_id) {
                // Remove empty ticks to keep book clean
                if queue.is_empty() {
                    levels.remove(&tick);
                }
                return true;
            }
        }
        false
    }

    /// Orders resting on `side` at `tick`, oldest first.
    pub fn queue_at(&self, side: Side, tick: Tick) -> Vec<OrderId> {
        self.side(side)
            .get(&tick)
            .map(TickQueue::order_ids)
            .unwrap_or_default()
    }

    /// Every tick holding orders, either side, ascending.
    pub fn ticks(&self) -> Vec<Tick> {
        let mut ticks: Vec<Tick> = self.bids.keys().chain(self.asks.keys()).copied().collect();
        ticks.sort_unstable();
        ticks.dedup();
        ticks
    }

    /// All resting ids, bids then asks, each tick in FIFO order.
    pub fn order_ids(&self) -> Vec<OrderId> {
        self.bids
            .values()
            .chain(self.asks.values())
            .flat_map(TickQueue::order_ids)
            .collect()
    }

    /// Check if the book is empty
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.bids
            .values()
            .chain(self.asks.values())
            .map(TickQueue::len)
            .sum()
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    fn side(&self, side: Side) -> &BTreeMap<Tick, TickQueue> {
        match side {
            Side::BUY => &self.bids,
            Side::SELL => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<Tick, TickQueue> {
        match side {
            Side::BUY => &mut self.bids,
            Side::SELL => &mut self.asks,
        }
    }
}
