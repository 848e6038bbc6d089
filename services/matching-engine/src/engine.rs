//! Simulated matching engine core
//!
//! Main coordinator for simulated orders against replayed market data:
//! - Limit orders rest at a tick behind the displayed size there and fill
//!   only from tape volume that trades through their queue
//! - Market orders sweep displayed depth immediately
//! - Every fill updates a single net position
//!
//! Order ids and fill ids come from one monotonic counter, so a replay of the
//! same log with the same commands is identical every time.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use types::book::BookSnapshot;
use types::errors::OrderError;
use types::ids::{IdGenerator, OrderId};
use types::numeric::{Price, Quantity, TickSize};
use types::order::{Order, OrderKind, Side};
use types::position::Position;
use types::trade::{Fill, Liquidity, TapeTrade};

use crate::book::RestingBook;
use crate::events::ExecutionEvent;
use crate::matching::{allocate, plan_sweep, FillExecutor};

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Currency value of one full price point per contract.
    pub multiplier: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            multiplier: Decimal::ONE,
        }
    }
}

/// Result of a market order.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketExecution {
    pub order: Order,
    pub fills: Vec<Fill>,
    /// Placement and fill events, in emission order.
    pub events: Vec<ExecutionEvent>,
}

impl MarketExecution {
    /// Volume-weighted fill price.
    pub fn average_price(&self) -> Option<Decimal> {
        let filled: Decimal = self.fills.iter().map(|f| f.quantity.as_decimal()).sum();
        if filled.is_zero() {
            return None;
        }
        let notional: Decimal = self.fills.iter().map(Fill::notional).sum();
        Some(notional / filled)
    }
}

/// Simulated matching engine
pub struct MatchingEngine {
    tick_size: TickSize,
    ids: IdGenerator,
    /// Every order ever placed, terminal ones included.
    orders: BTreeMap<OrderId, Order>,
    resting: RestingBook,
    executor: FillExecutor,
    outbox: Vec<ExecutionEvent>,
    /// Latest timestamp seen; stamps commands that carry none.
    clock: i64,
}

impl MatchingEngine {
    /// Create a new engine for an instrument with a frozen tick size
    pub fn new(tick_size: TickSize, config: EngineConfig) -> Self {
        Self {
            tick_size,
            ids: IdGenerator::new(),
            orders: BTreeMap::new(),
            resting: RestingBook::new(),
            executor: FillExecutor::new(config.multiplier),
            outbox: Vec::new(),
            clock: 0,
        }
    }

    pub fn tick_size(&self) -> TickSize {
        self.tick_size
    }

    /// Move the engine clock forward. Never moves backwards.
    pub fn advance_clock(&mut self, timestamp: i64) {
        self.clock = self.clock.max(timestamp);
    }

    pub fn clock(&self) -> i64 {
        self.clock
    }

    /// Rest a limit order at the tick nearest `price`.
    ///
    /// The order queues behind all displayed size on its own side at that
    /// tick. It never executes on placement, even if marketable.
    pub fn place_limit(
        &mut self,
        side: Side,
        price: Price,
        quantity: Quantity,
        book: &BookSnapshot,
        timestamp: i64,
    ) -> Result<Order, OrderError> {
        validate_quantity(quantity)?;
        self.advance_clock(timestamp);

        let tick = self.tick_size.tick_of(price);
        let limit_price = self.tick_size.price_of(tick);
        let queue_ahead = book.size_at_tick(side, tick, self.tick_size);

        let order = Order::limit(
            self.ids.next_order_id(),
            side,
            limit_price,
            tick,
            quantity,
            queue_ahead,
            timestamp,
        );

        info!(
            order_id = %order.order_id,
            side = side.as_str(),
            price = %limit_price,
            tick,
            quantity = %quantity,
            queue_ahead = %queue_ahead,
            "Limit order resting"
        );

        self.resting.insert(side, tick, order.order_id);
        self.outbox.push(ExecutionEvent::placed(&order));
        self.orders.insert(order.order_id, order.clone());
        Ok(order)
    }

    /// Sweep the opposite side of `book` best level first.
    ///
    /// Any quantity beyond displayed depth fills at the worst level's price.
    pub fn execute_market(
        &mut self,
        side: Side,
        quantity: Quantity,
        book: &BookSnapshot,
        timestamp: i64,
    ) -> Result<MarketExecution, OrderError> {
        validate_quantity(quantity)?;
        let contra = side.opposite();
        let plan = plan_sweep(book.side(contra), quantity);
        if plan.is_empty() {
            return Err(OrderError::NoLiquidity {
                side: contra.as_str().to_string(),
            });
        }
        self.advance_clock(timestamp);

        let mut order = Order::market(self.ids.next_order_id(), side, quantity, timestamp);
        let mut events = vec![ExecutionEvent::placed(&order)];

        let mut fills = Vec::with_capacity(plan.len());
        for step in &plan {
            let event = self.executor.execute(
                &mut self.ids,
                &mut order,
                step.price,
                step.quantity,
                Liquidity::Taker,
                timestamp,
            );
            if let Some(fill) = event.as_fill() {
                fills.push(fill.clone());
            }
            events.push(event);
        }
        self.outbox.extend(events.iter().cloned());

        info!(
            order_id = %order.order_id,
            side = side.as_str(),
            quantity = %quantity,
            levels = plan.len(),
            beyond_depth = plan.iter().any(|step| step.beyond_depth),
            "Market order executed"
        );

        self.orders.insert(order.order_id, order.clone());
        Ok(MarketExecution {
            order,
            fills,
            events,
        })
    }

    /// Run one tape print past the resting orders at its tick.
    ///
    /// A BUY aggressor lifts resting SELL orders, a SELL aggressor hits
    /// resting BUY orders. Orders are visited in arrival order and the print
    /// size is shared out, never duplicated.
    pub fn process_trade(&mut self, trade: &TapeTrade) -> Vec<ExecutionEvent> {
        self.advance_clock(trade.timestamp);

        let resting_side = trade.aggressor.resting_side_hit();
        let tick = self.tick_size.tick_of(trade.price);
        let queue = self.resting.queue_at(resting_side, tick);
        if queue.is_empty() {
            return Vec::new();
        }

        let mut available = trade.size;
        let mut events = Vec::new();
        for order_id in queue {
            if available.is_zero() {
                break;
            }
            let Some(order) = self.orders.get_mut(&order_id) else {
                continue;
            };

            let allocation = allocate(order, &mut available);
            if !allocation.queue_consumed.is_zero() {
                debug!(
                    order_id = %order_id,
                    consumed = %allocation.queue_consumed,
                    queue_ahead = %order.queue_ahead,
                    "Queue advanced"
                );
                events.push(ExecutionEvent::QueueAdvanced {
                    order_id,
                    consumed: allocation.queue_consumed,
                    queue_ahead: order.queue_ahead,
                    timestamp: trade.timestamp,
                });
            }
            if !allocation.fill.is_zero() {
                let price = order.limit_price;
                events.push(self.executor.execute(
                    &mut self.ids,
                    order,
                    price,
                    allocation.fill,
                    Liquidity::Maker,
                    trade.timestamp,
                ));
                if !order.is_active() {
                    self.resting.remove(resting_side, tick, order_id);
                }
            }
        }

        self.outbox.extend(events.iter().cloned());
        events
    }

    /// Process every print with `t0 < timestamp <= t1`, in slice order.
    pub fn process_trade_window(
        &mut self,
        trades: &[TapeTrade],
        t0: i64,
        t1: i64,
    ) -> Vec<ExecutionEvent> {
        trades
            .iter()
            .filter(|trade| trade.timestamp > t0 && trade.timestamp <= t1)
            .flat_map(|trade| self.process_trade(trade))
            .collect()
    }

    /// Cancel one active order.
    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<ExecutionEvent, OrderError> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(OrderError::NotFound {
                order_id: order_id.value(),
            })?;
        order.cancel(self.clock)?;
        self.resting.remove(order.side, order.tick, order_id);

        info!(
            order_id = %order_id,
            remaining = %order.remaining_quantity,
            "Order canceled"
        );

        let event = ExecutionEvent::OrderCanceled {
            order_id,
            remaining_quantity: order.remaining_quantity,
            timestamp: self.clock,
        };
        self.outbox.push(event.clone());
        Ok(event)
    }

    /// Cancel every active order resting at the tick of `price`, either
    /// side. Filled orders are untouched.
    pub fn cancel_at_price(&mut self, price: Price) -> Vec<ExecutionEvent> {
        let tick = self.tick_size.tick_of(price);
        let targets: Vec<OrderId> = self
            .orders
            .values()
            .filter(|order| order.is_active() && order.kind == OrderKind::Limit && order.tick == tick)
            .map(|order| order.order_id)
            .collect();
        self.cancel_each(targets)
    }

    /// Cancel every active order.
    pub fn cancel_all(&mut self) -> Vec<ExecutionEvent> {
        let targets: Vec<OrderId> = self
            .orders
            .values()
            .filter(|order| order.is_active())
            .map(|order| order.order_id)
            .collect();
        self.cancel_each(targets)
    }

    /// Recompute unrealized P&L against `mark`.
    pub fn mark_to_market(&mut self, mark: Price) {
        self.executor.mark_to_market(mark);
    }

    /// Active orders in id order.
    pub fn working_orders(&self) -> Vec<&Order> {
        self.orders.values().filter(|order| order.is_active()).collect()
    }

    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// Every order ever placed, in id order.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn fills(&self) -> &[Fill] {
        self.executor.fills()
    }

    pub fn position(&self) -> &Position {
        self.executor.position()
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<ExecutionEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn cancel_each(&mut self, targets: Vec<OrderId>) -> Vec<ExecutionEvent> {
        targets
            .into_iter()
            .filter_map(|order_id| self.cancel_order(order_id).ok())
            .collect()
    }
}

fn validate_quantity(quantity: Quantity) -> Result<(), OrderError> {
    if quantity.is_zero() {
        return Err(OrderError::InvalidQuantity(quantity.to_string()));
    }
    Ok(())
}
