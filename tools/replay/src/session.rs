//! Replay session state
//!
//! One explicit state value for everything a replay mutates: book, ladder
//! builder, simulated engine and trade tape. Market events and user
//! commands are the only transitions, and `snapshot` is the only way state
//! leaves the session.

use market_data::events::{MarketEvent, MarketEventPayload};
use market_data::ladder::{LadderBuilder, TickLadder, WindowDirection};
use market_data::order_book::{BookState, TopOfBook};
use market_data::trades::{AggregatedPrint, TapeTotals, TradeTape};
use matching_engine::{ExecutionEvent, MarketExecution, MatchingEngine};
use serde::{Deserialize, Serialize};
use tracing::debug;
use types::errors::{LadderError, OrderError};
use types::numeric::{Price, Quantity, Tick, TickSize};
use types::order::{Order, Side};
use types::position::Position;
use types::trade::Fill;

use crate::config::ReplayConfig;

/// Commands accepted from the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    PlaceLimit {
        side: Side,
        price: Price,
        quantity: Quantity,
    },
    PlaceMarket {
        side: Side,
        quantity: Quantity,
    },
    CancelAtPrice {
        price: Price,
    },
    /// `None` clears the explicit anchor.
    SetAnchor {
        tick: Option<Tick>,
    },
    /// `batch` defaults to the configured extend batch.
    ExtendWindow {
        direction: WindowDirection,
        batch: Option<u32>,
    },
    SetSpeed {
        speed: f64,
    },
    Pause,
    Resume,
}

/// Everything the presentation layer pulls after an event or command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Sequence of the last applied event, if any.
    pub sequence: Option<u64>,
    pub timestamp: i64,
    pub ladder: TickLadder,
    pub top_of_book: TopOfBook,
    pub working_orders: Vec<Order>,
    pub position: Position,
    pub fills: Vec<Fill>,
    /// Closed prints, newest first.
    pub prints: Vec<AggregatedPrint>,
    /// Print still open in the aggregation buffer.
    pub pending_print: Option<AggregatedPrint>,
    pub totals: TapeTotals,
}

pub struct Session {
    book: BookState,
    ladder: LadderBuilder,
    engine: MatchingEngine,
    tape: TradeTape,
    extend_batch: u32,
    last_sequence: Option<u64>,
    clock: i64,
}

impl Session {
    pub fn new(tick_size: TickSize, config: &ReplayConfig) -> Self {
        Self {
            book: BookState::new(),
            ladder: LadderBuilder::new(tick_size, config.ladder.half_width),
            engine: MatchingEngine::new(tick_size, config.engine_config()),
            tape: TradeTape::new(config.playback.tape_capacity),
            extend_batch: config.ladder.extend_batch,
            last_sequence: None,
            clock: 0,
        }
    }

    pub fn tick_size(&self) -> TickSize {
        self.ladder.tick_size()
    }

    /// Apply one market event.
    ///
    /// Book events update the book; trades feed the tape, the volume
    /// profile and the resting simulated orders. The position is marked
    /// afterwards against the last trade, or the mid when nothing has traded.
    pub fn apply_event(&mut self, event: &MarketEvent) -> Vec<ExecutionEvent> {
        self.clock = self.clock.max(event.timestamp);
        self.last_sequence = Some(event.sequence);
        self.engine.advance_clock(event.timestamp);

        let executions = match &event.payload {
            MarketEventPayload::OrderBook(_) | MarketEventPayload::Bbo { .. } => {
                self.book.apply_event(event);
                Vec::new()
            }
            MarketEventPayload::Trade(trade) => {
                self.book.apply_event(event);
                self.tape.record_trade(trade);
                self.ladder.record_trade(trade);
                self.engine.process_trade(trade)
            }
        };

        if let Some(mark) = self.mark_price() {
            self.engine.mark_to_market(mark);
        }

        debug!(
            sequence = event.sequence,
            event_type = event.event_type_label(),
            executions = executions.len(),
            "Event applied"
        );
        executions
    }

    pub fn place_limit(
        &mut self,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Result<Order, OrderError> {
        let snapshot = self.book.snapshot();
        self.engine
            .place_limit(side, price, quantity, &snapshot, self.clock)
    }

    pub fn place_market(
        &mut self,
        side: Side,
        quantity: Quantity,
    ) -> Result<MarketExecution, OrderError> {
        let snapshot = self.book.snapshot();
        let execution = self
            .engine
            .execute_market(side, quantity, &snapshot, self.clock)?;
        if let Some(mark) = self.mark_price() {
            self.engine.mark_to_market(mark);
        }
        Ok(execution)
    }

    pub fn cancel_at_price(&mut self, price: Price) -> Vec<ExecutionEvent> {
        self.engine.cancel_at_price(price)
    }

    pub fn set_anchor(&mut self, tick: Option<Tick>) {
        self.ladder.set_anchor(tick);
    }

    /// Grow the ladder window. The extension sticks until the next re-anchor.
    pub fn extend_window(
        &mut self,
        direction: WindowDirection,
        batch: Option<u32>,
    ) -> Result<TickLadder, LadderError> {
        let current = self.ladder()?;
        self.ladder
            .extend_window(&current, direction, batch.unwrap_or(self.extend_batch))
    }

    /// Record a closed print on the tape.
    pub fn push_print(&mut self, print: AggregatedPrint) {
        self.tape.push_print(print);
    }

    /// Ladder for the current book and last trade.
    pub fn ladder(&self) -> Result<TickLadder, LadderError> {
        self.ladder
            .rebuild(&self.book.snapshot(), self.tape.last_trade())
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, LadderError> {
        Ok(SessionSnapshot {
            sequence: self.last_sequence,
            timestamp: self.clock,
            ladder: self.ladder()?,
            top_of_book: TopOfBook::from(&self.book),
            working_orders: self.engine.working_orders().into_iter().cloned().collect(),
            position: self.engine.position().clone(),
            fills: self.engine.fills().to_vec(),
            prints: self.tape.recent_prints(self.tape.len()),
            pending_print: None,
            totals: self.tape.totals().clone(),
        })
    }

    pub fn position(&self) -> &Position {
        self.engine.position()
    }

    pub fn fills(&self) -> &[Fill] {
        self.engine.fills()
    }

    pub fn working_orders(&self) -> Vec<&Order> {
        self.engine.working_orders()
    }

    pub fn book(&self) -> &BookState {
        &self.book
    }

    pub fn tape(&self) -> &TradeTape {
        &self.tape
    }

    pub fn clock(&self) -> i64 {
        self.clock
    }

    /// Take every execution event emitted since the last drain.
    pub fn drain_executions(&mut self) -> Vec<ExecutionEvent> {
        self.engine.drain_events()
    }

    fn mark_price(&self) -> Option<Price> {
        self.tape
            .last_trade()
            .map(|trade| trade.price)
            .or_else(|| self.book.mid_price().map(Price::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use types::book::{BookLevel, BookSnapshot};
    use types::order::OrderStatus;
    use types::trade::TapeTrade;

    fn px(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn qty(n: u64) -> Quantity {
        Quantity::from_u64(n)
    }

    fn session() -> Session {
        let mut config = ReplayConfig::default();
        config.ladder.half_width = 4;
        config.ladder.extend_batch = 2;
        Session::new(TickSize::new(Decimal::new(25, 2)).unwrap(), &config)
    }

    fn book_event(seq: u64, ts: i64) -> MarketEvent {
        MarketEvent::new(
            seq,
            ts,
            MarketEventPayload::OrderBook(BookSnapshot::new(
                vec![BookLevel::new(px("100"), qty(5))],
                vec![BookLevel::new(px("100.25"), qty(7))],
            )),
        )
    }

    fn trade_event(seq: u64, ts: i64, price: &str, size: u64, aggressor: Side) -> MarketEvent {
        MarketEvent::new(
            seq,
            ts,
            MarketEventPayload::Trade(TapeTrade::new(ts, px(price), qty(size), aggressor)),
        )
    }

    #[test]
    fn test_limit_order_fills_from_tape() {
        let mut s = session();
        s.apply_event(&book_event(0, 10));
        let order = s.place_limit(Side::BUY, px("100"), qty(2)).unwrap();
        assert_eq!(order.queue_ahead, qty(5));
        assert_eq!(order.created_at, 10);

        let executions = s.apply_event(&trade_event(1, 11, "100", 6, Side::SELL));
        assert_eq!(executions.len(), 2);
        assert_eq!(s.fills().len(), 1);
        assert_eq!(s.working_orders()[0].status, OrderStatus::Partial);
        assert_eq!(s.position().net_quantity, Decimal::ONE);
    }

    #[test]
    fn test_marks_against_mid_then_last_trade() {
        let mut s = session();
        s.apply_event(&book_event(0, 10));
        s.place_market(Side::BUY, qty(1)).unwrap();
        // Bought at 100.25, mid is 100.125.
        assert_eq!(s.position().unrealized_pnl, Decimal::new(-125, 3));

        s.apply_event(&trade_event(1, 11, "100.5", 1, Side::BUY));
        assert_eq!(s.position().unrealized_pnl, Decimal::new(25, 2));
    }

    #[test]
    fn test_ladder_follows_last_trade_until_anchored() {
        let mut s = session();
        s.apply_event(&book_event(0, 10));
        assert_eq!(s.ladder().unwrap().anchor_tick, 400);

        s.apply_event(&trade_event(1, 11, "101", 1, Side::BUY));
        let ladder = s.ladder().unwrap();
        assert_eq!(ladder.anchor_tick, 404);
        assert_eq!(ladder.level(404).unwrap().volume, qty(1));

        s.set_anchor(Some(390));
        s.apply_event(&trade_event(2, 12, "102", 1, Side::BUY));
        assert_eq!(s.ladder().unwrap().anchor_tick, 390);
    }

    #[test]
    fn test_extend_window_persists() {
        let mut s = session();
        s.apply_event(&book_event(0, 10));
        let extended = s.extend_window(WindowDirection::Down, None).unwrap();
        assert_eq!(extended.len(), 9 + 2);
        assert_eq!(s.ladder().unwrap(), extended);
    }

    #[test]
    fn test_snapshot_contents() {
        let mut s = session();
        s.apply_event(&book_event(0, 10));
        s.place_limit(Side::SELL, px("100.25"), qty(3)).unwrap();
        let snapshot = s.snapshot().unwrap();
        assert_eq!(snapshot.sequence, Some(0));
        assert_eq!(snapshot.working_orders.len(), 1);
        assert_eq!(snapshot.top_of_book.best_bid.unwrap().price, px("100"));
        assert!(snapshot.fills.is_empty());
        assert!(snapshot.pending_print.is_none());
    }
}
