//! Replay scheduler
//!
//! Single-threaded, cooperative driver over a normalized event log. Each
//! `step` applies exactly one event and reports how long to wait before the
//! next one; pacing is left to the caller, so speed changes wall-clock
//! timing only, never event order or outcome.
//!
//! The scheduler owns the print aggregation buffer and flushes it on pause,
//! stop and end of stream. It also drains the engine's execution outbox on
//! every step and command, keeping only the latest step's events.

use std::time::{Duration, Instant};

use market_data::events::MarketEvent;
use market_data::ingestion::NormalizedLog;
use market_data::trades::PrintAggregator;
use matching_engine::ExecutionEvent;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::checksum::snapshot_checksum;
use crate::config::ReplayConfig;
use crate::session::{Command, Session, SessionSnapshot};
use crate::ReplayError;

/// What the caller should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// An event was applied; wait this long before the next step.
    Delay(Duration),
    /// Paused; nothing was applied.
    Paused,
    /// No events left.
    Finished,
}

/// Replay statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayMetrics {
    pub events_replayed: u64,
    pub fills: usize,
    pub duration_ms: u64,
    pub events_per_second: f64,
    /// Checksum of the final session snapshot.
    pub state_checksum: String,
}

pub struct ReplayScheduler {
    events: Vec<MarketEvent>,
    cursor: usize,
    session: Session,
    aggregator: PrintAggregator,
    speed: f64,
    min_delay: Duration,
    max_delay: Duration,
    paused: bool,
    stopped: bool,
    expected_checksum: Option<String>,
    /// Executions produced by the most recent step.
    executions: Vec<ExecutionEvent>,
}

impl ReplayScheduler {
    pub fn new(log: NormalizedLog, config: &ReplayConfig) -> Result<Self, ReplayError> {
        let playback = &config.playback;
        validate_speed(playback.speed)?;

        info!(
            events = log.events.len(),
            tick_size = %log.tick_size.as_decimal(),
            tick_size_source = ?log.tick_size_source,
            speed = playback.speed,
            "Replay scheduler ready"
        );

        Ok(Self {
            session: Session::new(log.tick_size, config),
            events: log.events,
            cursor: 0,
            aggregator: PrintAggregator::new(playback.aggregation_window_ms),
            speed: playback.speed,
            min_delay: Duration::from_millis(playback.min_delay_ms),
            max_delay: Duration::from_millis(playback.max_delay_ms),
            paused: false,
            stopped: false,
            expected_checksum: None,
            executions: Vec::new(),
        })
    }

    /// Fail `run_to_end` unless the final state hashes to `checksum`.
    pub fn with_expected_checksum(mut self, checksum: String) -> Self {
        self.expected_checksum = Some(checksum);
        self
    }

    /// Apply the next event.
    pub fn step(&mut self) -> StepOutcome {
        self.executions.clear();
        if self.stopped || self.cursor >= self.events.len() {
            self.flush_prints();
            return StepOutcome::Finished;
        }
        if self.paused {
            return StepOutcome::Paused;
        }

        let event = &self.events[self.cursor];
        self.cursor += 1;
        self.session.apply_event(event);
        self.executions = self.session.drain_executions();
        if let Some(trade) = event.as_trade() {
            if let Some(closed) = self.aggregator.push(trade) {
                self.session.push_print(closed);
            }
        }

        let current = event.timestamp;
        match self.events.get(self.cursor).map(|next| next.timestamp) {
            Some(next) => StepOutcome::Delay(self.delay_between(current, next)),
            None => {
                self.flush_prints();
                debug!(events = self.events.len(), "End of log reached");
                StepOutcome::Finished
            }
        }
    }

    /// Wall-clock delay between two event timestamps at the current speed.
    pub fn delay_between(&self, current: i64, next: i64) -> Duration {
        let gap_ms = (next - current).max(0) as f64 / self.speed;
        Duration::from_micros((gap_ms * 1_000.0).round() as u64)
            .clamp(self.min_delay, self.max_delay)
    }

    /// Stop stepping. The cursor is kept and pending prints are flushed.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.flush_prints();
            info!(cursor = self.cursor, "Replay paused");
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            info!(cursor = self.cursor, "Replay resumed");
        }
    }

    /// End the replay early. Later steps report `Finished`.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.flush_prints();
        info!(cursor = self.cursor, remaining = self.remaining(), "Replay stopped");
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<(), ReplayError> {
        validate_speed(speed)?;
        debug!(previous = self.speed, speed, "Replay speed changed");
        self.speed = speed;
        Ok(())
    }

    /// Handle a command from the presentation layer.
    ///
    /// Returns the execution events the command produced.
    pub fn handle(&mut self, command: Command) -> Result<Vec<ExecutionEvent>, ReplayError> {
        debug!(command = ?command, "Command received");
        let events = match command {
            Command::PlaceLimit {
                side,
                price,
                quantity,
            } => {
                let order = self.session.place_limit(side, price, quantity)?;
                vec![ExecutionEvent::placed(&order)]
            }
            Command::PlaceMarket { side, quantity } => {
                self.session.place_market(side, quantity)?.events
            }
            Command::CancelAtPrice { price } => self.session.cancel_at_price(price),
            Command::SetAnchor { tick } => {
                self.session.set_anchor(tick);
                Vec::new()
            }
            Command::ExtendWindow { direction, batch } => {
                self.session.extend_window(direction, batch)?;
                Vec::new()
            }
            Command::SetSpeed { speed } => {
                self.set_speed(speed)?;
                Vec::new()
            }
            Command::Pause => {
                self.pause();
                Vec::new()
            }
            Command::Resume => {
                self.resume();
                Vec::new()
            }
        };
        // Already returned to the caller.
        self.session.drain_executions();
        Ok(events)
    }

    /// Step through the rest of the log without pacing.
    ///
    /// Stops early if paused.
    pub fn run_to_end(&mut self) -> Result<ReplayMetrics, ReplayError> {
        let start = Instant::now();
        let first = self.cursor;

        loop {
            let outcome = self.step();
            self.log_executions();
            if !matches!(outcome, StepOutcome::Delay(_)) {
                break;
            }
        }

        let events_replayed = (self.cursor - first) as u64;
        let duration_ms = start.elapsed().as_millis() as u64;
        let events_per_second = if duration_ms > 0 {
            events_replayed as f64 / (duration_ms as f64 / 1000.0)
        } else {
            events_replayed as f64
        };

        let state_checksum = self.state_checksum()?;
        if let Some(expected) = &self.expected_checksum {
            if &state_checksum != expected {
                error!(
                    expected = %expected,
                    actual = %state_checksum,
                    "State checksum mismatch after replay"
                );
                return Err(ReplayError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual: state_checksum,
                });
            }
        }

        let metrics = ReplayMetrics {
            events_replayed,
            fills: self.session.fills().len(),
            duration_ms,
            events_per_second,
            state_checksum,
        };

        info!(
            events_replayed = metrics.events_replayed,
            fills = metrics.fills,
            duration_ms = metrics.duration_ms,
            eps = %format!("{:.0}", metrics.events_per_second),
            "Replay run completed"
        );
        Ok(metrics)
    }

    /// Current state, including the open print.
    pub fn snapshot(&self) -> Result<SessionSnapshot, ReplayError> {
        let mut snapshot = self.session.snapshot()?;
        snapshot.pending_print = self.aggregator.pending().cloned();
        Ok(snapshot)
    }

    pub fn state_checksum(&self) -> Result<String, ReplayError> {
        Ok(snapshot_checksum(&self.snapshot()?)?)
    }

    /// Execution events produced by the last `step`.
    pub fn last_executions(&self) -> &[ExecutionEvent] {
        &self.executions
    }

    /// Log the last step's executions.
    pub fn log_executions(&self) {
        for execution in &self.executions {
            info!(
                order_id = %execution.order_id(),
                event = execution.label(),
                "Execution"
            );
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.cursor
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.stopped || self.cursor >= self.events.len()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    fn flush_prints(&mut self) {
        if let Some(print) = self.aggregator.flush() {
            debug!(price = %print.price, size = %print.size, "Print flushed");
            self.session.push_print(print);
        }
    }
}

fn validate_speed(speed: f64) -> Result<(), ReplayError> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(ReplayError::InvalidSpeed(speed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_data::events::MarketEventPayload;
    use market_data::ingestion::{NormalizationStats, TickSizeSource};
    use rust_decimal::Decimal;
    use types::numeric::{Price, Quantity, TickSize};
    use types::order::Side;
    use types::trade::TapeTrade;

    fn trade(seq: u64, ts: i64, price: u64, size: u64) -> MarketEvent {
        MarketEvent::new(
            seq,
            ts,
            MarketEventPayload::Trade(TapeTrade::new(
                ts,
                Price::from_u64(price),
                Quantity::from_u64(size),
                Side::BUY,
            )),
        )
    }

    fn scheduler(events: Vec<MarketEvent>) -> ReplayScheduler {
        let log = NormalizedLog {
            events,
            tick_size: TickSize::new(Decimal::ONE).unwrap(),
            tick_size_source: TickSizeSource::Configured,
            stats: NormalizationStats::default(),
        };
        ReplayScheduler::new(log, &ReplayConfig::default()).unwrap()
    }

    #[test]
    fn test_delay_is_scaled_and_clamped() {
        let mut s = scheduler(Vec::new());
        assert_eq!(s.delay_between(0, 200), Duration::from_millis(200));
        assert_eq!(s.delay_between(0, 0), Duration::from_millis(1));
        assert_eq!(s.delay_between(0, 60_000), Duration::from_millis(1_000));

        s.set_speed(4.0).unwrap();
        assert_eq!(s.delay_between(0, 200), Duration::from_millis(50));
    }

    #[test]
    fn test_rejects_bad_speed() {
        let mut s = scheduler(Vec::new());
        assert!(matches!(s.set_speed(0.0), Err(ReplayError::InvalidSpeed(_))));
        assert!(s.set_speed(f64::NAN).is_err());
        assert_eq!(s.speed(), 1.0);
    }

    #[test]
    fn test_step_reports_gap_to_next_event() {
        let mut s = scheduler(vec![trade(0, 100, 10, 1), trade(1, 350, 11, 1)]);
        assert_eq!(s.step(), StepOutcome::Delay(Duration::from_millis(250)));
        assert_eq!(s.step(), StepOutcome::Finished);
        assert_eq!(s.step(), StepOutcome::Finished);
        assert_eq!(s.cursor(), 2);
    }

    #[test]
    fn test_pause_keeps_cursor_and_flushes() {
        let mut s = scheduler(vec![
            trade(0, 100, 10, 1),
            trade(1, 101, 10, 2),
            trade(2, 500, 10, 1),
        ]);
        s.step();
        s.step();
        assert!(s.snapshot().unwrap().pending_print.is_some());

        s.pause();
        assert_eq!(s.step(), StepOutcome::Paused);
        assert_eq!(s.cursor(), 2);
        let snapshot = s.snapshot().unwrap();
        assert!(snapshot.pending_print.is_none());
        assert_eq!(snapshot.prints.len(), 1);
        assert_eq!(snapshot.prints[0].size, Quantity::from_u64(3));

        s.resume();
        assert_eq!(s.step(), StepOutcome::Finished);
        assert_eq!(s.snapshot().unwrap().prints.len(), 2);
    }

    #[test]
    fn test_steps_drain_the_execution_outbox() {
        let mut s = scheduler(vec![trade(0, 100, 10, 1), trade(1, 200, 10, 1)]);
        let placed = s
            .handle(Command::PlaceLimit {
                side: Side::SELL,
                price: Price::from_u64(10),
                quantity: Quantity::from_u64(2),
            })
            .unwrap();
        assert_eq!(placed.len(), 1);
        assert!(s.session_mut().drain_executions().is_empty());

        s.step();
        let labels: Vec<&str> = s.last_executions().iter().map(ExecutionEvent::label).collect();
        assert_eq!(labels, vec!["OrderFilled"]);
        assert!(s.session_mut().drain_executions().is_empty());

        // The final fill lands on the step that finishes the log.
        let metrics = s.run_to_end().unwrap();
        assert_eq!(metrics.fills, 2);
        assert_eq!(s.last_executions().len(), 1);
        assert!(s.session_mut().drain_executions().is_empty());

        assert_eq!(s.step(), StepOutcome::Finished);
        assert!(s.last_executions().is_empty());
    }

    #[test]
    fn test_stop_flushes_and_finishes() {
        let mut s = scheduler(vec![trade(0, 100, 10, 1), trade(1, 200, 10, 1)]);
        s.step();
        s.stop();
        assert_eq!(s.step(), StepOutcome::Finished);
        assert_eq!(s.remaining(), 1);
        assert_eq!(s.snapshot().unwrap().prints.len(), 1);
    }

    #[test]
    fn test_expected_checksum_mismatch() {
        let mut s =
            scheduler(vec![trade(0, 100, 10, 1)]).with_expected_checksum("deadbeef".into());
        assert!(matches!(
            s.run_to_end(),
            Err(ReplayError::ChecksumMismatch { .. })
        ));
    }
}
