//! Simulated Matching Engine
//!
//! Executes simulated orders against replayed market data with
//! queue-position realism.
//!
//! **Key Invariants:**
//! - Queue ahead of a resting order never grows and never goes negative
//! - Tape volume is shared across resting orders in arrival order, never
//!   duplicated
//! - Market orders are never filled better than the displayed book
//! - Realized plus unrealized P&L always equals total P&L
//! - Deterministic execution (same inputs → same outputs)

pub mod book;
pub mod engine;
pub mod events;
pub mod matching;

pub use engine::{EngineConfig, MarketExecution, MatchingEngine};
pub use events::ExecutionEvent;
