//! Simulated execution logic
//!
//! Market sweeps against displayed depth, queue-position fills from tape
//! volume, and fill bookkeeping.

pub mod executor;
pub mod queue;
pub mod sweep;

pub use executor::FillExecutor;
pub use queue::{allocate, QueueAllocation};
pub use sweep::{plan_sweep, SweepFill};
