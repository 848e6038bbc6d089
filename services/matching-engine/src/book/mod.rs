//! Resting-order bookkeeping
//!
//! Per-tick FIFO queues of simulated orders, for both sides.

pub mod resting_book;
pub mod tick_queue;

pub use resting_book::RestingBook;
pub use tick_queue::TickQueue;
