//! Types library for the tick replay workspace
//!
//! Core type definitions shared by the market-data, matching-engine and
//! replay packages. All prices and sizes are fixed-point decimals so that a
//! replay is bit-for-bit reproducible.
//!
//! # Modules
//! - `ids`: Monotonic identifiers (OrderId, FillId)
//! - `numeric`: Fixed-point types (Price, Quantity, Tick, TickSize)
//! - `order`: Simulated order lifecycle
//! - `trade`: Tape prints and fills
//! - `book`: Depth snapshots
//! - `position`: Net position and P&L
//! - `errors`: Error taxonomy

pub mod book;
pub mod errors;
pub mod ids;
pub mod numeric;
pub mod order;
pub mod position;
pub mod trade;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::book::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::position::*;
    pub use crate::trade::*;
}
