//! Market order sweep planning
//!
//! A market order walks the opposite side best level first, taking
//! `min(remaining, level size)` at each. Whatever is left after the last
//! quoted level fills at that worst level's price. The simulated order
//! is never granted better liquidity than the book showed.

use types::book::BookLevel;
use types::numeric::{Price, Quantity};

/// One planned fill of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepFill {
    pub price: Price,
    pub quantity: Quantity,
    /// Filled beyond displayed depth at the worst level.
    pub beyond_depth: bool,
}

/// Plan the fills for sweeping `quantity` through `levels` (best first).
///
/// Returns an empty plan when there are no levels or nothing to fill.
/// Zero-size levels are skipped.
pub fn plan_sweep(levels: &[BookLevel], quantity: Quantity) -> Vec<SweepFill> {
    let mut plan = Vec::new();
    let mut remaining = quantity;
    let mut worst: Option<Price> = None;

    for level in levels.iter().filter(|level| !level.size.is_zero()) {
        if remaining.is_zero() {
            break;
        }
        let take = remaining.min(level.size);
        plan.push(SweepFill {
            price: level.price,
            quantity: take,
            beyond_depth: false,
        });
        remaining = remaining - take;
        worst = Some(level.price);
    }

    if !remaining.is_zero() {
        // Depth exhausted: the remainder goes at the last level seen. With
        // every level empty, fall back to the best quoted price.
        let price = worst.or_else(|| levels.last().map(|level| level.price));
        if let Some(price) = price {
            plan.push(SweepFill {
                price,
                quantity: remaining,
                beyond_depth: true,
            });
        }
    }

    plan
}
