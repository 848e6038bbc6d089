//! Tick-size inference from observed prices
//!
//! Collects distinct prices while the log is normalized. Once enough prices
//! have been observed, the smallest positive gap between neighbouring
//! distinct prices is snapped to a canonical tick size and frozen.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use tracing::info;
use types::numeric::{Price, TickSize};

/// Infers and then freezes the tick size.
#[derive(Debug, Clone)]
pub struct TickSizeEstimator {
    samples: BTreeSet<Decimal>,
    observed: usize,
    min_samples: usize,
    max_samples: usize,
    inferred: Option<TickSize>,
}

impl TickSizeEstimator {
    pub fn new(min_samples: usize, max_samples: usize) -> Self {
        Self {
            samples: BTreeSet::new(),
            observed: 0,
            min_samples: min_samples.max(2),
            max_samples: max_samples.max(2),
            inferred: None,
        }
    }

    /// Record a price. Returns the tick size once it is known.
    pub fn observe(&mut self, price: Price) -> Option<TickSize> {
        if self.inferred.is_some() {
            return self.inferred;
        }

        self.observed += 1;
        if self.samples.len() < self.max_samples {
            self.samples.insert(price.as_decimal());
        }

        if self.observed >= self.min_samples {
            self.try_infer();
        }
        self.inferred
    }

    /// Last chance at end of input: infer from whatever was sampled.
    pub fn finish(&mut self) -> Option<TickSize> {
        if self.inferred.is_none() {
            self.try_infer();
        }
        self.inferred
    }

    pub fn inferred(&self) -> Option<TickSize> {
        self.inferred
    }

    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Smallest positive gap between neighbouring distinct samples.
    pub fn min_positive_delta(&self) -> Option<Decimal> {
        self.samples
            .iter()
            .zip(self.samples.iter().skip(1))
            .map(|(lo, hi)| hi - lo)
            .filter(|delta| *delta > Decimal::ZERO)
            .min()
    }

    fn try_infer(&mut self) {
        if let Some(delta) = self.min_positive_delta() {
            let tick_size = TickSize::snap(delta);
            info!(
                min_delta = %delta,
                tick_size = %tick_size,
                samples = self.samples.len(),
                observed = self.observed,
                "Tick size inferred"
            );
            self.inferred = Some(tick_size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn p(s: &str) -> Price {
        s.parse().unwrap()
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_waits_for_min_samples() {
        let mut est = TickSizeEstimator::new(4, 100);
        assert!(est.observe(p("100")).is_none());
        assert!(est.observe(p("100.25")).is_none());
        assert!(est.observe(p("100.75")).is_none());
        let ts = est.observe(p("101")).unwrap();
        assert_eq!(ts.as_decimal(), d("0.25"));
    }

    #[test]
    fn test_frozen_after_inference() {
        let mut est = TickSizeEstimator::new(2, 100);
        est.observe(p("100"));
        est.observe(p("100.5"));
        assert_eq!(est.inferred().unwrap().as_decimal(), d("0.5"));

        // A finer increment later does not change the frozen value.
        est.observe(p("100.01"));
        assert_eq!(est.inferred().unwrap().as_decimal(), d("0.5"));
    }

    #[test]
    fn test_snaps_noisy_delta() {
        let mut est = TickSizeEstimator::new(3, 100);
        est.observe(p("10.00"));
        est.observe(p("10.12"));
        est.observe(p("10.36"));
        assert_eq!(est.inferred().unwrap().as_decimal(), d("0.1"));
    }

    #[test]
    fn test_identical_prices_do_not_infer() {
        let mut est = TickSizeEstimator::new(2, 100);
        for _ in 0..10 {
            est.observe(p("100"));
        }
        assert!(est.inferred().is_none());
        assert!(est.finish().is_none());
    }

    #[test]
    fn test_finish_uses_partial_sample() {
        let mut est = TickSizeEstimator::new(50, 100);
        est.observe(p("5"));
        est.observe(p("6"));
        assert!(est.inferred().is_none());
        assert_eq!(est.finish().unwrap().as_decimal(), Decimal::ONE);
    }
}
