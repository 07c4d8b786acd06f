//! Windowed Price Aggregation
//!
//! Bounded per-symbol FIFO price windows and the rolling moving average
//! derived from them.
//!
//! # Design
//!
//! Windows are created lazily on the first observation of a symbol and are
//! never explicitly destroyed; they live as long as the warm worker that
//! owns the [`WindowBank`]. State is in-memory only: a cold start begins
//! every window empty, so the first observation after a restart yields a
//! moving average equal to that single price.
//!
//! Neither type is thread-safe by itself. The batch coordinator owns the
//! bank behind a lock so window access is single-writer per symbol.

use std::collections::{HashMap, VecDeque};

use crate::domain::tick::round2;

/// Default number of prices held per symbol window.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

// =============================================================================
// Price Window
// =============================================================================

/// A bounded FIFO of the most recent prices for one symbol.
///
/// Appending at capacity evicts the oldest price (ring-buffer semantics),
/// so `len() <= capacity` always holds.
#[derive(Debug, Clone)]
pub struct PriceWindow {
    prices: VecDeque<f64>,
    capacity: usize,
}

impl PriceWindow {
    /// Create an empty window holding at most `capacity` prices.
    ///
    /// A zero capacity is clamped to 1 so the window always reflects at
    /// least the latest price.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            prices: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a price, evicting the oldest if the window is full.
    pub fn push(&mut self, price: f64) {
        if self.prices.len() == self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
    }

    /// Arithmetic mean of the currently held prices.
    ///
    /// Returns 0.0 for an empty window; callers always push before reading.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.prices.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let len = self.prices.len() as f64;
        self.prices.iter().sum::<f64>() / len
    }

    /// Number of prices currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Check whether the window holds no prices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

// =============================================================================
// Window Bank
// =============================================================================

/// Per-symbol arena of price windows for one warm worker.
#[derive(Debug)]
pub struct WindowBank {
    windows: HashMap<String, PriceWindow>,
    capacity: usize,
}

impl WindowBank {
    /// Create an empty bank whose windows hold at most `capacity` prices.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            windows: HashMap::new(),
            capacity,
        }
    }

    /// Record a price for a symbol and return the rolling moving average.
    ///
    /// Creates the symbol's window on first observation. The returned
    /// average includes the just-appended price and is rounded to 2
    /// decimals (see [`round2`](crate::domain::tick::round2)).
    pub fn observe(&mut self, symbol: &str, price: f64) -> f64 {
        let window = self
            .windows
            .entry(symbol.to_string())
            .or_insert_with(|| PriceWindow::new(self.capacity));
        window.push(price);
        round2(window.mean())
    }

    /// Number of symbols with a live window.
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.windows.len()
    }

    /// Current window length for a symbol, if one exists.
    #[must_use]
    pub fn window_len(&self, symbol: &str) -> Option<usize> {
        self.windows.get(symbol).map(PriceWindow::len)
    }
}

impl Default for WindowBank {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn first_observation_equals_price() {
        let mut bank = WindowBank::default();
        assert_eq!(bank.observe("AAPL", 150.0), 150.0);
        assert_eq!(bank.window_len("AAPL"), Some(1));
    }

    #[test]
    fn second_observation_averages_both() {
        let mut bank = WindowBank::default();
        bank.observe("AAPL", 150.0);
        assert_eq!(bank.observe("AAPL", 160.0), 155.0);
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        let mut bank = WindowBank::default();
        bank.observe("AAPL", 100.0);
        bank.observe("AAPL", 100.0);
        // (100 + 100 + 110) / 3 = 103.3333..
        assert_eq!(bank.observe("AAPL", 110.0), 103.33);
    }

    #[test]
    fn window_evicts_oldest_at_capacity() {
        let mut bank = WindowBank::new(3);
        bank.observe("AAPL", 10.0);
        bank.observe("AAPL", 20.0);
        bank.observe("AAPL", 30.0);
        // 10.0 evicted: (20 + 30 + 40) / 3
        assert_eq!(bank.observe("AAPL", 40.0), 30.0);
        assert_eq!(bank.window_len("AAPL"), Some(3));
    }

    #[test]
    fn symbols_have_independent_windows() {
        let mut bank = WindowBank::default();
        bank.observe("AAPL", 100.0);
        assert_eq!(bank.observe("MSFT", 300.0), 300.0);
        assert_eq!(bank.observe("AAPL", 200.0), 150.0);
        assert_eq!(bank.symbol_count(), 2);
    }

    #[test]
    fn zero_capacity_clamps_to_one() {
        let mut window = PriceWindow::new(0);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.len(), 1);
        assert_eq!(window.mean(), 2.0);
    }

    #[test]
    fn empty_window_mean_is_zero() {
        let window = PriceWindow::new(5);
        assert!(window.is_empty());
        assert_eq!(window.mean(), 0.0);
    }

    proptest! {
        /// After k observations, the average equals the rounded mean of the
        /// last min(k, N) prices.
        #[test]
        fn moving_average_matches_tail_mean(
            prices in prop::collection::vec(0.01_f64..10_000.0, 1..20),
            capacity in 1_usize..8,
        ) {
            let mut bank = WindowBank::new(capacity);
            let mut last = 0.0;
            for price in &prices {
                last = bank.observe("SYM", *price);
            }

            let tail_start = prices.len().saturating_sub(capacity);
            let tail = &prices[tail_start..];
            #[allow(clippy::cast_precision_loss)]
            let expected = round2(tail.iter().sum::<f64>() / tail.len() as f64);
            prop_assert!((last - expected).abs() < 1e-9);
        }
    }
}
