//! Simulated Tick Source
//!
//! Produces mocked price observations with a small artificial latency,
//! keeping the pipeline runnable without a market-data subscription.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use crate::application::ports::{SourceError, TickSource};
use crate::domain::tick::{round2, Tick};

/// Mocked tick source with uniform random prices and volumes.
#[derive(Debug, Clone)]
pub struct SimTickSource {
    latency: Duration,
}

impl SimTickSource {
    /// Create a source with the given simulated upstream latency.
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for SimTickSource {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

#[async_trait]
impl TickSource for SimTickSource {
    async fn fetch(&self, symbol: &str) -> Result<Tick, SourceError> {
        tokio::time::sleep(self.latency).await;

        let mut rng = rand::rng();
        let price = round2(rng.random_range(100.0..500.0));
        let volume = rng.random_range(1_000..5_000_000);

        Ok(Tick {
            symbol: symbol.to_string(),
            price,
            volume,
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn produces_valid_ticks() {
        let source = SimTickSource::new(Duration::ZERO);
        let tick = source.fetch("AAPL").await.unwrap();
        assert_eq!(tick.symbol, "AAPL");
        assert!(tick.validate().is_ok());
        assert!((100.0..500.0).contains(&tick.price));
        assert!((1_000..5_000_000).contains(&tick.volume));
    }
}
