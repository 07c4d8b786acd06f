//! Dual-Sink Persister
//!
//! Writes the enriched record to the keyed store and the raw tick to the
//! time-partitioned blob archive. The two writes are independent: either
//! may fail without rolling back the other. No partial-write compensation
//! is attempted here; batch-level redelivery is the recovery mechanism.

use chrono::{DateTime, FixedOffset};
use metrics::counter;

use crate::application::ports::{BlobStore, KeyedStore, SinkError};
use crate::domain::archive::blob_key;
use crate::domain::tick::{EnrichedRecord, Tick};

/// Persists each processed record to both sinks.
pub struct Persister<K, B> {
    keyed: K,
    blobs: B,
}

impl<K, B> Persister<K, B>
where
    K: KeyedStore,
    B: BlobStore,
{
    /// Create a persister over the two sinks.
    pub const fn new(keyed: K, blobs: B) -> Self {
        Self { keyed, blobs }
    }

    /// Write the enriched record and archive the raw tick.
    ///
    /// The keyed store is written first, then the blob store; a crash
    /// between the two leaves them inconsistent until the symbol's next
    /// successful observation overwrites the keyed entry.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] naming whichever sink failed first.
    pub async fn persist(
        &self,
        enriched: &EnrichedRecord,
        raw: &Tick,
        event_time: &DateTime<FixedOffset>,
    ) -> Result<(), SinkError> {
        self.write_keyed(enriched).await?;
        self.write_blob(raw, event_time).await?;
        Ok(())
    }

    async fn write_keyed(&self, enriched: &EnrichedRecord) -> Result<(), SinkError> {
        match self.keyed.put(enriched).await {
            Ok(()) => {
                tracing::debug!(symbol = %enriched.symbol, "keyed store write ok");
                counter!("tickflow_sink_writes_total", "sink" => "keyed_store").increment(1);
                Ok(())
            }
            Err(err) => {
                tracing::error!(symbol = %enriched.symbol, error = %err, "keyed store write failed");
                counter!("tickflow_sink_failures_total", "sink" => "keyed_store").increment(1);
                Err(err)
            }
        }
    }

    async fn write_blob(
        &self,
        raw: &Tick,
        event_time: &DateTime<FixedOffset>,
    ) -> Result<(), SinkError> {
        let key = blob_key(&raw.symbol, event_time);
        let body = serde_json::to_vec(raw)
            .map_err(|err| SinkError::BlobStore(format!("raw tick serialization failed: {err}")))?;

        match self.blobs.put(&key, &body).await {
            Ok(()) => {
                tracing::debug!(symbol = %raw.symbol, key = %key, "blob store write ok");
                counter!("tickflow_sink_writes_total", "sink" => "blob_store").increment(1);
                Ok(())
            }
            Err(err) => {
                tracing::error!(symbol = %raw.symbol, key = %key, error = %err, "blob store write failed");
                counter!("tickflow_sink_failures_total", "sink" => "blob_store").increment(1);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockBlobStore, MockKeyedStore};

    fn sample() -> (Tick, EnrichedRecord, DateTime<FixedOffset>) {
        let tick = Tick {
            symbol: "AAPL".to_string(),
            price: 150.0,
            volume: 1000,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        };
        let enriched = EnrichedRecord::from_tick(&tick, 150.0);
        let event_time = tick.event_time().unwrap();
        (tick, enriched, event_time)
    }

    #[tokio::test]
    async fn persists_to_both_sinks() {
        let (tick, enriched, event_time) = sample();

        let mut keyed = MockKeyedStore::new();
        keyed
            .expect_put()
            .withf(|record| record.symbol == "AAPL")
            .times(1)
            .returning(|_| Ok(()));

        let mut blobs = MockBlobStore::new();
        blobs
            .expect_put()
            .withf(|key, _| key == "year=2024/month=01/day=01/AAPL-2024-01-01T00:00:00+00:00.json")
            .times(1)
            .returning(|_, _| Ok(()));

        let persister = Persister::new(keyed, blobs);
        assert!(persister.persist(&enriched, &tick, &event_time).await.is_ok());
    }

    #[tokio::test]
    async fn keyed_failure_skips_blob_write() {
        let (tick, enriched, event_time) = sample();

        let mut keyed = MockKeyedStore::new();
        keyed
            .expect_put()
            .times(1)
            .returning(|_| Err(SinkError::KeyedStore("conditional check".to_string())));

        let mut blobs = MockBlobStore::new();
        blobs.expect_put().times(0);

        let persister = Persister::new(keyed, blobs);
        let err = persister
            .persist(&enriched, &tick, &event_time)
            .await
            .unwrap_err();
        assert_eq!(err.sink_name(), "keyed_store");
    }

    #[tokio::test]
    async fn blob_failure_surfaces_after_keyed_write() {
        let (tick, enriched, event_time) = sample();

        let mut keyed = MockKeyedStore::new();
        keyed.expect_put().times(1).returning(|_| Ok(()));

        let mut blobs = MockBlobStore::new();
        blobs
            .expect_put()
            .times(1)
            .returning(|_, _| Err(SinkError::BlobStore("access denied".to_string())));

        let persister = Persister::new(keyed, blobs);
        let err = persister
            .persist(&enriched, &tick, &event_time)
            .await
            .unwrap_err();
        assert_eq!(err.sink_name(), "blob_store");
    }

    #[tokio::test]
    async fn blob_body_is_the_raw_tick() {
        let (tick, enriched, event_time) = sample();
        let expected = serde_json::to_vec(&tick).unwrap();

        let mut keyed = MockKeyedStore::new();
        keyed.expect_put().returning(|_| Ok(()));

        let mut blobs = MockBlobStore::new();
        blobs
            .expect_put()
            .withf(move |_, body| body == expected.as_slice())
            .times(1)
            .returning(|_, _| Ok(()));

        let persister = Persister::new(keyed, blobs);
        persister.persist(&enriched, &tick, &event_time).await.unwrap();
    }
}
