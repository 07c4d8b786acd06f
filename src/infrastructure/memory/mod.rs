//! In-Process Stream and Store Adapters
//!
//! A stream transport and keyed/blob stores backed by process memory,
//! used by the local pipeline binary and the integration tests.
//!
//! [`MemoryTransport`] honors the transport contract the publisher and
//! consumer are written against: records are partitioned by key, delivered
//! in publish order, and redelivered at-least-once when a batch result
//! names their delivery identifier. Redelivery per record is capped so a
//! permanently poisoned record cannot loop forever; capped-out records are
//! parked and exposed for inspection.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use parking_lot::Mutex;

use crate::application::ports::{
    BatchResult, BlobStore, DeliveredRecord, DeliveryId, KeyedStore, PublishAck, SinkError,
    StreamTransport, TransportError,
};
use crate::domain::tick::EnrichedRecord;

// =============================================================================
// Memory Transport
// =============================================================================

/// Default redelivery cap per record before it is parked as poisoned.
pub const DEFAULT_MAX_DELIVERIES: u32 = 5;

#[derive(Debug, Clone)]
struct PendingRecord {
    delivery_id: DeliveryId,
    payload: String,
    deliveries: u32,
}

#[derive(Debug, Default)]
struct TransportState {
    queue: VecDeque<PendingRecord>,
    in_flight: HashMap<DeliveryId, PendingRecord>,
    parked: Vec<DeliveryId>,
    next_sequence: u64,
    next_delivery: u64,
    fail_next: u32,
}

/// Ordered, partitioned, at-least-once stream held in process memory.
#[derive(Debug)]
pub struct MemoryTransport {
    state: Mutex<TransportState>,
    shard_count: u64,
    max_deliveries: u32,
}

impl MemoryTransport {
    /// Create a transport with the given shard count and redelivery cap.
    #[must_use]
    pub fn new(shard_count: u64, max_deliveries: u32) -> Self {
        Self {
            state: Mutex::new(TransportState::default()),
            shard_count: shard_count.max(1),
            max_deliveries: max_deliveries.max(1),
        }
    }

    /// Make the next `n` publishes fail transiently (test hook).
    pub fn fail_next_publishes(&self, n: u32) {
        self.state.lock().fail_next = n;
    }

    /// Pull the next delivery batch, at most `max` records.
    ///
    /// Pulled records stay in flight until [`Self::complete_batch`] runs.
    #[must_use]
    pub fn next_batch(&self, max: usize) -> Vec<DeliveredRecord> {
        let mut state = self.state.lock();
        let mut batch = Vec::new();
        while batch.len() < max {
            let Some(record) = state.queue.pop_front() else {
                break;
            };
            batch.push(DeliveredRecord {
                delivery_id: record.delivery_id.clone(),
                payload: record.payload.clone(),
            });
            state.in_flight.insert(record.delivery_id.clone(), record);
        }
        batch
    }

    /// Resolve the in-flight batch against the consumer's result.
    ///
    /// Failed identifiers are redelivered (requeued at the front, so a
    /// redelivery may arrive before newer records); successful ones are
    /// dropped. A record that exceeds the redelivery cap is parked instead
    /// of requeued.
    pub fn complete_batch(&self, result: &BatchResult) {
        let mut state = self.state.lock();

        // Requeue failures in their original delivery order.
        for delivery_id in result.failed_ids.iter().rev() {
            let Some(mut record) = state.in_flight.remove(delivery_id) else {
                continue;
            };
            record.deliveries += 1;
            if record.deliveries >= self.max_deliveries {
                tracing::warn!(delivery_id = %record.delivery_id, "redelivery cap reached, parking record");
                state.parked.push(record.delivery_id);
            } else {
                state.queue.push_front(record);
            }
        }
        state.in_flight.clear();
    }

    /// Number of records waiting for delivery.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Delivery identifiers parked after exceeding the redelivery cap.
    #[must_use]
    pub fn parked_ids(&self) -> Vec<DeliveryId> {
        self.state.lock().parked.clone()
    }

    fn shard_for(&self, partition_key: &str) -> String {
        let mut hasher = DefaultHasher::new();
        partition_key.hash(&mut hasher);
        format!("shard-{:04}", hasher.finish() % self.shard_count)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(2, DEFAULT_MAX_DELIVERIES)
    }
}

#[async_trait]
impl StreamTransport for MemoryTransport {
    async fn publish(
        &self,
        partition_key: &str,
        payload: &[u8],
    ) -> Result<PublishAck, TransportError> {
        let shard_id = self.shard_for(partition_key);
        let mut state = self.state.lock();

        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(TransportError::Transient(
                "injected transient failure".to_string(),
            ));
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        let delivery = state.next_delivery;
        state.next_delivery += 1;

        state.queue.push_back(PendingRecord {
            delivery_id: format!("rec-{delivery}"),
            payload: BASE64.encode(payload),
            deliveries: 0,
        });

        Ok(PublishAck {
            sequence_id: sequence.to_string(),
            shard_id,
        })
    }
}

// =============================================================================
// Memory Keyed Store
// =============================================================================

/// Last-write-wins keyed store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryKeyedStore {
    records: Mutex<HashMap<String, EnrichedRecord>>,
    fail_next: Mutex<u32>,
}

impl MemoryKeyedStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` puts fail (test hook).
    pub fn fail_next_puts(&self, n: u32) {
        *self.fail_next.lock() = n;
    }

    /// Read the latest record for a symbol.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<EnrichedRecord> {
        self.records.lock().get(symbol).cloned()
    }

    /// Number of symbols with a stored record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl KeyedStore for MemoryKeyedStore {
    async fn put(&self, record: &EnrichedRecord) -> Result<(), SinkError> {
        {
            let mut fail_next = self.fail_next.lock();
            if *fail_next > 0 {
                *fail_next -= 1;
                return Err(SinkError::KeyedStore("injected failure".to_string()));
            }
        }
        self.records
            .lock()
            .insert(record.symbol.clone(), record.clone());
        Ok(())
    }
}

// =============================================================================
// Memory Blob Store
// =============================================================================

/// Create-or-overwrite blob store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an object's bytes.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(key).cloned()
    }

    /// All stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    /// Check whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), SinkError> {
        self.objects.lock().insert(key.to_string(), body.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn publish_n(transport: &MemoryTransport, n: usize) {
        for i in 0..n {
            let payload = format!("payload-{i}");
            transport
                .publish("AAPL", payload.as_bytes())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn delivers_in_publish_order() {
        let transport = MemoryTransport::default();
        publish_n(&transport, 3).await;

        let batch = transport.next_batch(10);
        let payloads: Vec<String> = batch
            .iter()
            .map(|r| String::from_utf8(BASE64.decode(&r.payload).unwrap()).unwrap())
            .collect();
        assert_eq!(payloads, vec!["payload-0", "payload-1", "payload-2"]);
    }

    #[tokio::test]
    async fn same_partition_key_maps_to_same_shard() {
        let transport = MemoryTransport::default();
        let a = transport.publish("AAPL", b"x").await.unwrap();
        let b = transport.publish("AAPL", b"y").await.unwrap();
        assert_eq!(a.shard_id, b.shard_id);
        assert_ne!(a.sequence_id, b.sequence_id);
    }

    #[tokio::test]
    async fn failed_ids_are_redelivered() {
        let transport = MemoryTransport::default();
        publish_n(&transport, 2).await;

        let batch = transport.next_batch(10);
        let failed = BatchResult {
            failed_ids: vec![batch[1].delivery_id.clone()],
        };
        transport.complete_batch(&failed);

        let redelivered = transport.next_batch(10);
        assert_eq!(redelivered.len(), 1);
        assert_eq!(redelivered[0].delivery_id, batch[1].delivery_id);
    }

    #[tokio::test]
    async fn successful_ids_are_not_redelivered() {
        let transport = MemoryTransport::default();
        publish_n(&transport, 2).await;

        let _batch = transport.next_batch(10);
        transport.complete_batch(&BatchResult::default());
        assert_eq!(transport.pending_len(), 0);
        assert!(transport.next_batch(10).is_empty());
    }

    #[tokio::test]
    async fn poisoned_record_is_parked_after_cap() {
        let transport = MemoryTransport::new(1, 3);
        transport.publish("AAPL", b"poison").await.unwrap();

        let mut last_id = String::new();
        for _ in 0..3 {
            let batch = transport.next_batch(10);
            assert_eq!(batch.len(), 1);
            last_id = batch[0].delivery_id.clone();
            transport.complete_batch(&BatchResult {
                failed_ids: vec![last_id.clone()],
            });
        }

        assert_eq!(transport.pending_len(), 0);
        assert_eq!(transport.parked_ids(), vec![last_id]);
    }

    #[tokio::test]
    async fn injected_publish_failures_are_transient() {
        let transport = MemoryTransport::default();
        transport.fail_next_publishes(1);

        let err = transport.publish("AAPL", b"x").await.unwrap_err();
        assert!(err.is_transient());
        assert!(transport.publish("AAPL", b"x").await.is_ok());
    }

    #[tokio::test]
    async fn keyed_store_is_last_write_wins() {
        let store = MemoryKeyedStore::new();
        let mut record = EnrichedRecord {
            symbol: "AAPL".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            price: 150.0,
            volume: 1000,
            moving_average: 150.0,
        };
        store.put(&record).await.unwrap();
        record.price = 160.0;
        store.put(&record).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("AAPL").unwrap().price, 160.0);
    }
}
