//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following the
//! Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`TickSource`]: Produces one price observation per symbol per call
//! - [`StreamTransport`]: Ordered, partitioned, at-least-once record stream
//! - [`KeyedStore`]: Last-write-wins upsert store keyed by symbol
//! - [`BlobStore`]: Create-or-overwrite object store for raw events
//! - [`SecretsProvider`]: JSON secret lookup, queried once per warm lifetime
//!
//! The transport delivers records in batches; the consumer answers with a
//! [`BatchResult`] naming only the delivery identifiers that failed, and
//! the transport redelivers exactly those records.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::tick::{EnrichedRecord, Tick};

// =============================================================================
// Shared Types
// =============================================================================

/// Transport-assigned identifier for one delivered record.
pub type DeliveryId = String;

/// Acknowledgement returned by a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishAck {
    /// Transport-assigned sequence identifier within the shard.
    pub sequence_id: String,
    /// Shard the record was routed to by its partition key.
    pub shard_id: String,
}

/// One record handed to the consumer inside a delivery batch.
///
/// The payload is the serialized tick, base64-encoded by the transport
/// envelope.
#[derive(Debug, Clone)]
pub struct DeliveredRecord {
    /// Identifier used to report this record back as failed.
    pub delivery_id: DeliveryId,
    /// Base64-encoded serialized tick.
    pub payload: String,
}

/// Result of one batch invocation: the delivery identifiers that failed.
///
/// An empty set means full success. This is the only value the consumer
/// returns to the transport's redelivery mechanism.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Identifiers of records that must be redelivered.
    pub failed_ids: Vec<DeliveryId>,
}

impl BatchResult {
    /// Check whether every record in the batch succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_ids.is_empty()
    }
}

/// Summary returned by one producer invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerSummary {
    /// Symbols whose tick was durably published.
    pub published: u32,
    /// Symbols that failed fetch or exhausted publish retries.
    pub failed: u32,
}

// =============================================================================
// Errors
// =============================================================================

/// Tick source failure.
#[derive(Debug, thiserror::Error)]
#[error("tick source error: {0}")]
pub struct SourceError(pub String);

/// Stream transport publish failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Transient failure; the publisher retries with backoff.
    #[error("transient transport failure: {0}")]
    Transient(String),
    /// Permanent failure; retrying cannot help.
    #[error("fatal transport failure: {0}")]
    Fatal(String),
}

impl TransportError {
    /// Check whether this failure is worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Persistence failure, naming the sink that failed.
///
/// The two sink writes are independent; a failure in either marks the
/// whole record failed and transport redelivery is the retry mechanism.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The keyed store write failed.
    #[error("keyed store write failed: {0}")]
    KeyedStore(String),
    /// The blob store write failed.
    #[error("blob store write failed: {0}")]
    BlobStore(String),
}

impl SinkError {
    /// Name of the failed sink, for logs and metrics labels.
    #[must_use]
    pub const fn sink_name(&self) -> &'static str {
        match self {
            Self::KeyedStore(_) => "keyed_store",
            Self::BlobStore(_) => "blob_store",
        }
    }
}

/// Secrets provider failure.
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    /// No secret exists under the requested name.
    #[error("secret not found: {0}")]
    NotFound(String),
    /// The provider rejected or failed the request.
    #[error("secret access failed: {0}")]
    Access(String),
    /// The stored secret is not a JSON object.
    #[error("secret is not valid JSON: {0}")]
    Malformed(String),
}

// =============================================================================
// Ports
// =============================================================================

/// Source of price observations, one tick per symbol per call.
///
/// May be slow (upstream latency) but must not block longer than a small
/// bounded delay.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TickSource: Send + Sync {
    /// Fetch the current tick for a symbol.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the observation cannot be produced.
    async fn fetch(&self, symbol: &str) -> Result<Tick, SourceError>;
}

/// Ordered, partitioned, at-least-once record stream.
///
/// Records sharing a partition key are delivered in relative order to the
/// same consumer shard. Redeliveries carry no ordering guarantee relative
/// to newer records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Submit one serialized record under a partition key.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`]; `Transient` failures are retried by
    /// the publisher, `Fatal` ones surface immediately.
    async fn publish(&self, partition_key: &str, payload: &[u8])
        -> Result<PublishAck, TransportError>;
}

/// Last-write-wins record store keyed by symbol.
///
/// Holds only the latest enriched record per symbol, not history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Upsert the enriched record under its symbol.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::KeyedStore`] on failure.
    async fn put(&self, record: &EnrichedRecord) -> Result<(), SinkError>;
}

/// Create-or-overwrite object store for raw-event archival.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write a JSON object at the given key.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::BlobStore`] on failure.
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), SinkError>;
}

/// Named JSON secret lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretsProvider: Send + Sync {
    /// Retrieve a secret as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a [`SecretsError`] if the secret is missing, inaccessible,
    /// or not valid JSON.
    async fn get_secret(&self, name: &str) -> Result<serde_json::Value, SecretsError>;
}

// Shared adapters are handed around as `Arc`s by the pipeline binary and
// the integration tests; forward the ports through the pointer.

#[async_trait]
impl<T: StreamTransport + ?Sized> StreamTransport for Arc<T> {
    async fn publish(
        &self,
        partition_key: &str,
        payload: &[u8],
    ) -> Result<PublishAck, TransportError> {
        (**self).publish(partition_key, payload).await
    }
}

#[async_trait]
impl<T: KeyedStore + ?Sized> KeyedStore for Arc<T> {
    async fn put(&self, record: &EnrichedRecord) -> Result<(), SinkError> {
        (**self).put(record).await
    }
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), SinkError> {
        (**self).put(key, body).await
    }
}

#[async_trait]
impl<T: TickSource + ?Sized> TickSource for Arc<T> {
    async fn fetch(&self, symbol: &str) -> Result<Tick, SourceError> {
        (**self).fetch(symbol).await
    }
}

#[async_trait]
impl<T: SecretsProvider + ?Sized> SecretsProvider for Arc<T> {
    async fn get_secret(&self, name: &str) -> Result<serde_json::Value, SecretsError> {
        (**self).get_secret(name).await
    }
}
