#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Tickflow - Market Tick Stream Pipeline
//!
//! Publishes per-symbol market ticks onto an ordered, partitioned,
//! at-least-once stream and consumes that stream in batches, computing a
//! rolling per-symbol moving average and persisting both the raw tick and
//! the enriched record.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: Pure types and windowed aggregation
//!   - `tick`: Tick and enriched record types with field validation
//!   - `window`: Bounded per-symbol price windows and moving averages
//!   - `archive`: Deterministic time-partitioned blob keys
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Interfaces for the tick source, stream transport, and sinks
//!   - `services`: Publisher retry loop, record codec, dual-sink persister,
//!     batch coordinator
//!
//! - **Infrastructure**: Adapters and wiring
//!   - `config`: Environment-driven configuration
//!   - `telemetry`: Structured logging setup
//!   - `metrics`: Prometheus counters
//!   - `sim`, `memory`, `fs`, `secrets`: Concrete port adapters
//!
//! # Data Flow
//!
//! ```text
//! Tick Source ──► Publisher ──► Stream Transport ──► Batch Coordinator
//!                (retry/backoff)  (ordered,          │
//!                                  partitioned,      ├─► Decoder
//!                                  at-least-once)    ├─► Window Aggregator
//!                                                    └─► Dual-Sink Persister
//!                                                         ├─► Keyed Store
//!                                                         └─► Blob Store
//! ```
//!
//! Each batch returns only the delivery identifiers that failed; the
//! transport redelivers exactly those records.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Pure tick, window, and archive-key types.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::archive::blob_key;
pub use domain::tick::{EnrichedRecord, Tick, TickError};
pub use domain::window::{PriceWindow, WindowBank, DEFAULT_WINDOW_SIZE};

// Ports and shared result types
pub use application::ports::{
    BatchResult, BlobStore, DeliveredRecord, DeliveryId, KeyedStore, ProducerSummary, PublishAck,
    SecretsError, SecretsProvider, SinkError, SourceError, StreamTransport, TickSource,
    TransportError,
};

// Services
pub use application::services::codec::{decode_record, encode_tick, DecodeError};
pub use application::services::persister::Persister;
pub use application::services::processor::BatchProcessor;
pub use application::services::publisher::Publisher;
pub use application::services::retry::{BackoffPolicy, RetryConfig};

// Infrastructure config
pub use infrastructure::config::{ConfigError, PipelineConfig};

// Adapters (for integration tests and the local pipeline binary)
pub use infrastructure::fs::FsBlobStore;
pub use infrastructure::memory::{MemoryBlobStore, MemoryKeyedStore, MemoryTransport};
pub use infrastructure::secrets::EnvSecretsProvider;
pub use infrastructure::sim::SimTickSource;

// Metrics
pub use infrastructure::metrics::init_metrics;
