//! Batch Coordinator
//!
//! Drives decode -> validate -> window observe -> dual-sink persist for
//! each record in one delivered batch, isolating per-record failures and
//! assembling the partial-failure result.
//!
//! # Design
//!
//! Every stage returns an explicit `Result`; a failure marks that record's
//! delivery identifier failed and the loop continues, so one malformed or
//! transiently-failing record never blocks the rest of the batch and never
//! aborts the invocation. The transport redelivers exactly the failed
//! identifiers (at-least-once).
//!
//! The per-symbol window bank lives for the warm worker, shared across
//! batches behind a mutex so window access stays single-writer. A record
//! that fails after its window was already updated is not rolled back:
//! redelivery re-observes the same price and skews the window. That is an
//! accepted limitation of the at-least-once design.

use metrics::counter;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::application::ports::{
    BatchResult, BlobStore, DeliveredRecord, KeyedStore, SecretsProvider, SinkError,
};
use crate::application::services::codec::{decode_record, DecodeError};
use crate::application::services::persister::Persister;
use crate::domain::tick::EnrichedRecord;
use crate::domain::window::WindowBank;

/// Why one record in a batch failed.
#[derive(Debug, thiserror::Error)]
enum RecordError {
    /// Format/validation failure; redelivery will re-attempt identically.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Persistence failure; redelivery is the retry mechanism.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Coordinates one delivery batch end to end.
///
/// Owns the warm-worker state: the per-symbol window bank and the
/// once-per-lifetime secret cache.
pub struct BatchProcessor<K, B, P> {
    persister: Persister<K, B>,
    windows: Mutex<WindowBank>,
    secrets: P,
    secret_name: String,
    secret: OnceCell<Option<serde_json::Value>>,
}

impl<K, B, P> BatchProcessor<K, B, P>
where
    K: KeyedStore,
    B: BlobStore,
    P: SecretsProvider,
{
    /// Create a processor with empty windows (cold start).
    pub fn new(persister: Persister<K, B>, secrets: P, secret_name: String, window_size: usize) -> Self {
        Self {
            persister,
            windows: Mutex::new(WindowBank::new(window_size)),
            secrets,
            secret_name,
            secret: OnceCell::new(),
        }
    }

    /// Process one delivered batch and report the failed identifiers.
    ///
    /// Records are handled in delivery order. An empty `failed_ids` means
    /// full success; detailed error context goes to the logs only.
    pub async fn handle_batch(&self, records: &[DeliveredRecord]) -> BatchResult {
        self.ensure_secret().await;

        let mut result = BatchResult::default();
        for record in records {
            match self.process_record(record).await {
                Ok(enriched) => {
                    tracing::info!(
                        symbol = %enriched.symbol,
                        price = enriched.price,
                        moving_average = enriched.moving_average,
                        delivery_id = %record.delivery_id,
                        "record processed"
                    );
                    counter!("tickflow_records_processed_total").increment(1);
                }
                Err(err) => {
                    tracing::error!(
                        delivery_id = %record.delivery_id,
                        error = %err,
                        "record failed"
                    );
                    counter!("tickflow_records_failed_total").increment(1);
                    result.failed_ids.push(record.delivery_id.clone());
                }
            }
        }
        result
    }

    /// Whether the warm-lifetime secret was loaded successfully.
    pub fn secret_loaded(&self) -> bool {
        matches!(self.secret.get(), Some(Some(_)))
    }

    async fn process_record(&self, record: &DeliveredRecord) -> Result<EnrichedRecord, RecordError> {
        let tick = decode_record(&record.payload)?;

        // validate() ran during decode, so this cannot fail here.
        let event_time = tick
            .event_time()
            .map_err(|err| RecordError::Decode(DecodeError::Validation(err)))?;

        let moving_average = self.windows.lock().observe(&tick.symbol, tick.price);
        let enriched = EnrichedRecord::from_tick(&tick, moving_average);

        self.persister.persist(&enriched, &tick, &event_time).await?;
        Ok(enriched)
    }

    /// Load the secret at most once per warm lifetime.
    ///
    /// A load failure degrades gracefully: it is logged as a warning and
    /// processing continues without the secret.
    async fn ensure_secret(&self) {
        self.secret
            .get_or_init(|| async {
                match self.secrets.get_secret(&self.secret_name).await {
                    Ok(value) => {
                        tracing::info!(
                            secret_name = %self.secret_name,
                            has_api_key = value.get("api_key").is_some(),
                            "secrets loaded"
                        );
                        Some(value)
                    }
                    Err(err) => {
                        tracing::warn!(
                            secret_name = %self.secret_name,
                            error = %err,
                            "failed to load secrets, continuing without"
                        );
                        None
                    }
                }
            })
            .await;
    }
}
