//! Tickflow Binary
//!
//! Runs the whole pipeline locally: a producer pass fetches and publishes
//! a tick per configured symbol, then the consumer drains the stream in
//! batches until empty. Repeats on an interval until interrupted.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin tickflow
//! ```
//!
//! # Environment Variables (all optional)
//!
//! - `TICKFLOW_SYMBOLS`: Comma-separated symbol list (default: AAPL,MSFT,GOOGL)
//! - `TICKFLOW_STREAM_NAME`: Stream identifier (default: tick-stream)
//! - `TICKFLOW_KEYED_STORE`: Keyed store identifier (default: tick-latest)
//! - `TICKFLOW_BLOB_ROOT`: Blob archive root directory (default: data/archive)
//! - `TICKFLOW_SECRET_NAME`: Secret identifier (default: tick-api-key-dev)
//! - `TICKFLOW_WINDOW_SIZE`: Prices per symbol window (default: 5)
//! - `TICKFLOW_MAX_ATTEMPTS`: Publish attempts per record (default: 3)
//! - `TICKFLOW_BACKOFF_BASE_SECS`: Backoff base in seconds (default: 2)
//! - `TICKFLOW_BATCH_SIZE`: Max records per delivery batch (default: 100)
//! - `TICKFLOW_PRODUCER_INTERVAL_SECS`: Seconds between producer passes (default: 30)
//! - `RUST_LOG`: Log filter (default: tickflow=info)

use std::sync::Arc;

use tickflow::infrastructure::telemetry;
use tickflow::{
    init_metrics, BatchProcessor, EnvSecretsProvider, FsBlobStore, MemoryKeyedStore,
    MemoryTransport, Persister, PipelineConfig, Publisher, SimTickSource,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    telemetry::init();
    let _metrics_handle = init_metrics();

    let config = PipelineConfig::from_env()?;
    log_config(&config);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    let transport = Arc::new(MemoryTransport::default());
    let keyed_store = Arc::new(MemoryKeyedStore::new());
    let blob_store = FsBlobStore::new(config.blob_root.clone());

    let publisher = Publisher::new(
        SimTickSource::default(),
        Arc::clone(&transport),
        config.producer.retry,
    );
    let processor = BatchProcessor::new(
        Persister::new(Arc::clone(&keyed_store), blob_store),
        EnvSecretsProvider::new(),
        config.secret_name.clone(),
        config.consumer.window_size,
    );

    let mut interval = tokio::time::interval(config.producer.interval);
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = interval.tick() => {
                run_cycle(&config, &publisher, &processor, &transport).await;
            }
        }
    }

    tracing::info!(
        symbols_stored = keyed_store.len(),
        "pipeline stopped"
    );
    Ok(())
}

/// One producer pass followed by draining the stream.
async fn run_cycle(
    config: &PipelineConfig,
    publisher: &Publisher<SimTickSource, Arc<MemoryTransport>>,
    processor: &BatchProcessor<Arc<MemoryKeyedStore>, FsBlobStore, EnvSecretsProvider>,
    transport: &MemoryTransport,
) {
    let summary = publisher.run(&config.producer.symbols).await;
    tracing::info!(
        published = summary.published,
        failed = summary.failed,
        "producer pass done"
    );

    loop {
        let batch = transport.next_batch(config.consumer.batch_size);
        if batch.is_empty() {
            break;
        }
        let result = processor.handle_batch(&batch).await;
        if !result.is_success() {
            tracing::warn!(
                failed = result.failed_ids.len(),
                batch = batch.len(),
                "batch completed with failures"
            );
        }
        transport.complete_batch(&result);
    }
}

fn log_config(config: &PipelineConfig) {
    tracing::info!(
        stream = %config.stream_name,
        keyed_store = %config.keyed_store_name,
        blob_root = %config.blob_root.display(),
        symbols = ?config.producer.symbols,
        window_size = config.consumer.window_size,
        max_attempts = config.producer.retry.max_attempts,
        "starting tickflow"
    );
}

fn load_dotenv() {
    // A missing .env file is fine.
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }
}
