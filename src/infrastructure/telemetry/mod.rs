//! Structured Logging Setup
//!
//! Initializes `tracing` with an environment-driven filter. All error
//! context in the pipeline is emitted here; the only externally observable
//! failure signals are the batch result and the producer summary.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: `tickflow=info`)

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter directive when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVE: &str = "tickflow=info";

/// Initialize the global tracing subscriber.
///
/// Safe to call once per process; later calls are ignored so tests can
/// initialize freely.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}
