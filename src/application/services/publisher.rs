//! Tick Publisher
//!
//! Fetches one tick per configured symbol and publishes it onto the stream
//! with bounded retries and exponential backoff. A failure on one symbol
//! never prevents processing of the next; the invocation ends with a
//! `{published, failed}` summary.

use metrics::counter;

use crate::application::ports::{
    ProducerSummary, PublishAck, StreamTransport, TickSource, TransportError,
};
use crate::application::services::codec::encode_tick;
use crate::application::services::retry::{BackoffPolicy, RetryConfig};
use crate::domain::tick::Tick;

/// Publishes ticks onto the stream with retry/backoff discipline.
pub struct Publisher<S, T> {
    source: S,
    transport: T,
    retry: RetryConfig,
}

impl<S, T> Publisher<S, T>
where
    S: TickSource,
    T: StreamTransport,
{
    /// Create a publisher over a tick source and a stream transport.
    pub const fn new(source: S, transport: T, retry: RetryConfig) -> Self {
        Self {
            source,
            transport,
            retry,
        }
    }

    /// Publish one tick, retrying transient transport failures.
    ///
    /// The tick's symbol is the partition key, so all ticks for one symbol
    /// land on the same shard in publish order. Sleeps `base^attempt`
    /// seconds between attempts; there is no sleep after the final attempt.
    ///
    /// # Errors
    ///
    /// Returns the last [`TransportError`] once retries are exhausted, or
    /// immediately on a fatal (non-transient) failure.
    pub async fn publish(&self, tick: &Tick) -> Result<PublishAck, TransportError> {
        let payload = encode_tick(tick)
            .map_err(|err| TransportError::Fatal(format!("tick serialization failed: {err}")))?;

        let mut policy = BackoffPolicy::new(self.retry);
        loop {
            let attempt = policy.current_attempt();
            match self.transport.publish(&tick.symbol, &payload).await {
                Ok(ack) => {
                    tracing::info!(
                        symbol = %tick.symbol,
                        attempt,
                        sequence_id = %ack.sequence_id,
                        shard_id = %ack.shard_id,
                        "record published"
                    );
                    return Ok(ack);
                }
                Err(err) if err.is_transient() => {
                    tracing::error!(
                        symbol = %tick.symbol,
                        attempt,
                        error = %err,
                        "publish attempt failed"
                    );
                    counter!("tickflow_publish_retries_total").increment(1);
                    match policy.delay_after_failure() {
                        Some(delay) => tokio::time::sleep(delay).await,
                        None => return Err(err),
                    }
                }
                Err(err) => {
                    tracing::error!(
                        symbol = %tick.symbol,
                        attempt,
                        error = %err,
                        "publish failed fatally"
                    );
                    return Err(err);
                }
            }
        }
    }

    /// Fetch and publish a tick for every configured symbol.
    ///
    /// Symbols are processed sequentially; fetch failures and exhausted
    /// publishes both count the symbol as failed and the run continues.
    pub async fn run(&self, symbols: &[String]) -> ProducerSummary {
        tracing::info!(?symbols, "producer invocation started");

        let mut summary = ProducerSummary::default();
        for symbol in symbols {
            if self.publish_symbol(symbol).await {
                summary.published += 1;
                counter!("tickflow_ticks_published_total").increment(1);
            } else {
                summary.failed += 1;
                counter!("tickflow_ticks_failed_total").increment(1);
            }
        }

        tracing::info!(
            published = summary.published,
            failed = summary.failed,
            "producer invocation completed"
        );
        summary
    }

    /// Returns true if the symbol's tick was fetched and durably published.
    async fn publish_symbol(&self, symbol: &str) -> bool {
        let tick = match self.source.fetch(symbol).await {
            Ok(tick) => tick,
            Err(err) => {
                tracing::error!(symbol, error = %err, "tick fetch failed");
                return false;
            }
        };

        match self.publish(&tick).await {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(symbol, error = %err, "publish exhausted");
                false
            }
        }
    }
}
