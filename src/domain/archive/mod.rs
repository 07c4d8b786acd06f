//! Archive Key Derivation
//!
//! Deterministic time-partitioned keys for the raw-event blob archive.
//! Two ticks with distinct symbol + timestamp combinations always map to
//! distinct keys, so archived objects are never overwritten in normal
//! operation.

use chrono::{DateTime, Datelike, FixedOffset};

/// Derive the archive key for a raw tick.
///
/// Layout: `year=YYYY/month=MM/day=DD/{symbol}-{isoTimestamp}.json`, with
/// the date partition taken from the tick's event time and the timestamp
/// rendered RFC 3339 with an explicit offset (`+00:00` for UTC).
#[must_use]
pub fn blob_key(symbol: &str, event_time: &DateTime<FixedOffset>) -> String {
    format!(
        "year={:04}/month={:02}/day={:02}/{}-{}.json",
        event_time.year(),
        event_time.month(),
        event_time.day(),
        symbol,
        event_time.to_rfc3339(),
    )
}
