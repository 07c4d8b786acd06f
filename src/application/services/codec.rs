//! Record Codec
//!
//! Encoding for the publish side and decoding for the consume side of the
//! stream. Ticks travel as JSON; the transport envelope base64-encodes the
//! payload on delivery, so decoding is base64 -> UTF-8 -> JSON -> field
//! validation. Both directions are pure.
//!
//! Decode failures are format/validation errors, a different class from
//! transport failures: the coordinator marks the record failed without
//! local retry and leaves redelivery to the transport.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::domain::tick::{Tick, TickError};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Payload is not valid base64.
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Decoded bytes are not UTF-8.
    #[error("payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// Payload is not a JSON tick (missing or mistyped fields included).
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    /// Fields decoded but violate the tick contract.
    #[error("tick validation failed: {0}")]
    Validation(#[from] TickError),
}

/// Serialize a tick for publishing.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if serialization fails.
pub fn encode_tick(tick: &Tick) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(tick)
}

/// Decode one delivered payload into a validated tick.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the payload is not base64, not UTF-8, not
/// a JSON tick, or fails field validation.
pub fn decode_record(payload: &str) -> Result<Tick, DecodeError> {
    let bytes = BASE64.decode(payload)?;
    let text = String::from_utf8(bytes)?;
    let tick: Tick = serde_json::from_str(&text)?;
    tick.validate()?;
    Ok(tick)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn encode_json(json: &str) -> String {
        BASE64.encode(json.as_bytes())
    }

    #[test]
    fn round_trip_through_transport_encoding() {
        let tick = Tick {
            symbol: "AAPL".to_string(),
            price: 150.0,
            volume: 1000,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        };
        let payload = BASE64.encode(encode_tick(&tick).unwrap());
        let decoded = decode_record(&payload).unwrap();
        assert_eq!(decoded, tick);
    }

    #[test]
    fn non_base64_payload_fails() {
        assert!(matches!(
            decode_record("not base64!!!"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn non_json_bytes_fail() {
        let payload = BASE64.encode(b"hello, not json");
        assert!(matches!(decode_record(&payload), Err(DecodeError::Json(_))));
    }

    #[test_case(r#"{"price":150.0,"volume":1000,"timestamp":"2024-01-01T00:00:00Z"}"#; "missing symbol")]
    #[test_case(r#"{"symbol":"AAPL","volume":1000,"timestamp":"2024-01-01T00:00:00Z"}"#; "missing price")]
    #[test_case(r#"{"symbol":"AAPL","price":150.0,"volume":1000}"#; "missing timestamp")]
    #[test_case(r#"{"symbol":"AAPL","price":"expensive","volume":1000,"timestamp":"2024-01-01T00:00:00Z"}"#; "non numeric price")]
    #[test_case(r#"{"symbol":"AAPL","price":150.0,"volume":"lots","timestamp":"2024-01-01T00:00:00Z"}"#; "non numeric volume")]
    fn malformed_json_fails(json: &str) {
        assert!(matches!(
            decode_record(&encode_json(json)),
            Err(DecodeError::Json(_))
        ));
    }

    #[test_case(r#"{"symbol":"","price":150.0,"volume":1000,"timestamp":"2024-01-01T00:00:00Z"}"#; "empty symbol")]
    #[test_case(r#"{"symbol":"AAPL","price":-1.0,"volume":1000,"timestamp":"2024-01-01T00:00:00Z"}"#; "negative price")]
    #[test_case(r#"{"symbol":"AAPL","price":150.0,"volume":-5,"timestamp":"2024-01-01T00:00:00Z"}"#; "negative volume")]
    #[test_case(r#"{"symbol":"AAPL","price":150.0,"volume":1000,"timestamp":"noon"}"#; "unparseable timestamp")]
    fn invalid_fields_fail_validation(json: &str) {
        assert!(matches!(
            decode_record(&encode_json(json)),
            Err(DecodeError::Validation(_))
        ));
    }
}
