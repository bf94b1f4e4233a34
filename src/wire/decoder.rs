//! # Sample Decoder
//!
//! Parses and validates a datagram payload.

use crate::controller::sample::ControllerSample;
use crate::error::DecodeError;

/// Decode a datagram payload into a sample
///
/// Rejects, in order: invalid UTF-8, malformed JSON, any missing or
/// mistyped key, and analog values outside their documented ranges.
/// Extra keys are ignored.
///
/// # Examples
///
/// ```
/// use padlink::wire::decode;
///
/// assert!(decode(b"{\"timestamp\": 1.0}").is_err());
/// ```
pub fn decode(payload: &[u8]) -> Result<ControllerSample, DecodeError> {
    let text = std::str::from_utf8(payload)?;
    let sample: ControllerSample = serde_json::from_str(text)?;

    if !sample.timestamp.is_finite() {
        return Err(DecodeError::OutOfRange {
            field: "timestamp",
            value: sample.timestamp,
        });
    }

    if let Some((field, value)) = sample.state.out_of_range() {
        return Err(DecodeError::OutOfRange { field, value });
    }

    Ok(sample)
}
