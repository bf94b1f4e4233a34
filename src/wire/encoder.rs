//! # Sample Encoder
//!
//! Serializes a [`ControllerSample`] into a datagram payload.

use crate::controller::sample::ControllerSample;

/// Encode a sample into a new buffer
///
/// Analog values are clamped into their documented ranges first, so the
/// payload always passes [`decode`](super::decode) on the other side.
///
/// # Examples
///
/// ```
/// use padlink::controller::sample::{ControllerSample, ControllerState};
/// use padlink::wire::encode;
///
/// let payload = encode(&ControllerSample::new(1.5, ControllerState::neutral()))?;
/// assert!(payload.starts_with(b"{\"timestamp\":1.5,"));
/// # Ok::<(), serde_json::Error>(())
/// ```
pub fn encode(sample: &ControllerSample) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(512);
    encode_into(&mut buf, sample)?;
    Ok(buf)
}

/// Encode a sample into `buf`, replacing its contents
///
/// Lets the sender reuse one allocation across ticks.
pub fn encode_into(buf: &mut Vec<u8>, sample: &ControllerSample) -> serde_json::Result<()> {
    buf.clear();
    let sample = ControllerSample::new(sample.timestamp, sample.state.clamped());
    serde_json::to_writer(&mut *buf, &sample)
}
