//! # Sample Sender
//!
//! Sends one encoded sample per datagram to a fixed peer. Fire-and-forget:
//! there is no acknowledgement and nothing is retried.

use std::net::SocketAddr;

use tracing::trace;

use super::sink::{DatagramSink, UdpSink};
use crate::controller::sample::ControllerSample;
use crate::error::{PadlinkError, Result};
use crate::wire;

/// Sending half of the link
pub struct SampleSender<S = UdpSink> {
    sink: S,
    peer: SocketAddr,
    buf: Vec<u8>,
}

impl<S> std::fmt::Debug for SampleSender<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleSender")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

impl SampleSender<UdpSink> {
    /// Bind the local socket once and fix the destination
    ///
    /// # Errors
    ///
    /// Returns `PortInUse` if `bind_addr` cannot be bound.
    pub async fn bind(bind_addr: SocketAddr, peer: SocketAddr) -> Result<Self> {
        let sink = UdpSink::bind(bind_addr).await?;
        Ok(Self::with_sink(sink, peer))
    }
}

impl<S: DatagramSink> SampleSender<S> {
    /// Use an existing sink
    pub fn with_sink(sink: S, peer: SocketAddr) -> Self {
        Self {
            sink,
            peer,
            buf: Vec::with_capacity(wire::MAX_DATAGRAM_SIZE),
        }
    }

    /// Encode `sample` and send it as one datagram
    ///
    /// # Errors
    ///
    /// Returns `SendFailure` if the OS refuses the datagram or sends only
    /// part of it. The sender stays usable either way.
    pub async fn send(&mut self, sample: &ControllerSample) -> Result<usize> {
        wire::encode_into(&mut self.buf, sample).map_err(|e| PadlinkError::SendFailure {
            peer: self.peer,
            reason: format!("encoding failed: {}", e),
        })?;

        let sent = self
            .sink
            .send_to(&self.buf, self.peer)
            .await
            .map_err(|e| PadlinkError::SendFailure {
                peer: self.peer,
                reason: e.to_string(),
            })?;

        if sent != self.buf.len() {
            return Err(PadlinkError::SendFailure {
                peer: self.peer,
                reason: format!("short send: {} of {} bytes", sent, self.buf.len()),
            });
        }

        trace!("Sent {} byte sample to {}", sent, self.peer);
        Ok(sent)
    }

    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.sink.local_addr()?)
    }
}
