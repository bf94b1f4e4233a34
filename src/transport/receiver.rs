//! # Sample Receiver
//!
//! Waits for datagrams on a bound socket and decodes each into a sample.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::trace;

use crate::controller::sample::ControllerSample;
use crate::error::{PadlinkError, Result};
use crate::wire;

/// Which senders the receiver accepts datagrams from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourcePolicy {
    /// Any sender (the sender's address is not checked)
    #[default]
    AcceptAny,
    /// Only this exact address and port
    Only(SocketAddr),
}

impl SourcePolicy {
    #[must_use]
    pub fn accepts(&self, source: SocketAddr) -> bool {
        match self {
            SourcePolicy::AcceptAny => true,
            SourcePolicy::Only(expected) => *expected == source,
        }
    }
}

/// Receiving half of the link
#[derive(Debug)]
pub struct SampleReceiver {
    socket: UdpSocket,
    policy: SourcePolicy,
    buf: Vec<u8>,
}

impl SampleReceiver {
    /// Bind the local socket
    ///
    /// # Errors
    ///
    /// Returns `PortInUse` if `bind_addr` cannot be bound.
    pub async fn bind(bind_addr: SocketAddr, policy: SourcePolicy) -> Result<Self> {
        let socket = super::bind_udp(bind_addr).await?;
        Ok(Self {
            socket,
            policy,
            buf: vec![0u8; wire::MAX_DATAGRAM_SIZE],
        })
    }

    /// Wait for the next datagram and decode it
    ///
    /// # Errors
    ///
    /// - `UnexpectedSource`: sender rejected by the source policy
    /// - `Decode`: payload is not a valid sample
    /// - `Io`: the socket reported an error
    ///
    /// None of these leave the receiver unusable.
    pub async fn recv(&mut self) -> Result<ControllerSample> {
        let (len, source) = self.socket.recv_from(&mut self.buf).await?;
        trace!("Received {} bytes from {}", len, source);

        if !self.policy.accepts(source) {
            return Err(PadlinkError::UnexpectedSource(source));
        }

        Ok(wire::decode(&self.buf[..len])?)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    #[must_use]
    pub fn policy(&self) -> SourcePolicy {
        self.policy
    }
}
