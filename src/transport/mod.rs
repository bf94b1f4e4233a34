//! # Transport Module
//!
//! UDP plumbing between the sender and receiver processes.
//!
//! - [`sink`]: the socket seam ([`sink::DatagramSink`]) so send failures can be injected in tests
//! - [`sender`]: encodes samples and sends one datagram per sample to a fixed peer
//! - [`receiver`]: waits for datagrams and decodes them, optionally filtering by source

pub mod receiver;
pub mod sender;
pub mod sink;

pub use receiver::{SampleReceiver, SourcePolicy};
pub use sender::SampleSender;
pub use sink::{DatagramSink, UdpSink};

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::{PadlinkError, Result};

/// Binds a UDP socket, mapping any failure to `PortInUse`.
pub(crate) async fn bind_udp(addr: SocketAddr) -> Result<UdpSocket> {
    debug!("Binding UDP socket on {}", addr);
    let socket = UdpSocket::bind(addr)
        .await
        .map_err(|source| PadlinkError::PortInUse { addr, source })?;
    info!("UDP socket bound on {}", socket.local_addr()?);
    Ok(socket)
}
