//! Trait abstraction for datagram output to enable testing

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

use crate::error::Result;

/// Trait for sending one datagram at a time
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatagramSink: Send {
    /// Send `payload` as a single datagram. Returns the number of bytes sent.
    async fn send_to(&mut self, payload: &[u8], peer: SocketAddr) -> io::Result<usize>;

    /// Local address of the underlying socket
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

/// Wrapper around tokio::net::UdpSocket that implements DatagramSink
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
}

impl UdpSink {
    pub fn new(socket: UdpSocket) -> Self {
        Self { socket }
    }

    /// Bind a new socket on `addr`
    ///
    /// # Errors
    ///
    /// Returns `PortInUse` if the address cannot be bound.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        Ok(Self::new(super::bind_udp(addr).await?))
    }
}

#[async_trait]
impl DatagramSink for UdpSink {
    async fn send_to(&mut self, payload: &[u8], peer: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(payload, peer).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_udp_sink_delivers_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer = receiver.local_addr().unwrap();

        let mut sink = UdpSink::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let sent = sink.send_to(b"ping", peer).await.unwrap();
        assert_eq!(sent, 4);

        let mut buf = [0u8; 16];
        let (len, from) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"ping");
        assert_eq!(from, sink.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_port_in_use() {
        let first = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let taken = first.local_addr().unwrap();

        let err = UdpSink::bind(taken).await.unwrap_err();
        assert!(matches!(err, crate::error::PadlinkError::PortInUse { addr, .. } if addr == taken));
    }
}
