//! # Error Types
//!
//! Custom error types for Padlink using `thiserror`.
//!
//! Startup errors ([`PadlinkError::DeviceUnavailable`], [`PadlinkError::PortInUse`],
//! [`PadlinkError::Config`]) are fatal. Per-datagram errors
//! ([`PadlinkError::SendFailure`], [`PadlinkError::Decode`],
//! [`PadlinkError::UnexpectedSource`]) are logged by the loops and never end a process.

use std::net::SocketAddr;

use thiserror::Error;

/// Main error type for Padlink
#[derive(Debug, Error)]
pub enum PadlinkError {
    /// No input backend could be initialized
    #[error("No input device available: {0}")]
    DeviceUnavailable(String),

    /// A single input backend failed to open or stopped answering
    #[error("{backend} backend error: {reason}")]
    Backend {
        backend: &'static str,
        reason: String,
    },

    /// Socket could not be bound (usually because the port is already taken)
    #[error("Cannot bind UDP socket on {addr}: {source}")]
    PortInUse {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The OS refused a datagram or sent only part of it
    #[error("Failed to send datagram to {peer}: {reason}")]
    SendFailure { peer: SocketAddr, reason: String },

    /// A received datagram is not a valid sample
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A datagram arrived from somewhere other than the configured server
    #[error("Datagram from unexpected source {0}")]
    UnexpectedSource(SocketAddr),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a datagram payload is rejected by the wire decoder
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed sample: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Result type alias for Padlink
pub type Result<T> = std::result::Result<T, PadlinkError>;
