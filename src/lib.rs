//! # Padlink Library
//!
//! Stream game controller state from one machine to another over UDP.
//!
//! The sender samples a local gamepad at a fixed rate (60Hz by default) and
//! sends each snapshot as a self-contained JSON datagram. The receiver
//! decodes each datagram and shows it. There is no handshake, no
//! acknowledgement and no retransmission: a lost sample is simply superseded
//! by the next one.

pub mod capture;
pub mod cli;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod receive;
pub mod shutdown;
pub mod transport;
pub mod wire;

pub use error::{DecodeError, PadlinkError, Result};
