//! # Wire Format Module
//!
//! One controller sample per UDP datagram, encoded as a UTF-8 JSON object:
//!
//! ```text
//! {"timestamp": 1700000000.25,
//!  "controller_data": {
//!    "left_stick": {"x": 0.0, "y": 0.0},
//!    "right_stick": {"x": 0.0, "y": 0.0},
//!    "triggers": {"left": 0.0, "right": 0.0},
//!    "buttons": {"A": false, "B": false, "X": false, "Y": false,
//!                "LB": false, "RB": false, "back": false, "start": false,
//!                "guide": false, "left_stick_click": false,
//!                "right_stick_click": false, "dpad_up": false,
//!                "dpad_down": false, "dpad_left": false, "dpad_right": false}}}
//! ```
//!
//! Every key is required. Unknown keys are ignored so newer senders can add
//! fields without breaking older receivers.

pub mod decoder;
pub mod encoder;

pub use decoder::decode;
pub use encoder::{encode, encode_into};

/// Receive buffer size. Datagrams longer than this are truncated by the OS
/// and then fail to decode.
pub const MAX_DATAGRAM_SIZE: usize = 4096;
