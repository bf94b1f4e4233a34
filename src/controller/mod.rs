//! # Controller Module
//!
//! Game controller input handling.
//!
//! This module handles:
//! - The sample data model and its value ranges ([`sample`])
//! - Deadzones and raw-axis scaling ([`calibration`])
//! - Input library adapters behind one interface ([`backend`])
//! - Background polling with non-blocking snapshot reads ([`sampler`])

pub mod backend;
pub mod calibration;
pub mod evdev_backend;
#[cfg(feature = "gilrs")]
pub mod gilrs_backend;
pub mod sample;
pub mod sampler;
pub mod synthetic;

pub use backend::{BackendCandidate, BackendKind, InputBackend};
pub use calibration::Calibration;
pub use sample::{Button, Buttons, ControllerSample, ControllerState, Stick, Triggers};
pub use sampler::{Sampler, SamplerSettings};
