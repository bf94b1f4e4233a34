//! # Synthetic Backend
//!
//! A backend whose state is set from code instead of hardware. Used to check
//! a network link without a controller attached and to drive tests.
//!
//! The state is already in sample ranges, so `normalize` only clamps it; the
//! deadzones are not applied a second time.
//!
//! ```
//! use padlink::controller::sample::{Button, Stick};
//! use padlink::controller::synthetic::SyntheticBackend;
//!
//! let backend = SyntheticBackend::default();
//! let handle = backend.clone();
//! handle.update(|state| {
//!     state.left_stick = Stick::new(0.5, -0.3);
//!     state.buttons.set(Button::A, true);
//! });
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use super::backend::{BackendCandidate, InputBackend};
use super::calibration::Calibration;
use super::sample::ControllerState;
use crate::error::Result;

#[derive(Debug, Default)]
struct Shared {
    state: ControllerState,
    dirty: bool,
}

/// Software-driven input backend. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct SyntheticBackend {
    shared: Arc<Mutex<Shared>>,
}

impl SyntheticBackend {
    /// Creates a backend that starts from `initial`.
    #[must_use]
    pub fn new(initial: ControllerState) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                state: initial,
                dirty: true,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the whole state.
    pub fn set(&self, state: ControllerState) {
        let mut shared = self.lock();
        shared.state = state;
        shared.dirty = true;
    }

    /// Modifies the state in place.
    pub fn update(&self, f: impl FnOnce(&mut ControllerState)) {
        let mut shared = self.lock();
        f(&mut shared.state);
        shared.dirty = true;
    }

    /// Returns the state as last set.
    #[must_use]
    pub fn current(&self) -> ControllerState {
        self.lock().state
    }

    /// Wraps a clone of this backend as a sampler candidate.
    #[must_use]
    pub fn into_candidate(self) -> BackendCandidate {
        BackendCandidate::new("synthetic", move || {
            Ok(Box::new(self) as Box<dyn InputBackend>)
        })
    }
}

impl InputBackend for SyntheticBackend {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn poll(&mut self) -> Result<bool> {
        let mut shared = self.lock();
        Ok(std::mem::take(&mut shared.dirty))
    }

    fn normalize(&self, _calibration: &Calibration) -> ControllerState {
        self.current().clamped()
    }
}
