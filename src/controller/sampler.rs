//! # Controller Sampler
//!
//! Owns the input backend on a dedicated worker thread and publishes the
//! latest normalized [`ControllerState`] through a `watch` channel.
//!
//! Readers never touch the device: [`Sampler::sample`] copies the most recent
//! snapshot and stamps it, so the capture loop can never be stalled by a slow
//! or missing controller.
//!
//! ```no_run
//! use padlink::controller::backend::BackendCandidate;
//! use padlink::controller::sampler::{Sampler, SamplerSettings};
//! use padlink::config::ControllerConfig;
//!
//! let config = ControllerConfig::default();
//! let sampler = Sampler::start(
//!     BackendCandidate::from_config(&config),
//!     SamplerSettings::from_config(&config),
//! )?;
//! println!("{:?}", sampler.sample());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::backend::{BackendCandidate, InputBackend};
use super::calibration::Calibration;
use super::sample::{ControllerSample, ControllerState};
use crate::config::ControllerConfig;
use crate::error::{PadlinkError, Result};

/// Worker tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerSettings {
    pub calibration: Calibration,
    pub poll_interval: Duration,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            poll_interval: Duration::from_millis(4),
        }
    }
}

impl SamplerSettings {
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            calibration: Calibration::new(config.deadzone_stick, config.deadzone_trigger),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// Handle to the running sampler. Dropping it stops the worker thread.
pub struct Sampler {
    state: watch::Receiver<ControllerState>,
    backend_name: &'static str,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("backend", &self.backend_name)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

type Ready = std::result::Result<&'static str, String>;

impl Sampler {
    /// Starts the worker and waits until a backend is open and has been
    /// polled once.
    ///
    /// Candidates are tried in order; the first one that opens is kept for
    /// the life of the sampler.
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` listing every candidate's failure when
    /// none of them opens.
    pub fn start(candidates: Vec<BackendCandidate>, settings: SamplerSettings) -> Result<Self> {
        let (state_tx, state_rx) = watch::channel(ControllerState::neutral());
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Ready>(1);
        let stop = Arc::new(AtomicBool::new(false));

        let worker_stop = Arc::clone(&stop);
        let worker = std::thread::Builder::new()
            .name("padlink-sampler".to_string())
            .spawn(move || {
                let backend = match open_first(candidates) {
                    Ok(backend) => backend,
                    Err(reasons) => {
                        let _ = ready_tx.send(Err(reasons));
                        return;
                    }
                };
                run_worker(backend, settings, state_tx, ready_tx, worker_stop);
            })?;

        match ready_rx.recv() {
            Ok(Ok(backend_name)) => {
                info!("Controller sampler running on {} backend", backend_name);
                Ok(Self {
                    state: state_rx,
                    backend_name,
                    stop,
                    worker: Some(worker),
                })
            }
            Ok(Err(reasons)) => {
                let _ = worker.join();
                Err(PadlinkError::DeviceUnavailable(reasons))
            }
            Err(_) => {
                let _ = worker.join();
                Err(PadlinkError::DeviceUnavailable(
                    "sampler worker exited during startup".to_string(),
                ))
            }
        }
    }

    /// Latest snapshot stamped with the current time. Never blocks.
    #[must_use]
    pub fn sample(&self) -> ControllerSample {
        ControllerSample::capture(self.current_state())
    }

    /// Latest published state without a timestamp.
    #[must_use]
    pub fn current_state(&self) -> ControllerState {
        *self.state.borrow()
    }

    /// Name of the backend that opened.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend_name
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Sampler worker panicked");
            }
        }
    }
}

fn open_first(candidates: Vec<BackendCandidate>) -> std::result::Result<Box<dyn InputBackend>, String> {
    if candidates.is_empty() {
        return Err("no input backends configured".to_string());
    }

    let mut failures = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let name = candidate.name();
        debug!("Trying {} input backend", name);
        match candidate.open() {
            Ok(backend) => return Ok(backend),
            Err(e) => {
                warn!("{} backend unavailable: {}", name, e);
                failures.push(format!("{}: {}", name, e));
            }
        }
    }
    Err(failures.join("; "))
}

fn run_worker(
    mut backend: Box<dyn InputBackend>,
    settings: SamplerSettings,
    state_tx: watch::Sender<ControllerState>,
    ready_tx: mpsc::SyncSender<Ready>,
    stop: Arc<AtomicBool>,
) {
    let mut failed = poll_and_publish(backend.as_mut(), &settings, &state_tx, false);
    state_tx.send_replace(backend.normalize(&settings.calibration));

    if ready_tx.send(Ok(backend.name())).is_err() {
        return;
    }
    drop(ready_tx);

    while !stop.load(Ordering::Relaxed) {
        std::thread::sleep(settings.poll_interval);
        failed = poll_and_publish(backend.as_mut(), &settings, &state_tx, failed);
    }
    debug!("Sampler worker stopped");
}

/// Polls once and publishes on change. Returns the new failure flag.
fn poll_and_publish(
    backend: &mut dyn InputBackend,
    settings: &SamplerSettings,
    state_tx: &watch::Sender<ControllerState>,
    failed: bool,
) -> bool {
    match backend.poll() {
        Ok(changed) => {
            if failed {
                info!("{} backend answering again", backend.name());
            }
            if changed {
                state_tx.send_replace(backend.normalize(&settings.calibration));
            }
            false
        }
        Err(e) => {
            if !failed {
                warn!("Controller input lost, holding neutral state: {}", e);
                state_tx.send_replace(backend.normalize(&settings.calibration));
            }
            true
        }
    }
}
