//! # Capture Loop
//!
//! The sender process' main loop: sample the controller, send the sample,
//! sleep out the rest of the tick.
//!
//! ## Timing
//!
//! Each tick sleeps `period - elapsed`, floored at zero. A tick that overruns
//! starts the next one immediately; missed ticks are never made up with a
//! burst of back-to-back sends.
//!
//! ## Shutdown
//!
//! Only the sleep is raced against the shutdown token. A send that has
//! started always completes, so the peer never sees half a sample.

use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::controller::backend::BackendCandidate;
use crate::controller::sampler::{Sampler, SamplerSettings};
use crate::error::Result;
use crate::transport::sink::{DatagramSink, UdpSink};
use crate::transport::SampleSender;

/// Number of ticks between status log messages (10 seconds at 60Hz)
pub const LOG_INTERVAL_TICKS: u64 = 600;

/// Lifecycle of a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Init,
    Running,
    Stopped,
}

/// Counters reported when the capture loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub ticks: u64,
    pub sent: u64,
    pub failed: u64,
}

/// Time left in the current tick. Zero when the tick overran.
///
/// ```
/// use std::time::Duration;
/// use padlink::capture::remaining_period;
///
/// let period = Duration::from_millis(16);
/// assert_eq!(remaining_period(period, Duration::from_millis(4)), Duration::from_millis(12));
/// assert_eq!(remaining_period(period, Duration::from_millis(40)), Duration::ZERO);
/// ```
#[must_use]
pub fn remaining_period(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

/// Periodic sample-and-send loop
pub struct CaptureLoop<S = UdpSink> {
    sampler: Sampler,
    sender: SampleSender<S>,
    rate_hz: u32,
    period: Duration,
    state: LoopState,
    stats: CaptureStats,
}

impl<S> std::fmt::Debug for CaptureLoop<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureLoop")
            .field("rate_hz", &self.rate_hz)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl CaptureLoop<UdpSink> {
    /// Start the sampler and bind the sender from configuration
    ///
    /// # Errors
    ///
    /// - `DeviceUnavailable`: no input backend could be opened
    /// - `PortInUse`: the sender socket could not be bound
    pub async fn init(config: &Config) -> Result<Self> {
        let sampler = Sampler::start(
            BackendCandidate::from_config(&config.controller),
            SamplerSettings::from_config(&config.controller),
        )?;
        let sender =
            SampleSender::bind(config.server.bind_addr(), config.server.peer_addr()).await?;

        Ok(Self::new(sampler, sender, config.server.rate_hz))
    }
}

impl<S: DatagramSink> CaptureLoop<S> {
    /// Assemble a loop from parts that are already running
    pub fn new(sampler: Sampler, sender: SampleSender<S>, rate_hz: u32) -> Self {
        let rate_hz = rate_hz.max(1);
        Self {
            sampler,
            sender,
            rate_hz,
            period: Duration::from_secs_f64(1.0 / f64::from(rate_hz)),
            state: LoopState::Init,
            stats: CaptureStats::default(),
        }
    }

    /// Run until `shutdown` is cancelled
    ///
    /// Send failures are logged and counted; they never stop the loop.
    pub async fn run(&mut self, shutdown: CancellationToken) -> CaptureStats {
        self.state = LoopState::Running;
        info!(
            "Sending {} samples to {} at {}Hz",
            self.sampler.backend_name(),
            self.sender.peer(),
            self.rate_hz
        );

        let mut last_log_ticks: u64 = 0;
        let mut failing = false;

        while !shutdown.is_cancelled() {
            let started = Instant::now();

            let sample = self.sampler.sample();
            self.stats.ticks += 1;
            match self.sender.send(&sample).await {
                Ok(_) => {
                    if failing {
                        info!("Sending to {} recovered", self.sender.peer());
                        failing = false;
                    }
                    self.stats.sent += 1;
                }
                Err(e) => {
                    if failing {
                        debug!("Failed to send sample: {}", e);
                    } else {
                        warn!("Failed to send sample: {}", e);
                        failing = true;
                    }
                    self.stats.failed += 1;
                }
            }

            if self.stats.ticks - last_log_ticks >= LOG_INTERVAL_TICKS {
                info!(
                    "Sent {} samples ({} failed, {}Hz)",
                    self.stats.sent, self.stats.failed, self.rate_hz
                );
                last_log_ticks = self.stats.ticks;
            }

            let pause = remaining_period(self.period, started.elapsed());
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        self.state = LoopState::Stopped;
        info!(
            "Capture stopped: {} ticks, {} sent, {} failed",
            self.stats.ticks, self.stats.sent, self.stats.failed
        );
        self.stats
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[must_use]
    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }
}
