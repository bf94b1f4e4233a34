//! # Receive Loop
//!
//! The receiver process' main loop: wait for a datagram, decode it, hand the
//! sample to a consumer. Bad datagrams are logged and skipped; only the
//! shutdown token ends the loop.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capture::LoopState;
use crate::config::Config;
use crate::display::SampleConsumer;
use crate::error::{PadlinkError, Result};
use crate::transport::SampleReceiver;

/// Number of received samples between status log messages
pub const LOG_INTERVAL_SAMPLES: u64 = 600;

/// Counters reported when the receive loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiveStats {
    pub received: u64,
    pub decode_errors: u64,
    pub rejected: u64,
    pub io_errors: u64,
}

/// Receive-and-consume loop
pub struct ReceiveLoop<C> {
    receiver: SampleReceiver,
    consumer: C,
    state: LoopState,
    stats: ReceiveStats,
}

impl<C> std::fmt::Debug for ReceiveLoop<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiveLoop")
            .field("receiver", &self.receiver)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<C: SampleConsumer> ReceiveLoop<C> {
    /// Bind the receiver from configuration
    ///
    /// # Errors
    ///
    /// Returns `PortInUse` if the receive socket cannot be bound.
    pub async fn init(config: &Config, consumer: C) -> Result<Self> {
        let receiver =
            SampleReceiver::bind(config.client.bind_addr(), config.client.source_policy()).await?;
        Ok(Self::new(receiver, consumer))
    }

    pub fn new(receiver: SampleReceiver, consumer: C) -> Self {
        Self {
            receiver,
            consumer,
            state: LoopState::Init,
            stats: ReceiveStats::default(),
        }
    }

    /// Run until `shutdown` is cancelled
    pub async fn run(&mut self, shutdown: CancellationToken) -> ReceiveStats {
        self.state = LoopState::Running;
        if let Ok(addr) = self.receiver.local_addr() {
            info!("Listening for samples on {}", addr);
        }

        let mut last_log_count: u64 = 0;

        loop {
            let result = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                result = self.receiver.recv() => result,
            };

            match result {
                Ok(sample) => {
                    self.stats.received += 1;
                    self.consumer.consume(sample);

                    if self.stats.received - last_log_count >= LOG_INTERVAL_SAMPLES {
                        debug!(
                            "Received {} samples ({} decode errors, {} rejected)",
                            self.stats.received, self.stats.decode_errors, self.stats.rejected
                        );
                        last_log_count = self.stats.received;
                    }
                }
                Err(PadlinkError::Decode(e)) => {
                    self.stats.decode_errors += 1;
                    warn!("Discarding malformed datagram: {}", e);
                }
                Err(PadlinkError::UnexpectedSource(source)) => {
                    self.stats.rejected += 1;
                    warn!("Discarding datagram from unexpected source {}", source);
                }
                Err(e) => {
                    self.stats.io_errors += 1;
                    warn!("Receive failed: {}", e);
                }
            }
        }

        self.state = LoopState::Stopped;
        info!(
            "Receive stopped: {} samples, {} decode errors, {} rejected",
            self.stats.received, self.stats.decode_errors, self.stats.rejected
        );
        self.stats
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[must_use]
    pub fn stats(&self) -> ReceiveStats {
        self.stats
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        self.receiver.local_addr()
    }
}
