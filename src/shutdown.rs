//! # Shutdown Signals
//!
//! Turns Ctrl+C (and SIGTERM on Unix) into a cancelled [`CancellationToken`].

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawn a task that cancels `token` on the first shutdown signal
///
/// The task also exits quietly if the token is cancelled some other way.
pub fn install(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            signal = wait_for_signal() => {
                info!("Received {}, shutting down...", signal);
                token.cancel();
            }
        }
    })
}

/// Wait for the next shutdown signal and return its name
pub async fn wait_for_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c() => "Ctrl+C",
                    _ = term.recv() => "SIGTERM",
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                ctrl_c().await;
                "Ctrl+C"
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
        "Ctrl+C"
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_install_exits_when_token_cancelled() {
        let token = CancellationToken::new();
        let handle = install(token.clone());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("signal task should stop")
            .unwrap();
    }
}
