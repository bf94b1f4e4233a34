//! # Padlink Server
//!
//! Reads the local game controller and streams its state to a client over
//! UDP at a fixed rate.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Parse arguments, load configuration, set up logging
//!    - Open the first available input backend
//!    - Bind the UDP socket
//!
//! 2. **Main Loop**
//!    - Sample, send, sleep out the rest of the tick
//!    - Log status every 600 ticks
//!
//! 3. **Graceful Shutdown**
//!    - Ctrl+C or SIGTERM stops the loop between ticks
//!    - Totals are logged and the socket is released
//!
//! Expected output:
//! ```text
//! INFO padlink_server: Padlink server v0.1.0 starting...
//! INFO padlink::controller::sampler: Controller sampler running on gilrs backend
//! INFO padlink::capture: Sending gilrs samples to 127.0.0.1:5001 at 60Hz
//! ```

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use padlink::capture::CaptureLoop;
use padlink::cli::{init_logging, ServerArgs};
use padlink::shutdown;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    let config = args.load_config()?;
    let _log_guard = init_logging(&config.logging, "padlink-server")?;

    info!("Padlink server v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut capture = match CaptureLoop::init(&config).await {
        Ok(capture) => capture,
        Err(e) => {
            error!("Startup failed: {}", e);
            return Err(e.into());
        }
    };

    let token = CancellationToken::new();
    shutdown::install(token.clone());
    info!("Press Ctrl+C to exit");

    let stats = capture.run(token).await;
    info!("Total samples sent: {}", stats.sent);

    Ok(())
}
