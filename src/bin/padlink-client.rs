//! # Padlink Client
//!
//! Listens for controller samples over UDP and draws each one in the
//! terminal. Malformed datagrams are logged and skipped.

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use padlink::cli::{init_logging, ClientArgs};
use padlink::display::{ConsoleDisplay, StaleFilter};
use padlink::receive::ReceiveLoop;
use padlink::shutdown;

#[tokio::main]
async fn main() -> Result<()> {
    let args = ClientArgs::parse();
    let config = args.load_config()?;
    let _log_guard = init_logging(&config.logging, "padlink-client")?;

    info!("Padlink client v{} starting...", env!("CARGO_PKG_VERSION"));

    let display = StaleFilter::new(ConsoleDisplay::stdout(config.client.clear_screen))
        .enabled(config.client.drop_stale);

    let mut receive = match ReceiveLoop::init(&config, display).await {
        Ok(receive) => receive,
        Err(e) => {
            error!("Startup failed: {}", e);
            return Err(e.into());
        }
    };

    if config.client.accept_any_source {
        info!("Accepting samples from any sender");
    } else {
        info!("Accepting samples only from {}", config.client.server_addr());
    }

    let token = CancellationToken::new();
    shutdown::install(token.clone());

    let stats = receive.run(token).await;
    info!(
        "Total samples received: {} ({} stale dropped)",
        stats.received,
        receive.consumer().dropped()
    );

    Ok(())
}
