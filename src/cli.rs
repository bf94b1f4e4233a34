//! # Command Line
//!
//! Arguments for both binaries and the shared logging setup.
//!
//! Flags override values from the configuration file; the merged result is
//! validated again before use.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LoggingConfig};
use crate::controller::backend::BackendKind;

/// Sender: reads the controller and streams samples to the client
#[derive(Debug, Parser)]
#[command(name = "padlink-server", version)]
#[command(about = "Stream game controller state over UDP")]
pub struct ServerArgs {
    /// Config file path (TOML); defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address of the receiving client
    #[arg(long)]
    pub client_ip: Option<IpAddr>,

    /// Port of the receiving client
    #[arg(long)]
    pub client_port: Option<u16>,

    /// Local port to send from
    #[arg(long)]
    pub server_port: Option<u16>,

    /// Samples per second
    #[arg(long)]
    pub rate: Option<u32>,

    /// Input backends to try, in order (gilrs, evdev, synthetic)
    #[arg(long, value_delimiter = ',')]
    pub backend: Option<Vec<BackendKind>>,

    /// evdev device node, e.g. /dev/input/event5
    #[arg(long)]
    pub device: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Receiver: listens for samples and displays them
#[derive(Debug, Parser)]
#[command(name = "padlink-client", version)]
#[command(about = "Receive and display game controller state sent over UDP")]
pub struct ClientArgs {
    /// Config file path (TOML); defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address of the sending server
    #[arg(long)]
    pub server_ip: Option<IpAddr>,

    /// Port the server sends from
    #[arg(long)]
    pub server_port: Option<u16>,

    /// Local port to listen on
    #[arg(long)]
    pub client_port: Option<u16>,

    /// Only accept datagrams from server-ip:server-port
    #[arg(long)]
    pub strict_source: bool,

    /// Show samples even when they arrive out of order
    #[arg(long)]
    pub keep_stale: bool,

    /// Do not clear the terminal between samples
    #[arg(long)]
    pub no_clear: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,
}

fn base_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

impl ServerArgs {
    /// Load the config file (if any) and apply flag overrides
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = base_config(self.config.as_deref())?;
        self.apply(&mut config);
        config.validate().context("invalid command line arguments")?;
        Ok(config)
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(ip) = self.client_ip {
            config.server.client_ip = ip;
        }
        if let Some(port) = self.client_port {
            config.server.client_port = port;
        }
        if let Some(port) = self.server_port {
            config.server.server_port = port;
        }
        if let Some(rate) = self.rate {
            config.server.rate_hz = rate;
        }
        if let Some(backends) = &self.backend {
            config.controller.backends = backends.clone();
        }
        if let Some(device) = &self.device {
            config.controller.device_path = device.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

impl ClientArgs {
    /// Load the config file (if any) and apply flag overrides
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = base_config(self.config.as_deref())?;
        self.apply(&mut config);
        config.validate().context("invalid command line arguments")?;
        Ok(config)
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(ip) = self.server_ip {
            config.client.server_ip = ip;
        }
        if let Some(port) = self.server_port {
            config.client.server_port = port;
        }
        if let Some(port) = self.client_port {
            config.client.client_port = port;
        }
        if self.strict_source {
            config.client.accept_any_source = false;
        }
        if self.keep_stale {
            config.client.drop_stale = false;
        }
        if self.no_clear {
            config.client.clear_screen = false;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level. Logs go to stderr, or to a
/// daily rolling file under `logging.directory` when it is set, so stdout
/// stays free for the display. Keep the returned guard alive until exit or
/// buffered file output is lost.
pub fn init_logging(config: &LoggingConfig, app: &str) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("invalid log level '{}'", config.level))?;

    if config.directory.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;
        return Ok(None);
    }

    std::fs::create_dir_all(&config.directory)
        .with_context(|| format!("cannot create log directory {}", config.directory))?;
    let appender = tracing_appender::rolling::daily(&config.directory, format!("{}.log", app));
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;

    Ok(Some(guard))
}
