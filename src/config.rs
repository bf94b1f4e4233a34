//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults below, so an empty file is a valid configuration.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::controller::backend::BackendKind;
use crate::error::{PadlinkError, Result};
use crate::transport::receiver::SourcePolicy;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub controller: ControllerConfig,
    pub logging: LoggingConfig,
}

/// Sender process configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Where samples are sent
    #[serde(default = "default_loopback")]
    pub client_ip: IpAddr,

    #[serde(default = "default_client_port")]
    pub client_port: u16,

    /// Local interface to bind
    #[serde(default = "default_bind_ip")]
    pub bind_ip: IpAddr,

    /// Local port to bind (0 picks an ephemeral port)
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
}

/// Receiver process configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ClientConfig {
    /// Expected sender, only enforced when `accept_any_source` is false
    #[serde(default = "default_loopback")]
    pub server_ip: IpAddr,

    #[serde(default = "default_server_port")]
    pub server_port: u16,

    #[serde(default = "default_bind_ip")]
    pub bind_ip: IpAddr,

    #[serde(default = "default_client_port")]
    pub client_port: u16,

    #[serde(default = "default_true")]
    pub accept_any_source: bool,

    /// Drop samples older than the newest one already shown
    #[serde(default = "default_true")]
    pub drop_stale: bool,

    #[serde(default = "default_true")]
    pub clear_screen: bool,
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Backends to try, in priority order
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendKind>,

    /// evdev node to use; empty means auto-detect
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_deadzone_stick")]
    pub deadzone_stick: f64,

    #[serde(default = "default_deadzone_trigger")]
    pub deadzone_trigger: f64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily log files; empty logs to stderr
    #[serde(default)]
    pub directory: String,
}

// Default value functions
fn default_loopback() -> IpAddr { IpAddr::V4(Ipv4Addr::LOCALHOST) }
fn default_bind_ip() -> IpAddr { IpAddr::V4(Ipv4Addr::UNSPECIFIED) }
fn default_client_port() -> u16 { 5001 }
fn default_server_port() -> u16 { 5000 }
fn default_rate_hz() -> u32 { 60 }
fn default_true() -> bool { true }

fn default_backends() -> Vec<BackendKind> { vec![BackendKind::Gilrs, BackendKind::Evdev] }
fn default_deadzone_stick() -> f64 { 0.05 }
fn default_deadzone_trigger() -> f64 { 0.0 }
fn default_poll_interval_ms() -> u64 { 4 }

fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            client_ip: default_loopback(),
            client_port: default_client_port(),
            bind_ip: default_bind_ip(),
            server_port: default_server_port(),
            rate_hz: default_rate_hz(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_ip: default_loopback(),
            server_port: default_server_port(),
            bind_ip: default_bind_ip(),
            client_port: default_client_port(),
            accept_any_source: default_true(),
            drop_stale: default_true(),
            clear_screen: default_true(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            backends: default_backends(),
            device_path: String::new(),
            deadzone_stick: default_deadzone_stick(),
            deadzone_trigger: default_deadzone_trigger(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
        }
    }
}

impl ServerConfig {
    /// Local address the sender socket binds to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.server_port)
    }

    /// Address every sample is sent to.
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        SocketAddr::new(self.client_ip, self.client_port)
    }

    /// Time between capture ticks.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.rate_hz.max(1)))
    }
}

impl ClientConfig {
    /// Local address the receiver socket binds to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.client_port)
    }

    #[must_use]
    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_ip, self.server_port)
    }

    /// Which senders the receiver accepts.
    #[must_use]
    pub fn source_policy(&self) -> SourcePolicy {
        if self.accept_any_source {
            SourcePolicy::AcceptAny
        } else {
            SourcePolicy::Only(self.server_addr())
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padlink::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Peer ports
        if self.server.client_port == 0 {
            return Err(PadlinkError::Config(
                toml::de::Error::custom("server.client_port cannot be 0")
            ));
        }

        if !self.client.accept_any_source && self.client.server_port == 0 {
            return Err(PadlinkError::Config(
                toml::de::Error::custom("client.server_port cannot be 0 when accept_any_source is false")
            ));
        }

        // Capture rate
        if self.server.rate_hz == 0 || self.server.rate_hz > 1000 {
            return Err(PadlinkError::Config(
                toml::de::Error::custom("rate_hz must be between 1 and 1000")
            ));
        }

        // Deadzones
        if !(0.0..=0.25).contains(&self.controller.deadzone_stick) {
            return Err(PadlinkError::Config(
                toml::de::Error::custom("deadzone_stick must be between 0.0 and 0.25")
            ));
        }

        if !(0.0..=0.25).contains(&self.controller.deadzone_trigger) {
            return Err(PadlinkError::Config(
                toml::de::Error::custom("deadzone_trigger must be between 0.0 and 0.25")
            ));
        }

        if self.controller.poll_interval_ms == 0 || self.controller.poll_interval_ms > 100 {
            return Err(PadlinkError::Config(
                toml::de::Error::custom("poll_interval_ms must be between 1 and 100")
            ));
        }

        // Backend list
        if self.controller.backends.is_empty() {
            return Err(PadlinkError::Config(
                toml::de::Error::custom("controller.backends cannot be empty")
            ));
        }

        for (i, kind) in self.controller.backends.iter().enumerate() {
            if self.controller.backends[..i].contains(kind) {
                return Err(PadlinkError::Config(
                    toml::de::Error::custom(format!("backend '{}' listed more than once", kind))
                ));
            }
        }

        // Log level
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(PadlinkError::Config(
                toml::de::Error::custom(format!(
                    "logging level '{}' must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ))
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_default_config() {
        let config = create_valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.peer_addr(), "127.0.0.1:5001".parse().unwrap());
        assert_eq!(config.server.bind_addr(), "0.0.0.0:5000".parse().unwrap());
        assert_eq!(config.client.bind_addr(), "0.0.0.0:5001".parse().unwrap());
        assert_eq!(config.server.rate_hz, 60);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
[server]
client_ip = "192.168.1.20"
"#,
        )
        .unwrap();

        assert_eq!(config.server.peer_addr(), "192.168.1.20:5001".parse().unwrap());
        assert_eq!(config.server.server_port, 5000);
        assert_eq!(config.controller, ControllerConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[server]
client_ip = "10.0.0.2"
client_port = 6001
rate_hz = 120

[client]
accept_any_source = false
server_ip = "10.0.0.1"

[controller]
backends = ["evdev"]
device_path = "/dev/input/event3"
deadzone_stick = 0.1

[logging]
level = "debug"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.server.peer_addr(), "10.0.0.2:6001".parse().unwrap());
        assert_eq!(config.server.rate_hz, 120);
        assert_eq!(config.controller.backends, vec![BackendKind::Evdev]);
        assert_eq!(config.controller.device_path, "/dev/input/event3");
        assert_eq!(
            config.client.source_policy(),
            SourcePolicy::Only("10.0.0.1:5000".parse().unwrap())
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/padlink.toml");
        assert!(matches!(result, Err(PadlinkError::Io(_))));
    }

    #[test]
    fn test_invalid_ip_rejected() {
        let result = Config::from_toml("[server]\nclient_ip = \"not-an-ip\"\n");
        assert!(matches!(result, Err(PadlinkError::Config(_))));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = Config::from_toml("[controller]\nbackends = [\"sdl\"]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_default_source_policy_accepts_any() {
        assert_eq!(ClientConfig::default().source_policy(), SourcePolicy::AcceptAny);
    }

    #[test]
    fn test_tick_period() {
        let mut config = ServerConfig::default();
        config.rate_hz = 50;
        assert_eq!(config.tick_period(), Duration::from_millis(20));
    }

    #[test]
    fn test_peer_port_zero() {
        let mut config = create_valid_config();
        config.server.client_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_port_zero_is_ephemeral() {
        let mut config = create_valid_config();
        config.server.server_port = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_source_needs_server_port() {
        let mut config = create_valid_config();
        config.client.server_port = 0;
        assert!(config.validate().is_ok());

        config.client.accept_any_source = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_zero() {
        let mut config = create_valid_config();
        config.server.rate_hz = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_too_high() {
        let mut config = create_valid_config();
        config.server.rate_hz = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_deadzone() {
        let mut config = create_valid_config();
        config.controller.deadzone_stick = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_trigger_deadzone() {
        let mut config = create_valid_config();
        config.controller.deadzone_trigger = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_interval_bounds() {
        let mut config = create_valid_config();
        config.controller.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        config.controller.poll_interval_ms = 101;
        assert!(config.validate().is_err());

        config.controller.poll_interval_ms = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_backends() {
        let mut config = create_valid_config();
        config.controller.backends.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_backends() {
        let mut config = create_valid_config();
        config.controller.backends = vec![BackendKind::Evdev, BackendKind::Evdev];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = create_valid_config();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_client_port(), 5001);
        assert_eq!(default_server_port(), 5000);
        assert_eq!(default_deadzone_stick(), 0.05);
        assert_eq!(default_deadzone_trigger(), 0.0);
        assert_eq!(default_poll_interval_ms(), 4);
        assert_eq!(default_log_level(), "info");
    }
}
