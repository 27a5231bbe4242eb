//! Configuration loading and management.

use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;
use thiserror::Error;

/// Default plaintext port.
pub const DEFAULT_PORT: u16 = 6667;
/// Default TLS port.
pub const DEFAULT_TLS_PORT: u16 = 6697;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server identity.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Optional TLS configuration, required for `--ssl`.
    pub tls: Option<TlsConfig>,
    /// Message of the day.
    #[serde(default)]
    pub motd: MotdConfig,
    /// Liveness probing.
    #[serde(default)]
    pub liveness: LivenessConfig,
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name (e.g., "irc.wren.local").
    #[serde(default = "defaults::server_name")]
    pub name: String,
    /// Network name shown in the welcome burst.
    #[serde(default = "defaults::network")]
    pub network: String,
    /// Server description.
    #[serde(default = "defaults::description")]
    pub description: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: defaults::server_name(),
            network: defaults::network(),
            description: defaults::description(),
        }
    }
}

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind (default all interfaces).
    #[serde(default = "defaults::bind_address")]
    pub address: IpAddr,
    /// Port to bind. Unset means 6667, or 6697 with `--ssl`.
    pub port: Option<u16>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: defaults::bind_address(),
            port: None,
        }
    }
}

/// TLS listener configuration.
///
/// The secure listener performs mutual verification: clients must present
/// a certificate signed by the configured CA.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Path to the server certificate chain (PEM).
    pub cert_path: String,
    /// Path to the server private key (PEM).
    pub key_path: String,
    /// Path to the CA bundle used to verify client certificates (PEM).
    pub ca_path: String,
}

/// Message of the day.
#[derive(Debug, Clone, Deserialize)]
pub struct MotdConfig {
    #[serde(default = "defaults::motd_lines")]
    pub lines: Vec<String>,
}

impl Default for MotdConfig {
    fn default() -> Self {
        Self {
            lines: defaults::motd_lines(),
        }
    }
}

/// Liveness probe timers for idle connections.
#[derive(Debug, Clone, Deserialize)]
pub struct LivenessConfig {
    /// Seconds of inbound silence before the server sends a PING.
    #[serde(default = "defaults::ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// Seconds a probed connection has to answer before it is reaped.
    #[serde(default = "defaults::pong_grace_secs")]
    pub pong_grace_secs: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: defaults::ping_interval_secs(),
            pong_grace_secs: defaults::pong_grace_secs(),
        }
    }
}

mod defaults {
    use std::net::{IpAddr, Ipv4Addr};

    pub fn server_name() -> String {
        "irc.wren.local".to_string()
    }

    pub fn network() -> String {
        "WrenNet".to_string()
    }

    pub fn description() -> String {
        "Wren IRC daemon".to_string()
    }

    pub fn bind_address() -> IpAddr {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    }

    pub fn motd_lines() -> Vec<String> {
        vec!["- Welcome to wrend.".to_string()]
    }

    pub fn ping_interval_secs() -> u64 {
        120
    }

    pub fn pong_grace_secs() -> u64 {
        30
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
