//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::chan::ChanServConfig;
use super::nick::NickServConfig;
use super::oper::OperServConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Uplink server connection.
    #[serde(default)]
    pub uplink: UplinkConfig,
    /// Service pseudo-client identities.
    #[serde(default)]
    pub services: ServicesConfig,
    /// Database (registry snapshot) configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Nickname registry policy.
    #[serde(default)]
    pub nickserv: NickServConfig,
    /// Channel registry policy.
    #[serde(default)]
    pub chanserv: ChanServConfig,
    /// Network policing policy.
    #[serde(default)]
    pub operserv: OperServConfig,
    /// Refuse all registry mutations; reads and enforcement still run.
    #[serde(default)]
    pub read_only: bool,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Uplink (pseudo-server link) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UplinkConfig {
    /// Address to connect to, host:port.
    #[serde(default = "default_uplink_addr")]
    pub addr: String,
    /// Our server name on the network (e.g., "services.straylight.net").
    #[serde(default = "default_server_name")]
    pub server_name: String,
    /// Server description sent at link time.
    #[serde(default = "default_server_description")]
    pub description: String,
    /// Link password.
    #[serde(default)]
    pub password: String,
    /// Network name, used in user-facing notices by the command layer.
    #[serde(default = "default_network_name")]
    pub network: String,
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            addr: default_uplink_addr(),
            server_name: default_server_name(),
            description: default_server_description(),
            password: String::new(),
            network: default_network_name(),
        }
    }
}

/// Pseudo-client identities the daemon introduces on the network.
#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_nickserv_nick")]
    pub nickserv: String,
    #[serde(default = "default_chanserv_nick")]
    pub chanserv: String,
    #[serde(default = "default_operserv_nick")]
    pub operserv: String,
    /// username@host the pseudo-clients are introduced with.
    #[serde(default = "default_services_user")]
    pub user: String,
    #[serde(default = "default_services_host")]
    pub host: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            nickserv: default_nickserv_nick(),
            chanserv: default_chanserv_nick(),
            operserv: default_operserv_nick(),
            user: default_services_user(),
            host: default_services_host(),
        }
    }
}

/// Registry snapshot storage.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Directory the per-registry snapshot files live in.
    #[serde(default = "default_db_dir")]
    pub dir: String,
    /// Seconds between periodic saves.
    #[serde(default = "default_save_interval")]
    pub save_interval: u64,
    /// Seconds between expiry sweeps.
    #[serde(default = "default_expire_interval")]
    pub expire_interval: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dir: default_db_dir(),
            save_interval: default_save_interval(),
            expire_interval: default_expire_interval(),
        }
    }
}

fn default_uplink_addr() -> String {
    "127.0.0.1:6667".to_string()
}

fn default_server_name() -> String {
    "services.straylight.net".to_string()
}

fn default_server_description() -> String {
    "Straylight IRC Services".to_string()
}

fn default_network_name() -> String {
    "Straylight".to_string()
}

fn default_nickserv_nick() -> String {
    "NickServ".to_string()
}

fn default_chanserv_nick() -> String {
    "ChanServ".to_string()
}

fn default_operserv_nick() -> String {
    "OperServ".to_string()
}

fn default_services_user() -> String {
    "services".to_string()
}

fn default_services_host() -> String {
    "services.straylight.net".to_string()
}

fn default_db_dir() -> String {
    "data".to_string()
}

fn default_save_interval() -> u64 {
    300
}

fn default_expire_interval() -> u64 {
    1800
}
