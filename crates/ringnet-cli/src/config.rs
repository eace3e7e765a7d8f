//! TOML configuration for the `ringnet` binary, mirroring
//! `ringnet_core::PeerConfig` with everything overridable from a file on
//! disk.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Top-level configuration file shape.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub identity: IdentityConfig,
    pub network: NetworkConfig,
    pub discovery: DiscoveryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_private_key_path")]
    pub private_key: PathBuf,
    #[serde(default = "default_public_key_path")]
    pub public_key: PathBuf,
    #[serde(default = "default_ring_public_key_path")]
    pub ring_public_key: PathBuf,
    #[serde(default = "default_signature_path")]
    pub signature: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_public_address")]
    pub public_address: String,
    #[serde(default = "default_cert_path")]
    pub cert_path: PathBuf,
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,
    #[serde(default)]
    pub require_confirmation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiscoveryConfig {
    /// `address[@signature]` pairs to seed the discovery queue with.
    #[serde(default)]
    pub peers: Vec<String>,
    #[serde(default = "default_true")]
    pub start_on_boot: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_private_key_path() -> PathBuf {
    PathBuf::from("private.pem")
}
fn default_public_key_path() -> PathBuf {
    PathBuf::from("public.pem")
}
fn default_ring_public_key_path() -> PathBuf {
    PathBuf::from("ring_public.pem")
}
fn default_signature_path() -> PathBuf {
    PathBuf::from("signature.b64")
}
fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:26781".parse().expect("valid default bind address")
}
fn default_public_address() -> String {
    "127.0.0.1:26781".to_string()
}
fn default_cert_path() -> PathBuf {
    PathBuf::from("cert.pem")
}
fn default_key_path() -> PathBuf {
    PathBuf::from("key.pem")
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            private_key: default_private_key_path(),
            public_key: default_public_key_path(),
            ring_public_key: default_ring_public_key_path(),
            signature: default_signature_path(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            public_address: default_public_address(),
            cert_path: default_cert_path(),
            key_path: default_key_path(),
            require_confirmation: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ringnet/config.toml")
    }

    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "invalid log level: {}. must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }
        for peer in &self.discovery.peers {
            if peer.trim().is_empty() {
                anyhow::bail!("discovery.peers contains an empty entry");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(config.network.bind_addr, back.network.bind_addr);
    }
}
