//! Load balancer configuration
//!
//! Configuration is a listening port plus an ordered list of `host:port`
//! backends. Defaults are used unless `ROTARY_CONFIG` points at a YAML file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the YAML configuration file
pub const CONFIG_ENV: &str = "ROTARY_CONFIG";

const DEFAULT_PORT: u16 = 8080;

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_backends() -> Vec<String> {
    vec!["localhost:9001".to_string(), "localhost:9002".to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Port to listen on, bound on all interfaces
    #[serde(default = "default_port")]
    pub port: u16,

    /// Ordered backend addresses, each `host:port`
    #[serde(default = "default_backends")]
    pub backends: Vec<String>,

    /// Optional backend connect timeout in milliseconds (disabled when unset)
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            backends: default_backends(),
            connect_timeout_ms: None,
        }
    }
}

impl Config {
    /// Load configuration from the file named by `ROTARY_CONFIG`, or defaults
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Read and parse a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("Failed to parse YAML configuration")
    }

    /// Reject configurations the balancer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.backends.is_empty() {
            anyhow::bail!("At least one backend must be configured");
        }

        for backend in &self.backends {
            validate_backend_addr(backend)?;
        }

        Ok(())
    }

    /// Address the listener binds to
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}

/// Check that a backend address has the `host:port` shape
pub fn validate_backend_addr(addr: &str) -> Result<()> {
    let (host, port) = addr
        .rsplit_once(':')
        .with_context(|| format!("Backend address '{}' is missing a port", addr))?;

    if host.is_empty() {
        anyhow::bail!("Backend address '{}' is missing a host", addr);
    }

    port.parse::<u16>()
        .with_context(|| format!("Backend address '{}' has an invalid port", addr))?;

    Ok(())
}
