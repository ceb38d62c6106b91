//! Client configuration.
//!
//! Read once at startup from a TOML file (`-C/--config`, `SCHED_CONFIG`).
//! Only connection settings are interpreted; `schedctl show config` prints the
//! whole file regardless of which keys it contains.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sched/config.toml";

/// Default control daemon port.
pub const DEFAULT_CONTROL_PORT: u16 = 10011;

/// Connection settings for the control daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host running the control daemon.
    pub control_host: String,
    /// Control daemon port.
    #[serde(default = "default_control_port")]
    pub control_port: u16,
    /// Connect over TLS (`wss://`).
    #[serde(default)]
    pub use_tls: bool,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

const fn default_control_port() -> u16 {
    DEFAULT_CONTROL_PORT
}

const fn default_connect_timeout() -> u64 {
    10
}

const fn default_request_timeout() -> u64 {
    30
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let content = read_config_file(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        let config: Self =
            toml::from_str(content).map_err(|e| CliError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.control_host.trim().is_empty() {
            return Err(CliError::Config("control_host cannot be empty".to_string()));
        }

        if self.control_host.contains("://") {
            return Err(CliError::Config(
                "control_host must be a host name, not a URL".to_string(),
            ));
        }

        if self.control_port == 0 {
            return Err(CliError::Config(
                "control_port must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(CliError::Config(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// WebSocket URL of the control daemon.
    #[must_use]
    pub fn control_url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{scheme}://{}:{}", self.control_host, self.control_port)
    }

    /// Connection timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Load the configuration file as an untyped TOML tree.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_raw(path: impl AsRef<Path>) -> Result<toml::Table, CliError> {
    let content = read_config_file(path.as_ref())?;
    content
        .parse::<toml::Table>()
        .map_err(|e| CliError::Config(format!("invalid TOML: {e}")))
}

fn read_config_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| {
        CliError::Config(format!(
            "failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })
}
