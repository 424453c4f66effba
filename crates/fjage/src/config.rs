// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway configuration.
//!
//! Supports programmatic construction, TOML files and `FJAGE_*` environment
//! overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default master container host.
pub const DEFAULT_HOSTNAME: &str = "localhost";
/// Default fjåge master container port.
pub const DEFAULT_PORT: u16 = 1100;
/// Default request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1000;
/// Default prefix of the gateway's own AgentID.
pub const DEFAULT_AGENT_ID_PREFIX: &str = "RustGW";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {var}")]
    Env { var: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Master container host name or address.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Master container TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bound on every correlated request (milliseconds).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Prefix of the generated gateway AgentID (`<prefix>-<uuid>`).
    #[serde(default = "default_agent_id_prefix")]
    pub agent_id_prefix: String,
}

fn default_hostname() -> String {
    DEFAULT_HOSTNAME.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_agent_id_prefix() -> String {
    DEFAULT_AGENT_ID_PREFIX.to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
            agent_id_prefix: default_agent_id_prefix(),
        }
    }
}

impl GatewayConfig {
    /// Configuration for a master container at `hostname:port`.
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FJAGE_HOST`, `FJAGE_PORT`, `FJAGE_REQUEST_TIMEOUT_MS` and
    /// `FJAGE_AGENT_PREFIX` from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FJAGE_HOST") {
            self.hostname = host;
        }
        if let Some(port) = parse_var(&lookup, "FJAGE_PORT")? {
            self.port = port;
        }
        if let Some(timeout) = parse_var(&lookup, "FJAGE_REQUEST_TIMEOUT_MS")? {
            self.request_timeout_ms = timeout;
        }
        if let Some(prefix) = lookup("FJAGE_AGENT_PREFIX") {
            self.agent_id_prefix = prefix;
        }
        Ok(self)
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::Invalid("hostname must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must not be 0".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.agent_id_prefix.is_empty() || self.agent_id_prefix.starts_with('#') {
            return Err(ConfigError::Invalid(format!(
                "agent_id_prefix '{}' is not a valid AgentID prefix",
                self.agent_id_prefix
            )));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env {
                var: var.to_string(),
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.hostname, "localhost");
        assert_eq!(config.port, 1100);
        assert_eq!(config.request_timeout(), Duration::from_millis(1000));
        assert_eq!(config.agent_id_prefix, "RustGW");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "hostname = \"modem.local\"\nport = 1101").expect("write");

        let config = GatewayConfig::from_file(file.path()).expect("load");
        assert_eq!(config.hostname, "modem.local");
        assert_eq!(config.port, 1101);
        assert_eq!(config.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "request_timeout_ms = 0").expect("write");

        let err = GatewayConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_file_reports_toml_errors() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "port = \"not a number\"").expect("write");

        let err = GatewayConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FJAGE_HOST", "10.0.0.7"),
            ("FJAGE_PORT", "5081"),
            ("FJAGE_REQUEST_TIMEOUT_MS", "250"),
        ]
        .into_iter()
        .collect();

        let config = GatewayConfig::default()
            .with_overrides(|var| vars.get(var).map(|v| v.to_string()))
            .expect("overrides");
        assert_eq!(config.hostname, "10.0.0.7");
        assert_eq!(config.port, 5081);
        assert_eq!(config.request_timeout_ms, 250);
        assert_eq!(config.agent_id_prefix, "RustGW");
    }

    #[test]
    fn test_bad_override_is_reported() {
        let err = GatewayConfig::default()
            .with_overrides(|var| (var == "FJAGE_PORT").then(|| "70000".to_string()))
            .unwrap_err();
        match err {
            ConfigError::Env { var, value } => {
                assert_eq!(var, "FJAGE_PORT");
                assert_eq!(value, "70000");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate() {
        assert!(GatewayConfig::new("", 1100).validate().is_err());
        assert!(GatewayConfig::new("localhost", 0).validate().is_err());

        let mut config = GatewayConfig::default();
        config.agent_id_prefix = "#topic".into();
        assert!(config.validate().is_err());

        let config = GatewayConfig::default().with_request_timeout(Duration::from_millis(5));
        assert_eq!(config.request_timeout_ms, 5);
        assert!(config.validate().is_ok());
    }
}
