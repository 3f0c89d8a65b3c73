//! Server configuration loaded from environment variables.

use std::net::SocketAddr;

use cobrador_core::{CobradorConfig, ConfigError};
use secrecy::SecretString;

/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Configuration for the API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen_addr: SocketAddr,
    pub database_url: SecretString,
    /// Bearer secret the scheduler presents.
    pub cron_secret: SecretString,
    pub cobrador: CobradorConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let optional = |key: &str| reader(key).ok().filter(|v| !v.trim().is_empty());

        let listen_addr = optional("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("LISTEN_ADDR".into(), e.to_string()))?;

        let database_url = optional("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".into()))?;
        let cron_secret = optional("CRON_SECRET")
            .ok_or_else(|| ConfigError::MissingVar("CRON_SECRET".into()))?;

        let cobrador = CobradorConfig::from_reader(&reader)?;

        Ok(Self {
            listen_addr,
            database_url: SecretString::new(database_url),
            cron_secret: SecretString::new(cron_secret),
            cobrador,
        })
    }
}
