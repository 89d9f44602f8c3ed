//! Startup configuration, read from the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const ENV_ASK_TIMEOUT_MS: &str = "RENT_A_ROOM_ASK_TIMEOUT_MS";
pub const ENV_BROKERS: &str = "RENT_A_ROOM_BROKERS";
pub const ENV_REGISTRY_BUFFER: &str = "RENT_A_ROOM_REGISTRY_BUFFER";
pub const ENV_PORT: &str = "RENT_A_ROOM_PORT";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long a client call waits for its answer.
    pub ask_timeout_ms: u64,
    /// Brokers started with the system.
    pub brokers: usize,
    /// Membership events a registry subscriber may fall behind before it is resynchronised.
    pub registry_buffer: usize,
    /// Remoting port for discovering peer systems. Only reported; remoting is not wired.
    pub remote_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ask_timeout_ms: 6000,
            brokers: 1,
            registry_buffer: 64,
            remote_port: None,
        }
    }
}

impl Config {
    pub fn ask_timeout(&self) -> Duration {
        Duration::from_millis(self.ask_timeout_ms)
    }

    /// Defaults overridden by any `RENT_A_ROOM_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_ASK_TIMEOUT_MS) {
            config.ask_timeout_ms = parse_positive(ENV_ASK_TIMEOUT_MS, value)?;
        }
        if let Some(value) = lookup(ENV_BROKERS) {
            config.brokers = parse_positive(ENV_BROKERS, value)?;
        }
        if let Some(value) = lookup(ENV_REGISTRY_BUFFER) {
            config.registry_buffer = parse_positive(ENV_REGISTRY_BUFFER, value)?;
        }
        if let Some(value) = lookup(ENV_PORT) {
            let port = value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: ENV_PORT,
                value: value.clone(),
                reason: "expected a port number",
            })?;
            config.remote_port = Some(port);
        }
        Ok(config)
    }
}

fn parse_positive<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        Ok(_) => Err(ConfigError::Invalid {
            key,
            value,
            reason: "must be positive",
        }),
        Err(_) => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected a number",
        }),
    }
}
