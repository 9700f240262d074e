// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use sensorlog_channel::{ProtocolVersion, SocketOptions};
use sensorlog_error::{Result, SensorLogError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:4000/sockets/logger/websocket";
pub const DEFAULT_DELAY_MS: u64 = 1000;
pub const DEFAULT_METADATA: &str = "AAAF";
pub const DEFAULT_VALUE_MAX: f64 = 100.0;

/// Everything a logger needs before it connects.
///
/// Only `id` and `sensor_ids` are required in a TOML file:
///
/// ```
/// use sensorlog::LoggerConfig;
///
/// let config = LoggerConfig::from_toml_str(r#"
///     id = "42"
///     sensor_ids = ["temp-1", "temp-2"]
///     delay_ms = 500
/// "#).unwrap();
///
/// assert_eq!(config.topic(), "loggers:42");
/// assert_eq!(config.metadata, "AAAF");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub id: String,
    pub sensor_ids: Vec<String>,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_metadata")]
    pub metadata: String,
    /// Readings are drawn from `[0, value_max)`.
    #[serde(default = "default_value_max")]
    pub value_max: f64,
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub protocol: ProtocolVersion,
}

impl LoggerConfig {
    pub fn new<I, S>(id: impl Into<String>, sensor_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            sensor_ids: sensor_ids.into_iter().map(Into::into).collect(),
            delay_ms: DEFAULT_DELAY_MS,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            metadata: DEFAULT_METADATA.to_string(),
            value_max: DEFAULT_VALUE_MAX,
            heartbeat_ms: default_heartbeat_ms(),
            timeout_ms: default_timeout_ms(),
            seed: None,
            protocol: ProtocolVersion::default(),
        }
    }

    /// # Errors
    /// Returns `SensorLogError::Config` if the text is not a valid logger config
    /// or a heartbeat or reply timeout is zero.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| SensorLogError::config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// A zero `delay_ms` is allowed and means "as fast as the timer allows".
    ///
    /// # Errors
    /// Returns `SensorLogError::Config` naming the first zero interval.
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_ms == 0 {
            return Err(SensorLogError::config("heartbeat_ms must be greater than zero"));
        }
        if self.timeout_ms == 0 {
            return Err(SensorLogError::config("timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    /// # Errors
    /// Returns `SensorLogError::Config` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| SensorLogError::config(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&text)
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn topic(&self) -> String {
        format!("loggers:{}", self.id)
    }

    /// Socket options carrying the logger identity and credential.
    pub fn socket_options(&self, password: &str) -> SocketOptions {
        SocketOptions::default()
            .with_param("id", self.id.clone())
            .with_param("password", password)
            .with_heartbeat_interval(Duration::from_millis(self.heartbeat_ms))
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_version(self.protocol)
    }
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_metadata() -> String {
    DEFAULT_METADATA.to_string()
}

fn default_value_max() -> f64 {
    DEFAULT_VALUE_MAX
}

fn default_heartbeat_ms() -> u64 {
    30_000
}

fn default_timeout_ms() -> u64 {
    10_000
}
