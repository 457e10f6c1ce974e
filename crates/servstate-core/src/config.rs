//! Lifecycle configuration.
//!
//! Validated at load time so a bad service list is rejected before any
//! lifecycle record is created.
//!
//! ```toml
//! domain = "ospl_sp_domain"
//! services = ["durability", "networking", "cmsoap"]
//!
//! [monitor]
//! poll_interval = "250ms"
//! history = 512
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, ServiceError};

/// Configuration for a domain's service registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Name of the data-space domain the services belong to.
    pub domain: String,

    /// Services registered up front, in state `NONE`.
    #[serde(default)]
    pub services: Vec<String>,

    /// State monitor settings.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl LifecycleConfig {
    /// Creates a configuration for `domain` with no pre-registered services.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            services: Vec::new(),
            monitor: MonitorConfig::default(),
        }
    }

    /// Adds a service to pre-register.
    #[must_use]
    pub fn with_service(mut self, name: impl Into<String>) -> Self {
        self.services.push(name.into());
        self
    }

    /// Sets the monitor configuration.
    #[must_use]
    pub fn with_monitor(mut self, monitor: MonitorConfig) -> Self {
        self.monitor = monitor;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(ServiceError::config("domain cannot be empty"));
        }

        let mut seen = HashSet::with_capacity(self.services.len());
        for name in &self.services {
            if name.is_empty() {
                return Err(ServiceError::config("service name cannot be empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(ServiceError::config(format!(
                    "service {name} listed more than once"
                )));
            }
        }

        self.monitor.validate()
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    /// Returns an error if the document cannot be parsed or is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ServiceError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns `ServiceError::Io` if the file cannot be read, or a
    /// configuration error if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// State monitor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Interval between registry polls.
    #[serde(default = "default_poll_interval")]
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Number of state events kept in the monitor's history.
    #[serde(default = "default_history")]
    pub history: usize,
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_history() -> usize {
    256
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            history: default_history(),
        }
    }
}

impl MonitorConfig {
    /// Sets the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the history capacity.
    #[must_use]
    pub const fn with_history(mut self, history: usize) -> Self {
        self.history = history;
        self
    }

    /// Validates the monitor settings.
    ///
    /// # Errors
    /// Returns an error if the interval or history is zero.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(ServiceError::config("monitor.poll_interval must be > 0"));
        }
        if self.history == 0 {
            return Err(ServiceError::config("monitor.history must be > 0"));
        }
        Ok(())
    }
}

/// Serde helper for humantime durations.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
