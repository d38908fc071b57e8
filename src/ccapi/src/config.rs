//! Connector timings and port, loadable from JSON.
//!
//! Every field has a default, so a partial file only overrides what it names.
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Error produced when connector timings fail validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("port must be greater than zero")]
    ZeroPort,
}

/// Timing and addressing knobs for the handshake and the polling loop.
///
/// Durations are expressed in milliseconds so the struct maps directly onto a
/// JSON config file. Missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// TCP port the camera serves CCAPI on.
    pub port: u16,
    /// Deadline for the root capability probe.
    pub probe_timeout_ms: u64,
    /// Deadline for each remaining handshake fetch.
    pub step_timeout_ms: u64,
    /// Period between polling ticks.
    pub poll_interval_ms: u64,
    /// Deadline for a single polling fetch.
    pub poll_timeout_ms: u64,
}

impl ConnectorConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Rejects settings the runtime cannot honour (a zero interval would spin).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        for (name, value) in [
            ("probe_timeout_ms", self.probe_timeout_ms),
            ("step_timeout_ms", self.step_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("poll_timeout_ms", self.poll_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration(name));
            }
        }
        Ok(())
    }
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            probe_timeout_ms: 4_000,
            step_timeout_ms: 4_000,
            poll_interval_ms: 3_000,
            poll_timeout_ms: 2_000,
        }
    }
}
