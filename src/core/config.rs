//! Configuration for the reporting bridge.
//!
//! Only the periodic reporter is configurable; the wire format and the
//! short-id scheme are fixed by the controller protocol.

use crate::core::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete configuration for the relay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Periodic reporter configuration.
    pub reporter: ReporterConfig,
}

/// Periodic reporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Whether the periodic reporter runs at all.
    pub enabled: bool,
    /// Interval between reporting cycles.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Publish snapshots even when no metrics were observed.
    pub publish_empty: bool,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(5),
            publish_empty: false,
        }
    }
}

impl RelayConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.reporter.interval.is_zero() {
            return Err(RelayError::config("reporter interval cannot be zero"));
        }
        Ok(())
    }
}
