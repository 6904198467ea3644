//! Core domain types and error handling for the relay.
//!
//! This module contains the label/identity types metrics are attributed
//! with, the crate error taxonomy, and configuration.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{RelayConfig, ReporterConfig};
pub use error::{RelayError, Result};
pub use types::{MetricLabels, MetricName, ProgressSnapshot};
