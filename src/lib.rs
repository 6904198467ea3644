//! metric-relay - worker-side metrics reporting bridge.
//!
//! Converts metrics accumulated inside a distributed-processing worker
//! (counters, distributions, gauges, element counts) into the compact wire
//! protocol an orchestrating controller consumes, and negotiates short
//! identifiers so metric metadata is transmitted once per process instead
//! of once per cycle.
//!
//! # Architecture
//!
//! - `wire`: closed URN/wire-type schema and varint payload encoders
//! - `shortid`: memoizing short-identifier cache and metadata descriptors
//! - `store`: the extraction seam plus a minimal accumulation store
//! - `snapshot`: one reporting cycle, producing the legacy tree, metadata
//!   records, and payloads keyed by short id
//! - `reporter`: optional interval-driven loop publishing to a sink
//! - `core`: labels, errors, configuration
//!
//! # Example
//!
//! ```
//! use metric_relay::core::MetricLabels;
//! use metric_relay::shortid::ShortIdCache;
//! use metric_relay::snapshot::SnapshotBuilder;
//! use metric_relay::store::MetricsStore;
//! use std::sync::Arc;
//!
//! # fn main() -> metric_relay::core::Result<()> {
//! let store = MetricsStore::new();
//! store.inc_counter(&MetricLabels::new("t1", "ns", "n")?, 7);
//!
//! let builder = SnapshotBuilder::new(Arc::new(ShortIdCache::new()));
//! let snapshot = builder.build(Some(&store), None)?;
//! assert_eq!(snapshot.records.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod core;
pub mod reporter;
pub mod shortid;
pub mod snapshot;
pub mod store;
pub mod wire;

// Re-export core types for convenience
pub use crate::core::{MetricLabels, ProgressSnapshot, RelayConfig, RelayError, Result};
pub use crate::shortid::{MetricIdentity, ShortId, ShortIdCache};
pub use crate::snapshot::{Snapshot, SnapshotBuilder};
