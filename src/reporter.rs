//! Periodic reporting loop.
//!
//! Optional convenience driver: builds a snapshot every configured interval
//! and hands it to a caller-supplied sink. The sink is the seam to the
//! control-channel transport, which stays outside this crate; callers that
//! decide reporting cadence themselves just call
//! [`SnapshotBuilder::build`](crate::snapshot::SnapshotBuilder::build)
//! directly.

use crate::core::config::ReporterConfig;
use crate::core::error::Result;
use crate::snapshot::{Snapshot, SnapshotBuilder};
use crate::store::MetricsView;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Consumes the snapshots a reporter produces.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Publishes one reporting cycle's output.
    async fn publish(&self, snapshot: Snapshot) -> Result<()>;
}

/// Drives reporting cycles at a fixed interval until shut down.
pub struct Reporter {
    builder: SnapshotBuilder,
    store: Arc<dyn MetricsView + Send + Sync>,
    sink: Arc<dyn SnapshotSink>,
    config: ReporterConfig,
    shutdown: watch::Receiver<bool>,
}

impl Reporter {
    /// Creates a reporter. Shutdown is signalled by sending `true` on the
    /// watch channel.
    pub fn new(
        builder: SnapshotBuilder,
        store: Arc<dyn MetricsView + Send + Sync>,
        sink: Arc<dyn SnapshotSink>,
        config: ReporterConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            builder,
            store,
            sink,
            config,
            shutdown,
        }
    }

    /// Runs the reporting loop.
    ///
    /// Sink failures are logged and the loop continues; re-sending belongs
    /// to the transport. A fatal build error (protocol violation) stops the
    /// loop and is returned.
    pub async fn run(self) -> Result<()> {
        if !self.config.enabled {
            debug!("reporter disabled, not starting");
            return Ok(());
        }

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval fires immediately; consume it
        // so the first report happens one interval after startup.
        ticker.tick().await;

        let mut shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = self.builder.build(Some(self.store.as_ref()), None)?;
                    if snapshot.is_empty() && !self.config.publish_empty {
                        continue;
                    }
                    debug!(records = snapshot.records.len(), "publishing snapshot");
                    if let Err(err) = self.sink.publish(snapshot).await {
                        warn!(error = %err, "snapshot sink rejected publish");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("reporter shutting down");
                        return Ok(());
                    }
                }
            }
        }
    }
}
