//! One reporting cycle: turn the store's current values into the wire
//! outputs the controller consumes.
//!
//! Each build produces three things:
//! - a legacy per-transform metrics tree carrying raw numeric values, a
//!   historical wire shape external tooling still expects;
//! - a list of fully populated metadata records, self-describing even for
//!   identities the controller already knows;
//! - a map from short id to freshly encoded payload bytes, the compact form
//!   once the controller has learned what the short ids mean.
//!
//! Payloads are rebuilt every cycle and never cached; descriptors are
//! created once and never change.

use crate::core::error::{RelayError, Result};
use crate::core::types::{MetricLabels, MetricName, ProgressSnapshot};
use crate::shortid::{CacheSession, MetricIdentity, ShortId, ShortIdCache};
use crate::store::{MetricsView, MetricsVisitor};
use crate::wire::codec::{encode_counter, encode_distribution, encode_latest, epoch_millis};
use crate::wire::urn::{MetricUrn, WireType};
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{trace, warn};

/// Per-transform slice of the legacy report tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransformMetrics {
    /// User-declared metric entries recorded in this transform.
    pub user: Vec<UserMetric>,
    /// Output element counts, keyed by collection display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_elements: Option<HashMap<String, i64>>,
}

/// One named user metric entry in the legacy tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserMetric {
    /// Namespace-qualified name.
    pub name: MetricName,
    /// Raw numeric value, not the encoded payload.
    pub data: UserMetricData,
}

/// Raw value of a user metric, by shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserMetricData {
    /// Scalar counter.
    Counter {
        /// Current value.
        value: i64,
    },
    /// Distribution summary.
    Distribution {
        /// Number of samples.
        count: i64,
        /// Sum of samples.
        sum: i64,
        /// Smallest sample.
        min: i64,
        /// Largest sample.
        max: i64,
    },
    /// Latest-value gauge.
    Gauge {
        /// Latest value.
        value: i64,
        /// Observation time in epoch milliseconds.
        timestamp_ms: i64,
    },
}

/// Self-describing wire record: URN, wire type, labels, and the current
/// payload. Emitted for every observed value every cycle.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataRecord {
    /// Metric-kind URN.
    pub urn: MetricUrn,
    /// Payload encoding.
    #[serde(rename = "type")]
    pub wire_type: WireType,
    /// Wire label map.
    pub labels: HashMap<String, String>,
    /// Encoded payload for this cycle.
    pub payload: Bytes,
}

/// The three outputs of one reporting cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    /// Legacy per-transform metrics tree.
    pub transforms: HashMap<String, TransformMetrics>,
    /// Fully populated metadata records, one per observed value.
    pub records: Vec<MetadataRecord>,
    /// Freshly encoded payloads keyed by short id.
    pub payloads: HashMap<ShortId, Bytes>,
}

impl Snapshot {
    /// Returns true if the cycle observed nothing at all.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty() && self.records.is_empty() && self.payloads.is_empty()
    }
}

/// Builds snapshots against an explicitly supplied short-id cache.
///
/// Concurrent builds are safe; the cache is the only shared state and each
/// wire pass runs under its lock.
#[derive(Clone)]
pub struct SnapshotBuilder {
    cache: Arc<ShortIdCache>,
}

impl SnapshotBuilder {
    /// Creates a builder over the given cache.
    pub fn new(cache: Arc<ShortIdCache>) -> Self {
        Self { cache }
    }

    /// The cache this builder resolves short ids against.
    pub fn cache(&self) -> &ShortIdCache {
        &self.cache
    }

    /// Runs one reporting cycle.
    ///
    /// An absent store yields an empty snapshot, not an error. Encoding
    /// failures for user metrics abort the cycle before any result is
    /// returned; only the progress merge degrades silently.
    pub fn build(
        &self,
        store: Option<&dyn MetricsView>,
        progress: Option<&ProgressSnapshot>,
    ) -> Result<Snapshot> {
        let Some(store) = store else {
            return Ok(Snapshot::default());
        };

        // Pass 1: legacy tree with raw values.
        let mut legacy = LegacyPass::default();
        store.extract(&mut legacy);
        if let Some(err) = legacy.failure {
            return Err(err);
        }
        let mut transforms = legacy.transforms;

        // Pass 2: payloads and metadata records, under one cache session so
        // resolution and payload construction stay consistent for the cycle.
        let mut wire = WirePass::new(self.cache.session());
        store.extract(&mut wire);
        let WirePass {
            session: _session,
            mut records,
            payloads,
            failure,
        } = wire;
        if let Some(err) = failure {
            return Err(err);
        }

        if let Some(progress) = progress {
            merge_progress(&mut transforms, &mut records, progress);
        }

        trace!(
            transforms = transforms.len(),
            records = records.len(),
            payloads = payloads.len(),
            "built snapshot"
        );
        Ok(Snapshot {
            transforms,
            records,
            payloads,
        })
    }
}

fn transform_entry<'a>(
    transforms: &'a mut HashMap<String, TransformMetrics>,
    labels: &MetricLabels,
) -> &'a mut TransformMetrics {
    transforms
        .entry(labels.transform().to_string())
        .or_default()
}

#[derive(Default)]
struct LegacyPass {
    transforms: HashMap<String, TransformMetrics>,
    failure: Option<RelayError>,
}

impl LegacyPass {
    fn push(&mut self, labels: &MetricLabels, data: UserMetricData) {
        transform_entry(&mut self.transforms, labels)
            .user
            .push(UserMetric {
                name: labels.metric_name(),
                data,
            });
    }
}

impl MetricsVisitor for LegacyPass {
    fn counter_i64(&mut self, labels: &MetricLabels, value: i64) {
        self.push(labels, UserMetricData::Counter { value });
    }

    fn distribution_i64(&mut self, labels: &MetricLabels, count: i64, sum: i64, min: i64, max: i64) {
        self.push(labels, UserMetricData::Distribution { count, sum, min, max });
    }

    fn gauge_i64(&mut self, labels: &MetricLabels, value: i64, at: SystemTime) {
        match epoch_millis(at) {
            Ok(timestamp_ms) => self.push(labels, UserMetricData::Gauge { value, timestamp_ms }),
            Err(err) => {
                if self.failure.is_none() {
                    self.failure = Some(err);
                }
            },
        }
    }
}

struct WirePass<'a> {
    session: CacheSession<'a>,
    records: Vec<MetadataRecord>,
    payloads: HashMap<ShortId, Bytes>,
    failure: Option<RelayError>,
}

impl<'a> WirePass<'a> {
    fn new(session: CacheSession<'a>) -> Self {
        Self {
            session,
            records: Vec::new(),
            payloads: HashMap::new(),
            failure: None,
        }
    }

    fn emit(&mut self, labels: &MetricLabels, urn: MetricUrn, payload: Bytes) {
        let identity = MetricIdentity::new(labels.clone(), urn);
        let short_id = self.session.resolve(&identity);
        self.payloads.insert(short_id, payload.clone());
        self.records.push(MetadataRecord {
            urn,
            wire_type: urn.wire_type(),
            labels: identity.wire_labels(),
            payload,
        });
    }
}

impl MetricsVisitor for WirePass<'_> {
    fn counter_i64(&mut self, labels: &MetricLabels, value: i64) {
        self.emit(labels, MetricUrn::UserSumInt64, encode_counter(value));
    }

    fn distribution_i64(&mut self, labels: &MetricLabels, count: i64, sum: i64, min: i64, max: i64) {
        self.emit(
            labels,
            MetricUrn::UserDistributionInt64,
            encode_distribution(count, sum, min, max),
        );
    }

    fn gauge_i64(&mut self, labels: &MetricLabels, value: i64, at: SystemTime) {
        match encode_latest(at, value) {
            Ok(payload) => self.emit(labels, MetricUrn::UserLatestInt64, payload),
            Err(err) => {
                if self.failure.is_none() {
                    self.failure = Some(err);
                }
            },
        }
    }
}

/// Folds the execution engine's progress into both output shapes.
///
/// Progress reporting is best effort: a failure here loses this one record
/// and nothing else.
fn merge_progress(
    transforms: &mut HashMap<String, TransformMetrics>,
    records: &mut Vec<MetadataRecord>,
    progress: &ProgressSnapshot,
) {
    transforms
        .entry(progress.transform_id.clone())
        .or_default()
        .processed_elements
        .get_or_insert_with(HashMap::new)
        .insert(progress.display_name.clone(), progress.element_count);

    match element_count_record(progress) {
        Ok(record) => records.push(record),
        Err(err) => {
            warn!(collection = %progress.collection_id, error = %err, "skipping progress record");
        },
    }
}

fn element_count_record(progress: &ProgressSnapshot) -> Result<MetadataRecord> {
    let urn = MetricUrn::ElementCount;
    Ok(MetadataRecord {
        urn,
        wire_type: urn.wire_type(),
        labels: HashMap::from([("PCOLLECTION".to_string(), progress.collection_id.clone())]),
        payload: encode_counter(progress.element_count),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MetricsStore;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new(Arc::new(ShortIdCache::new()))
    }

    fn labels(transform: &str, name: &str) -> MetricLabels {
        MetricLabels::new(transform, "ns", name).unwrap()
    }

    #[test]
    fn test_absent_store_yields_empty_snapshot() {
        let snapshot = builder().build(None, None).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_empty_store_yields_empty_snapshot() {
        let store = MetricsStore::new();
        let snapshot = builder().build(Some(&store), None).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_counter_metadata_completeness() {
        let store = MetricsStore::new();
        store.inc_counter(&labels("t1", "n"), 7);

        let snapshot = builder().build(Some(&store), None).unwrap();

        assert_eq!(snapshot.records.len(), 1);
        let record = &snapshot.records[0];
        assert_eq!(record.urn, MetricUrn::UserSumInt64);
        assert_eq!(record.wire_type, WireType::SumInt64);
        assert_eq!(record.labels["PTRANSFORM"], "t1");
        assert_eq!(record.labels["NAMESPACE"], "ns");
        assert_eq!(record.labels["NAME"], "n");
        assert_eq!(record.payload, encode_counter(7));

        // The payload map holds the same bytes under the record's short id.
        assert_eq!(snapshot.payloads.len(), 1);
        let payload = snapshot.payloads.values().next().unwrap();
        assert_eq!(*payload, encode_counter(7));
    }

    #[test]
    fn test_legacy_tree_carries_raw_values() {
        let store = MetricsStore::new();
        store.inc_counter(&labels("t1", "n"), 7);
        for sample in [5, 15, 10] {
            store.record_distribution(&labels("t1", "d"), sample);
        }

        let snapshot = builder().build(Some(&store), None).unwrap();
        let transform = &snapshot.transforms["t1"];
        assert_eq!(transform.user.len(), 2);
        assert!(transform.user.iter().any(|m| {
            m.name.name == "n" && m.data == UserMetricData::Counter { value: 7 }
        }));
        assert!(transform.user.iter().any(|m| {
            m.name.name == "d"
                && m.data
                    == UserMetricData::Distribution {
                        count: 3,
                        sum: 30,
                        min: 5,
                        max: 15,
                    }
        }));
        assert!(transform.processed_elements.is_none());
    }

    #[test]
    fn test_gauge_produces_latest_payload() {
        let at = SystemTime::UNIX_EPOCH + Duration::from_millis(1_700_000_000_000);
        let store = MetricsStore::new();
        store.set_gauge(&labels("t1", "g"), 9, at);

        let snapshot = builder().build(Some(&store), None).unwrap();
        let record = &snapshot.records[0];
        assert_eq!(record.urn, MetricUrn::UserLatestInt64);
        assert_eq!(record.wire_type, WireType::LatestInt64);
        assert_eq!(record.payload, encode_latest(at, 9).unwrap());

        let transform = &snapshot.transforms["t1"];
        assert_eq!(
            transform.user[0].data,
            UserMetricData::Gauge {
                value: 9,
                timestamp_ms: 1_700_000_000_000
            }
        );
    }

    #[test]
    fn test_pre_epoch_gauge_aborts_the_cycle() {
        let store = MetricsStore::new();
        store.set_gauge(
            &labels("t1", "g"),
            9,
            SystemTime::UNIX_EPOCH - Duration::from_secs(1),
        );

        let err = builder().build(Some(&store), None).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_progress_merge() {
        let store = MetricsStore::new();
        let progress = ProgressSnapshot {
            transform_id: "t1".to_string(),
            collection_id: "pc1".to_string(),
            display_name: "pc1".to_string(),
            element_count: 42,
        };

        let snapshot = builder().build(Some(&store), Some(&progress)).unwrap();

        let counts = snapshot.transforms["t1"].processed_elements.as_ref().unwrap();
        assert_eq!(counts["pc1"], 42);

        assert_eq!(snapshot.records.len(), 1);
        let record = &snapshot.records[0];
        assert_eq!(record.urn, MetricUrn::ElementCount);
        assert_eq!(record.wire_type, WireType::SumInt64);
        assert_eq!(record.labels, HashMap::from([("PCOLLECTION".to_string(), "pc1".to_string())]));
        assert_eq!(record.payload, encode_counter(42));
        // Built-in element counts get no short id; only user metrics do.
        assert!(snapshot.payloads.is_empty());
    }

    #[test]
    fn test_progress_merge_keeps_user_metrics_on_same_transform() {
        let store = MetricsStore::new();
        store.inc_counter(&labels("t1", "n"), 7);
        let progress = ProgressSnapshot {
            transform_id: "t1".to_string(),
            collection_id: "pc1".to_string(),
            display_name: "out".to_string(),
            element_count: 3,
        };

        let snapshot = builder().build(Some(&store), Some(&progress)).unwrap();
        let transform = &snapshot.transforms["t1"];
        assert_eq!(transform.user.len(), 1);
        assert_eq!(transform.processed_elements.as_ref().unwrap()["out"], 3);
    }

    #[test]
    fn test_records_fully_populated_on_every_cycle() {
        let store = MetricsStore::new();
        store.inc_counter(&labels("t1", "n"), 7);
        let builder = builder();

        let first = builder.build(Some(&store), None).unwrap();
        store.inc_counter(&labels("t1", "n"), 1);
        let second = builder.build(Some(&store), None).unwrap();

        // Same identity, same short id, fresh payload, record still present.
        assert_eq!(second.records.len(), 1);
        let short_id = first.payloads.keys().next().unwrap();
        assert_eq!(second.payloads[short_id], encode_counter(8));
        assert_eq!(builder.cache().len(), 1);
    }

    #[test]
    fn test_snapshot_serializes_for_external_tooling() {
        let store = MetricsStore::new();
        store.inc_counter(&labels("t1", "n"), 7);
        let snapshot = builder().build(Some(&store), None).unwrap();

        let json = serde_json::to_value(&snapshot.transforms).unwrap();
        assert_eq!(json["t1"]["user"][0]["name"]["name"], "n");
        assert_eq!(json["t1"]["user"][0]["data"]["counter"]["value"], 7);
    }
}
