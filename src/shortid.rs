//! Short-identifier cache for metric metadata negotiation.
//!
//! Re-sending a metric's URN, wire type, and labels on every reporting
//! cycle would dwarf the payloads themselves. Instead each distinct metric
//! identity is bound, once per process lifetime, to a compact token; the
//! controller asks for the token's metadata the first time it sees it and
//! never again.
//!
//! Identity cardinality is bounded by the pipeline's static structure
//! (transforms times declared metric names), so the cache grows without
//! eviction.

use crate::core::types::MetricLabels;
use crate::wire::urn::{MetricUrn, WireType};
use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::debug;

/// The composite key a short id stands for: attribution labels plus the
/// metric-kind URN. URNs fully determine the wire type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricIdentity {
    /// Attribution labels.
    pub labels: MetricLabels,
    /// Metric-kind URN.
    pub urn: MetricUrn,
}

impl MetricIdentity {
    /// Creates an identity from labels and a URN.
    pub fn new(labels: MetricLabels, urn: MetricUrn) -> Self {
        Self { labels, urn }
    }

    /// The label map this identity carries on the wire.
    pub fn wire_labels(&self) -> HashMap<String, String> {
        HashMap::from([
            ("PTRANSFORM".to_string(), self.labels.transform().to_string()),
            ("NAMESPACE".to_string(), self.labels.namespace().to_string()),
            ("NAME".to_string(), self.labels.name().to_string()),
        ])
    }
}

/// Compact per-process token standing in for a metric identity.
///
/// Tokens are the base-36 rendering of a monotonically increasing counter,
/// so early (frequent) metrics get the shortest possible strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ShortId(String);

impl ShortId {
    /// Returns the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_counter(n: u64) -> Self {
        const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        // 13 base-36 digits cover the full u64 range.
        let mut digits = SmallVec::<[u8; 13]>::new();
        let mut n = n;
        loop {
            digits.push(DIGITS[(n % 36) as usize]);
            n /= 36;
            if n == 0 {
                break;
            }
        }
        ShortId(digits.iter().rev().map(|&b| b as char).collect())
    }
}

impl std::fmt::Display for ShortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The time-invariant metadata bound to a short id at creation.
///
/// Immutable once created; only payloads vary cycle to cycle.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataDescriptor {
    /// Metric-kind URN.
    pub urn: MetricUrn,
    /// Payload encoding.
    #[serde(rename = "type")]
    pub wire_type: WireType,
    /// Wire label map.
    pub labels: HashMap<String, String>,
}

#[derive(Default)]
struct CacheInner {
    ids: FxHashMap<MetricIdentity, ShortId>,
    descriptors: FxHashMap<ShortId, MetadataDescriptor>,
    last_id: u64,
}

impl CacheInner {
    fn resolve(&mut self, identity: &MetricIdentity) -> ShortId {
        if let Some(id) = self.ids.get(identity) {
            return id.clone();
        }
        self.last_id += 1;
        let id = ShortId::from_counter(self.last_id);
        debug!(short_id = %id, identity = %identity.labels, urn = %identity.urn, "assigned short id");
        self.ids.insert(identity.clone(), id.clone());
        self.descriptors.insert(
            id.clone(),
            MetadataDescriptor {
                urn: identity.urn,
                wire_type: identity.urn.wire_type(),
                labels: identity.wire_labels(),
            },
        );
        id
    }
}

/// Memoizing registry of (metric identity -> short id) and
/// (short id -> metadata descriptor).
///
/// One mutex covers both maps and the counter: token allocation and
/// descriptor publication are a single critical section, so a caller that
/// reads a token can always look up its fully built descriptor. Explicitly
/// constructed and passed; there is no process-wide default instance.
#[derive(Default)]
pub struct ShortIdCache {
    inner: Mutex<CacheInner>,
}

impl ShortIdCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the short id for the given identity, assigning one and
    /// recording its descriptor if the identity has not been seen before.
    pub fn resolve(&self, identity: &MetricIdentity) -> ShortId {
        self.session().resolve(identity)
    }

    /// Batch metadata lookup. Unknown tokens map to `None`; the batch
    /// itself never fails.
    pub fn describe_many(&self, tokens: &[ShortId]) -> HashMap<ShortId, Option<MetadataDescriptor>> {
        let inner = self.inner.lock();
        tokens
            .iter()
            .map(|t| (t.clone(), inner.descriptors.get(t).cloned()))
            .collect()
    }

    /// Acquires the cache lock for a whole reporting pass, so every resolve
    /// within the pass observes one consistent cache state.
    pub fn session(&self) -> CacheSession<'_> {
        CacheSession {
            inner: self.inner.lock(),
        }
    }

    /// Number of identities bound so far.
    pub fn len(&self) -> usize {
        self.inner.lock().ids.len()
    }

    /// Returns true if no identity has been bound yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive access to the cache for the duration of a reporting pass.
pub struct CacheSession<'a> {
    inner: MutexGuard<'a, CacheInner>,
}

impl CacheSession<'_> {
    /// Same contract as [`ShortIdCache::resolve`], under the held lock.
    pub fn resolve(&mut self, identity: &MetricIdentity) -> ShortId {
        self.inner.resolve(identity)
    }
}
