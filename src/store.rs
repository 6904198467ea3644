//! Metric accumulation store and the extraction seam the bridge consumes.
//!
//! The snapshot builder never depends on a concrete store; it pulls current
//! values through [`MetricsView`], a push-style visitor interface keyed by
//! metric shape. [`MetricsStore`] is a minimal in-memory implementation so
//! the crate is usable end to end; execution engines with their own
//! accumulation just implement the trait.

use crate::core::types::MetricLabels;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::time::SystemTime;

/// Receives every currently accumulated value, one call per metric cell.
pub trait MetricsVisitor {
    /// A scalar counter's current value.
    fn counter_i64(&mut self, labels: &MetricLabels, value: i64);
    /// A distribution's current (count, sum, min, max).
    fn distribution_i64(&mut self, labels: &MetricLabels, count: i64, sum: i64, min: i64, max: i64);
    /// A gauge's latest value and observation time.
    fn gauge_i64(&mut self, labels: &MetricLabels, value: i64, at: SystemTime);
}

/// Anything that can push its current metric values through a visitor.
pub trait MetricsView {
    /// Visits every accumulated value. Order is unspecified.
    fn extract(&self, visitor: &mut dyn MetricsVisitor);
}

#[derive(Debug, Clone, Copy)]
struct DistributionCell {
    count: i64,
    sum: i64,
    min: i64,
    max: i64,
}

#[derive(Debug, Clone, Copy)]
struct GaugeCell {
    value: i64,
    at: SystemTime,
}

#[derive(Default)]
struct Cells {
    counters: FxHashMap<MetricLabels, i64>,
    distributions: FxHashMap<MetricLabels, DistributionCell>,
    gauges: FxHashMap<MetricLabels, GaugeCell>,
}

/// In-memory accumulation store with typed cells per metric shape.
#[derive(Default)]
pub struct MetricsStore {
    cells: Mutex<Cells>,
}

impl MetricsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` to a counter cell, creating it at zero first.
    pub fn inc_counter(&self, labels: &MetricLabels, delta: i64) {
        let mut cells = self.cells.lock();
        *cells.counters.entry(labels.clone()).or_insert(0) += delta;
    }

    /// Folds one sample into a distribution cell.
    pub fn record_distribution(&self, labels: &MetricLabels, sample: i64) {
        let mut cells = self.cells.lock();
        cells
            .distributions
            .entry(labels.clone())
            .and_modify(|d| {
                d.count += 1;
                d.sum += sample;
                d.min = d.min.min(sample);
                d.max = d.max.max(sample);
            })
            .or_insert(DistributionCell {
                count: 1,
                sum: sample,
                min: sample,
                max: sample,
            });
    }

    /// Sets a gauge cell to the given value and observation time.
    pub fn set_gauge(&self, labels: &MetricLabels, value: i64, at: SystemTime) {
        let mut cells = self.cells.lock();
        cells.gauges.insert(labels.clone(), GaugeCell { value, at });
    }

    /// Number of cells across all shapes.
    pub fn len(&self) -> usize {
        let cells = self.cells.lock();
        cells.counters.len() + cells.distributions.len() + cells.gauges.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetricsView for MetricsStore {
    fn extract(&self, visitor: &mut dyn MetricsVisitor) {
        let cells = self.cells.lock();
        for (labels, value) in &cells.counters {
            visitor.counter_i64(labels, *value);
        }
        for (labels, d) in &cells.distributions {
            visitor.distribution_i64(labels, d.count, d.sum, d.min, d.max);
        }
        for (labels, g) in &cells.gauges {
            visitor.gauge_i64(labels, g.value, g.at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording {
        counters: Vec<(MetricLabels, i64)>,
        distributions: Vec<(MetricLabels, i64, i64, i64, i64)>,
        gauges: Vec<(MetricLabels, i64)>,
    }

    impl MetricsVisitor for Recording {
        fn counter_i64(&mut self, labels: &MetricLabels, value: i64) {
            self.counters.push((labels.clone(), value));
        }
        fn distribution_i64(
            &mut self,
            labels: &MetricLabels,
            count: i64,
            sum: i64,
            min: i64,
            max: i64,
        ) {
            self.distributions.push((labels.clone(), count, sum, min, max));
        }
        fn gauge_i64(&mut self, labels: &MetricLabels, value: i64, _at: SystemTime) {
            self.gauges.push((labels.clone(), value));
        }
    }

    fn labels(name: &str) -> MetricLabels {
        MetricLabels::new("t1", "ns", name).unwrap()
    }

    #[test]
    fn test_counter_accumulates() {
        let store = MetricsStore::new();
        store.inc_counter(&labels("n"), 3);
        store.inc_counter(&labels("n"), 4);

        let mut visitor = Recording::default();
        store.extract(&mut visitor);
        assert_eq!(visitor.counters, vec![(labels("n"), 7)]);
    }

    #[test]
    fn test_distribution_merges_samples() {
        let store = MetricsStore::new();
        for sample in [5, 15, 10] {
            store.record_distribution(&labels("d"), sample);
        }

        let mut visitor = Recording::default();
        store.extract(&mut visitor);
        assert_eq!(visitor.distributions, vec![(labels("d"), 3, 30, 5, 15)]);
    }

    #[test]
    fn test_gauge_keeps_latest() {
        let store = MetricsStore::new();
        store.set_gauge(&labels("g"), 1, SystemTime::UNIX_EPOCH);
        store.set_gauge(&labels("g"), 9, SystemTime::now());

        let mut visitor = Recording::default();
        store.extract(&mut visitor);
        assert_eq!(visitor.gauges, vec![(labels("g"), 9)]);
    }

    #[test]
    fn test_empty_store() {
        let store = MetricsStore::new();
        assert!(store.is_empty());

        let mut visitor = Recording::default();
        store.extract(&mut visitor);
        assert!(visitor.counters.is_empty());
        assert!(visitor.distributions.is_empty());
        assert!(visitor.gauges.is_empty());
    }

    #[test]
    fn test_same_name_different_shapes_are_distinct_cells() {
        let store = MetricsStore::new();
        store.inc_counter(&labels("x"), 1);
        store.record_distribution(&labels("x"), 2);
        assert_eq!(store.len(), 2);
    }
}
