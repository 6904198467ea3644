use crate::core::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribution labels for a user metric: the transform it was recorded in
/// plus the namespace-qualified metric name.
///
/// Two label sets are equal iff all three fields match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricLabels {
    transform: String,
    namespace: String,
    name: String,
}

impl MetricLabels {
    /// Creates a new label set after validation.
    pub fn new(
        transform: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let transform = transform.into();
        let namespace = namespace.into();
        let name = name.into();
        if transform.is_empty() {
            return Err(RelayError::InvalidLabels(
                "transform id cannot be empty".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(RelayError::InvalidLabels(
                "metric name cannot be empty".to_string(),
            ));
        }
        Ok(MetricLabels {
            transform,
            namespace,
            name,
        })
    }

    /// The id of the transform this metric is attributed to.
    pub fn transform(&self) -> &str {
        &self.transform
    }

    /// The user-chosen namespace of the metric.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The user-chosen name of the metric.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace-qualified metric name, as the legacy report carries it.
    pub fn metric_name(&self) -> MetricName {
        MetricName {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

impl fmt::Display for MetricLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.transform, self.namespace, self.name)
    }
}

/// Namespace-qualified metric name as it appears in the legacy report tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricName {
    /// User-chosen metric name.
    pub name: String,
    /// User-chosen namespace.
    pub namespace: String,
}

/// Point-in-time progress of the actively executing transform, supplied by
/// the execution engine alongside the metric store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Id of the transform currently executing.
    pub transform_id: String,
    /// Id of the data collection being counted.
    pub collection_id: String,
    /// Display name of the collection, used as the legacy element-count key.
    pub display_name: String,
    /// Elements processed so far.
    pub element_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_validation() {
        assert!(MetricLabels::new("", "ns", "n").is_err());
        assert!(MetricLabels::new("t1", "ns", "").is_err());
        let labels = MetricLabels::new("t1", "ns", "n").unwrap();
        assert_eq!(labels.transform(), "t1");
        assert_eq!(labels.namespace(), "ns");
        assert_eq!(labels.name(), "n");
    }

    #[test]
    fn test_labels_equality_is_exact() {
        let a = MetricLabels::new("t1", "ns", "n").unwrap();
        let b = MetricLabels::new("t1", "ns", "n").unwrap();
        let c = MetricLabels::new("t2", "ns", "n").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_metric_name_projection() {
        let labels = MetricLabels::new("t1", "ns", "n").unwrap();
        let name = labels.metric_name();
        assert_eq!(name.name, "n");
        assert_eq!(name.namespace, "ns");
    }

    #[test]
    fn test_empty_namespace_allowed() {
        // Built-in metrics carry no namespace.
        assert!(MetricLabels::new("t1", "", "n").is_ok());
    }
}
