//! Closed metric-kind and wire-type identifier sets.
//!
//! Every metric kind the worker can report is named by a URN, and every URN
//! has exactly one payload encoding named by a wire type. Both sets are
//! closed: adding a kind means adding an enum variant, and the compiler then
//! forces the mapping and the string tables to be extended with it.

use crate::core::error::{RelayError, Result};
use serde::{Serialize, Serializer};
use std::fmt;

/// Metric-kind URN: names what a metric *is*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricUrn {
    /// User-declared sum of int64s.
    UserSumInt64,
    /// User-declared sum of doubles.
    UserSumDouble,
    /// User-declared distribution of int64s.
    UserDistributionInt64,
    /// User-declared distribution of doubles.
    UserDistributionDouble,
    /// User-declared latest-value int64 (gauge).
    UserLatestInt64,
    /// User-declared latest-value double (gauge).
    UserLatestDouble,
    /// User-declared largest-N int64s.
    UserTopNInt64,
    /// User-declared largest-N doubles.
    UserTopNDouble,
    /// User-declared smallest-N int64s.
    UserBottomNInt64,
    /// User-declared smallest-N doubles.
    UserBottomNDouble,
    /// Built-in: elements produced on a collection.
    ElementCount,
    /// Built-in: sampled encoded byte size of a collection.
    SampledByteSize,
    /// Built-in: milliseconds spent in bundle start.
    StartBundleMsecs,
    /// Built-in: milliseconds spent processing a bundle.
    ProcessBundleMsecs,
    /// Built-in: milliseconds spent in bundle finish.
    FinishBundleMsecs,
    /// Built-in: total milliseconds attributed to a transform.
    TransformTotalMsecs,
    /// Built-in: work remaining estimate for a transform.
    ProgressRemaining,
    /// Built-in: work completed estimate for a transform.
    ProgressCompleted,
}

/// Wire type: names how a metric's payload is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// Single varint.
    SumInt64,
    /// Single IEEE 754 double.
    SumDouble,
    /// Four varints: count, sum, min, max.
    DistributionInt64,
    /// Four doubles: count, sum, min, max.
    DistributionDouble,
    /// Varint epoch-milliseconds followed by varint value.
    LatestInt64,
    /// Double epoch-milliseconds followed by double value.
    LatestDouble,
    /// Repeated varints, largest first.
    TopNInt64,
    /// Repeated doubles, largest first.
    TopNDouble,
    /// Repeated varints, smallest first.
    BottomNInt64,
    /// Repeated doubles, smallest first.
    BottomNDouble,
    /// Pair of doubles: remaining, completed.
    Progress,
}

/// All supported URNs, in allocation order of the protocol.
pub const ALL_URNS: [MetricUrn; 18] = [
    MetricUrn::UserSumInt64,
    MetricUrn::UserSumDouble,
    MetricUrn::UserDistributionInt64,
    MetricUrn::UserDistributionDouble,
    MetricUrn::UserLatestInt64,
    MetricUrn::UserLatestDouble,
    MetricUrn::UserTopNInt64,
    MetricUrn::UserTopNDouble,
    MetricUrn::UserBottomNInt64,
    MetricUrn::UserBottomNDouble,
    MetricUrn::ElementCount,
    MetricUrn::SampledByteSize,
    MetricUrn::StartBundleMsecs,
    MetricUrn::ProcessBundleMsecs,
    MetricUrn::FinishBundleMsecs,
    MetricUrn::TransformTotalMsecs,
    MetricUrn::ProgressRemaining,
    MetricUrn::ProgressCompleted,
];

impl MetricUrn {
    /// Returns the stable wire string for this URN.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserSumInt64 => "beam:metric:user:sum_int64:v1",
            Self::UserSumDouble => "beam:metric:user:sum_double:v1",
            Self::UserDistributionInt64 => "beam:metric:user:distribution_int64:v1",
            Self::UserDistributionDouble => "beam:metric:user:distribution_double:v1",
            Self::UserLatestInt64 => "beam:metric:user:latest_int64:v1",
            Self::UserLatestDouble => "beam:metric:user:latest_double:v1",
            Self::UserTopNInt64 => "beam:metric:user:top_n_int64:v1",
            Self::UserTopNDouble => "beam:metric:user:top_n_double:v1",
            Self::UserBottomNInt64 => "beam:metric:user:bottom_n_int64:v1",
            Self::UserBottomNDouble => "beam:metric:user:bottom_n_double:v1",
            Self::ElementCount => "beam:metric:element_count:v1",
            Self::SampledByteSize => "beam:metric:sampled_byte_size:v1",
            Self::StartBundleMsecs => "beam:metric:pardo_execution_time:start_bundle_msecs:v1",
            Self::ProcessBundleMsecs => "beam:metric:pardo_execution_time:process_bundle_msecs:v1",
            Self::FinishBundleMsecs => "beam:metric:pardo_execution_time:finish_bundle_msecs:v1",
            Self::TransformTotalMsecs => "beam:metric:ptransform_execution_time:total_msecs:v1",
            Self::ProgressRemaining => "beam:metric:ptransform_progress:remaining:v1",
            Self::ProgressCompleted => "beam:metric:ptransform_progress:completed:v1",
        }
    }

    /// Parses a wire URN string. An unrecognized string is a protocol
    /// violation: the supported set is closed and internally produced.
    pub fn parse(s: &str) -> Result<Self> {
        ALL_URNS
            .into_iter()
            .find(|urn| urn.as_str() == s)
            .ok_or_else(|| RelayError::UnknownUrn { urn: s.to_string() })
    }

    /// Maps this URN to its payload encoding.
    ///
    /// Total by construction: the match has no default arm, so a new URN
    /// variant fails to compile until it is mapped here.
    #[inline]
    pub fn wire_type(self) -> WireType {
        match self {
            Self::UserSumInt64
            | Self::ElementCount
            | Self::StartBundleMsecs
            | Self::ProcessBundleMsecs
            | Self::FinishBundleMsecs
            | Self::TransformTotalMsecs => WireType::SumInt64,
            Self::UserSumDouble => WireType::SumDouble,
            Self::UserDistributionInt64 | Self::SampledByteSize => WireType::DistributionInt64,
            Self::UserDistributionDouble => WireType::DistributionDouble,
            Self::UserLatestInt64 => WireType::LatestInt64,
            Self::UserLatestDouble => WireType::LatestDouble,
            Self::UserTopNInt64 => WireType::TopNInt64,
            Self::UserTopNDouble => WireType::TopNDouble,
            Self::UserBottomNInt64 => WireType::BottomNInt64,
            Self::UserBottomNDouble => WireType::BottomNDouble,
            Self::ProgressRemaining | Self::ProgressCompleted => WireType::Progress,
        }
    }
}

impl WireType {
    /// Returns the stable wire string for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SumInt64 => "beam:metrics:sum_int64:v1",
            Self::SumDouble => "beam:metrics:sum_double:v1",
            Self::DistributionInt64 => "beam:metrics:distribution_int64:v1",
            Self::DistributionDouble => "beam:metrics:distribution_double:v1",
            Self::LatestInt64 => "beam:metrics:latest_int64:v1",
            Self::LatestDouble => "beam:metrics:latest_double:v1",
            Self::TopNInt64 => "beam:metrics:top_n_int64:v1",
            Self::TopNDouble => "beam:metrics:top_n_double:v1",
            Self::BottomNInt64 => "beam:metrics:bottom_n_int64:v1",
            Self::BottomNDouble => "beam:metrics:bottom_n_double:v1",
            Self::Progress => "beam:metrics:progress:v1",
        }
    }
}

impl fmt::Display for MetricUrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MetricUrn {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Serialize for WireType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
